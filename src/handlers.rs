//! HTTP handlers: decode the request, validate, hit the store, encode the
//! response.

use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::middleware::DefaultHeaders;
use actix_web::{get, post, route, web, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;
use tera::Tera;
use thiserror::Error;

use crate::message_database::{MessageDatabase, Messages, StoreError};
use crate::validation::{validate, ValidationError};

pub const TITLE: &str = "Friend Chat API";

/// Shared state handed to every handler.
pub struct AppState {
    pub tera: Tera,
    pub store: Arc<dyn MessageDatabase>,
}

impl AppState {
    /// # Errors
    ///
    /// Fails if the bundled templates do not parse.
    pub fn new(store: Arc<dyn MessageDatabase>) -> tera::Result<Self> {
        Ok(Self {
            tera: templates()?,
            store,
        })
    }
}

/// Loads the templates compiled into the binary.
pub fn templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template("index.html", include_str!("../templates/index.html"))?;
    Ok(tera)
}

/// Permissive CORS headers for browser clients.
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
}

/// Registers every route on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_index)
        .service(get_messages)
        .service(post_messages)
        .service(preflight_messages);
}

/// Request failures, each mapped to a status and an `{"error": ...}` body.
///
/// Store errors keep their cause for logging; the client only sees the
/// fixed message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("Failed to save messages")]
    Save(#[source] StoreError),

    #[error("Failed to fetch messages")]
    Fetch(#[source] StoreError),

    #[error("Failed to render page")]
    Render(#[source] tera::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Save(_) | Self::Fetch(_) | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

// Serialization object
#[derive(Serialize)]
struct AddedDso {
    added: Messages,
}

#[get("/")]
async fn get_index(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let mut context = tera::Context::new();
    context.insert("title", TITLE);
    let output = data.tera.render("index.html", &context).map_err(|err| {
        log::error!("Rendering index failed: {err}");
        ApiError::Render(err)
    })?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(output))
}

#[get("/messages")]
async fn get_messages(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let messages = data.store.read_all().await.map_err(|err| {
        log::error!("Reading messages failed: {err}");
        ApiError::Fetch(err)
    })?;
    Ok(HttpResponse::Ok().json(messages))
}

// The body is parsed whatever its content type; clients often leave it off.
#[post("/messages")]
async fn post_messages(
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let raw: Value = serde_json::from_slice(&body).map_err(|err| {
        log::debug!("Rejecting body that is not JSON: {err}");
        ApiError::InvalidJson
    })?;
    let messages = validate(&raw).map_err(|err| {
        log::debug!("Rejecting invalid message: {err}");
        ApiError::from(err)
    })?;

    let added = data.store.append_all(messages).await.map_err(|err| {
        log::error!("Saving messages failed: {err}");
        ApiError::Save(err)
    })?;
    log::info!("Added {} message(s)", added.len());

    Ok(HttpResponse::Created().json(AddedDso { added }))
}

#[route("/messages", method = "OPTIONS")]
async fn preflight_messages() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_render_landing_page() {
        let tera = templates().unwrap();
        let mut context = tera::Context::new();
        context.insert("title", TITLE);
        let page = tera.render("index.html", &context).unwrap();
        assert!(page.contains("<h1>Friend Chat API</h1>"));
        assert!(page.contains("POST /messages"));
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(ApiError::InvalidJson.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ValidationError::NotAnObject).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Save(StoreError::unavailable("down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_hide_their_cause() {
        let err = ApiError::Fetch(StoreError::unavailable("token rejected"));
        assert_eq!(err.to_string(), "Failed to fetch messages");
    }
}
