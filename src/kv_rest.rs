//! [`KeyValueList`] over a Redis-compatible REST endpoint.
//!
//! Commands are sent as `POST <base_url>` with a JSON array body such as
//! `["RPUSH", "messages", "..."]` and a bearer token. Replies look like
//! `{"result": ...}` on success and `{"error": "..."}` on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::remote_store::{KeyValueList, KvError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct Reply {
    result: Option<Value>,
    error: Option<String>,
}

/// HTTP client for the key-value REST API.
#[derive(Debug, Clone)]
pub struct RestKeyValueClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestKeyValueClient {
    /// Creates a client whose every call gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, KvError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn command(&self, args: &[&str]) -> Result<Value, KvError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let reply: Option<Reply> = serde_json::from_str(&body).ok();

        match reply {
            Some(Reply {
                error: Some(error), ..
            }) => Err(KvError::Command(error)),
            _ if !status.is_success() => Err(KvError::Status {
                status: status.as_u16(),
                body,
            }),
            Some(Reply {
                result: Some(result),
                ..
            }) => Ok(result),
            _ => Err(KvError::Response(body)),
        }
    }
}

#[async_trait]
impl KeyValueList for RestKeyValueClient {
    async fn push(&self, key: &str, values: &[String]) -> Result<u64, KvError> {
        let mut args = vec!["RPUSH", key];
        args.extend(values.iter().map(String::as_str));
        let result = self.command(&args).await?;
        result
            .as_u64()
            .ok_or_else(|| KvError::Response(format!("RPUSH returned {result}")))
    }

    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        let result = self.command(&["LRANGE", key, "0", "-1"]).await?;
        let Value::Array(items) = result else {
            return Err(KvError::Response(format!("LRANGE returned {result}")));
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                // passed on as JSON text; the caller decides what is malformed
                other => Ok(other.to_string()),
            })
            .collect()
    }
}
