use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;

use std::sync::Arc;

use friend_chat::config::{Cli, Config, StoreConfig};
use friend_chat::handlers::{self, AppState};
use friend_chat::kv_rest::RestKeyValueClient;
use friend_chat::memory_store::InMemoryMessageDatabase;
use friend_chat::message_database::MessageDatabase;
use friend_chat::remote_store::{KvError, RemoteMessageDatabase};

fn open_store(config: &StoreConfig) -> Result<Arc<dyn MessageDatabase>, KvError> {
    match config {
        StoreConfig::Memory => {
            log::info!("Keeping messages in memory; they are lost on restart");
            Ok(Arc::new(InMemoryMessageDatabase::new()))
        }
        StoreConfig::Remote {
            url,
            token,
            list_key,
            timeout,
        } => {
            let client = RestKeyValueClient::new(url.as_str(), token.as_str(), *timeout)?;
            log::info!("Keeping messages in list {list_key} at {}", client.base_url());
            Ok(Arc::new(RemoteMessageDatabase::new(client, list_key.as_str())))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_cli(Cli::parse()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            ::std::process::exit(1);
        }
    };

    let store = match open_store(&config.store) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Could not set up the message store: {e}");
            ::std::process::exit(1);
        }
    };

    let app_data = match AppState::new(store) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Parsing error: {e}");
            ::std::process::exit(1);
        }
    };

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .wrap(handlers::cors())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
