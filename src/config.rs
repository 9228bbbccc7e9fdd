//! Command-line and environment configuration.
//!
//! Every flag can also come from the environment (and so from a `.env`
//! file, which `main` loads first).

use std::time::Duration;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::kv_rest::DEFAULT_TIMEOUT;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LIST_KEY: &str = "messages";

#[derive(Debug, Parser)]
#[command(name = "friend-chat", version, about = "Minimal chat message API")]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Where messages are kept
    #[arg(long, env = "MESSAGE_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Base URL of the key-value REST API (remote store only)
    #[arg(long, env = "KV_REST_API_URL", value_name = "URL")]
    pub kv_url: Option<String>,

    /// Bearer token for the key-value REST API (remote store only)
    #[arg(long, env = "KV_REST_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub kv_token: Option<String>,

    /// Name of the list holding the messages
    #[arg(long, env = "MESSAGE_LIST_KEY", default_value = DEFAULT_LIST_KEY)]
    pub list_key: String,

    /// Give up on a key-value request after this many seconds
    #[arg(long, env = "KV_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub kv_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// In-process list, lost on restart
    Memory,
    /// Hosted key-value store over HTTP
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Remote {
        url: String,
        token: String,
        list_key: String,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set when using the remote store")]
    Missing(&'static str),

    #[error("KV_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    /// Checks that everything the selected store needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the remote store is selected without a
    /// URL, a token, or with a zero timeout.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let store = match cli.store {
            StoreKind::Memory => StoreConfig::Memory,
            StoreKind::Remote => {
                let url =
                    non_empty(cli.kv_url).ok_or(ConfigError::Missing("KV_REST_API_URL"))?;
                let token =
                    non_empty(cli.kv_token).ok_or(ConfigError::Missing("KV_REST_API_TOKEN"))?;
                if cli.kv_timeout_secs == 0 {
                    return Err(ConfigError::ZeroTimeout);
                }
                StoreConfig::Remote {
                    url,
                    token,
                    list_key: cli.list_key,
                    timeout: Duration::from_secs(cli.kv_timeout_secs),
                }
            }
        };
        Ok(Self {
            host: cli.host,
            port: cli.port,
            store,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Parsed from explicit args only, so the test environment cannot leak in
    // through a set variable.
    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("friend-chat").chain(args.iter().copied());
        let mut cli = Cli::try_parse_from(argv).unwrap();
        if !args.iter().any(|a| a.starts_with("--kv-url")) {
            cli.kv_url = None;
        }
        if !args.iter().any(|a| a.starts_with("--kv-token")) {
            cli.kv_token = None;
        }
        cli
    }

    #[test]
    fn memory_store_needs_nothing() {
        let config = Config::from_cli(cli(&["--store", "memory", "--port", "8080"])).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn remote_store_collects_settings() {
        let config = Config::from_cli(cli(&[
            "--store",
            "remote",
            "--kv-url",
            "https://kv.example.com",
            "--kv-token",
            "secret",
            "--list-key",
            "chat",
            "--kv-timeout-secs",
            "2",
        ]))
        .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Remote {
                url: "https://kv.example.com".to_string(),
                token: "secret".to_string(),
                list_key: "chat".to_string(),
                timeout: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn remote_store_timeout_defaults_to_client_default() {
        let config = Config::from_cli(cli(&[
            "--store",
            "remote",
            "--kv-url",
            "https://kv.example.com",
            "--kv-token",
            "secret",
        ]))
        .unwrap();
        assert!(matches!(
            config.store,
            StoreConfig::Remote { timeout, .. } if timeout == DEFAULT_TIMEOUT
        ));
    }

    #[test]
    fn remote_store_requires_url() {
        let err = Config::from_cli(cli(&["--store", "remote", "--kv-token", "secret"]));
        assert_eq!(err, Err(ConfigError::Missing("KV_REST_API_URL")));
    }

    #[test]
    fn remote_store_requires_token() {
        let err = Config::from_cli(cli(&[
            "--store",
            "remote",
            "--kv-url",
            "https://kv.example.com",
            "--kv-token",
            "  ",
        ]));
        assert_eq!(err, Err(ConfigError::Missing("KV_REST_API_TOKEN")));
    }

    #[test]
    fn remote_store_rejects_zero_timeout() {
        let err = Config::from_cli(cli(&[
            "--store",
            "remote",
            "--kv-url",
            "https://kv.example.com",
            "--kv-token",
            "secret",
            "--kv-timeout-secs",
            "0",
        ]));
        assert_eq!(err, Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn unknown_store_is_rejected() {
        let parsed = Cli::try_parse_from(["friend-chat", "--store", "postgres"]);
        assert!(parsed.is_err());
    }
}
