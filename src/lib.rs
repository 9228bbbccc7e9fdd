//! A minimal chat message API.
//!
//! Messages are posted as `{user, text, timestamp?}`, given an id and a
//! timestamp, appended to a log and listed back in insertion order. The log
//! lives either in process memory or in a list of a hosted key-value store.
//!
//! - [`validation`]: turns a decoded request body into [`message_database::NewMessage`]s
//! - [`assign`]: id and timestamp assignment
//! - [`message_database`]: the [`message_database::MessageDatabase`] contract
//! - [`memory_store`], [`remote_store`]: the two backends
//! - [`kv_rest`]: the key-value REST client behind the remote backend
//! - [`handlers`]: the actix-web routes
//! - [`config`]: command-line and environment settings

pub mod assign;
pub mod config;
pub mod handlers;
pub mod kv_rest;
pub mod memory_store;
pub mod message_database;
pub mod remote_store;
pub mod validation;
