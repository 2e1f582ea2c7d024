//! Social API Library
//! Re-exports modules for the binary and the integration tests

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pubsub;
pub mod schema;
pub mod security;
pub mod seed;
pub mod server;
