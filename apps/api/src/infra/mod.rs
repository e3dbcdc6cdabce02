pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http_client;
pub mod identity_toolkit;
pub mod setup;
