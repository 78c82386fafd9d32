pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod filters;
pub mod services;

#[cfg(feature = "graphql")]
pub mod graphql;

#[cfg(feature = "server")]
pub mod server;
