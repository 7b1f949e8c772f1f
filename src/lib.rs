pub mod config;
pub mod error;
pub mod geo;
pub mod jobs;
pub mod middleware_impls;
pub mod models;
pub mod registry;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod validate;
