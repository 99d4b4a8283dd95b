pub mod app;
pub mod config;
pub mod error;
pub mod ga;
pub mod routes;
pub mod state;
