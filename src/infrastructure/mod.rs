//! Infrastructure layer: SQLite schema and connection, JWT and password
//! handling, environment configuration, SeaORM repositories, the axum
//! server and demo seeding.

pub mod auth;
pub mod config;
pub mod db;
pub mod repositories;
pub mod seed;
pub mod server;
pub mod state;

pub use repositories::*;
pub use state::AppState;
