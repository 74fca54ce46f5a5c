pub mod auth;
pub mod blob;
pub mod client_ip;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod redis_store;
pub mod response;
pub mod server;
pub mod state;
pub mod validation;

pub use config::Config;
pub use error::{ApiError, Result};
pub use server::{build_state, create_app, Server};
pub use state::AppState;
