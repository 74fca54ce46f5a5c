//! Shared application state.

use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::blob::BlobStore;
use crate::config::Config;
use crate::db::Database;
use crate::rate_limiter::{Clock, RateLimitStore};

/// Everything a handler needs, behind trait objects so each collaborator
/// can be substituted (tests use the in-memory set).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn Database>,
    pub blobs: Arc<dyn BlobStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub limiter: Arc<dyn RateLimitStore>,
    pub clock: Arc<dyn Clock>,
}
