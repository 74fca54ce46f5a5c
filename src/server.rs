use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::{middleware, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthenticatedUser, MemorySessionStore, SessionProvider};
use crate::blob::{BlobStore, FsBlobStore};
use crate::config::Config;
use crate::db::{Database, MemoryDatabase};
use crate::error::Result;
use crate::handlers::{health, kanban, projects, public, tasks, upload, users};
use crate::middleware::logging_middleware;
use crate::rate_limiter::{Clock, MemoryRateLimitStore, RateLimitStore, SystemClock};
use crate::redis_store::RedisRateLimitStore;
use crate::state::AppState;

/// Wire the default collaborators: in-memory database and sessions, fs blob
/// store, and a rate-limit store picked by `REDIS_URL`.
pub fn build_state(config: Config) -> Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let limiter: Arc<dyn RateLimitStore> = if config.redis_url.is_empty() {
        Arc::new(MemoryRateLimitStore::new(clock.clone()))
    } else {
        Arc::new(RedisRateLimitStore::new(&config.redis_url, clock.clone())?)
    };

    let sessions = MemorySessionStore::new();
    if !config.dev_session_token.is_empty() {
        sessions.insert(
            config.dev_session_token.clone(),
            AuthenticatedUser {
                id: "dev-user".to_string(),
                name: Some("Dev".to_string()),
                email: None,
                image: None,
            },
        );
        tracing::warn!("DEV_SESSION_TOKEN is set; a development session is active");
    }

    let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
    let blobs: Arc<dyn BlobStore> =
        Arc::new(FsBlobStore::new(&config.upload_dir, &config.upload_base_url));
    let sessions: Arc<dyn SessionProvider> = Arc::new(sessions);

    Ok(AppState {
        db,
        blobs,
        sessions,
        limiter,
        clock,
        config: Arc::new(config),
    })
}

/// Build the router. Separate from `Server` so tests can drive it directly.
pub fn create_app(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            "/api/kanban",
            get(kanban::list_cards)
                .post(kanban::create_card)
                .patch(kanban::update_card)
                .delete(kanban::delete_card),
        )
        .route("/api/users", get(users::list_users).post(users::upsert_user))
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/api/public/:id", get(public::get_public_project))
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            state: build_state(config)?,
        })
    }

    pub async fn run(self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let addr = self.state.config.bind_addr;
        let app = create_app(self.state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Komnot API listening on {}", addr);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
