//! Request guards.
//!
//! Composable pre-checks a request must pass before a handler touches the
//! store. Every failure is a prepared [`ApiError`] response, so handlers
//! bail with `?` and nothing escapes the boundary.

use axum::http::HeaderMap;

use crate::auth::AuthenticatedUser;
use crate::client_ip;
use crate::error::{ApiError, Result};
use crate::rate_limiter::{RateLimitQuota, RateLimitResult};
use crate::state::AppState;

/// Fail with 401 unless the session provider yields a principal with an id.
pub async fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser> {
    state
        .sessions
        .authenticate(headers)
        .await
        .filter(|user| !user.id.is_empty())
        .ok_or(ApiError::Unauthorized)
}

/// Count this request against `endpoint`'s quota for the resolved caller;
/// fail with 429 when the window is exhausted.
pub fn require_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    endpoint: &str,
    quota: &RateLimitQuota,
) -> Result<RateLimitResult> {
    let client = client_ip::resolve(headers);
    let key = format!("{}:{}", endpoint, client);
    let result = state.limiter.check(&key, quota)?;

    if result.success {
        Ok(result)
    } else {
        let now = state.clock.now_ms();
        let retry_after_secs = result.reset_ms.saturating_sub(now).div_ceil(1000).max(1);
        tracing::warn!(
            target: "komnot::guard",
            endpoint = %endpoint,
            client = %client,
            "rate limit exceeded"
        );
        Err(ApiError::RateLimited {
            limit: result.limit,
            reset_ms: result.reset_ms,
            retry_after_secs,
        })
    }
}

/// Auth first, rate limit second: anonymous probing must not consume the
/// window budget of authenticated callers. Short-circuits on the first
/// failure.
pub async fn require_auth_and_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    endpoint: &str,
    quota: &RateLimitQuota,
) -> Result<AuthenticatedUser> {
    let user = require_auth(state, headers).await?;
    require_rate_limit(state, headers, endpoint, quota)?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, MemorySessionStore};
    use crate::rate_limiter::{Clock, ManualClock, MemoryRateLimitStore};
    use crate::state::AppState;
    use axum::http::{header, HeaderValue};
    use std::sync::Arc;
    use std::time::Duration;

    const TOKEN: &str = "test-token";

    fn test_state() -> (AppState, Arc<MemoryRateLimitStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limiter = Arc::new(MemoryRateLimitStore::new(clock.clone()));
        let sessions = MemorySessionStore::new();
        sessions.insert(
            TOKEN,
            AuthenticatedUser {
                id: "user-1".to_string(),
                name: Some("Sokha".to_string()),
                email: None,
                image: None,
            },
        );
        let state = AppState {
            config: Arc::new(crate::config::Config::default()),
            db: Arc::new(crate::db::MemoryDatabase::new()),
            blobs: Arc::new(crate::blob::MemoryBlobStore::new()),
            sessions: Arc::new(sessions),
            limiter: limiter.clone(),
            clock: clock.clone(),
        };
        (state, limiter, clock)
    }

    fn authed_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", TOKEN)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn missing_session_fails_without_touching_the_limiter() {
        let (state, limiter, _) = test_state();
        let quota = RateLimitQuota {
            limit: 5,
            window: Duration::from_secs(60),
        };

        let result =
            require_auth_and_rate_limit(&state, &HeaderMap::new(), "projects:get", &quota).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn auth_then_rate_limit_passes_through() {
        let (state, limiter, _) = test_state();
        let quota = RateLimitQuota {
            limit: 2,
            window: Duration::from_secs(60),
        };
        let headers = authed_headers();

        let user = require_auth_and_rate_limit(&state, &headers, "tasks:post", &quota)
            .await
            .unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_quota_yields_rate_limited() {
        let (state, _, clock) = test_state();
        let quota = RateLimitQuota {
            limit: 1,
            window: Duration::from_secs(60),
        };
        let headers = authed_headers();

        require_auth_and_rate_limit(&state, &headers, "upload:post", &quota)
            .await
            .unwrap();
        let denied = require_auth_and_rate_limit(&state, &headers, "upload:post", &quota).await;

        match denied {
            Err(ApiError::RateLimited {
                limit,
                reset_ms,
                retry_after_secs,
            }) => {
                assert_eq!(limit, 1);
                assert!(reset_ms > clock.now_ms());
                assert!((1..=60).contains(&retry_after_secs));
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn different_clients_have_independent_budgets() {
        let (state, _, _) = test_state();
        let quota = RateLimitQuota {
            limit: 1,
            window: Duration::from_secs(60),
        };

        let mut first = authed_headers();
        first.insert("cf-connecting-ip", HeaderValue::from_static("1.1.1.1"));
        let mut second = authed_headers();
        second.insert("cf-connecting-ip", HeaderValue::from_static("2.2.2.2"));

        require_auth_and_rate_limit(&state, &first, "kanban:post", &quota)
            .await
            .unwrap();
        // Same client again: denied.
        assert!(
            require_auth_and_rate_limit(&state, &first, "kanban:post", &quota)
                .await
                .is_err()
        );
        // Different client: fresh budget.
        require_auth_and_rate_limit(&state, &second, "kanban:post", &quota)
            .await
            .unwrap();
    }
}
