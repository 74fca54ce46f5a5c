//! Session resolution.
//!
//! The identity provider is an external collaborator; the guard only needs
//! something that turns request headers into a principal.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// The authenticated principal attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve the request to a principal, or `None` when no valid session
    /// is present.
    async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedUser>;
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Token-to-user map. Serves standalone deployments and tests; production
/// substitutes a provider backed by the real identity service.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, AuthenticatedUser>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, user: AuthenticatedUser) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(token.into(), user);
        }
    }
}

#[async_trait]
impl SessionProvider for MemorySessionStore {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        let token = bearer_token(headers)?;
        self.sessions.read().ok()?.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            id: id.to_string(),
            name: None,
            email: None,
            image: None,
        }
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn memory_store_resolves_known_token() {
        let store = MemorySessionStore::new();
        store.insert("tok-1", user("u1"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-1"),
        );
        let resolved = store.authenticate(&headers).await.unwrap();
        assert_eq!(resolved.id, "u1");

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-2"),
        );
        assert!(store.authenticate(&headers).await.is_none());
    }
}
