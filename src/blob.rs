//! Blob storage boundary for uploads.
//!
//! The product stores uploads in an external blob service; this trait keeps
//! that collaborator swappable. The filesystem store is the standalone
//! default, the memory store backs the tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::validation::sanitize_filename;

/// Metadata returned to the client after an upload.
#[derive(Debug, Clone, Serialize)]
pub struct BlobMeta {
    pub url: String,
    pub pathname: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, owner_id: &str, filename: &str, data: Bytes) -> Result<BlobMeta>;
}

/// Content type served back for an uploaded file, from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn build_meta(url: String, pathname: String, filename: &str, size: u64) -> BlobMeta {
    BlobMeta {
        url,
        pathname,
        content_type: content_type_for(filename).to_string(),
        size,
        uploaded_at: Utc::now(),
    }
}

pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, owner_id: &str, filename: &str, data: Bytes) -> Result<BlobMeta> {
        let safe = sanitize_filename(filename);
        // Random prefix so repeated uploads of the same name never collide.
        let unique = format!("{}-{}", Uuid::new_v4(), safe);
        let pathname = format!("{}/{}", owner_id, unique);

        let dir = self.root.join(owner_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&unique);
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::info!(
            target: "komnot::blob",
            pathname = %pathname,
            size = data.len(),
            "stored upload"
        );

        let url = format!("{}/{}", self.public_base.trim_end_matches('/'), pathname);
        Ok(build_meta(url, pathname, &safe, data.len() as u64))
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, pathname: &str) -> bool {
        self.blobs.read().await.contains_key(pathname)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, owner_id: &str, filename: &str, data: Bytes) -> Result<BlobMeta> {
        let safe = sanitize_filename(filename);
        let unique = format!("{}-{}", Uuid::new_v4(), safe);
        let pathname = format!("{}/{}", owner_id, unique);
        let size = data.len() as u64;
        self.blobs.write().await.insert(pathname.clone(), data);
        let url = format!("memory://{}", pathname);
        Ok(build_meta(url, pathname, &safe, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_from_extension() {
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("doc.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn fs_store_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost/uploads");

        let meta = store
            .put("user-1", "note.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(meta.size, 5);
        assert_eq!(meta.content_type, "text/plain");
        assert!(meta.url.starts_with("http://localhost/uploads/user-1/"));
        assert!(meta.pathname.ends_with("-note.txt"));

        let on_disk = dir.path().join(&meta.pathname);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn uploads_with_same_name_get_distinct_paths() {
        let store = MemoryBlobStore::new();
        let a = store
            .put("u", "a.png", Bytes::from_static(b"1"))
            .await
            .unwrap();
        let b = store
            .put("u", "a.png", Bytes::from_static(b"2"))
            .await
            .unwrap();
        assert_ne!(a.pathname, b.pathname);
        assert!(store.contains(&a.pathname).await);
        assert!(store.contains(&b.pathname).await);
    }
}
