//! Blob storage for document media attachments.
//!
//! Uploading is handled elsewhere; this layer only needs to resolve and
//! remove the blobs behind attachment rows when a document is purged.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Storage backend for attachment blobs.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Delete a blob. Missing blobs are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalStorage {
    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        tokio::fs::try_exists(self.base_path.join(key))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Generate a storage key for an attachment of a document.
#[must_use]
pub fn generate_storage_key(document_id: &str, original_name: &str) -> String {
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(char::is_alphanumeric))
        .unwrap_or("bin");

    format!("documents/{document_id}/{}.{extension}", uuid::Uuid::new_v4())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("doc123", "diagram.png");
        assert!(key.starts_with("documents/doc123/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("doc123", "README");
        assert!(key.ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_local_delete_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("marknest-media-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(dir.join("documents")).await.unwrap();
        tokio::fs::write(dir.join("documents/a.txt"), b"hello")
            .await
            .unwrap();

        let storage = LocalStorage::new(dir.clone(), "/media/".to_string());
        assert!(storage.exists("documents/a.txt").await.unwrap());

        storage.delete("documents/a.txt").await.unwrap();
        assert!(!storage.exists("documents/a.txt").await.unwrap());

        // Second delete of a missing blob succeeds.
        storage.delete("documents/a.txt").await.unwrap();
        assert_eq!(storage.public_url("x.png"), "/media/x.png");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
