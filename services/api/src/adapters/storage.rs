//! services/api/src/adapters/storage.rs
//!
//! A `FileStorageService` that writes uploads to a local directory which the
//! HTTP layer serves under `/uploads`.

use async_trait::async_trait;
use bytes::Bytes;
use job_board_core::domain::Resume;
use job_board_core::ports::{FileStorageService, PortError, PortResult};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn public_url(&self, public_id: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, public_id)
    }
}

/// Keeps the original extension (lowercased) when it is a plain one.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Public ids are single file names; anything that could escape the root is refused.
fn is_safe_public_id(public_id: &str) -> bool {
    !public_id.is_empty()
        && public_id != "."
        && public_id != ".."
        && !public_id.contains(|c: char| c == '/' || c == '\\')
}

#[async_trait]
impl FileStorageService for LocalFileStorage {
    async fn upload(&self, file_name: &str, data: Bytes) -> PortResult<Resume> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to create upload dir: {e}")))?;

        let public_id = format!("{}{}", Uuid::new_v4(), extension_of(file_name));
        tokio::fs::write(self.root.join(&public_id), &data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to store upload: {e}")))?;

        info!("Stored upload {} ({} bytes)", public_id, data.len());
        Ok(Resume {
            url: self.public_url(&public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> PortResult<()> {
        if !is_safe_public_id(public_id) {
            return Err(PortError::Unexpected(format!(
                "Refusing to delete '{public_id}'"
            )));
        }
        match tokio::fs::remove_file(self.root.join(public_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!("Failed to delete upload: {e}"))),
        }
    }
}
