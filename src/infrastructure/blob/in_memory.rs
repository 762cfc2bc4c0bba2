//! In-memory blob store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::blob::{
    BlobStore, BlobUpload, DEFAULT_THUMBNAIL_FILENAME, StoredBlob, stored_filename,
};

#[derive(Debug)]
struct StoredFile {
    blob: StoredBlob,
    bytes: Vec<u8>,
}

/// Blob store keeping files in memory and serving them under `base_url`
///
/// The default thumbnail is always present.
#[derive(Debug)]
pub struct InMemoryBlobStore {
    base_url: String,
    files: RwLock<HashMap<String, StoredFile>>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut files = HashMap::new();
        files.insert(
            DEFAULT_THUMBNAIL_FILENAME.to_string(),
            StoredFile {
                blob: StoredBlob {
                    filename: DEFAULT_THUMBNAIL_FILENAME.to_string(),
                    content_type: content_type_of(DEFAULT_THUMBNAIL_FILENAME),
                },
                bytes: Vec::new(),
            },
        );

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            files: RwLock::new(files),
        }
    }

    /// Size in bytes of a stored file
    pub fn size_of(&self, filename: &str) -> Option<usize> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(filename).map(|f| f.bytes.len()))
    }
}

fn content_type_of(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, upload: BlobUpload) -> Result<StoredBlob, DomainError> {
        if upload.name.trim().is_empty() {
            return Err(DomainError::validation("Upload name cannot be empty"));
        }

        let blob = StoredBlob {
            filename: stored_filename(Utc::now().timestamp_millis(), &upload.name),
            content_type: content_type_of(&upload.name),
        };

        let mut files = self.files.write().map_err(|e| {
            DomainError::blob(format!("Failed to acquire write lock: {}", e))
        })?;
        files.insert(
            blob.filename.clone(),
            StoredFile {
                blob: blob.clone(),
                bytes: upload.bytes,
            },
        );

        debug!(filename = %blob.filename, content_type = %blob.content_type, "Stored blob");
        Ok(blob)
    }

    async fn resolve(&self, filename: &str) -> Result<String, DomainError> {
        let files = self.files.read().map_err(|e| {
            DomainError::blob(format!("Failed to acquire read lock: {}", e))
        })?;

        match files.get(filename) {
            Some(file) => Ok(format!("{}/{}", self.base_url, file.blob.filename)),
            None => Err(DomainError::not_found(format!("Blob '{}' not found", filename))),
        }
    }
}
