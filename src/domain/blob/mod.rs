//! Blob store domain - uploaded files such as thumbnails

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// Thumbnail assigned to events and trainings created without one
pub const DEFAULT_THUMBNAIL_FILENAME: &str = "default-thumbnail.png";

/// File to upload
#[derive(Debug, Clone, PartialEq)]
pub struct BlobUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl BlobUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Uploaded file as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Stored name, `<millis>-<original name>`
    pub filename: String,
    pub content_type: String,
}

/// Object storage for uploaded files
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, upload: BlobUpload) -> Result<StoredBlob, DomainError>;

    /// Public URL of a stored file
    async fn resolve(&self, filename: &str) -> Result<String, DomainError>;
}

/// Stored filename for an upload made at `millis`
pub fn stored_filename(millis: i64, name: &str) -> String {
    format!("{}-{}", millis, name)
}

/// Original name of a stored file, without the upload prefix
pub fn display_name(filename: &str) -> &str {
    match filename.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => filename,
    }
}
