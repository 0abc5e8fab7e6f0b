//! Avatar upload — constraint checks and the blob storage seam.
//!
//! Constraints are validated before any network or disk I/O; the actual
//! storage backend lives behind [`BlobStore`] and is supplied by the
//! host application.

use async_trait::async_trait;

use crate::error::UploadError;

/// Size and type limits for uploaded binaries.
#[derive(Debug, Clone)]
pub struct UploadConstraints {
    pub max_size_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_size_bytes: 5 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

impl UploadConstraints {
    /// Reject oversized or mistyped uploads. Runs before any I/O.
    pub fn check(&self, size: usize, mime: &str) -> Result<(), UploadError> {
        if size > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_size_bytes,
            });
        }
        if !self.allowed_mime_types.iter().any(|m| m == mime) {
            return Err(UploadError::UnsupportedType {
                mime: mime.to_string(),
            });
        }
        Ok(())
    }
}

/// External binary storage. Returns a URL for the stored blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store_blob(
        &self,
        user_id: &str,
        data: Vec<u8>,
        mime: &str,
    ) -> Result<String, UploadError>;
}
