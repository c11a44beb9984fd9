//! Boundary to the remote cleaning service.
//!
//! The service is reached through the [`CleaningService`] trait so the
//! session can run against the real HTTP API or an in-memory fake.
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | POST | `/api/upload` | multipart, field `file` |
//! | POST | `/api/process` | JSON `{file_id, operations, scheme, credentials}` |
//! | GET | download URL from `/api/process` | none |
//!
//! Transports return the raw status and body ([`HttpReply`]); turning those
//! into domain values or error messages is done by the decoders in
//! [`responses`], which are shared by every transport.

mod http;
pub mod responses;

pub use http::HttpCleaningService;
pub use responses::{ErrorDetail, ErrorEnvelope, ValidationIssue, decode_process, decode_upload};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CleaningOperations, FileUpload};

/// Path of the upload endpoint.
pub const UPLOAD_PATH: &str = "/api/upload";

/// Path of the processing endpoint.
pub const PROCESS_PATH: &str = "/api/process";

/// Raw status code and body of a service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A downloaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Name suggested by the service (`Content-Disposition`), if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Transport to the cleaning service.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a session can be moved across
/// tasks.
///
/// # Errors
///
/// `upload` and `process` only fail when no response was received at all;
/// any HTTP status is returned as an [`HttpReply`] for the decoders.
#[async_trait]
pub trait CleaningService: Send + Sync {
    /// Send the file as multipart form data.
    async fn upload(&self, file: &FileUpload) -> Result<HttpReply>;

    /// Ask the service to clean a previously uploaded file.
    async fn process(&self, file_id: &str, operations: &CleaningOperations) -> Result<HttpReply>;

    /// Fetch a cleaned file by the URL returned from [`CleaningService::process`].
    async fn download(&self, url: &str) -> Result<DownloadedFile>;

    /// Turn a possibly server-relative URL into an absolute one.
    fn resolve_url(&self, url: &str) -> Result<String> {
        Ok(url.to_string())
    }

    /// Name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        assert!(HttpReply::new(200, "{}").is_success());
        assert!(HttpReply::new(204, "").is_success());
        assert!(!HttpReply::new(199, "").is_success());
        assert!(!HttpReply::new(300, "").is_success());
        assert!(!HttpReply::new(422, "{}").is_success());
    }
}
