//! Custom error types for the cleaning client.
//!
//! Errors fall into three families:
//!
//! - **Client-side validation** (wrong file type, nothing loaded, no operation
//!   chosen). These never reach the network.
//! - **Transport** (the request could not be sent, or the body was not JSON).
//!   These are shown with a generic message.
//! - **Server-reported** (`detail` / `message` payloads). These are shown
//!   verbatim.
//!
//! Errors are serializable so they can be forwarded to a frontend as
//! `{ "code": ..., "message": ... }`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::status::Severity;

/// Fallback shown when the service gives us nothing better to display.
pub const GENERIC_UPLOAD_FAILURE: &str = "An error occurred while uploading the file.";

/// Fallback shown when processing fails without a usable server message.
pub const GENERIC_PROCESS_FAILURE: &str = "An error occurred while processing the data.";

/// Shown for transport-level failures (connection refused, bad body, ...).
pub const GENERIC_TRANSPORT_FAILURE: &str = "Could not communicate with the server.";

/// The main error type for the cleaning client.
#[derive(Error, Debug)]
pub enum CleanerError {
    /// The selected file does not have a `.csv` name.
    #[error("Please upload a CSV file only ('{0}' is not a .csv file).")]
    InvalidFileType(String),

    /// A processing request was made before any file was uploaded.
    #[error("You must upload a file before processing.")]
    NoFileLoaded,

    /// Neither cleaning flag was selected.
    #[error("Please select at least one cleaning operation.")]
    NoOperationSelected,

    /// A file was chosen while another upload is still running.
    #[error("An upload is already in progress.")]
    UploadInProgress,

    /// A processing request is already running.
    #[error("Processing is already in progress.")]
    ProcessingInProgress,

    /// The service answered with an error payload.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The service answered 2xx but the payload breaks the success contract.
    #[error("{0}")]
    UnexpectedResponse(String),

    /// The response body could not be decoded.
    #[error("Malformed response from server: {0}")]
    MalformedResponse(String),

    /// HTTP request error.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be joined onto the service address.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),
}

impl CleanerError {
    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::NoFileLoaded => "NO_FILE_LOADED",
            Self::NoOperationSelected => "NO_OPERATION_SELECTED",
            Self::UploadInProgress => "UPLOAD_IN_PROGRESS",
            Self::ProcessingInProgress => "PROCESSING_IN_PROGRESS",
            Self::Server { .. } => "SERVER_ERROR",
            Self::UnexpectedResponse(_) => "UNEXPECTED_RESPONSE",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::Http(_) => "HTTP_REQUEST_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// Whether the error was detected locally, before any request was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::InvalidFileType(_)
                | Self::NoFileLoaded
                | Self::NoOperationSelected
                | Self::UploadInProgress
                | Self::ProcessingInProgress
        )
    }

    /// Whether the error comes from the transport rather than the service.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::MalformedResponse(_))
    }

    /// Severity used when the error is shown to the user.
    ///
    /// Missing preconditions are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            Self::NoFileLoaded
            | Self::NoOperationSelected
            | Self::UploadInProgress
            | Self::ProcessingInProgress => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The message shown to the user.
    ///
    /// Transport failures are normalised to a generic text; the underlying
    /// error is only logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::MalformedResponse(_) => GENERIC_TRANSPORT_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Serialize implementation for frontend consumption.
impl Serialize for CleanerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleanerError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.user_message())?;
        state.end()
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, CleanerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(CleanerError::NoFileLoaded.error_code(), "NO_FILE_LOADED");
        assert_eq!(
            CleanerError::InvalidFileType("data.txt".to_string()).error_code(),
            "INVALID_FILE_TYPE"
        );
        assert_eq!(
            CleanerError::Server {
                status: 404,
                message: "gone".to_string()
            }
            .error_code(),
            "SERVER_ERROR"
        );
    }

    #[test]
    fn test_client_side_classification() {
        assert!(CleanerError::NoOperationSelected.is_client_side());
        assert!(CleanerError::InvalidFileType("a.xlsx".to_string()).is_client_side());
        assert!(!CleanerError::UnexpectedResponse("x".to_string()).is_client_side());
        assert!(CleanerError::MalformedResponse("eof".to_string()).is_transport());
        assert!(!CleanerError::InvalidUrl(url::ParseError::EmptyHost).is_transport());
    }

    #[test]
    fn test_severity() {
        assert_eq!(CleanerError::NoFileLoaded.severity(), Severity::Warning);
        assert_eq!(CleanerError::NoOperationSelected.severity(), Severity::Warning);
        assert_eq!(
            CleanerError::InvalidFileType("a.txt".to_string()).severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_server_message_is_verbatim() {
        let error = CleanerError::Server {
            status: 422,
            message: "body.file_id field required".to_string(),
        };
        assert_eq!(error.user_message(), "body.file_id field required");
    }

    #[test]
    fn test_transport_message_is_generic() {
        let error = CleanerError::MalformedResponse("expected value at line 1".to_string());
        assert_eq!(error.user_message(), GENERIC_TRANSPORT_FAILURE);
    }

    #[test]
    fn test_error_serialization() {
        let error = CleanerError::InvalidFileType("notes.txt".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INVALID_FILE_TYPE"));
        assert!(json.contains("notes.txt"));
    }
}
