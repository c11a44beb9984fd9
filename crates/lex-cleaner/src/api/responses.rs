//! Decoding of service responses.
//!
//! Success payloads become [`UploadedFile`] / [`ProcessedArtifact`]; failure
//! payloads go through [`ErrorEnvelope`]. Each envelope field is read on its
//! own, so one odd field never hides the others. `detail` is matched as a
//! tagged variant:
//!
//! 1. a list of validation issues → `"<loc.joined('.')> <msg>"`, `"; "`-joined
//! 2. a string → used directly
//! 3. otherwise the `message` field
//! 4. otherwise a generic fallback chosen by the caller

use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::HttpReply;
use crate::error::{CleanerError, GENERIC_PROCESS_FAILURE, GENERIC_UPLOAD_FAILURE, Result};
use crate::preview::display_value;
use crate::types::{PreviewData, ProcessedArtifact, UploadedFile};

/// The `status` value of a successful response.
const STATUS_SUCCESS: &str = "success";

/// Used when a 2xx body does not follow the success contract.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response received from the server.";

/// Message used for a validation issue without `msg`.
const DEFAULT_ISSUE_MESSAGE: &str = "Validation error";

// ============================================================================
// ERROR ENVELOPE
// ============================================================================

/// One structured validation error (`{loc: [...], msg: ...}`).
///
/// Items of any other shape read as an issue with neither field.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub struct ValidationIssue {
    /// Path to the offending field. Segments may be strings or indices.
    pub loc: Option<Vec<Value>>,
    /// Usually a string; other JSON values are rendered as preview cells are.
    pub msg: Option<Value>,
}

impl From<Value> for ValidationIssue {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let loc = match map.remove("loc") {
            Some(Value::Array(segments)) => Some(segments),
            _ => None,
        };
        let msg = map.remove("msg").filter(|msg| !msg.is_null());
        Self { loc, msg }
    }
}

impl ValidationIssue {
    /// `"body.file_id field required"`, or just the message without `loc`.
    pub fn describe(&self) -> String {
        let msg = self
            .msg
            .as_ref()
            .map(display_value)
            .unwrap_or_else(|| DEFAULT_ISSUE_MESSAGE.to_string());
        let path = self
            .loc
            .as_deref()
            .map(|segments| segments.iter().map(display_value).collect::<Vec<_>>().join("."))
            .unwrap_or_default();

        if path.is_empty() {
            msg
        } else {
            format!("{path} {msg}")
        }
    }
}

/// The shape of `detail`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ErrorDetail {
    Issues(Vec<ValidationIssue>),
    Text(String),
    Other(Value),
}

impl From<Value> for ErrorDetail {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Issues(items.into_iter().map(ValidationIssue::from).collect()),
            Value::String(text) => Self::Text(text),
            other => Self::Other(other),
        }
    }
}

/// Error body returned by the service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorEnvelope {
    pub status: Option<String>,
    pub detail: Option<ErrorDetail>,
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Read an envelope from a JSON value, field by field.
    ///
    /// Non-string `status`/`message` values are dropped; anything that is not
    /// an object gives an empty envelope.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            debug!("error body is not a JSON object");
            return Self::default();
        }
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            status: text("status"),
            detail: value
                .get("detail")
                .filter(|detail| !detail.is_null())
                .cloned()
                .map(ErrorDetail::from),
            message: text("message"),
        }
    }

    /// The message to show, by priority; `None` when nothing usable is present.
    pub fn describe(&self) -> Option<String> {
        let from_detail = match &self.detail {
            Some(ErrorDetail::Issues(issues)) if !issues.is_empty() => Some(
                issues
                    .iter()
                    .map(ValidationIssue::describe)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Some(ErrorDetail::Text(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        };

        from_detail.or_else(|| self.message.clone().filter(|m| !m.is_empty()))
    }
}

// ============================================================================
// SUCCESS PAYLOADS
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    size: Option<Number>,
    #[serde(default)]
    rows: Option<Number>,
    #[serde(default)]
    columns: Option<Number>,
    #[serde(default)]
    preview_data: PreviewData,
}

#[derive(Debug, Deserialize)]
struct ProcessBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    rows: Option<Number>,
    #[serde(default)]
    columns: Option<Number>,
}

/// Read a count from any JSON number; `10.0` is 10, negative values are dropped.
fn count(number: Option<&Number>) -> Option<u64> {
    let number = number?;
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.trunc() as u64)
    })
}

/// A 2xx body whose fields have the wrong types.
fn schema_mismatch(err: serde_json::Error) -> CleanerError {
    warn!("success body does not match the expected shape: {}", err);
    CleanerError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string())
}

fn parse_json(reply: &HttpReply) -> Result<Value> {
    serde_json::from_str(&reply.body).map_err(|e| {
        warn!(status = reply.status, "response body is not JSON: {}", e);
        CleanerError::MalformedResponse(e.to_string())
    })
}

fn server_error(reply: &HttpReply, value: &Value, fallback: &str) -> CleanerError {
    let message = ErrorEnvelope::from_value(value)
        .describe()
        .unwrap_or_else(|| fallback.to_string());
    warn!(status = reply.status, %message, "service reported an error");
    CleanerError::Server {
        status: reply.status,
        message,
    }
}

fn unexpected(value: &Value) -> CleanerError {
    let message = ErrorEnvelope::from_value(value)
        .describe()
        .unwrap_or_else(|| UNEXPECTED_RESPONSE.to_string());
    CleanerError::UnexpectedResponse(message)
}

/// Decode an upload reply.
///
/// `local_name` is used as the display name when the service does not echo
/// one back.
pub fn decode_upload(reply: &HttpReply, local_name: &str) -> Result<(UploadedFile, PreviewData)> {
    let value = parse_json(reply)?;
    if !reply.is_success() {
        return Err(server_error(reply, &value, GENERIC_UPLOAD_FAILURE));
    }

    let body = UploadBody::deserialize(&value).map_err(schema_mismatch)?;

    if body.status.as_deref() != Some(STATUS_SUCCESS) {
        return Err(unexpected(&value));
    }

    let file_id = body
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            CleanerError::UnexpectedResponse("Server response did not include a file id.".to_string())
        })?;

    let file = UploadedFile {
        file_id,
        name: body.filename.unwrap_or_else(|| local_name.to_string()),
        rows: count(body.rows.as_ref()).unwrap_or(0),
        columns: count(body.columns.as_ref()).unwrap_or(0),
        size_bytes: count(body.size.as_ref()),
    };

    Ok((file, body.preview_data))
}

/// Decode a processing reply.
///
/// A `"success"` status without a non-empty `download_url` is a failure. The
/// URL is kept as sent.
pub fn decode_process(reply: &HttpReply) -> Result<ProcessedArtifact> {
    let value = parse_json(reply)?;
    if !reply.is_success() {
        return Err(server_error(reply, &value, GENERIC_PROCESS_FAILURE));
    }

    let body = ProcessBody::deserialize(&value).map_err(schema_mismatch)?;

    if body.status.as_deref() != Some(STATUS_SUCCESS) {
        return Err(unexpected(&value));
    }

    let download_url = body
        .download_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            CleanerError::UnexpectedResponse(
                "Server response did not include a download URL.".to_string(),
            )
        })?;

    Ok(ProcessedArtifact {
        download_url,
        message: body.message,
        file_id: body.file_id,
        filename: body.filename,
        rows: count(body.rows.as_ref()),
        columns: count(body.columns.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reply(status: u16, body: Value) -> HttpReply {
        HttpReply::new(status, body.to_string())
    }

    // -------------------------------------------------------------------------
    // Envelope decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_detail_issue_list_is_joined() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "detail": [{"loc": ["body", "file_id"], "msg": "field required"}]
        }));
        assert_eq!(envelope.describe().as_deref(), Some("body.file_id field required"));
    }

    #[test]
    fn test_multiple_issues_are_semicolon_separated() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "detail": [
                {"loc": ["body", "operations", 0], "msg": "bad value"},
                {"msg": "no location"}
            ]
        }));
        assert_eq!(
            envelope.describe().as_deref(),
            Some("body.operations.0 bad value; no location")
        );
    }

    #[test]
    fn test_detail_string_wins_over_message() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "status": "error",
            "detail": "File not found. Please upload again.",
            "message": "ignored"
        }));
        assert_eq!(
            envelope.describe().as_deref(),
            Some("File not found. Please upload again.")
        );
    }

    #[test]
    fn test_message_used_when_detail_unusable() {
        let envelope = ErrorEnvelope::from_value(&json!({"detail": {"x": 1}, "message": "boom"}));
        assert_eq!(envelope.describe().as_deref(), Some("boom"));

        let envelope = ErrorEnvelope::from_value(&json!({"message": "only message"}));
        assert_eq!(envelope.describe().as_deref(), Some("only message"));
    }

    #[test]
    fn test_nothing_usable() {
        assert_eq!(ErrorEnvelope::from_value(&json!({})).describe(), None);
        assert_eq!(ErrorEnvelope::from_value(&json!({"detail": []})).describe(), None);
        assert_eq!(ErrorEnvelope::from_value(&json!([1, 2])).describe(), None);
        assert_eq!(ErrorEnvelope::from_value(&json!({"message": 5})).describe(), None);
    }

    #[test]
    fn test_numeric_status_keeps_detail() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "status": 404,
            "detail": "File not found. Please upload again."
        }));
        assert_eq!(envelope.status, None);
        assert_eq!(
            envelope.describe().as_deref(),
            Some("File not found. Please upload again.")
        );
    }

    #[test]
    fn test_object_message_keeps_detail() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "detail": "Empty or invalid CSV file.",
            "message": {"code": 7}
        }));
        assert_eq!(envelope.message, None);
        assert_eq!(envelope.describe().as_deref(), Some("Empty or invalid CSV file."));
    }

    #[test]
    fn test_non_string_issue_message_is_rendered() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "detail": [
                {"loc": ["body", "file_id"], "msg": "field required"},
                {"loc": ["x"], "msg": 5}
            ]
        }));
        assert_eq!(
            envelope.describe().as_deref(),
            Some("body.file_id field required; x 5")
        );
    }

    #[test]
    fn test_odd_issue_items_do_not_hide_the_rest() {
        let envelope = ErrorEnvelope::from_value(&json!({
            "detail": ["oops", {"loc": "body", "msg": "bad"}, {"msg": null}]
        }));
        assert_eq!(
            envelope.describe().as_deref(),
            Some("Validation error; bad; Validation error")
        );
    }

    #[test]
    fn test_detail_deserializes_from_any_value() {
        let detail: ErrorDetail = serde_json::from_value(json!([{"msg": 1.5}])).unwrap();
        assert_eq!(
            detail,
            ErrorDetail::Issues(vec![ValidationIssue {
                loc: None,
                msg: Some(json!(1.5)),
            }])
        );

        let detail: ErrorDetail = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(detail, ErrorDetail::Other(json!(42)));
    }

    // -------------------------------------------------------------------------
    // Upload replies
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_upload_success() {
        let (file, preview) = decode_upload(
            &reply(
                200,
                json!({
                    "status": "success",
                    "file_id": "abc",
                    "rows": 10,
                    "columns": 3,
                    "preview_data": [{"a": 1, "b": 2}, {"a": 3, "c": 4}]
                }),
            ),
            "data.csv",
        )
        .unwrap();

        assert_eq!(file.file_id, "abc");
        assert_eq!(file.name, "data.csv");
        assert_eq!((file.rows, file.columns), (10, 3));
        assert_eq!(preview.rows().unwrap().len(), 2);
    }

    #[test]
    fn test_decode_upload_uses_server_filename_and_size() {
        let (file, _) = decode_upload(
            &reply(
                200,
                json!({
                    "status": "success", "file_id": "abc", "filename": "server.csv",
                    "size": 2048, "rows": 1, "columns": 1, "preview_data": []
                }),
            ),
            "local.csv",
        )
        .unwrap();
        assert_eq!(file.name, "server.csv");
        assert_eq!(file.size_bytes, Some(2048));
    }

    #[test]
    fn test_decode_upload_accepts_float_counts() {
        let (file, _) = decode_upload(
            &reply(
                200,
                json!({
                    "status": "success", "file_id": "abc", "size": 2048.0,
                    "rows": 10.0, "columns": 3, "preview_data": []
                }),
            ),
            "data.csv",
        )
        .unwrap();
        assert_eq!((file.rows, file.columns), (10, 3));
        assert_eq!(file.size_bytes, Some(2048));
    }

    #[test]
    fn test_decode_upload_negative_count_defaults() {
        let (file, _) = decode_upload(
            &reply(200, json!({"status": "success", "file_id": "abc", "rows": -1})),
            "data.csv",
        )
        .unwrap();
        assert_eq!(file.rows, 0);
    }

    #[test]
    fn test_decode_upload_wrong_field_type_is_unexpected() {
        let err = decode_upload(
            &reply(200, json!({"status": "success", "file_id": "abc", "rows": "ten"})),
            "data.csv",
        )
        .unwrap_err();
        assert!(matches!(err, CleanerError::UnexpectedResponse(ref m) if m == UNEXPECTED_RESPONSE));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_decode_upload_http_error_prefers_detail() {
        let err = decode_upload(
            &reply(400, json!({"status": "error", "detail": "Empty or invalid CSV file."})),
            "data.csv",
        )
        .unwrap_err();

        assert!(matches!(err, CleanerError::Server { status: 400, .. }));
        assert_eq!(err.user_message(), "Empty or invalid CSV file.");
    }

    #[test]
    fn test_decode_upload_http_error_generic_fallback() {
        let err = decode_upload(&reply(500, json!({})), "data.csv").unwrap_err();
        assert_eq!(err.user_message(), GENERIC_UPLOAD_FAILURE);
    }

    #[test]
    fn test_decode_upload_non_success_status() {
        let err = decode_upload(
            &reply(200, json!({"status": "pending", "message": "try later"})),
            "data.csv",
        )
        .unwrap_err();
        assert!(matches!(err, CleanerError::UnexpectedResponse(ref m) if m == "try later"));

        let err = decode_upload(&reply(200, json!({"file_id": "x"})), "data.csv").unwrap_err();
        assert_eq!(err.user_message(), UNEXPECTED_RESPONSE);
    }

    #[test]
    fn test_decode_upload_missing_file_id() {
        let err = decode_upload(&reply(200, json!({"status": "success"})), "data.csv").unwrap_err();
        assert!(matches!(err, CleanerError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_decode_upload_malformed_body() {
        let err = decode_upload(&HttpReply::new(502, "<html>Bad Gateway</html>"), "data.csv")
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    }

    // -------------------------------------------------------------------------
    // Process replies
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_process_success() {
        let artifact = decode_process(&reply(
            200,
            json!({
                "status": "success",
                "file_id": "new",
                "rows": 8,
                "columns": 3,
                "message": "Data cleaned.",
                "download_url": "/api/download/new"
            }),
        ))
        .unwrap();

        assert_eq!(artifact.download_url, "/api/download/new");
        assert_eq!(artifact.message.as_deref(), Some("Data cleaned."));
        assert_eq!(artifact.rows, Some(8));
    }

    #[test]
    fn test_decode_process_keeps_url_as_sent() {
        let artifact = decode_process(&reply(
            200,
            json!({"status": "success", "download_url": " ", "rows": 8.0}),
        ))
        .unwrap();
        assert_eq!(artifact.download_url, " ");
        assert_eq!(artifact.rows, Some(8));
    }

    #[test]
    fn test_decode_process_validation_failure() {
        let err = decode_process(&reply(
            422,
            json!({"detail": [{"loc": ["body", "file_id"], "msg": "field required"}]}),
        ))
        .unwrap_err();
        assert_eq!(err.user_message(), "body.file_id field required");
    }

    #[test]
    fn test_decode_process_success_without_url_is_failure() {
        let err = decode_process(&reply(200, json!({"status": "success"}))).unwrap_err();
        assert!(matches!(err, CleanerError::UnexpectedResponse(_)));

        let err =
            decode_process(&reply(200, json!({"status": "success", "download_url": ""}))).unwrap_err();
        assert!(matches!(err, CleanerError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_decode_process_generic_fallback() {
        let err = decode_process(&reply(500, json!({"status": "error"}))).unwrap_err();
        assert_eq!(err.user_message(), GENERIC_PROCESS_FAILURE);
    }
}
