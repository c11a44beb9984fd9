//! Shared data types for the cleaning client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ============================================================================
// LOCAL FILE
// ============================================================================

/// A file picked by the user, read into memory before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name as shown to the user (no directory part).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name for display.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }

    /// Naive extension check: the name must literally end in `.csv`.
    ///
    /// Contents are not inspected.
    pub fn has_csv_name(&self) -> bool {
        self.name.ends_with(".csv")
    }
}

// ============================================================================
// UPLOADED FILE
// ============================================================================

/// A file the service accepted. At most one is live per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Opaque, server-assigned identifier.
    pub file_id: String,
    /// Display name.
    pub name: String,
    pub rows: u64,
    pub columns: u64,
    /// Size reported by the service, when it sends one.
    pub size_bytes: Option<u64>,
}

// ============================================================================
// PREVIEW ROWS
// ============================================================================

/// One record of preview data.
///
/// No schema is assumed: rows may carry any key set. Entries that are not
/// JSON objects (e.g. `null`) become [`PreviewRow::Missing`] and render as a
/// row of empty cells.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "Value", into = "Value")]
pub enum PreviewRow {
    /// Column name to value, in the order the service sent them.
    Record(Map<String, Value>),
    Missing,
}

impl PreviewRow {
    /// Iterate the row's keys in the order they were received.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let map = match self {
            Self::Record(map) => Some(map),
            Self::Missing => None,
        };
        map.into_iter().flat_map(|m| m.keys().map(String::as_str))
    }

    /// Look up a value. JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Record(map) => map.get(key).filter(|v| !v.is_null()),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Value> for PreviewRow {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Record(map),
            _ => Self::Missing,
        }
    }
}

impl From<PreviewRow> for Value {
    fn from(row: PreviewRow) -> Self {
        match row {
            PreviewRow::Record(map) => Value::Object(map),
            PreviewRow::Missing => Value::Null,
        }
    }
}

/// The `preview_data` payload.
///
/// Anything other than a JSON array is [`PreviewData::Malformed`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum PreviewData {
    Rows(Vec<PreviewRow>),
    #[default]
    Malformed,
}

impl PreviewData {
    /// Rows when the payload is a non-empty sequence.
    pub fn rows(&self) -> Option<&[PreviewRow]> {
        match self {
            Self::Rows(rows) if !rows.is_empty() => Some(rows),
            _ => None,
        }
    }
}

impl From<Value> for PreviewData {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Rows(items.into_iter().map(PreviewRow::from).collect()),
            _ => Self::Malformed,
        }
    }
}

impl From<Vec<PreviewRow>> for PreviewData {
    fn from(rows: Vec<PreviewRow>) -> Self {
        Self::Rows(rows)
    }
}

// ============================================================================
// CLEANING OPERATIONS
// ============================================================================

/// Which server-side cleaning operations to run.
///
/// `columns: None` serializes as `null`, meaning "all columns".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleaningOperations {
    pub remove_missing: bool,
    pub remove_duplicates: bool,
    pub columns: Option<Vec<String>>,
}

impl CleaningOperations {
    pub fn new(remove_missing: bool, remove_duplicates: bool) -> Self {
        Self {
            remove_missing,
            remove_duplicates,
            columns: None,
        }
    }

    /// Restrict the operations to a column subset. An empty list means all.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = if columns.is_empty() { None } else { Some(columns) };
        self
    }

    /// At least one flag must be set before a request is issued.
    pub fn has_any(&self) -> bool {
        self.remove_missing || self.remove_duplicates
    }
}

// ============================================================================
// PROCESSED ARTIFACT
// ============================================================================

/// Result of a successful processing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedArtifact {
    /// Opaque reference to the cleaned file (usually server-relative).
    pub download_url: String,
    pub message: Option<String>,
    pub file_id: Option<String>,
    pub filename: Option<String>,
    pub rows: Option<u64>,
    pub columns: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_name_check_is_naive() {
        assert!(FileUpload::new("data.csv", "not,really").has_csv_name());
        assert!(FileUpload::new("archive.tar.csv", vec![0u8, 1, 2]).has_csv_name());
        assert!(!FileUpload::new("data.CSV", "a,b").has_csv_name());
        assert!(!FileUpload::new("data.csv.txt", "a,b").has_csv_name());
        assert!(!FileUpload::new("csv", "a,b").has_csv_name());
    }

    #[test]
    fn test_preview_row_from_values() {
        let row = PreviewRow::from(json!({"b": 1, "a": null}));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(row.get("b"), Some(&json!(1)));
        assert_eq!(row.get("a"), None);
        assert_eq!(row.get("zzz"), None);

        assert!(PreviewRow::from(Value::Null).is_missing());
        assert!(PreviewRow::from(json!(42)).is_missing());
        assert_eq!(PreviewRow::Missing.keys().count(), 0);
    }

    #[test]
    fn test_preview_data_deserialization() {
        let data: PreviewData = serde_json::from_value(json!([{"a": 1}, null])).unwrap();
        let rows = data.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_missing());

        let data: PreviewData = serde_json::from_value(json!({"a": 1})).unwrap();
        assert_eq!(data, PreviewData::Malformed);

        let data: PreviewData = serde_json::from_value(json!([])).unwrap();
        assert!(data.rows().is_none());
    }

    #[test]
    fn test_operations_serialize_null_columns() {
        let ops = CleaningOperations::new(true, false);
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!({"remove_missing": true, "remove_duplicates": false, "columns": null})
        );
        assert!(ops.has_any());
        assert!(!CleaningOperations::default().has_any());
    }

    #[test]
    fn test_operations_with_columns() {
        let ops = CleaningOperations::new(false, true).with_columns(vec!["age".to_string()]);
        assert_eq!(ops.columns, Some(vec!["age".to_string()]));

        let ops = CleaningOperations::new(false, true).with_columns(Vec::new());
        assert_eq!(ops.columns, None);
    }
}
