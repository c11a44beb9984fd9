//! Preview table rendering.
//!
//! Turns loosely-typed preview rows into a rectangular table. Rows do not
//! share a schema, so the header list is the ordered union of every key seen
//! across all rows, and each row gets exactly one cell per header.
//!
//! ```text
//! rows:    {a:1, b:2}   {a:3, c:4}   null
//! headers: a | b | c
//! cells:   1 | 2 |
//!          3 |   | 4
//!            |   |
//! ```

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DEFAULT_PREVIEW_CELL_LIMIT;
use crate::status::StatusMessage;
use crate::types::{PreviewData, PreviewRow};

/// Appended to truncated cell text.
pub const ELLIPSIS: &str = "...";

/// Shown when the payload is empty or not a sequence.
pub const NO_PREVIEW_DATA: &str = "No valid preview data found.";

/// Shown when no row contributes a single column.
pub const NO_COLUMNS_DETECTED: &str = "No column headers detected in the data.";

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Text as displayed, possibly truncated.
    pub display: String,
    /// The untruncated text, present only when `display` was truncated.
    pub full_value: Option<String>,
}

impl Cell {
    fn new(text: String, limit: usize) -> Self {
        match truncate_chars(&text, limit) {
            Some(short) => Self {
                display: short,
                full_value: Some(text),
            },
            None => Self {
                display: text,
                full_value: None,
            },
        }
    }

    /// The complete value regardless of truncation.
    pub fn full_text(&self) -> &str {
        self.full_value.as_deref().unwrap_or(&self.display)
    }

    pub fn is_truncated(&self) -> bool {
        self.full_value.is_some()
    }
}

/// A rectangular preview table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    /// One entry per input row, each exactly `headers.len()` long.
    pub rows: Vec<Vec<Cell>>,
}

impl PreviewTable {
    /// Look up a cell by row index and header name.
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render as aligned plain text for a terminal.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.display.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, self.headers.iter().map(String::as_str), &widths);
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, separator.iter().map(String::as_str), &widths);
        for row in &self.rows {
            push_line(&mut out, row.iter().map(|c| c.display.as_str()), &widths);
        }
        out
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(text, width)| format!("{:<width$}", text, width = *width))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}

/// Outcome of a render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A table is now displayed.
    Rendered { columns: usize, rows: usize },
    /// Empty or malformed input; the table is hidden.
    NoData,
    /// Rows were present but carried no keys; the table is hidden.
    NoColumns,
}

impl RenderOutcome {
    /// Status message to surface, if any.
    pub fn status(&self) -> Option<StatusMessage> {
        match self {
            Self::Rendered { .. } => None,
            Self::NoData => Some(StatusMessage::warning(NO_PREVIEW_DATA)),
            Self::NoColumns => Some(StatusMessage::error(NO_COLUMNS_DETECTED)),
        }
    }
}

/// Owns the currently displayed preview table.
#[derive(Debug, Clone)]
pub struct TablePreviewRenderer {
    cell_limit: usize,
    table: Option<PreviewTable>,
}

impl Default for TablePreviewRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CELL_LIMIT)
    }
}

impl TablePreviewRenderer {
    pub fn new(cell_limit: usize) -> Self {
        Self {
            cell_limit,
            table: None,
        }
    }

    /// Replace the displayed table with one built from `data`.
    ///
    /// Never fails: empty input and key-less rows hide the table and report
    /// the condition through the returned outcome.
    pub fn render(&mut self, data: &PreviewData) -> RenderOutcome {
        let Some(rows) = data.rows() else {
            debug!("preview payload empty or not a sequence");
            self.table = None;
            return RenderOutcome::NoData;
        };

        match build_table(rows, self.cell_limit) {
            Some(table) => {
                let outcome = RenderOutcome::Rendered {
                    columns: table.headers.len(),
                    rows: table.rows.len(),
                };
                debug!(?outcome, "preview rendered");
                self.table = Some(table);
                outcome
            }
            None => {
                self.table = None;
                RenderOutcome::NoColumns
            }
        }
    }

    /// Hide and empty the table.
    pub fn clear(&mut self) {
        self.table = None;
    }

    /// The displayed table, if visible.
    pub fn table(&self) -> Option<&PreviewTable> {
        self.table.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.table.is_some()
    }
}

/// Build a table from rows, or `None` when the key union is empty.
pub fn build_table(rows: &[PreviewRow], cell_limit: usize) -> Option<PreviewTable> {
    let headers = column_union(rows);
    if headers.is_empty() {
        return None;
    }

    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| {
                    let text = row.get(header).map(display_value).unwrap_or_default();
                    Cell::new(text, cell_limit)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Some(PreviewTable {
        headers: headers.into_iter().collect(),
        rows,
    })
}

/// Ordered union of keys across all rows, first-seen order.
pub fn column_union(rows: &[PreviewRow]) -> IndexSet<String> {
    let mut headers = IndexSet::new();
    for key in rows.iter().flat_map(PreviewRow::keys) {
        if !headers.contains(key) {
            headers.insert(key.to_string());
        }
    }
    headers
}

/// Convert a JSON scalar to its display text.
///
/// Integral floats lose their fractional part (`3.0` shows as `3`); nested
/// arrays and objects are shown as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        return format!("{}", f as i64);
                    }
                }
            }
            n.to_string()
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// First `limit` characters plus an ellipsis, or `None` if it already fits.
fn truncate_chars(text: &str, limit: usize) -> Option<String> {
    let (cut, _) = text.char_indices().nth(limit)?;
    Some(format!("{}{}", &text[..cut], ELLIPSIS))
}
