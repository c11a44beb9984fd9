//! Single-slot status line shown to the user.
//!
//! Only one message is visible at a time: every [`StatusNotifier::show`]
//! call overwrites whatever was there before.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    /// Style class applied to the status element.
    pub fn style_class(&self) -> &'static str {
        match self {
            Self::Success => "status status--success",
            Self::Error => "status status--error",
            Self::Warning => "status status--warning",
            Self::Info => "status status--info",
        }
    }

    /// Short label used when printing to a terminal.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Error => "ERROR",
            Self::Warning => "WARN",
            Self::Info => "INFO",
        }
    }
}

/// A message with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Success)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Error)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Warning)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Info)
    }

    pub fn style_class(&self) -> &'static str {
        self.severity.style_class()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.label(), self.text)
    }
}

/// Holds the currently displayed status message.
#[derive(Debug, Clone, Default)]
pub struct StatusNotifier {
    current: Option<StatusMessage>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current message.
    pub fn show(&mut self, text: impl Into<String>, severity: Severity) {
        self.display(StatusMessage::new(text, severity));
    }

    /// Replace the current message with an already-built one.
    pub fn display(&mut self, message: StatusMessage) {
        match message.severity {
            Severity::Error => error!(status = %message.text, "status updated"),
            Severity::Warning => warn!(status = %message.text, "status updated"),
            Severity::Success | Severity::Info => info!(status = %message.text, "status updated"),
        }
        self.current = Some(message);
    }

    /// Remove the message and its styling.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    /// Style class for the status element; empty when nothing is shown.
    pub fn style_class(&self) -> &'static str {
        self.current.as_ref().map_or("", StatusMessage::style_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_message_wins() {
        let mut notifier = StatusNotifier::new();
        notifier.show("Uploading...", Severity::Info);
        notifier.show("Something broke", Severity::Error);

        let current = notifier.current().unwrap();
        assert_eq!(current.text, "Something broke");
        assert_eq!(current.severity, Severity::Error);
        assert_eq!(notifier.style_class(), "status status--error");
    }

    #[test]
    fn test_clear_removes_message_and_style() {
        let mut notifier = StatusNotifier::new();
        notifier.show("done", Severity::Success);
        notifier.clear();

        assert!(notifier.current().is_none());
        assert_eq!(notifier.style_class(), "");
    }

    #[test]
    fn test_each_severity_has_distinct_style() {
        let classes = [
            Severity::Success.style_class(),
            Severity::Error.style_class(),
            Severity::Warning.style_class(),
            Severity::Info.style_class(),
        ];
        for (i, a) in classes.iter().enumerate() {
            for b in &classes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_display_format() {
        let message = StatusMessage::warning("pick an operation");
        assert_eq!(message.to_string(), "[WARN] pick an operation");
    }
}
