//! UI state machine.
//!
//! All state transitions go through [`transition`], a pure function from the
//! current [`UiState`] and an [`Event`] to the next state plus a list of
//! [`Effect`]s. The session executes the effects (network calls, status
//! updates, preview rendering) and feeds network results back in as events.
//!
//! # States
//!
//! ```text
//!            FileChosen(.csv)              UploadSucceeded
//!   Idle ───────────────────► Uploading ───────────────────► FileSelected
//!    ▲                            │                          │      ▲
//!    │        UploadFailed        │         ProcessRequested │      │ ProcessSucceeded
//!    └────────────────────────────┘                          ▼      │ ProcessFailed
//!                                                          Processing
//! ```
//!
//! A file id exists only in `FileSelected` and `Processing`; both variants
//! carry the [`UploadedFile`], so the invariant is enforced by the type.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CleanerError;
use crate::status::StatusMessage;
use crate::types::{CleaningOperations, FileUpload, PreviewData, ProcessedArtifact, UploadedFile};

/// Upload control label before any file is loaded.
pub const LABEL_CHOOSE_FILE: &str = "Choose CSV File";
/// Upload control label once a file is loaded.
pub const LABEL_CHANGE_FILE: &str = "Change File";
/// Upload control label while uploading.
pub const LABEL_UPLOADING: &str = "Uploading...";
/// Process control label when idle.
pub const LABEL_PROCESS: &str = "Clean & Download";
/// Process control label while processing.
pub const LABEL_PROCESSING: &str = "Processing...";

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// An upload request is in flight.
    Uploading { file_name: String },
    /// A file is loaded and ready for processing.
    FileSelected(UploadedFile),
    /// A processing request is in flight for the loaded file.
    Processing(UploadedFile),
}

impl UiState {
    /// The current file id; `Some` only in `FileSelected` and `Processing`.
    pub fn current_file_id(&self) -> Option<&str> {
        self.current_file().map(|f| f.file_id.as_str())
    }

    pub fn current_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::FileSelected(file) | Self::Processing(file) => Some(file),
            Self::Idle | Self::Uploading { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading { .. } => "uploading",
            Self::FileSelected(_) => "file_selected",
            Self::Processing(_) => "processing",
        }
    }

    /// Derive the enabled/visible state of every control.
    pub fn controls(&self) -> Controls {
        let has_file = self.current_file().is_some();
        let uploading = matches!(self, Self::Uploading { .. });
        let processing = matches!(self, Self::Processing(_));

        Controls {
            upload_enabled: !uploading,
            upload_label: match self {
                Self::Idle => LABEL_CHOOSE_FILE,
                Self::Uploading { .. } => LABEL_UPLOADING,
                Self::FileSelected(_) | Self::Processing(_) => LABEL_CHANGE_FILE,
            },
            process_enabled: has_file && !processing,
            process_label: if processing {
                LABEL_PROCESSING
            } else {
                LABEL_PROCESS
            },
            preview_visible: has_file,
            options_visible: has_file,
        }
    }
}

/// Enabled/visible flags and labels for the page controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub upload_enabled: bool,
    pub upload_label: &'static str,
    pub process_enabled: bool,
    pub process_label: &'static str,
    pub preview_visible: bool,
    pub options_visible: bool,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user picked a file.
    FileChosen(FileUpload),
    /// The service accepted the upload.
    UploadSucceeded {
        file: UploadedFile,
        preview: PreviewData,
    },
    /// The upload failed; carries the message to show.
    UploadFailed(String),
    /// The user asked to clean the loaded file.
    ProcessRequested(CleaningOperations),
    /// The service produced a cleaned file.
    ProcessSucceeded(ProcessedArtifact),
    /// Processing failed; carries the message to show.
    ProcessFailed(String),
    /// Return everything to its initial values.
    Reset,
}

/// Side effects requested by a transition, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowStatus(StatusMessage),
    ClearStatus,
    /// Send the file to the upload endpoint.
    SendUpload(FileUpload),
    /// Send a processing request for `file_id`.
    SendProcess {
        file_id: String,
        operations: CleaningOperations,
    },
    RenderPreview(PreviewData),
    ClearPreview,
    /// Forget the picked file so the same file can be chosen again.
    ClearFileInput,
    /// Hand the download URL to the artifact opener.
    OpenArtifact(String),
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: UiState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: UiState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    /// Keep the state and only show a message.
    fn stay(state: &UiState, message: StatusMessage) -> Self {
        Self {
            state: state.clone(),
            effects: vec![Effect::ShowStatus(message)],
        }
    }

    fn reject(state: &UiState, error: CleanerError) -> Self {
        debug!(state = state.name(), code = error.error_code(), "event rejected");
        Self::stay(state, StatusMessage::new(error.user_message(), error.severity()))
    }
}

/// Effects that return every control and identifier to its initial value.
fn reset_effects() -> Vec<Effect> {
    vec![Effect::ClearFileInput, Effect::ClearPreview, Effect::ClearStatus]
}

/// Why `event` cannot be accepted in `state`, if it cannot.
///
/// These checks run before any request is issued, so a rejected event never
/// reaches the network.
pub fn rejection(state: &UiState, event: &Event) -> Option<CleanerError> {
    match (event, state) {
        (Event::FileChosen(_), UiState::Uploading { .. }) => Some(CleanerError::UploadInProgress),
        (Event::FileChosen(file), _) if !file.has_csv_name() => {
            Some(CleanerError::InvalidFileType(file.name.clone()))
        }
        (Event::ProcessRequested(_), UiState::Processing(_)) => {
            Some(CleanerError::ProcessingInProgress)
        }
        (Event::ProcessRequested(_), UiState::Idle | UiState::Uploading { .. }) => {
            Some(CleanerError::NoFileLoaded)
        }
        (Event::ProcessRequested(operations), UiState::FileSelected(_))
            if !operations.has_any() =>
        {
            Some(CleanerError::NoOperationSelected)
        }
        _ => None,
    }
}

/// Compute the next state and effects. Pure: no I/O happens here.
pub fn transition(state: &UiState, event: Event) -> Transition {
    if let Some(error) = rejection(state, &event) {
        return Transition::reject(state, error);
    }

    match event {
        Event::FileChosen(file) => {
            info!(file = %file.name, "uploading file");
            let file_name = file.name.clone();
            Transition::to(
                UiState::Uploading { file_name },
                vec![
                    Effect::ShowStatus(StatusMessage::info("Uploading file, please wait...")),
                    Effect::SendUpload(file),
                ],
            )
        }

        Event::UploadSucceeded { file, preview } => match state {
            UiState::Uploading { .. } => {
                info!(file_id = %file.file_id, rows = file.rows, columns = file.columns, "upload accepted");
                let message = format!(
                    "Loaded {} rows and {} columns successfully.",
                    file.rows, file.columns
                );
                Transition::to(
                    UiState::FileSelected(file),
                    vec![
                        Effect::ShowStatus(StatusMessage::success(message)),
                        Effect::RenderPreview(preview),
                    ],
                )
            }
            _ => stale(state, "upload result"),
        },

        Event::UploadFailed(message) => match state {
            UiState::Uploading { .. } => {
                let mut effects = reset_effects();
                effects.push(Effect::ShowStatus(StatusMessage::error(format!(
                    "Error: {message}"
                ))));
                Transition::to(UiState::Idle, effects)
            }
            _ => stale(state, "upload failure"),
        },

        Event::ProcessRequested(operations) => match state {
            UiState::FileSelected(file) => {
                info!(file_id = %file.file_id, ?operations, "processing requested");
                Transition::to(
                    UiState::Processing(file.clone()),
                    vec![
                        Effect::ShowStatus(StatusMessage::info(
                            "Cleaning data, this may take a while...",
                        )),
                        Effect::SendProcess {
                            file_id: file.file_id.clone(),
                            operations,
                        },
                    ],
                )
            }
            _ => stale(state, "process request"),
        },

        Event::ProcessSucceeded(artifact) => match state {
            UiState::Processing(file) => {
                let text = match artifact.message.as_deref() {
                    Some(extra) if !extra.is_empty() => format!("Processing complete! {extra}"),
                    _ => "Processing complete!".to_string(),
                };
                Transition::to(
                    UiState::FileSelected(file.clone()),
                    vec![
                        Effect::ShowStatus(StatusMessage::success(text)),
                        Effect::OpenArtifact(artifact.download_url),
                    ],
                )
            }
            _ => stale(state, "process result"),
        },

        Event::ProcessFailed(message) => match state {
            UiState::Processing(file) => Transition::to(
                UiState::FileSelected(file.clone()),
                vec![Effect::ShowStatus(StatusMessage::error(format!(
                    "Error: {message}"
                )))],
            ),
            _ => stale(state, "process failure"),
        },

        Event::Reset => Transition::to(UiState::Idle, reset_effects()),
    }
}

/// A network result arrived for a request this state never issued.
fn stale(state: &UiState, what: &str) -> Transition {
    debug!(state = state.name(), what, "ignoring stale event");
    Transition::to(state.clone(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Severity;
    use pretty_assertions::assert_eq;

    fn uploaded(id: &str) -> UploadedFile {
        UploadedFile {
            file_id: id.to_string(),
            name: "data.csv".to_string(),
            rows: 10,
            columns: 3,
            size_bytes: None,
        }
    }

    fn shown(effects: &[Effect]) -> Vec<StatusMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::ShowStatus(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    fn has_network_effect(effects: &[Effect]) -> bool {
        effects
            .iter()
            .any(|e| matches!(e, Effect::SendUpload(_) | Effect::SendProcess { .. }))
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    #[test]
    fn test_initial_controls() {
        let controls = UiState::Idle.controls();
        assert_eq!(
            controls,
            Controls {
                upload_enabled: true,
                upload_label: LABEL_CHOOSE_FILE,
                process_enabled: false,
                process_label: LABEL_PROCESS,
                preview_visible: false,
                options_visible: false,
            }
        );
    }

    #[test]
    fn test_controls_per_state() {
        let uploading = UiState::Uploading {
            file_name: "a.csv".to_string(),
        }
        .controls();
        assert!(!uploading.upload_enabled);
        assert!(!uploading.process_enabled);
        assert_eq!(uploading.upload_label, LABEL_UPLOADING);

        let selected = UiState::FileSelected(uploaded("f1")).controls();
        assert!(selected.upload_enabled);
        assert!(selected.process_enabled);
        assert!(selected.preview_visible && selected.options_visible);
        assert_eq!(selected.upload_label, LABEL_CHANGE_FILE);

        let processing = UiState::Processing(uploaded("f1")).controls();
        assert!(processing.upload_enabled);
        assert!(!processing.process_enabled);
        assert_eq!(processing.process_label, LABEL_PROCESSING);
    }

    #[test]
    fn test_file_id_only_when_loaded() {
        assert_eq!(UiState::Idle.current_file_id(), None);
        assert_eq!(
            UiState::Uploading {
                file_name: "x.csv".to_string()
            }
            .current_file_id(),
            None
        );
        assert_eq!(UiState::FileSelected(uploaded("abc")).current_file_id(), Some("abc"));
        assert_eq!(UiState::Processing(uploaded("abc")).current_file_id(), Some("abc"));
    }

    // -------------------------------------------------------------------------
    // Upload transitions
    // -------------------------------------------------------------------------

    #[test]
    fn test_non_csv_is_rejected_without_network() {
        let t = transition(&UiState::Idle, Event::FileChosen(FileUpload::new("data.xlsx", "x")));

        assert_eq!(t.state, UiState::Idle);
        assert!(!has_network_effect(&t.effects));
        let messages = shown(&t.effects);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
    }

    #[test]
    fn test_non_csv_keeps_loaded_file() {
        let state = UiState::FileSelected(uploaded("keep"));
        let t = transition(&state, Event::FileChosen(FileUpload::new("notes.txt", "x")));
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_csv_starts_upload_and_drops_file_id() {
        let file = FileUpload::new("data.csv", "a,b\n1,2\n");
        let t = transition(
            &UiState::FileSelected(uploaded("old")),
            Event::FileChosen(file.clone()),
        );

        assert_eq!(
            t.state,
            UiState::Uploading {
                file_name: "data.csv".to_string()
            }
        );
        assert_eq!(t.state.current_file_id(), None);
        assert!(t.effects.contains(&Effect::SendUpload(file)));
    }

    #[test]
    fn test_second_file_while_uploading_is_rejected() {
        let state = UiState::Uploading {
            file_name: "a.csv".to_string(),
        };
        let t = transition(&state, Event::FileChosen(FileUpload::new("b.csv", "x")));

        assert_eq!(t.state, state);
        assert!(!has_network_effect(&t.effects));
        assert_eq!(shown(&t.effects)[0].severity, Severity::Warning);
    }

    #[test]
    fn test_upload_success_selects_file_and_renders_preview() {
        let state = UiState::Uploading {
            file_name: "data.csv".to_string(),
        };
        let preview = PreviewData::Rows(Vec::new());
        let t = transition(
            &state,
            Event::UploadSucceeded {
                file: uploaded("abc"),
                preview: preview.clone(),
            },
        );

        assert_eq!(t.state, UiState::FileSelected(uploaded("abc")));
        assert_eq!(
            t.effects,
            vec![
                Effect::ShowStatus(StatusMessage::success(
                    "Loaded 10 rows and 3 columns successfully."
                )),
                Effect::RenderPreview(preview),
            ]
        );
    }

    #[test]
    fn test_upload_failure_resets_then_shows_error() {
        let state = UiState::Uploading {
            file_name: "data.csv".to_string(),
        };
        let t = transition(&state, Event::UploadFailed("File too large".to_string()));

        assert_eq!(t.state, UiState::Idle);
        assert_eq!(
            t.effects,
            vec![
                Effect::ClearFileInput,
                Effect::ClearPreview,
                Effect::ClearStatus,
                Effect::ShowStatus(StatusMessage::error("Error: File too large")),
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Process transitions
    // -------------------------------------------------------------------------

    #[test]
    fn test_process_without_file_is_local_warning() {
        let t = transition(
            &UiState::Idle,
            Event::ProcessRequested(CleaningOperations::new(true, true)),
        );

        assert_eq!(t.state, UiState::Idle);
        assert!(!has_network_effect(&t.effects));
        assert_eq!(shown(&t.effects)[0].severity, Severity::Warning);
    }

    #[test]
    fn test_process_without_operations_is_local_warning() {
        let state = UiState::FileSelected(uploaded("abc"));
        let t = transition(
            &state,
            Event::ProcessRequested(CleaningOperations::new(false, false)),
        );

        assert_eq!(t.state, state);
        assert!(!has_network_effect(&t.effects));
        assert_eq!(
            shown(&t.effects),
            vec![StatusMessage::warning(
                "Please select at least one cleaning operation."
            )]
        );
    }

    #[test]
    fn test_process_request_sends_file_id() {
        let ops = CleaningOperations::new(true, false);
        let t = transition(
            &UiState::FileSelected(uploaded("abc")),
            Event::ProcessRequested(ops.clone()),
        );

        assert_eq!(t.state, UiState::Processing(uploaded("abc")));
        assert!(t.effects.contains(&Effect::SendProcess {
            file_id: "abc".to_string(),
            operations: ops,
        }));
    }

    #[test]
    fn test_process_success_opens_artifact_and_keeps_file() {
        let artifact = ProcessedArtifact {
            download_url: "/api/download/xyz".to_string(),
            message: Some("Data cleaned.".to_string()),
            file_id: Some("xyz".to_string()),
            filename: None,
            rows: None,
            columns: None,
        };
        let t = transition(
            &UiState::Processing(uploaded("abc")),
            Event::ProcessSucceeded(artifact),
        );

        assert_eq!(t.state, UiState::FileSelected(uploaded("abc")));
        assert_eq!(
            t.effects,
            vec![
                Effect::ShowStatus(StatusMessage::success("Processing complete! Data cleaned.")),
                Effect::OpenArtifact("/api/download/xyz".to_string()),
            ]
        );
    }

    #[test]
    fn test_process_failure_keeps_file() {
        let t = transition(
            &UiState::Processing(uploaded("abc")),
            Event::ProcessFailed("body.file_id field required".to_string()),
        );

        assert_eq!(t.state, UiState::FileSelected(uploaded("abc")));
        assert!(t.state.controls().process_enabled);
        assert_eq!(
            shown(&t.effects),
            vec![StatusMessage::error("Error: body.file_id field required")]
        );
    }

    #[test]
    fn test_rejection_matches_transition() {
        let idle = UiState::Idle;
        let event = Event::FileChosen(FileUpload::new("a.txt", "x"));
        assert!(matches!(
            rejection(&idle, &event),
            Some(CleanerError::InvalidFileType(name)) if name == "a.txt"
        ));
        assert!(rejection(&idle, &Event::FileChosen(FileUpload::new("a.csv", "x"))).is_none());

        let processing = UiState::Processing(uploaded("abc"));
        let event = Event::ProcessRequested(CleaningOperations::new(true, false));
        assert!(matches!(
            rejection(&processing, &event),
            Some(CleanerError::ProcessingInProgress)
        ));
        assert!(rejection(&UiState::FileSelected(uploaded("abc")), &event).is_none());
        assert!(rejection(&idle, &Event::Reset).is_none());
    }

    // -------------------------------------------------------------------------
    // Reset and stale events
    // -------------------------------------------------------------------------

    #[test]
    fn test_reset_returns_to_initial_values() {
        let t = transition(&UiState::FileSelected(uploaded("abc")), Event::Reset);
        assert_eq!(t.state, UiState::Idle);
        assert_eq!(t.state.controls(), UiState::Idle.controls());
        assert_eq!(t.effects, reset_effects());
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let state = UiState::FileSelected(uploaded("abc"));
        let t = transition(&state, Event::UploadFailed("late".to_string()));
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());

        let t = transition(&UiState::Idle, Event::ProcessFailed("late".to_string()));
        assert_eq!(t.state, UiState::Idle);
        assert!(t.effects.is_empty());
    }
}
