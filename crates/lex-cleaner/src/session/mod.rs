//! The cleaning session: one page's worth of state.
//!
//! [`CleaningSession`] owns the UI state, the status line and the preview
//! table. User actions ([`CleaningSession::select_file`],
//! [`CleaningSession::process`], [`CleaningSession::reset`]) are turned into
//! [`Event`]s, run through [`transition`], and the resulting effects are
//! executed here. Network results are fed back in as further events until the
//! queue is empty.
//!
//! Every action takes `&mut self`, so at most one request per session is ever
//! in flight.

mod process;
mod upload;

pub use process::ProcessReport;

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error};

use crate::api::{CleaningService, HttpCleaningService, decode_process, decode_upload};
use crate::artifact::{ArtifactOpener, LinkOnly, OpenedArtifact};
use crate::config::ClientConfig;
use crate::error::{CleanerError, Result};
use crate::preview::{PreviewTable, TablePreviewRenderer};
use crate::state::{Controls, Effect, Event, Transition, UiState, transition};
use crate::status::{StatusMessage, StatusNotifier};
use crate::types::ProcessedArtifact;

/// Client-side session against the cleaning service.
pub struct CleaningSession {
    service: Arc<dyn CleaningService>,
    opener: Box<dyn ArtifactOpener>,
    state: UiState,
    notifier: StatusNotifier,
    preview: TablePreviewRenderer,
    /// Name of the file currently held by the file picker.
    picked_file: Option<String>,
    /// Error behind the most recent failed request, for the caller.
    last_failure: Option<CleanerError>,
    last_artifact: Option<ProcessedArtifact>,
    opened: Option<OpenedArtifact>,
}

static_assertions::assert_impl_all!(CleaningSession: Send);

impl CleaningSession {
    /// Create a session over any transport.
    pub fn new(service: Arc<dyn CleaningService>) -> Self {
        Self {
            service,
            opener: Box::new(LinkOnly),
            state: UiState::default(),
            notifier: StatusNotifier::new(),
            preview: TablePreviewRenderer::default(),
            picked_file: None,
            last_failure: None,
            last_artifact: None,
            opened: None,
        }
    }

    /// Create a session talking HTTP to the configured service.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let cell_limit = config.preview_cell_limit;
        let service = HttpCleaningService::new(config)?;
        Ok(Self::new(Arc::new(service)).with_preview_cell_limit(cell_limit))
    }

    /// Replace what is done with cleaned files (default: [`LinkOnly`]).
    pub fn with_opener(mut self, opener: impl ArtifactOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn with_preview_cell_limit(mut self, limit: usize) -> Self {
        self.preview = TablePreviewRenderer::new(limit);
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn controls(&self) -> Controls {
        self.state.controls()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.notifier.current()
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    /// The preview table, when one is displayed.
    pub fn preview_table(&self) -> Option<&PreviewTable> {
        self.preview.table()
    }

    pub fn picked_file_name(&self) -> Option<&str> {
        self.picked_file.as_deref()
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Return every control, identifier and message to its initial value.
    pub async fn reset(&mut self) {
        self.dispatch(Event::Reset).await;
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Feed an event through the state machine until no follow-up remains.
    async fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let Transition { state, effects } = transition(&self.state, event);
            if state != self.state {
                debug!(from = self.state.name(), to = state.name(), "state changed");
            }
            self.state = state;

            for effect in effects {
                if let Some(next) = self.run_effect(effect).await {
                    queue.push_back(next);
                }
            }
        }
    }

    /// Execute one effect, returning the event it produced, if any.
    async fn run_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::ShowStatus(message) => self.notifier.display(message),
            Effect::ClearStatus => self.notifier.clear(),
            Effect::ClearPreview => self.preview.clear(),
            Effect::ClearFileInput => self.picked_file = None,

            Effect::RenderPreview(data) => {
                if let Some(message) = self.preview.render(&data).status() {
                    self.notifier.display(message);
                }
            }

            Effect::SendUpload(file) => {
                let result = match self.service.upload(&file).await {
                    Ok(reply) => decode_upload(&reply, &file.name),
                    Err(e) => Err(e),
                };
                return Some(match result {
                    Ok((file, preview)) => Event::UploadSucceeded { file, preview },
                    Err(e) => Event::UploadFailed(self.record_failure(e)),
                });
            }

            Effect::SendProcess {
                file_id,
                operations,
            } => {
                let result = match self.service.process(&file_id, &operations).await {
                    Ok(reply) => decode_process(&reply),
                    Err(e) => Err(e),
                };
                return Some(match result {
                    Ok(artifact) => {
                        self.last_artifact = Some(artifact.clone());
                        Event::ProcessSucceeded(artifact)
                    }
                    Err(e) => Event::ProcessFailed(self.record_failure(e)),
                });
            }

            Effect::OpenArtifact(url) => {
                match self.opener.open(self.service.as_ref(), &url).await {
                    Ok(opened) => self.opened = Some(opened),
                    Err(e) => {
                        let text = format!("Error: {}", self.record_failure(e));
                        self.notifier.display(StatusMessage::error(text));
                    }
                }
            }
        }
        None
    }

    /// Log and keep the error; returns the text to show.
    fn record_failure(&mut self, e: CleanerError) -> String {
        error!(code = e.error_code(), "request failed: {}", e);
        let message = e.user_message();
        self.last_failure = Some(e);
        message
    }

    fn begin_request(&mut self) {
        self.last_failure = None;
        self.last_artifact = None;
        self.opened = None;
    }
}
