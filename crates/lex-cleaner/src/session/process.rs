use serde::Serialize;

use super::CleaningSession;
use crate::api::responses::UNEXPECTED_RESPONSE;
use crate::artifact::OpenedArtifact;
use crate::error::{CleanerError, Result};
use crate::state::{Event, rejection};
use crate::types::{CleaningOperations, ProcessedArtifact};

/// What a successful processing request produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub artifact: ProcessedArtifact,
    /// Where the cleaned file went; `None` only if no opener ran.
    #[serde(skip)]
    pub opened: Option<OpenedArtifact>,
}

impl CleaningSession {
    /// Clean the loaded file and hand the result to the artifact opener.
    ///
    /// Requires a loaded file and at least one operation; otherwise a
    /// warning is shown and nothing is sent. The loaded file stays loaded
    /// whether processing succeeds or fails, so it can be processed again.
    pub async fn process(&mut self, operations: CleaningOperations) -> Result<ProcessReport> {
        let event = Event::ProcessRequested(operations);
        if let Some(error) = rejection(&self.state, &event) {
            self.dispatch(event).await;
            return Err(error);
        }

        self.begin_request();
        self.dispatch(event).await;

        if let Some(error) = self.last_failure.take() {
            return Err(error);
        }
        let artifact = self
            .last_artifact
            .take()
            .ok_or_else(|| CleanerError::UnexpectedResponse(UNEXPECTED_RESPONSE.to_string()))?;

        Ok(ProcessReport {
            artifact,
            opened: self.opened.take(),
        })
    }
}
