use tracing::info;

use super::CleaningSession;
use crate::error::{CleanerError, Result};
use crate::state::{Event, UiState, rejection};
use crate::types::{FileUpload, UploadedFile};

impl CleaningSession {
    /// Pick a file and upload it.
    ///
    /// Files without a `.csv` name are rejected before any request is made
    /// and the previously loaded file (if any) stays loaded. On upload
    /// failure the session returns to its initial state.
    pub async fn select_file(&mut self, file: FileUpload) -> Result<UploadedFile> {
        let event = Event::FileChosen(file);
        if let Some(error) = rejection(&self.state, &event) {
            self.dispatch(event).await;
            return Err(error);
        }

        if let Event::FileChosen(file) = &event {
            self.picked_file = Some(file.name.clone());
        }
        self.begin_request();
        self.dispatch(event).await;

        if let Some(error) = self.last_failure.take() {
            return Err(error);
        }
        match &self.state {
            UiState::FileSelected(file) => {
                info!(file_id = %file.file_id, name = %file.name, "file loaded");
                Ok(file.clone())
            }
            other => Err(CleanerError::UnexpectedResponse(format!(
                "Upload finished in state '{}'.",
                other.name()
            ))),
        }
    }
}
