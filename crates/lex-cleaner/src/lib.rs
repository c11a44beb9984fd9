//! CSV Cleaning Client Library
//!
//! A client for a remote CSV cleaning service: upload a CSV file, preview
//! its first rows as a table, ask the service to remove missing values and
//! duplicates, and fetch the cleaned result.
//!
//! # Overview
//!
//! - **Session**: [`CleaningSession`] drives one upload/process workflow and
//!   owns the status line and the preview table
//! - **State Machine**: every transition goes through the pure
//!   [`state::transition`] function
//! - **Preview Rendering**: schema-less rows are rendered as a table over the
//!   union of their keys, with long cells truncated
//! - **Transport**: [`api::CleaningService`] abstracts the HTTP API so the
//!   session can run against a fake in tests
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_cleaner::{CleaningOperations, CleaningSession, ClientConfig, FileUpload};
//! use lex_cleaner::artifact::SaveToDirectory;
//!
//! let config = ClientConfig::builder_from_env().build()?;
//! let mut session = CleaningSession::from_config(config)?
//!     .with_opener(SaveToDirectory::new("outputs"));
//!
//! let file = session.select_file(FileUpload::from_path("data.csv").await?).await?;
//! println!("{} rows, {} columns", file.rows, file.columns);
//!
//! if let Some(table) = session.preview_table() {
//!     println!("{}", table.to_text());
//! }
//!
//! let report = session.process(CleaningOperations::new(true, true)).await?;
//! println!("{:?}", report.opened);
//! ```
//!
//! # Errors
//!
//! All fallible operations return [`CleanerError`]. Whatever the outcome, the
//! message shown to the user is also available through
//! [`CleaningSession::status`].

pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod preview;
pub mod session;
pub mod state;
pub mod status;
pub mod types;

// Re-export main types for convenience
pub use api::{CleaningService, HttpCleaningService};
pub use artifact::{ArtifactOpener, LinkOnly, OpenedArtifact, SaveToDirectory};
pub use config::{AuthPlacement, ClientConfig, ClientConfigBuilder};
pub use error::{CleanerError, Result};
pub use preview::{PreviewTable, RenderOutcome, TablePreviewRenderer};
pub use session::{CleaningSession, ProcessReport};
pub use state::{Controls, UiState};
pub use status::{Severity, StatusMessage, StatusNotifier};
pub use types::{
    CleaningOperations, FileUpload, PreviewData, PreviewRow, ProcessedArtifact, UploadedFile,
};
