//! What happens to a cleaned file once processing succeeds.
//!
//! A browser would simply navigate to the download URL. Outside a browser the
//! caller chooses an [`ArtifactOpener`]: [`LinkOnly`] reports the resolved
//! URL, [`SaveToDirectory`] fetches the file and writes it to disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::CleaningService;
use crate::error::Result;

/// Name used when neither the response nor the URL provides one.
pub const DEFAULT_ARTIFACT_NAME: &str = "cleaned_data.csv";

/// Outcome of opening an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenedArtifact {
    /// Absolute URL of the cleaned file.
    Link(String),
    /// Local path the cleaned file was written to.
    Saved(PathBuf),
}

impl std::fmt::Display for OpenedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link(url) => write!(f, "{url}"),
            Self::Saved(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Hands a cleaned file to the user.
#[async_trait]
pub trait ArtifactOpener: Send + Sync {
    async fn open(&self, service: &dyn CleaningService, url: &str) -> Result<OpenedArtifact>;
}

/// Resolves the URL and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOnly;

#[async_trait]
impl ArtifactOpener for LinkOnly {
    async fn open(&self, service: &dyn CleaningService, url: &str) -> Result<OpenedArtifact> {
        let resolved = service.resolve_url(url)?;
        info!(url = %resolved, "cleaned file available");
        Ok(OpenedArtifact::Link(resolved))
    }
}

/// Downloads the file into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct SaveToDirectory {
    dir: PathBuf,
}

impl SaveToDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactOpener for SaveToDirectory {
    async fn open(&self, service: &dyn CleaningService, url: &str) -> Result<OpenedArtifact> {
        let downloaded = service.download(url).await?;

        let name = downloaded
            .filename
            .as_deref()
            .and_then(sanitize_file_name)
            .or_else(|| name_from_url(url))
            .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string());

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &downloaded.bytes).await?;

        info!(path = %path.display(), bytes = downloaded.bytes.len(), "saved cleaned file");
        Ok(OpenedArtifact::Saved(path))
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Plain `filename=` wins over `filename*=`; the extended form only has its
/// charset prefix stripped.
pub fn attachment_filename(header: &str) -> Option<String> {
    let mut extended = None;

    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" if !value.is_empty() => return Some(value.to_string()),
            "filename*" => {
                let name = value.rsplit("''").next().unwrap_or(value);
                if !name.is_empty() {
                    extended = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    extended
}

/// Keep only the final path component; reject names that escape the directory.
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match base {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

fn name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    sanitize_file_name(path).filter(|name| name.contains('.'))
}
