//! Configuration for the cleaning client.
//!
//! This module provides configuration options using the builder pattern,
//! plus loading of overrides from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Default service address (the service serves its API and page together).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Static development credential expected by the service.
pub const DEFAULT_API_KEY: &str = "demo-key";

/// Cells longer than this many characters are truncated in the preview.
pub const DEFAULT_PREVIEW_CELL_LIMIT: usize = 50;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "LEX_CLEANER_BASE_URL";

/// Environment variable overriding [`ClientConfig::api_key`].
pub const ENV_API_KEY: &str = "LEX_CLEANER_API_KEY";

/// Environment variable overriding [`ClientConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "LEX_CLEANER_TIMEOUT_SECS";

/// Where the credential is attached on requests to the service.
///
/// The processing endpoint documents the key both as a bearer header and as
/// `scheme`/`credentials` body fields. Which one the backend enforces is not
/// known, so both are sent by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthPlacement {
    /// `Authorization: Bearer <key>` only
    Header,
    /// `scheme` + `credentials` fields in JSON bodies only
    Body,
    /// Both header and body fields
    #[default]
    HeaderAndBody,
}

impl AuthPlacement {
    pub fn uses_header(self) -> bool {
        matches!(self, Self::Header | Self::HeaderAndBody)
    }

    pub fn uses_body(self) -> bool {
        matches!(self, Self::Body | Self::HeaderAndBody)
    }
}

/// Configuration for the cleaning client.
///
/// # Example
///
/// ```rust,ignore
/// use lex_cleaner::config::{AuthPlacement, ClientConfig};
///
/// let config = ClientConfig::builder()
///     .base_url("http://cleaner.internal:8000")
///     .auth_placement(AuthPlacement::Header)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the service, without a trailing `/api`.
    /// Default: "http://localhost:8000"
    pub base_url: String,

    /// Static credential sent with every request.
    /// Default: "demo-key"
    pub api_key: String,

    /// Where the credential goes.
    /// Default: HeaderAndBody
    pub auth_placement: AuthPlacement,

    /// Optional request timeout. `None` waits until the request completes.
    /// Default: None
    pub timeout_secs: Option<u64>,

    /// Preview cells longer than this are truncated with an ellipsis.
    /// Default: 50
    pub preview_cell_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            auth_placement: AuthPlacement::default(),
            timeout_secs: None,
            preview_cell_limit: DEFAULT_PREVIEW_CELL_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Start a builder seeded from the process environment.
    ///
    /// Unset variables keep their defaults. An unparsable timeout is reported
    /// by [`ClientConfigBuilder::build`].
    pub fn builder_from_env() -> ClientConfigBuilder {
        let mut builder = ClientConfigBuilder::default();
        if let Ok(url) = env::var(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Ok(key) = env::var(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            builder.raw_timeout = Some(raw);
        }
        builder
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.parsed_base_url()?;
        if self.api_key.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("api_key".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout("0".to_string()));
        }
        if self.preview_cell_limit == 0 {
            return Err(ConfigValidationError::InvalidCellLimit(
                self.preview_cell_limit,
            ));
        }
        Ok(())
    }

    /// Parse the base URL. Only `http` and `https` URLs with a host are accepted.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigValidationError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(ConfigValidationError::EmptyField("base_url".to_string()));
        }
        let invalid = |reason: String| ConfigValidationError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must not be empty")]
    EmptyField(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid timeout '{0}' (must be a positive number of seconds)")]
    InvalidTimeout(String),

    #[error("Invalid preview cell limit: {0} (must be at least 1)")]
    InvalidCellLimit(usize),
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    auth_placement: Option<AuthPlacement>,
    timeout_secs: Option<u64>,
    raw_timeout: Option<String>,
    preview_cell_limit: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the service base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Choose where the credential is attached.
    pub fn auth_placement(mut self, placement: AuthPlacement) -> Self {
        self.auth_placement = Some(placement);
        self
    }

    /// Set a request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self.raw_timeout = None;
        self
    }

    /// Set the preview truncation limit.
    pub fn preview_cell_limit(mut self, limit: usize) -> Self {
        self.preview_cell_limit = Some(limit);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigValidationError> {
        let timeout_secs = match self.raw_timeout {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigValidationError::InvalidTimeout(raw.clone()))?,
            ),
            None => self.timeout_secs,
        };

        let config = ClientConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: self.api_key.unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            auth_placement: self.auth_placement.unwrap_or_default(),
            timeout_secs,
            preview_cell_limit: self
                .preview_cell_limit
                .unwrap_or(DEFAULT_PREVIEW_CELL_LIMIT),
        };

        config.validate()?;
        Ok(config)
    }
}
