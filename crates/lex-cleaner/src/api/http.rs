//! reqwest-based transport to the cleaning service.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{CleaningService, DownloadedFile, HttpReply, PROCESS_PATH, UPLOAD_PATH};
use crate::api::responses::ErrorEnvelope;
use crate::artifact::attachment_filename;
use crate::config::ClientConfig;
use crate::error::{CleanerError, GENERIC_PROCESS_FAILURE, Result};
use crate::types::{CleaningOperations, FileUpload};

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// MIME type declared for uploaded files.
const CSV_MIME: &str = "text/csv";

/// Value of the `scheme` body field.
const BEARER_SCHEME: &str = "bearer";

/// JSON body of `POST /api/process`.
#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    file_id: &'a str,
    operations: &'a CleaningOperations,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<&'a str>,
}

/// HTTP implementation of [`CleaningService`].
pub struct HttpCleaningService {
    client: Client,
    config: ClientConfig,
    base: Url,
}

static_assertions::assert_impl_all!(HttpCleaningService: Send, Sync);

impl HttpCleaningService {
    /// Create a transport for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = config.parsed_base_url()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            base,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve `path` against the base URL the way a browser resolves a link.
    fn join(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.config.auth_placement.uses_header() {
            request.header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
        } else {
            request
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<HttpReply> {
        let response = request.send().await.map_err(|e| {
            warn!("request to cleaning service failed: {}", e);
            CleanerError::Http(e)
        })?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "received response");
        Ok(HttpReply::new(status, body))
    }
}

#[async_trait]
impl CleaningService for HttpCleaningService {
    async fn upload(&self, file: &FileUpload) -> Result<HttpReply> {
        let url = self.join(UPLOAD_PATH)?;
        info!(file = %file.name, bytes = file.bytes.len(), %url, "uploading file");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)?;
        let form = Form::new().part(FILE_FIELD, part);

        let request = self.authorize(self.client.post(url)).multipart(form);
        self.send(request).await
    }

    async fn process(&self, file_id: &str, operations: &CleaningOperations) -> Result<HttpReply> {
        let url = self.join(PROCESS_PATH)?;
        info!(file_id, ?operations, %url, "requesting processing");

        let with_body_auth = self.config.auth_placement.uses_body();
        let body = ProcessRequest {
            file_id,
            operations,
            scheme: with_body_auth.then_some(BEARER_SCHEME),
            credentials: with_body_auth.then_some(self.config.api_key.as_str()),
        };

        let request = self.authorize(self.client.post(url)).json(&body);
        self.send(request).await
    }

    async fn download(&self, url: &str) -> Result<DownloadedFile> {
        let url = self.join(url)?;
        info!(%url, "downloading cleaned file");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                warn!("download failed: {}", e);
                CleanerError::Http(e)
            })?;

        let status = response.status();
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str(&body)
                .ok()
                .and_then(|value| ErrorEnvelope::from_value(&value).describe())
                .unwrap_or_else(|| GENERIC_PROCESS_FAILURE.to_string());
            return Err(CleanerError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), ?filename, "download complete");
        Ok(DownloadedFile { filename, bytes })
    }

    fn resolve_url(&self, url: &str) -> Result<String> {
        Ok(self.join(url)?.into())
    }

    fn name(&self) -> &str {
        "http"
    }
}
