//! Byte fetching for image references.
//!
//! The normalizer does not know where a reference lives. The host picks one
//! [`ByteFetcher`]: files on native platforms, HTTP on the web.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::Platform;
use crate::error::{Error, Result};

/// Raw bytes behind an image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    /// The image payload.
    pub bytes: Vec<u8>,
    /// MIME type, when the source reported or implied one.
    pub mime: Option<String>,
}

/// Fetches the bytes an image reference points at.
#[async_trait]
pub trait ByteFetcher: Send + Sync + std::fmt::Debug {
    /// Fetch the bytes for `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageResolution`] if the bytes cannot be read.
    async fn fetch(&self, reference: &str) -> Result<FetchedImage>;
}

/// Reads references as local file paths or `file://` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl ByteFetcher for FileFetcher {
    async fn fetch(&self, reference: &str) -> Result<FetchedImage> {
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        debug!("Reading image from {}", path.display());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::image_resolution(reference, e.to_string()))?;
        let mime = mime_guess::from_path(path).first_raw().map(str::to_string);

        Ok(FetchedImage { bytes, mime })
    }
}

/// Fetches references as URLs over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, reference: &str) -> Result<FetchedImage> {
        debug!("Fetching image from {reference}");
        let fail = |e: reqwest::Error| Error::image_resolution(reference, e.to_string());

        let response = self
            .client
            .get(reference)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?;

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(fail)?.to_vec();

        Ok(FetchedImage { bytes, mime })
    }
}

/// Pick the fetcher matching the host platform.
///
/// # Errors
///
/// Returns an error if the HTTP client for the web platform cannot be built.
pub fn fetcher_for(platform: Platform, timeout: Duration) -> Result<Arc<dyn ByteFetcher>> {
    Ok(match platform {
        Platform::Native => Arc::new(FileFetcher),
        Platform::Web => Arc::new(HttpFetcher::new(timeout)?),
    })
}
