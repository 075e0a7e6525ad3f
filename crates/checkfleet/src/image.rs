//! Image normalization.
//!
//! Checklists travel between devices, so photos are stored as `data:` URLs
//! rather than paths that only exist on the phone that took them. The
//! normalizer turns whatever the form collected into that embedded form,
//! keeping at most [`MAX_IMAGES`] entries.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use crate::checklist::MAX_IMAGES;
use crate::error::{Error, Result};
use crate::fetch::ByteFetcher;

/// MIME type used when the source gives no usable image type.
pub const DEFAULT_MIME: &str = "image/jpeg";

/// What kind of reference a stored image string is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef {
    /// Self-contained `data:` URL.
    Embedded,
    /// Path or `file://` URI on the device.
    LocalFile,
    /// `http(s)://` or `blob:` URL.
    RemoteUrl,
}

impl ImageRef {
    /// Classify a stored image string.
    #[must_use]
    pub fn classify(reference: &str) -> Self {
        if reference.starts_with("data:") {
            Self::Embedded
        } else if reference.starts_with("http://")
            || reference.starts_with("https://")
            || reference.starts_with("blob:")
        {
            Self::RemoteUrl
        } else {
            Self::LocalFile
        }
    }

    /// Whether the reference is already embedded data.
    #[must_use]
    pub fn is_embedded(self) -> bool {
        self == Self::Embedded
    }
}

/// Encode bytes as a base64 `data:` URL.
///
/// `mime` is used when it names an image type (parameters are dropped);
/// anything else falls back to [`DEFAULT_MIME`].
#[must_use]
pub fn embed(bytes: &[u8], mime: Option<&str>) -> String {
    let mime = mime
        .and_then(|m| m.split(';').next())
        .map(str::trim)
        .filter(|m| m.starts_with("image/"))
        .unwrap_or(DEFAULT_MIME);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Converts image references into embedded data.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    fetcher: Arc<dyn ByteFetcher>,
}

impl ImageNormalizer {
    /// Create a normalizer resolving references through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ByteFetcher>) -> Self {
        Self { fetcher }
    }

    /// Normalize the images of a checklist.
    ///
    /// Only the first [`MAX_IMAGES`] entries are looked at; empty strings
    /// among them are dropped. Embedded entries pass through unchanged.
    /// Anything else is fetched and embedded, and if that fails the original
    /// reference is kept so one bad photo never blocks a save.
    pub async fn normalize(&self, images: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(MAX_IMAGES.min(images.len()));

        for reference in images.iter().take(MAX_IMAGES) {
            if reference.is_empty() {
                continue;
            }
            if ImageRef::classify(reference).is_embedded() {
                out.push(reference.clone());
                continue;
            }

            match self.resolve(reference).await {
                Ok(data_url) => {
                    debug!("Embedded image {reference} ({} chars)", data_url.len());
                    out.push(data_url);
                }
                Err(e) => {
                    warn!("{e}; keeping original reference");
                    out.push(reference.clone());
                }
            }
        }

        out
    }

    async fn resolve(&self, reference: &str) -> Result<String> {
        let fetched = self.fetcher.fetch(reference).await?;
        if fetched.bytes.is_empty() {
            return Err(Error::image_resolution(reference, "empty payload"));
        }
        Ok(embed(&fetched.bytes, fetched.mime.as_deref()))
    }
}
