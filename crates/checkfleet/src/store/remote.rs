//! Remote backend: one Firestore document per checklist.
//!
//! Talks to the Firestore REST API directly. Writes are `PATCH` without an
//! update mask, which replaces the whole document.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::checklist::VehicleChecklist;
use crate::config::RemoteConfig;
use crate::error::{BackendKind, Error, Result};

use super::{firestore, ChecklistStore, RemoteConnector};

fn unavailable(message: impl Into<String>) -> Error {
    Error::backend(BackendKind::Remote, message)
}

/// One page of a collection listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListPage {
    documents: Vec<Value>,
    next_page_token: Option<String>,
}

/// Checklist storage in a remote document collection.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    collection_url: Url,
    api_key: String,
    page_size: u32,
}

impl RemoteStore {
    /// Create a store for the collection `remote` points at.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotConfigured`] if the credentials are unusable
    /// and [`Error::ConfigValidation`] if the base URL cannot be parsed.
    pub fn new(client: reqwest::Client, remote: &RemoteConfig) -> Result<Self> {
        if !remote.is_configured() {
            return Err(Error::BackendNotConfigured);
        }

        let mut collection_url =
            Url::parse(&remote.base_url).map_err(|e| Error::ConfigValidation {
                message: format!("remote.base_url '{}': {e}", remote.base_url),
            })?;
        collection_url
            .path_segments_mut()
            .map_err(|()| Error::ConfigValidation {
                message: format!("remote.base_url '{}' cannot hold a path", remote.base_url),
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                remote.project_id.trim(),
                "databases",
                "(default)",
                "documents",
                remote.collection.as_str(),
            ]);

        Ok(Self {
            client,
            collection_url,
            api_key: remote.api_key.trim().to_string(),
            page_size: remote.page_size,
        })
    }

    fn document_url(&self, id: &str) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        request
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = body.lines().next().unwrap_or_default();
        Err(unavailable(format!("HTTP {status}: {detail}")))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| unavailable(format!("unreadable response: {e}")))
    }
}

#[async_trait]
impl ChecklistStore for RemoteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn get_all(&self) -> Result<Vec<VehicleChecklist>> {
        let mut checklists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url.clone())
                .query(&[("pageSize", self.page_size.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = Self::check(self.send(request).await?).await?;
            let page: ListPage = Self::read_json(response).await?;
            debug!("Listed {} remote documents", page.documents.len());

            for document in &page.documents {
                checklists.push(firestore::from_document(document)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(checklists)
    }

    async fn get(&self, id: &str) -> Result<Option<VehicleChecklist>> {
        let response = self.send(self.client.get(self.document_url(id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Value = Self::read_json(Self::check(response).await?).await?;
        firestore::from_document(&document).map(Some)
    }

    async fn put(&self, checklist: &VehicleChecklist) -> Result<()> {
        let body = firestore::to_document(checklist)?;
        let request = self.client.patch(self.document_url(&checklist.id)).json(&body);
        Self::check(self.send(request).await?).await?;
        info!("Wrote remote document {}", checklist.id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self.send(self.client.delete(self.document_url(id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Remote document {id} already absent");
            return Ok(());
        }
        Self::check(response).await?;
        info!("Deleted remote document {id}");
        Ok(())
    }
}

/// Builds [`RemoteStore`]s sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct FirestoreConnector {
    client: reqwest::Client,
}

impl FirestoreConnector {
    /// Create a connector whose requests give up after `timeout`.
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

    /// Create a connector around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl RemoteConnector for FirestoreConnector {
    fn connect(&self, remote: &RemoteConfig) -> Result<Arc<dyn ChecklistStore>> {
        Ok(Arc::new(RemoteStore::new(self.client.clone(), remote)?))
    }
}
