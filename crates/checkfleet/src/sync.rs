//! Pushing locally held checklists to the remote backend.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::checklist::VehicleChecklist;
use crate::credentials::CredentialSource;
use crate::error::{Error, Result};
use crate::store::{ChecklistStore, RemoteConnector};

/// Outcome of a completed sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Number of documents written to the remote backend.
    pub uploaded: usize,
}

/// Uploads checklists to the remote backend one at a time.
#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn RemoteConnector>,
}

impl SyncOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialSource>, connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            credentials,
            connector,
        }
    }

    /// Whether a sync can run with the current credentials.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.credentials.remote_config().is_configured()
    }

    /// Overwrite each checklist's remote document, in order.
    ///
    /// Stops at the first failed write. Writes before it stay applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotConfigured`] without writing anything if
    /// the remote credentials are unusable, and [`Error::SyncFailed`] naming
    /// the record if a write fails.
    pub async fn sync_all(&self, checklists: &[VehicleChecklist]) -> Result<SyncReport> {
        let remote = self.credentials.remote_config();
        if !remote.is_configured() {
            return Err(Error::BackendNotConfigured);
        }
        let store = self.connector.connect(&remote)?;

        info!("Syncing {} checklists to remote backend", checklists.len());
        for (index, checklist) in checklists.iter().enumerate() {
            if let Err(e) = store.put(checklist).await {
                warn!(
                    "Sync stopped at record {index} ({}) after {index} uploads",
                    checklist.id
                );
                return Err(Error::SyncFailed {
                    index,
                    id: checklist.id.clone(),
                    source: Box::new(e),
                });
            }
            debug!("Synced {} ({}/{})", checklist.id, index + 1, checklists.len());
        }

        info!("Sync complete: {} uploaded", checklists.len());
        Ok(SyncReport {
            uploaded: checklists.len(),
        })
    }

    /// Read everything from `local` and sync it.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read, plus everything
    /// [`sync_all`](Self::sync_all) returns.
    pub async fn push_local(&self, local: &dyn ChecklistStore) -> Result<SyncReport> {
        if !self.is_available() {
            return Err(Error::BackendNotConfigured);
        }
        let checklists = local.get_all().await?;
        self.sync_all(&checklists).await
    }
}
