//! The checklist repository.
//!
//! Every operation first decides which backend is active by asking the
//! credential source for the current remote configuration. Well-formed
//! credentials select the remote store, anything else selects the local one.
//! The two are never combined and a failing backend is never swapped for the
//! other.

use std::sync::Arc;

use tracing::{debug, info};

use crate::checklist::VehicleChecklist;
use crate::credentials::CredentialSource;
use crate::error::{BackendKind, Result};
use crate::image::ImageNormalizer;
use crate::store::{ChecklistStore, RemoteConnector};
use crate::sync::SyncOrchestrator;

/// CRUD over checklists against whichever backend is active.
#[derive(Debug, Clone)]
pub struct ChecklistRepository {
    local: Arc<dyn ChecklistStore>,
    connector: Arc<dyn RemoteConnector>,
    credentials: Arc<dyn CredentialSource>,
    normalizer: ImageNormalizer,
}

impl ChecklistRepository {
    /// Create a repository.
    #[must_use]
    pub fn new(
        local: Arc<dyn ChecklistStore>,
        connector: Arc<dyn RemoteConnector>,
        credentials: Arc<dyn CredentialSource>,
        normalizer: ImageNormalizer,
    ) -> Self {
        Self {
            local,
            connector,
            credentials,
            normalizer,
        }
    }

    /// The backend the next operation would use.
    #[must_use]
    pub fn active_backend(&self) -> BackendKind {
        if self.credentials.remote_config().is_configured() {
            BackendKind::Remote
        } else {
            BackendKind::Local
        }
    }

    /// A sync orchestrator sharing this repository's credentials and connector.
    #[must_use]
    pub fn sync_orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(Arc::clone(&self.credentials), Arc::clone(&self.connector))
    }

    /// The local store, regardless of which backend is active.
    #[must_use]
    pub fn local_store(&self) -> &Arc<dyn ChecklistStore> {
        &self.local
    }

    fn active_store(&self) -> Result<Arc<dyn ChecklistStore>> {
        let remote = self.credentials.remote_config();
        if remote.is_configured() {
            debug!("Using remote backend (project {})", remote.project_id);
            self.connector.connect(&remote)
        } else {
            debug!("Using local backend");
            Ok(Arc::clone(&self.local))
        }
    }

    /// Every checklist in the active backend, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`](crate::Error::BackendUnavailable)
    /// if the active backend cannot be read.
    pub async fn get_all(&self) -> Result<Vec<VehicleChecklist>> {
        let store = self.active_store()?;
        let checklists = store.get_all().await?;
        debug!("Loaded {} checklists from {}", checklists.len(), store.kind());
        Ok(checklists)
    }

    /// The checklist with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the active backend cannot be read. A missing
    /// record is not an error.
    pub async fn get(&self, id: &str) -> Result<Option<VehicleChecklist>> {
        self.active_store()?.get(id).await
    }

    /// Insert or fully replace a checklist.
    ///
    /// Images are normalized first: at most two are kept and each is
    /// embedded if it can be fetched. Timestamps are left as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the active backend cannot be written. Image
    /// failures are not errors.
    pub async fn save(&self, checklist: &VehicleChecklist) -> Result<()> {
        let store = self.active_store()?;

        let mut record = checklist.clone();
        record.images = self.normalizer.normalize(&checklist.images).await;

        store.put(&record).await?;
        info!(
            "Saved checklist {} ({}) to {} backend",
            record.id,
            record.plate,
            store.kind()
        );
        Ok(())
    }

    /// Remove a checklist. Missing ids are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the active backend cannot be written.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let store = self.active_store()?;
        store.delete(id).await?;
        info!("Deleted checklist {id} from {} backend", store.kind());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::credentials::SharedCredentials;
    use crate::error::Error;
    use crate::fetch::{ByteFetcher, FetchedImage};
    use crate::store::{MemoryStore, StoreCall};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher for which every reference is unreachable.
    #[derive(Debug)]
    pub(crate) struct OfflineFetcher;

    #[async_trait]
    impl ByteFetcher for OfflineFetcher {
        async fn fetch(&self, reference: &str) -> Result<FetchedImage> {
            Err(Error::image_resolution(reference, "offline"))
        }
    }

    /// Connector handing out one shared in-memory remote store.
    #[derive(Debug)]
    pub(crate) struct FakeConnector {
        pub(crate) remote: Arc<MemoryStore>,
        pub(crate) connects: AtomicUsize,
    }

    impl FakeConnector {
        pub(crate) fn new(remote: MemoryStore) -> Self {
            Self {
                remote: Arc::new(remote),
                connects: AtomicUsize::new(0),
            }
        }
    }

    impl RemoteConnector for FakeConnector {
        fn connect(&self, remote: &RemoteConfig) -> Result<Arc<dyn ChecklistStore>> {
            assert!(remote.is_configured());
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.remote) as Arc<dyn ChecklistStore>)
        }
    }

    struct Harness {
        repo: ChecklistRepository,
        local: Arc<MemoryStore>,
        connector: Arc<FakeConnector>,
        credentials: SharedCredentials,
    }

    fn harness(remote: RemoteConfig) -> Harness {
        let local = Arc::new(MemoryStore::new(BackendKind::Local));
        let connector = Arc::new(FakeConnector::new(MemoryStore::new(BackendKind::Remote)));
        let credentials = SharedCredentials::new(remote);
        let repo = ChecklistRepository::new(
            Arc::clone(&local) as Arc<dyn ChecklistStore>,
            Arc::clone(&connector) as Arc<dyn RemoteConnector>,
            Arc::new(credentials.clone()),
            ImageNormalizer::new(Arc::new(OfflineFetcher)),
        );
        Harness {
            repo,
            local,
            connector,
            credentials,
        }
    }

    fn checklist(id: &str) -> VehicleChecklist {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut c = VehicleChecklist::new(id, "user-1", now);
        c.plate = "ABC1D23".to_string();
        c.driver = "Maria Souza".to_string();
        c.km = "50000".to_string();
        c
    }

    fn configured() -> RemoteConfig {
        RemoteConfig::with_credentials("fleet-prod", "AIzaSyD-key")
    }

    #[tokio::test]
    async fn test_save_then_get_returns_equal_record() {
        let h = harness(RemoteConfig::default());
        let mut c = checklist("1");
        c.images = vec![
            "data:image/jpeg;base64,AAAA".to_string(),
            "data:image/png;base64,BBBB".to_string(),
            "data:image/png;base64,CCCC".to_string(),
        ];

        h.repo.save(&c).await.unwrap();
        let stored = h.repo.get("1").await.unwrap().unwrap();

        assert_eq!(stored.images, c.images[..2].to_vec());
        let mut expected = c.clone();
        expected.images.truncate(2);
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_save_keeps_timestamps() {
        let h = harness(RemoteConfig::default());
        let mut c = checklist("1");
        c.updated_at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();

        h.repo.save(&c).await.unwrap();
        let stored = h.repo.get("1").await.unwrap().unwrap();

        assert_eq!(stored.created_at, c.created_at);
        assert_eq!(stored.updated_at, c.updated_at);
    }

    #[tokio::test]
    async fn test_unresolvable_image_is_kept_and_save_succeeds() {
        let h = harness(RemoteConfig::default());
        let mut c = checklist("1");
        c.images = vec!["file:///sdcard/front.jpg".to_string()];

        h.repo.save(&c).await.unwrap();
        let stored = h.repo.get("1").await.unwrap().unwrap();

        assert_eq!(stored.unresolved_images(), vec!["file:///sdcard/front.jpg"]);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let h = harness(RemoteConfig::default());
        let mut c = checklist("1");
        c.general_notes = "first".to_string();
        h.repo.save(&c).await.unwrap();

        c.general_notes = String::new();
        c.plate = "XYZ9K87".to_string();
        h.repo.save(&c).await.unwrap();

        let all = h.repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].general_notes, "");
        assert_eq!(all[0].plate, "XYZ9K87");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_absent() {
        let h = harness(RemoteConfig::default());
        h.repo.save(&checklist("1")).await.unwrap();

        h.repo.delete("1").await.unwrap();
        h.repo.delete("1").await.unwrap();

        assert_eq!(h.repo.get("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_all_counts_saved_minus_deleted() {
        let h = harness(RemoteConfig::default());
        for i in 0..5 {
            h.repo.save(&checklist(&i.to_string())).await.unwrap();
        }
        for i in 0..2 {
            h.repo.delete(&i.to_string()).await.unwrap();
        }

        assert_eq!(h.repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_configured_credentials_target_remote() {
        let h = harness(configured());

        h.repo.save(&checklist("1")).await.unwrap();

        assert_eq!(h.repo.active_backend(), BackendKind::Remote);
        assert_eq!(
            h.connector.remote.journal(),
            vec![StoreCall::Put("1".to_string())]
        );
        assert!(h.local.journal().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_credentials_target_local() {
        let cases = [
            RemoteConfig::default(),
            RemoteConfig::with_credentials("", ""),
            RemoteConfig::with_credentials("   ", "AIzaSyD-key"),
            RemoteConfig::with_credentials("fleet-prod", "<your-api-key>"),
            RemoteConfig::with_credentials("<project-id>", "AIzaSyD-key"),
        ];

        for remote in cases {
            let h = harness(remote);
            h.repo.save(&checklist("1")).await.unwrap();

            assert_eq!(h.repo.active_backend(), BackendKind::Local);
            assert_eq!(h.local.journal(), vec![StoreCall::Put("1".to_string())]);
            assert!(h.connector.remote.journal().is_empty());
            assert_eq!(h.connector.connects.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_selection_is_reevaluated_every_call() {
        let h = harness(RemoteConfig::default());
        h.repo.save(&checklist("local-1")).await.unwrap();

        h.credentials.replace(configured());
        h.repo.save(&checklist("remote-1")).await.unwrap();

        h.credentials.clear();
        let visible = h.repo.get_all().await.unwrap();

        assert_eq!(h.local.ids(), vec!["local-1".to_string()]);
        assert_eq!(h.connector.remote.ids(), vec!["remote-1".to_string()]);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "local-1");
        assert_eq!(h.connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_does_not_fall_back_to_local() {
        let h = harness(configured());
        h.connector.remote.set_unavailable(true);

        let err = h.repo.save(&checklist("1")).await.unwrap_err();

        assert!(err.is_backend_unavailable());
        assert!(err.to_string().contains("remote"));
        assert!(h.local.journal().is_empty());
        assert!(h.repo.get_all().await.is_err());
    }

    #[tokio::test]
    async fn test_local_failure_propagates() {
        let h = harness(RemoteConfig::default());
        h.local.set_unavailable(true);

        assert!(h.repo.get("1").await.unwrap_err().is_backend_unavailable());
        assert!(h.repo.delete("1").await.unwrap_err().is_backend_unavailable());
    }
}
