//! Storage backends for checklists.
//!
//! Both backends implement [`ChecklistStore`]: the local key-value blob
//! ([`LocalStore`]) and the remote document collection ([`RemoteStore`]).
//! [`MemoryStore`] is an in-process stand-in with a call journal.

pub mod firestore;
pub mod local;
pub mod memory;
pub mod migrations;
pub mod remote;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;

use crate::checklist::VehicleChecklist;
use crate::config::RemoteConfig;
use crate::error::{BackendKind, Result};

pub use local::LocalStore;
pub use memory::{MemoryStore, StoreCall};
pub use remote::{FirestoreConnector, RemoteStore};

/// CRUD over checklists in one backend.
///
/// Failures to reach or decode the backend surface as
/// [`Error::BackendUnavailable`](crate::Error::BackendUnavailable).
#[async_trait]
pub trait ChecklistStore: Send + Sync + std::fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Every checklist in the backend, in no particular order.
    async fn get_all(&self) -> Result<Vec<VehicleChecklist>>;

    /// The checklist with `id`, or `None` if there is none.
    async fn get(&self, id: &str) -> Result<Option<VehicleChecklist>>;

    /// Insert or fully replace the checklist with the same id.
    async fn put(&self, checklist: &VehicleChecklist) -> Result<()>;

    /// Remove the checklist with `id`. Missing ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Opens a remote store for one set of credentials.
///
/// Called once per operation so credential changes apply immediately.
pub trait RemoteConnector: Send + Sync + std::fmt::Debug {
    /// Build a store talking to the backend `remote` describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be constructed.
    fn connect(&self, remote: &RemoteConfig) -> Result<Arc<dyn ChecklistStore>>;
}
