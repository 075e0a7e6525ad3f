//! In-process checklist store.
//!
//! Records every call in a journal and can be told to fail, which makes it
//! the substitute backend for tests of backend selection and sync.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::checklist::VehicleChecklist;
use crate::error::{BackendKind, Error, Result};

use super::ChecklistStore;

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_all()`
    GetAll,
    /// `get(id)`
    Get(String),
    /// `put(checklist)` with the checklist's id.
    Put(String),
    /// `delete(id)`
    Delete(String),
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, VehicleChecklist>,
    journal: Vec<StoreCall>,
    puts: usize,
    fail_put_at: Option<usize>,
    unavailable: bool,
}

/// A checklist store held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    kind: BackendKind,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store reporting itself as `kind`.
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            state: Mutex::new(State::default()),
        }
    }

    /// Make the `n`th `put` (1-based, counted from creation) fail.
    #[must_use]
    pub fn failing_put_at(self, n: usize) -> Self {
        self.lock().fail_put_at = Some(n);
        self
    }

    /// Make every call fail until [`set_unavailable(false)`](Self::set_unavailable).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    /// Ids currently stored, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.lock().records.keys().cloned().collect()
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: StoreCall) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.journal.push(call);
        if state.unavailable {
            return Err(Error::backend(self.kind, "store marked unavailable"));
        }
        Ok(state)
    }
}

#[async_trait]
impl ChecklistStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn get_all(&self) -> Result<Vec<VehicleChecklist>> {
        let state = self.begin(StoreCall::GetAll)?;
        Ok(state.records.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<VehicleChecklist>> {
        let state = self.begin(StoreCall::Get(id.to_string()))?;
        Ok(state.records.get(id).cloned())
    }

    async fn put(&self, checklist: &VehicleChecklist) -> Result<()> {
        let mut state = self.begin(StoreCall::Put(checklist.id.clone()))?;
        state.puts += 1;
        if state.fail_put_at == Some(state.puts) {
            return Err(Error::backend(
                self.kind,
                format!("injected failure on put #{}", state.puts),
            ));
        }
        state
            .records
            .insert(checklist.id.clone(), checklist.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.begin(StoreCall::Delete(id.to_string()))?;
        state.records.remove(id);
        Ok(())
    }
}
