//! Local backend: the whole checklist collection as one JSON blob.
//!
//! The blob lives in a `SQLite` key-value table under a fixed namespace key.
//! Every write reads the full array, changes it in memory and writes it
//! back. Each cycle runs on the blocking pool while holding the connection
//! lock, so cycles are exclusive within the process and never stall the
//! async workers. Other processes sharing the file are not guarded.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::checklist::VehicleChecklist;
use crate::error::{BackendKind, Error, Result};

use super::{migrations, ChecklistStore};

/// On-device checklist storage.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the database file.
    path: PathBuf,
    /// Key the checklist array is stored under.
    namespace_key: String,
    /// Database connection; holding the lock spans a whole read-modify-write.
    conn: Arc<Mutex<Connection>>,
}

fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::backend(BackendKind::Local, err.to_string())
}

fn read_blob(conn: &Connection, key: &str) -> Result<Vec<VehicleChecklist>> {
    let blob: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .map_err(unavailable)?;

    match blob {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| unavailable(format!("corrupt checklist blob: {e}"))),
    }
}

fn write_blob(conn: &Connection, key: &str, checklists: &[VehicleChecklist]) -> Result<()> {
    let json = serde_json::to_string(checklists).map_err(unavailable)?;
    conn.execute(
        r"
        INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        ",
        (key, &json),
    )
    .map_err(unavailable)?;
    debug!(
        "Wrote {} checklists ({} bytes) under {key}",
        checklists.len(),
        json.len()
    );
    Ok(())
}

impl LocalStore {
    /// Open or create a local store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>, namespace_key: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(unavailable)?;
        migrations::initialize_schema(&conn)?;

        info!("Local store opened at {}", path.display());
        Ok(Self {
            path,
            namespace_key: namespace_key.into(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(namespace_key: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            namespace_key: namespace_key.into(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the namespace key the blob is stored under.
    #[must_use]
    pub fn namespace_key(&self) -> &str {
        &self.namespace_key
    }

    /// Run `f` against the locked connection on the blocking pool.
    async fn with_blob<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let key = self.namespace_key.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn, &key)
        })
        .await
        .map_err(|e| unavailable(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl ChecklistStore for LocalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn get_all(&self) -> Result<Vec<VehicleChecklist>> {
        self.with_blob(read_blob).await
    }

    async fn get(&self, id: &str) -> Result<Option<VehicleChecklist>> {
        let id = id.to_string();
        self.with_blob(move |conn, key| {
            Ok(read_blob(conn, key)?.into_iter().find(|c| c.id == id))
        })
        .await
    }

    async fn put(&self, checklist: &VehicleChecklist) -> Result<()> {
        let checklist = checklist.clone();
        self.with_blob(move |conn, key| {
            let mut checklists = read_blob(conn, key)?;
            match checklists.iter_mut().find(|c| c.id == checklist.id) {
                Some(existing) => *existing = checklist,
                None => checklists.push(checklist),
            }
            write_blob(conn, key, &checklists)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_blob(move |conn, key| {
            let mut checklists = read_blob(conn, key)?;
            checklists.retain(|c| c.id != id);
            write_blob(conn, key, &checklists)
        })
        .await
    }
}
