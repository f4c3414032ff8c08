// crates/db/src/handle.rs
//! Process-wide cached handle to the live store.
//!
//! The handle is explicitly owned and explicitly invalidated — never an
//! ambient singleton — so the atomic-swap invariant of the rebuild stays
//! auditable. Invalidation clears the cached [`Database`] only: clones
//! acquired earlier keep their pool (and with it the old file) alive until
//! the operations holding them finish.

use crate::{Database, DbResult};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;

/// Guard proving this task is the only rebuild in flight.
pub struct RebuildGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

pub struct StoreHandle {
    path: PathBuf,
    db: RwLock<Option<Database>>,
    rebuild_gate: Mutex<()>,
}

impl StoreHandle {
    /// No I/O happens here; the store opens lazily on first acquire.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: RwLock::new(None),
            rebuild_gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached handle to the live store, opening (and creating) it on
    /// first use.
    pub async fn acquire(&self) -> DbResult<Database> {
        if let Some(db) = self.db.read().await.as_ref() {
            return Ok(db.clone());
        }

        let mut slot = self.db.write().await;
        // Another task may have opened the store while we waited
        if let Some(db) = slot.as_ref() {
            return Ok(db.clone());
        }
        let db = Database::new(&self.path).await?;
        *slot = Some(db.clone());
        Ok(db)
    }

    /// Like [`acquire`](Self::acquire), but never creates a store: returns
    /// `None` when nothing is cached and no file exists on disk. The
    /// rebuild uses this to read body scans out of the previous live store
    /// without conjuring an empty one.
    pub async fn acquire_existing(&self) -> DbResult<Option<Database>> {
        if let Some(db) = self.db.read().await.as_ref() {
            return Ok(Some(db.clone()));
        }
        if !self.path.exists() {
            return Ok(None);
        }
        self.acquire().await.map(Some)
    }

    /// Drop the cached handle so no new acquirer sees the old store.
    pub async fn invalidate(&self) {
        let mut slot = self.db.write().await;
        if slot.take().is_some() {
            debug!("live store handle invalidated");
        }
    }

    /// Publish a freshly opened store as the live one.
    pub async fn install(&self, db: Database) {
        *self.db.write().await = Some(db);
    }

    /// Claim the rebuild gate. `None` means another rebuild is in flight;
    /// callers must reject, not queue.
    pub fn try_begin_rebuild(&self) -> Option<RebuildGuard<'_>> {
        self.rebuild_gate.try_lock().ok().map(RebuildGuard)
    }
}
