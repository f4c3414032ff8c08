// crates/db/src/rebuild.rs
//! Rebuild orchestrator: full cache reconstruction from the remote source.
//!
//! The pipeline builds an entirely new store at a temporary path, imports
//! every session tab into it, carries body scans forward from the previous
//! live store, and only then — as the single commit point — invalidates
//! the cached handle and renames the temporary store over the live path.
//! Any failure before that point leaves the live store and its cached
//! handle completely untouched; the temporary store stays on disk for
//! inspection and is removed by the next attempt.

use crate::handle::StoreHandle;
use crate::{Database, DbError, DbResult};
use chrono::Utc;
use serde::Serialize;
use sheetlift_core::parser::build_entry;
use sheetlift_core::source::SheetSource;
use sheetlift_core::tabs::filter_session_tabs;
use sheetlift_core::types::{EntryInput, RebuildReport, SessionInput};
use sheetlift_core::SourceError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RebuildError {
    /// No remote tab matched the weekly-session naming convention. Usually
    /// means the convention drifted upstream, not an outage.
    #[error("no session tabs found in the remote document")]
    NoSessionTabs,

    #[error("a rebuild is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("failed to commit rebuilt store: {source}")]
    Swap {
        #[source]
        source: std::io::Error,
    },

    /// The temporary store vanished between build and swap. Unreachable
    /// when the build steps succeeded.
    #[error("rebuilt store missing at commit time")]
    MissingRebuildStore,
}

/// Freshness bookkeeping written into every rebuilt store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildMetadata {
    pub last_rebuild_at: i64,
    pub last_rebuild_duration_ms: i64,
    pub sessions_imported: i64,
    pub rows_imported: i64,
}

/// Rebuild the live store from the remote source.
///
/// Only one rebuild may run at a time; a concurrent call is rejected with
/// [`RebuildError::AlreadyRunning`]. Readers holding a previously acquired
/// handle keep seeing the old store until their operation completes; new
/// acquirers after the swap see the new one. Never an intermediate state.
pub async fn rebuild(
    source: &dyn SheetSource,
    store: &StoreHandle,
) -> Result<RebuildReport, RebuildError> {
    let _guard = store
        .try_begin_rebuild()
        .ok_or(RebuildError::AlreadyRunning)?;
    let started = std::time::Instant::now();

    // Step 1: enumerate and filter session tabs
    let names = source.list_tab_names().await?;
    let tabs = filter_session_tabs(&names);
    if tabs.is_empty() {
        warn!(tabs_seen = names.len(), "no tab matched the session naming convention");
        return Err(RebuildError::NoSessionTabs);
    }
    info!(sessions = tabs.len(), "rebuilding store from remote source");

    // Step 2: fresh store at the temporary path, clearing any stale one
    let tmp_path = rebuild_path(store.path());
    remove_store_files(&tmp_path).map_err(|source| RebuildError::Swap { source })?;
    let fresh = Database::new(&tmp_path).await?;

    // Step 3: import every tab in chronological order
    let mut sessions_imported = 0i64;
    let mut rows_imported = 0i64;
    let mut rows_with_logs = 0i64;
    for tab in &tabs {
        let raw_rows = source.fetch_rows(&tab.tab_name).await?;
        let entries: Vec<EntryInput> = raw_rows.iter().map(|row| build_entry(row)).collect();
        rows_imported += entries.len() as i64;
        rows_with_logs += entries.iter().filter(|e| e.has_log()).count() as i64;

        let input = SessionInput {
            tab_name: tab.tab_name.clone(),
            day_label: tab.day_label.clone(),
            session_date: Some(tab.date),
            entries,
        };
        fresh.sync_session(&input, true).await?;
        sessions_imported += 1;
        debug!(tab = %tab.tab_name, "tab imported");
    }

    // Step 4: carry body scans forward from the previous live store
    if let Some(live) = store.acquire_existing().await? {
        let copied = live.copy_body_scans_into(&fresh).await?;
        debug!(copied, "body scans carried forward");
    }

    let summary = fresh.store_summary().await?;
    fresh
        .record_rebuild(&RebuildMetadata {
            last_rebuild_at: Utc::now().timestamp(),
            last_rebuild_duration_ms: started.elapsed().as_millis() as i64,
            sessions_imported,
            rows_imported,
        })
        .await?;
    fresh.close().await;

    // Steps 5–6: the commit point. Invalidate first so no new acquirer can
    // observe the store mid-swap.
    store.invalidate().await;
    if !tmp_path.exists() {
        return Err(RebuildError::MissingRebuildStore);
    }
    remove_store_files(store.path()).map_err(|source| RebuildError::Swap { source })?;
    std::fs::rename(&tmp_path, store.path()).map_err(|source| RebuildError::Swap { source })?;

    // Step 7: reopen through the handle and report
    store.acquire().await?;
    info!(
        sessions = sessions_imported,
        rows = rows_imported,
        elapsed_ms = started.elapsed().as_millis() as i64,
        "rebuild committed"
    );

    Ok(RebuildReport {
        sessions_scanned: tabs.len() as i64,
        sessions_imported,
        rows_imported,
        rows_with_logs,
        total_exercises: summary.total_exercises,
        total_sessions: summary.total_sessions,
        total_log_rows: summary.total_log_rows,
    })
}

impl Database {
    pub(crate) async fn record_rebuild(&self, meta: &RebuildMetadata) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sync_metadata (id, last_rebuild_at, last_rebuild_duration_ms, sessions_imported, rows_imported)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
               last_rebuild_at = excluded.last_rebuild_at,
               last_rebuild_duration_ms = excluded.last_rebuild_duration_ms,
               sessions_imported = excluded.sessions_imported,
               rows_imported = excluded.rows_imported",
        )
        .bind(meta.last_rebuild_at)
        .bind(meta.last_rebuild_duration_ms)
        .bind(meta.sessions_imported)
        .bind(meta.rows_imported)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// When (and how big) the last committed rebuild was, if any.
    pub async fn rebuild_metadata(&self) -> DbResult<Option<RebuildMetadata>> {
        let row: Option<(Option<i64>, Option<i64>, i64, i64)> = sqlx::query_as(
            "SELECT last_rebuild_at, last_rebuild_duration_ms, sessions_imported, rows_imported
             FROM sync_metadata WHERE id = 1",
        )
        .fetch_optional(self.pool())
        .await?;

        Ok(row.and_then(|(at, duration, sessions, rows)| {
            Some(RebuildMetadata {
                last_rebuild_at: at?,
                last_rebuild_duration_ms: duration.unwrap_or(0),
                sessions_imported: sessions,
                rows_imported: rows,
            })
        }))
    }
}

/// Temporary-store path for a rebuild: `<live>.rebuild` in the same
/// directory, so the final rename never crosses a filesystem boundary.
fn rebuild_path(live: &Path) -> PathBuf {
    let mut os = live.as_os_str().to_owned();
    os.push(".rebuild");
    PathBuf::from(os)
}

/// Remove a store file and its WAL sidecars, tolerating absence.
fn remove_store_files(path: &Path) -> std::io::Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut os = path.as_os_str().to_owned();
        os.push(suffix);
        match std::fs::remove_file(PathBuf::from(os)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rebuild_path_stays_in_directory() {
        let path = rebuild_path(Path::new("/data/sheetlift.db"));
        assert_eq!(path, Path::new("/data/sheetlift.db.rebuild"));
    }

    #[test]
    fn test_remove_store_files_tolerates_absence() {
        let tmp = tempfile::tempdir().unwrap();
        remove_store_files(&tmp.path().join("nothing.db")).unwrap();
    }

    #[test]
    fn test_remove_store_files_removes_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("store.db");
        for suffix in ["", "-wal", "-shm"] {
            std::fs::write(
                tmp.path().join(format!("store.db{suffix}")),
                b"x",
            )
            .unwrap();
        }
        remove_store_files(&base).unwrap();
        assert!(tmp.path().read_dir().unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_metadata_roundtrip() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.rebuild_metadata().await.unwrap().is_none());

        let meta = RebuildMetadata {
            last_rebuild_at: 1_700_000_000,
            last_rebuild_duration_ms: 420,
            sessions_imported: 3,
            rows_imported: 24,
        };
        db.record_rebuild(&meta).await.unwrap();
        assert_eq!(db.rebuild_metadata().await.unwrap(), Some(meta));

        let newer = RebuildMetadata {
            last_rebuild_at: 1_700_000_100,
            ..meta
        };
        db.record_rebuild(&newer).await.unwrap();
        assert_eq!(db.rebuild_metadata().await.unwrap(), Some(newer));
    }
}
