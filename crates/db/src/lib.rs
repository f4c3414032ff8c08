// crates/db/src/lib.rs
// SQLite store for the workout-sheet mirror: schema, reconciler, rebuild
// orchestrator, and analytics queries.

pub mod body_scans;
pub mod handle;
mod migrations;
pub mod queries;
pub mod rebuild;
pub mod sync;

pub use handle::StoreHandle;
pub use rebuild::{rebuild, RebuildError, RebuildMetadata};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("Failed to create store directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Store handle wrapping a SQLite connection pool.
///
/// Cloning is cheap (pool handle); a clone acquired before the live store
/// is swapped keeps reading the old file until it is dropped.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the store at the given path and run migrations.
    pub async fn new(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            db_path: path.to_owned(),
        };
        db.run_migrations().await?;

        info!("Store opened at {}", path.display());
        Ok(db)
    }

    /// Create an in-memory store (for testing).
    ///
    /// Uses `shared_cache(true)` so all pool connections share the same
    /// in-memory database; without it each connection gets its own empty
    /// database.
    pub async fn new_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Self {
            pool,
            db_path: PathBuf::new(),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open the store at the default location:
    /// `<cache_dir>/sheetlift/sheetlift.db`.
    pub async fn open_default() -> DbResult<Self> {
        let path = default_db_path()?;
        Self::new(&path).await
    }

    /// Run all inline migrations.
    ///
    /// A `_migrations` table tracks which versions have been applied, so
    /// non-idempotent statements only execute once.
    async fn run_migrations(&self) -> DbResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;
        let current_version = row.0 as usize;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = i + 1; // 1-based
            if version > current_version {
                sqlx::query(migration).execute(&self.pool).await?;
                sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                    .bind(version as i64)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Path of the store file. Empty for in-memory stores.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Close the pool, folding all WAL state into the main file. Used by
    /// the rebuild orchestrator before committing the swap.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Returns the default store path: `<cache_dir>/sheetlift/sheetlift.db`.
pub fn default_db_path() -> DbResult<PathBuf> {
    sheetlift_core::paths::db_path().ok_or(DbError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_database() {
        let db = Database::new_in_memory()
            .await
            .expect("should create in-memory store");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(db.pool())
            .await
            .expect("sessions table should exist");
        assert_eq!(count.0, 0);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM body_scans")
            .fetch_one(db.pool())
            .await
            .expect("body_scans table should exist");
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = Database::new_in_memory()
            .await
            .expect("first open should succeed");

        db.run_migrations()
            .await
            .expect("second migration run should succeed");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM log_rows")
            .fetch_one(db.pool())
            .await
            .expect("log_rows table should still exist");
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_file_based_database() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let db_path = tmp.path().join("test.db");

        let db = Database::new(&db_path)
            .await
            .expect("should create file-based store");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exercises")
            .fetch_one(db.pool())
            .await
            .expect("exercises table should exist");
        assert_eq!(count.0, 0);

        assert!(db_path.exists(), "store file should be created on disk");
    }

    #[tokio::test]
    async fn test_default_db_path() {
        let path = default_db_path().expect("should resolve default path");
        assert!(path.to_string_lossy().contains("sheetlift"));
        assert!(path.to_string_lossy().ends_with("sheetlift.db"));
    }
}
