// crates/db/src/sync.rs
//! Reconciler: upserts one session's parsed entries into the store.
//!
//! Each call runs in a single transaction — a failure rolls back this
//! session only, never sessions committed earlier in the same rebuild
//! pass. Idempotent: re-applying the same batch leaves the stored state
//! observably unchanged (value-aware `updated_at`, not write-aware).

use crate::{Database, DbResult};
use chrono::Utc;
use sheetlift_core::types::{canonical_name, EntryInput, SessionInput, SyncSummary};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

impl Database {
    /// Upsert a session and its entries, keyed by `(tab_name, day_label)`
    /// and `(session_id, ordinal)`.
    ///
    /// Blank entries (all prescribed fields empty) are skipped unless
    /// `include_blank_rows`; rebuilds pass `true` so that source-row
    /// ordinals stay continuous for later edits.
    pub async fn sync_session(
        &self,
        input: &SessionInput,
        include_blank_rows: bool,
    ) -> DbResult<SyncSummary> {
        let now = Utc::now().timestamp();
        let session_date = input
            .session_date
            .unwrap_or_else(|| Utc::now().date_naive())
            .to_string();

        let mut tx = self.pool().begin().await?;

        let session_id =
            upsert_session(&mut tx, &input.tab_name, &input.day_label, &session_date, now).await?;

        let mut skipped = 0usize;
        for (ordinal, entry) in input.entries.iter().enumerate() {
            if entry.is_blank() && !include_blank_rows {
                skipped += 1;
                continue;
            }

            let exercise_id = if entry.exercise.is_empty() {
                None
            } else {
                Some(resolve_exercise(&mut tx, &entry.exercise, now).await?)
            };

            upsert_log_row(&mut tx, session_id, ordinal as i64, entry, exercise_id, now).await?;
        }

        tx.commit().await?;

        debug!(
            tab = %input.tab_name,
            entries = input.entries.len(),
            skipped,
            "session synced"
        );

        self.store_summary().await
    }
}

/// Upsert the session row; returns its id. The stored date and
/// `updated_at` only move when the date actually changed.
async fn upsert_session(
    tx: &mut Transaction<'_, Sqlite>,
    tab_name: &str,
    day_label: &str,
    session_date: &str,
    now: i64,
) -> DbResult<i64> {
    let existing: Option<(i64, String)> =
        sqlx::query_as("SELECT id, session_date FROM sessions WHERE tab_name = ?1 AND day_label = ?2")
            .bind(tab_name)
            .bind(day_label)
            .fetch_optional(&mut **tx)
            .await?;

    match existing {
        Some((id, stored_date)) => {
            if stored_date != session_date {
                sqlx::query("UPDATE sessions SET session_date = ?1, updated_at = ?2 WHERE id = ?3")
                    .bind(session_date)
                    .bind(now)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
            }
            Ok(id)
        }
        None => {
            let result = sqlx::query(
                "INSERT INTO sessions (tab_name, day_label, session_date, origin, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'remote', ?4, ?4)",
            )
            .bind(tab_name)
            .bind(day_label)
            .bind(session_date)
            .bind(now)
            .execute(&mut **tx)
            .await?;
            Ok(result.last_insert_rowid())
        }
    }
}

/// Resolve a raw exercise name to its canonical identity, creating the
/// exercise on first sighting and recording unseen raw spellings as
/// aliases.
async fn resolve_exercise(
    tx: &mut Transaction<'_, Sqlite>,
    raw: &str,
    now: i64,
) -> DbResult<i64> {
    let canonical = canonical_name(raw);

    let existing: Option<(i64, String)> =
        sqlx::query_as("SELECT id, aliases FROM exercises WHERE canonical_name = ?1")
            .bind(&canonical)
            .fetch_optional(&mut **tx)
            .await?;

    match existing {
        Some((id, aliases_json)) => {
            let mut aliases: Vec<String> =
                serde_json::from_str(&aliases_json).unwrap_or_default();
            if !aliases.iter().any(|a| a == raw) {
                aliases.push(raw.to_string());
                let aliases_json =
                    serde_json::to_string(&aliases).unwrap_or_else(|_| "[]".to_string());
                sqlx::query("UPDATE exercises SET aliases = ?1 WHERE id = ?2")
                    .bind(aliases_json)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
            }
            Ok(id)
        }
        None => {
            let aliases_json = serde_json::to_string(&[raw]).unwrap_or_else(|_| "[]".to_string());
            let result = sqlx::query(
                "INSERT INTO exercises (canonical_name, aliases, first_seen_at) VALUES (?1, ?2, ?3)",
            )
            .bind(&canonical)
            .bind(aliases_json)
            .bind(now)
            .execute(&mut **tx)
            .await?;
            Ok(result.last_insert_rowid())
        }
    }
}

/// Row snapshot used for value-aware change detection.
type StoredRow = (
    i64,            // id
    String,         // block_label
    Option<i64>,    // exercise_id
    String,         // sets
    String,         // reps
    String,         // load
    String,         // rest
    String,         // notes
    String,         // log_text
    Option<f64>,    // rating
    String,         // log_note
);

/// Upsert one log row keyed by `(session_id, ordinal)`. An existing row
/// with identical values is left untouched so `updated_at` only rotates
/// on real change.
async fn upsert_log_row(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: i64,
    ordinal: i64,
    entry: &EntryInput,
    exercise_id: Option<i64>,
    now: i64,
) -> DbResult<()> {
    let existing: Option<StoredRow> = sqlx::query_as(
        "SELECT id, block_label, exercise_id, sets, reps, load, rest, notes, log_text, rating, log_note
         FROM log_rows WHERE session_id = ?1 AND ordinal = ?2",
    )
    .bind(session_id)
    .bind(ordinal)
    .fetch_optional(&mut **tx)
    .await?;

    match existing {
        Some((
            id,
            block_label,
            stored_exercise_id,
            sets,
            reps,
            load,
            rest,
            notes,
            log_text,
            rating,
            log_note,
        )) => {
            let unchanged = block_label == entry.block_label
                && stored_exercise_id == exercise_id
                && sets == entry.sets
                && reps == entry.reps
                && load == entry.load
                && rest == entry.rest
                && notes == entry.notes
                && log_text == entry.log_text
                && rating == entry.rating
                && log_note == entry.log_note;
            if unchanged {
                return Ok(());
            }

            sqlx::query(
                "UPDATE log_rows SET
                   block_label = ?1, exercise_id = ?2, sets = ?3, reps = ?4, load = ?5,
                   rest = ?6, notes = ?7, log_text = ?8, rating = ?9, log_note = ?10,
                   updated_at = ?11
                 WHERE id = ?12",
            )
            .bind(&entry.block_label)
            .bind(exercise_id)
            .bind(&entry.sets)
            .bind(&entry.reps)
            .bind(&entry.load)
            .bind(&entry.rest)
            .bind(&entry.notes)
            .bind(&entry.log_text)
            .bind(entry.rating)
            .bind(&entry.log_note)
            .bind(now)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            sqlx::query(
                "INSERT INTO log_rows (
                   session_id, ordinal, block_label, exercise_id, sets, reps, load,
                   rest, notes, log_text, rating, log_note, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            )
            .bind(session_id)
            .bind(ordinal)
            .bind(&entry.block_label)
            .bind(exercise_id)
            .bind(&entry.sets)
            .bind(&entry.reps)
            .bind(&entry.load)
            .bind(&entry.rest)
            .bind(&entry.notes)
            .bind(&entry.log_text)
            .bind(entry.rating)
            .bind(&entry.log_note)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}
