// crates/core/src/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalize a raw exercise name into its canonical identity.
///
/// Pure and deterministic: trim, collapse internal whitespace, lowercase.
/// Two raw spellings that normalize equal refer to the same exercise.
pub fn canonical_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parsed content of one free-text log cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogCell {
    /// Subjective-effort rating in [1, 10], if the cell carried a valid one.
    pub rating: Option<f64>,
    /// Residual free text after extracting the rating.
    pub note: String,
}

impl LogCell {
    pub fn empty() -> Self {
        Self {
            rating: None,
            note: String::new(),
        }
    }
}

/// One structured exercise line built from a raw 8-column remote row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub block_label: String,
    pub exercise: String,
    pub sets: String,
    pub reps: String,
    pub load: String,
    pub rest: String,
    pub notes: String,
    /// Raw log cell, verbatim (trimmed).
    pub log_text: String,
    /// Intensity rating extracted from the log cell.
    pub rating: Option<f64>,
    /// Free-text note extracted from the log cell.
    pub log_note: String,
}

impl EntryInput {
    /// True when every prescribed field is empty. Blank entries are skipped
    /// by incremental sync but kept during a rebuild so that source-row
    /// ordinals stay continuous.
    pub fn is_blank(&self) -> bool {
        self.block_label.is_empty()
            && self.exercise.is_empty()
            && self.sets.is_empty()
            && self.reps.is_empty()
            && self.load.is_empty()
            && self.rest.is_empty()
            && self.notes.is_empty()
    }

    pub fn has_log(&self) -> bool {
        !self.log_text.is_empty()
    }
}

/// One training session's worth of parsed entries, addressed to the
/// reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    pub tab_name: String,
    pub day_label: String,
    /// Session date; defaults to the import time when the remote side
    /// supplies none.
    pub session_date: Option<NaiveDate>,
    pub entries: Vec<EntryInput>,
}

/// Store-wide totals after a sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total_exercises: i64,
    pub total_sessions: i64,
    pub total_log_rows: i64,
    pub log_rows_with_rating: i64,
}

/// Outcome of a full cache rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub sessions_scanned: i64,
    pub sessions_imported: i64,
    pub rows_imported: i64,
    pub rows_with_logs: i64,
    pub total_exercises: i64,
    pub total_sessions: i64,
    pub total_log_rows: i64,
}

/// Measurement fields of a body-composition scan, as entered locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyScanInput {
    pub scan_date: NaiveDate,
    pub weight_kg: f64,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub score: Option<f64>,
    pub visceral_fat_area: Option<f64>,
    pub notes: String,
}

/// A stored body-composition measurement. Never produced by the remote
/// source; carried forward verbatim across rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyScan {
    pub scan_date: NaiveDate,
    pub weight_kg: f64,
    pub lean_mass_kg: Option<f64>,
    pub fat_mass_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub score: Option<f64>,
    pub visceral_fat_area: Option<f64>,
    pub notes: String,
    /// Unix seconds; managed by the store.
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Read models (derived summaries — never persisted)
// ============================================================================

/// Exercise/session/log-row counts over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTotals {
    pub exercises: i64,
    pub sessions: i64,
    pub log_rows: i64,
}

/// Training volume of one session (sum over logged rows of sets × reps × load).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionVolumePoint {
    pub tab_name: String,
    pub day_label: String,
    pub session_date: NaiveDate,
    pub volume: f64,
}

/// Average intensity rating of one session, with the number of rows that
/// contributed a rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIntensityPoint {
    pub tab_name: String,
    pub day_label: String,
    pub session_date: NaiveDate,
    pub avg_rating: Option<f64>,
    pub rated_rows: i64,
}

/// Training volume grouped by block label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVolume {
    pub block_label: String,
    pub volume: f64,
}

/// An exercise ranked by how many logged rows reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRank {
    pub canonical_name: String,
    pub logged_rows: i64,
}

/// Lightweight session listing entry, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub tab_name: String,
    pub day_label: String,
    pub session_date: NaiveDate,
    pub row_count: i64,
    pub logged_rows: i64,
}
