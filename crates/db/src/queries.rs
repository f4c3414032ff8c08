// crates/db/src/queries.rs
//! Analytics aggregator: pure read queries over the live store.
//!
//! Every query tolerates an empty store (empty or zeroed results, never an
//! error) and recomputes from current row state — nothing here is
//! persisted. Numeric folding over free-text prescribed fields goes
//! through `sheetlift_core::numbers` so an unparseable cell zeroes its
//! row's contribution instead of failing the report.

use crate::{Database, DbResult};
use chrono::NaiveDate;
use sheetlift_core::numbers::row_volume;
use sheetlift_core::types::{
    BlockVolume, ExerciseRank, SessionIntensityPoint, SessionOverview, SessionVolumePoint,
    StoreTotals, SyncSummary,
};
use std::collections::HashMap;

fn parse_date(s: &str) -> NaiveDate {
    s.parse()
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

impl Database {
    /// Exercise/session/log-row counts over the whole store.
    pub async fn store_totals(&self) -> DbResult<StoreTotals> {
        let (exercises, sessions, log_rows): (i64, i64, i64) = sqlx::query_as(
            "SELECT
               (SELECT COUNT(*) FROM exercises),
               (SELECT COUNT(*) FROM sessions),
               (SELECT COUNT(*) FROM log_rows)",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(StoreTotals {
            exercises,
            sessions,
            log_rows,
        })
    }

    /// Store-wide summary returned by every sync call.
    pub async fn store_summary(&self) -> DbResult<SyncSummary> {
        let (total_exercises, total_sessions, total_log_rows, log_rows_with_rating): (
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            "SELECT
               (SELECT COUNT(*) FROM exercises),
               (SELECT COUNT(*) FROM sessions),
               (SELECT COUNT(*) FROM log_rows),
               (SELECT COUNT(*) FROM log_rows WHERE rating IS NOT NULL)",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(SyncSummary {
            total_exercises,
            total_sessions,
            total_log_rows,
            log_rows_with_rating,
        })
    }

    /// Completion rate in percent: logged rows / total rows × 100.
    ///
    /// `since` restricts to sessions on or after that date. Exactly `0.0`
    /// over zero rows.
    pub async fn completion_rate(&self, since: Option<NaiveDate>) -> DbResult<f64> {
        let since = since.map(|d| d.to_string());
        let (total, logged): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN l.log_text != '' THEN 1 ELSE 0 END), 0)
             FROM log_rows l
             JOIN sessions s ON s.id = l.session_id
             WHERE ?1 IS NULL OR s.session_date >= ?1",
        )
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        if total == 0 {
            return Ok(0.0);
        }
        Ok(logged as f64 / total as f64 * 100.0)
    }

    /// Training volume per session, chronological: Σ over logged rows of
    /// sets × reps × load. Sessions without logged rows report `0.0`.
    pub async fn session_volume_series(&self) -> DbResult<Vec<SessionVolumePoint>> {
        let sessions: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, tab_name, day_label, session_date
             FROM sessions ORDER BY session_date ASC, tab_name ASC",
        )
        .fetch_all(self.pool())
        .await?;

        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT session_id, sets, reps, load FROM log_rows WHERE log_text != ''",
        )
        .fetch_all(self.pool())
        .await?;

        let mut volumes: HashMap<i64, f64> = HashMap::new();
        for (session_id, sets, reps, load) in &rows {
            *volumes.entry(*session_id).or_insert(0.0) += row_volume(sets, reps, load);
        }

        Ok(sessions
            .into_iter()
            .map(|(id, tab_name, day_label, date)| SessionVolumePoint {
                tab_name,
                day_label,
                session_date: parse_date(&date),
                volume: volumes.get(&id).copied().unwrap_or(0.0),
            })
            .collect())
    }

    /// Average intensity rating per session, chronological, with the count
    /// of rows that contributed a rating.
    pub async fn session_intensity_series(&self) -> DbResult<Vec<SessionIntensityPoint>> {
        let rows: Vec<(String, String, String, Option<f64>, i64)> = sqlx::query_as(
            "SELECT s.tab_name, s.day_label, s.session_date,
                    AVG(l.rating), COUNT(l.rating)
             FROM sessions s
             LEFT JOIN log_rows l ON l.session_id = s.id
             GROUP BY s.id
             ORDER BY s.session_date ASC, s.tab_name ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(tab_name, day_label, date, avg_rating, rated_rows)| SessionIntensityPoint {
                    tab_name,
                    day_label,
                    session_date: parse_date(&date),
                    avg_rating,
                    rated_rows,
                },
            )
            .collect())
    }

    /// Training volume grouped by block label, largest first.
    pub async fn block_volume(&self) -> DbResult<Vec<BlockVolume>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT block_label, sets, reps, load FROM log_rows WHERE log_text != ''",
        )
        .fetch_all(self.pool())
        .await?;

        let mut volumes: HashMap<String, f64> = HashMap::new();
        for (block, sets, reps, load) in &rows {
            *volumes.entry(block.clone()).or_insert(0.0) += row_volume(sets, reps, load);
        }

        let mut result: Vec<BlockVolume> = volumes
            .into_iter()
            .map(|(block_label, volume)| BlockVolume {
                block_label,
                volume,
            })
            .collect();
        result.sort_by(|a, b| {
            b.volume
                .total_cmp(&a.volume)
                .then_with(|| a.block_label.cmp(&b.block_label))
        });
        Ok(result)
    }

    /// Exercises ranked by logged-row count, descending.
    pub async fn top_exercises(&self, limit: i64) -> DbResult<Vec<ExerciseRank>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT e.canonical_name, COUNT(*) AS logged
             FROM log_rows l
             JOIN exercises e ON e.id = l.exercise_id
             WHERE l.log_text != ''
             GROUP BY e.id
             ORDER BY logged DESC, e.canonical_name ASC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(canonical_name, logged_rows)| ExerciseRank {
                canonical_name,
                logged_rows,
            })
            .collect())
    }

    /// Most recent sessions, newest first.
    pub async fn recent_sessions(&self, limit: i64) -> DbResult<Vec<SessionOverview>> {
        let rows: Vec<(String, String, String, i64, i64)> = sqlx::query_as(
            "SELECT s.tab_name, s.day_label, s.session_date,
                    COUNT(l.id),
                    COALESCE(SUM(CASE WHEN l.log_text != '' THEN 1 ELSE 0 END), 0)
             FROM sessions s
             LEFT JOIN log_rows l ON l.session_id = s.id
             GROUP BY s.id
             ORDER BY s.session_date DESC, s.tab_name ASC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(tab_name, day_label, date, row_count, logged_rows)| SessionOverview {
                    tab_name,
                    day_label,
                    session_date: parse_date(&date),
                    row_count,
                    logged_rows,
                },
            )
            .collect())
    }
}
