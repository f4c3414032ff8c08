// crates/db/src/body_scans.rs
//! Direct local-edit interface for body-composition scans.
//!
//! The remote source knows nothing about these records: they are created,
//! updated, and deleted only here, and carried forward verbatim by the
//! rebuild orchestrator via [`Database::copy_body_scans_into`].

use crate::{Database, DbResult};
use chrono::{NaiveDate, Utc};
use sheetlift_core::types::{BodyScan, BodyScanInput};

type ScanRow = (
    String,         // scan_date
    f64,            // weight_kg
    Option<f64>,    // lean_mass_kg
    Option<f64>,    // fat_mass_kg
    Option<f64>,    // body_fat_pct
    Option<f64>,    // score
    Option<f64>,    // visceral_fat_area
    String,         // notes
    i64,            // created_at
    i64,            // updated_at
);

fn scan_from_row(row: ScanRow) -> BodyScan {
    let (date, weight_kg, lean, fat, pct, score, visceral, notes, created_at, updated_at) = row;
    BodyScan {
        scan_date: date
            .parse()
            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        weight_kg,
        lean_mass_kg: lean,
        fat_mass_kg: fat,
        body_fat_pct: pct,
        score,
        visceral_fat_area: visceral,
        notes,
        created_at,
        updated_at,
    }
}

const SCAN_COLUMNS: &str = "scan_date, weight_kg, lean_mass_kg, fat_mass_kg, body_fat_pct, \
                            score, visceral_fat_area, notes, created_at, updated_at";

impl Database {
    /// Insert or update the scan for its date. `updated_at` rotates only
    /// when a measurement actually changed.
    pub async fn upsert_body_scan(&self, input: &BodyScanInput) -> DbResult<BodyScan> {
        let now = Utc::now().timestamp();
        let date = input.scan_date.to_string();

        let existing = self.get_body_scan(input.scan_date).await?;

        match existing {
            Some(stored) => {
                let unchanged = stored.weight_kg == input.weight_kg
                    && stored.lean_mass_kg == input.lean_mass_kg
                    && stored.fat_mass_kg == input.fat_mass_kg
                    && stored.body_fat_pct == input.body_fat_pct
                    && stored.score == input.score
                    && stored.visceral_fat_area == input.visceral_fat_area
                    && stored.notes == input.notes;
                if unchanged {
                    return Ok(stored);
                }

                sqlx::query(
                    "UPDATE body_scans SET
                       weight_kg = ?1, lean_mass_kg = ?2, fat_mass_kg = ?3,
                       body_fat_pct = ?4, score = ?5, visceral_fat_area = ?6,
                       notes = ?7, updated_at = ?8
                     WHERE scan_date = ?9",
                )
                .bind(input.weight_kg)
                .bind(input.lean_mass_kg)
                .bind(input.fat_mass_kg)
                .bind(input.body_fat_pct)
                .bind(input.score)
                .bind(input.visceral_fat_area)
                .bind(&input.notes)
                .bind(now)
                .bind(&date)
                .execute(self.pool())
                .await?;

                Ok(BodyScan {
                    updated_at: now,
                    weight_kg: input.weight_kg,
                    lean_mass_kg: input.lean_mass_kg,
                    fat_mass_kg: input.fat_mass_kg,
                    body_fat_pct: input.body_fat_pct,
                    score: input.score,
                    visceral_fat_area: input.visceral_fat_area,
                    notes: input.notes.clone(),
                    ..stored
                })
            }
            None => {
                sqlx::query(
                    "INSERT INTO body_scans (
                       scan_date, weight_kg, lean_mass_kg, fat_mass_kg, body_fat_pct,
                       score, visceral_fat_area, notes, created_at, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                )
                .bind(&date)
                .bind(input.weight_kg)
                .bind(input.lean_mass_kg)
                .bind(input.fat_mass_kg)
                .bind(input.body_fat_pct)
                .bind(input.score)
                .bind(input.visceral_fat_area)
                .bind(&input.notes)
                .bind(now)
                .execute(self.pool())
                .await?;

                Ok(BodyScan {
                    scan_date: input.scan_date,
                    weight_kg: input.weight_kg,
                    lean_mass_kg: input.lean_mass_kg,
                    fat_mass_kg: input.fat_mass_kg,
                    body_fat_pct: input.body_fat_pct,
                    score: input.score,
                    visceral_fat_area: input.visceral_fat_area,
                    notes: input.notes.clone(),
                    created_at: now,
                    updated_at: now,
                })
            }
        }
    }

    pub async fn get_body_scan(&self, scan_date: NaiveDate) -> DbResult<Option<BodyScan>> {
        let sql = format!("SELECT {SCAN_COLUMNS} FROM body_scans WHERE scan_date = ?1");
        let row: Option<ScanRow> = sqlx::query_as(&sql)
            .bind(scan_date.to_string())
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(scan_from_row))
    }

    /// All scans, newest first.
    pub async fn list_body_scans(&self) -> DbResult<Vec<BodyScan>> {
        let sql = format!("SELECT {SCAN_COLUMNS} FROM body_scans ORDER BY scan_date DESC");
        let rows: Vec<ScanRow> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(scan_from_row).collect())
    }

    /// Returns true when a scan existed and was removed.
    pub async fn delete_body_scan(&self, scan_date: NaiveDate) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM body_scans WHERE scan_date = ?1")
            .bind(scan_date.to_string())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy every scan into `target` verbatim, timestamps included. Used
    /// only by the rebuild orchestrator; returns the number copied.
    pub async fn copy_body_scans_into(&self, target: &Database) -> DbResult<u64> {
        let sql = format!("SELECT {SCAN_COLUMNS} FROM body_scans");
        let rows: Vec<ScanRow> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;
        let count = rows.len() as u64;

        for (date, weight, lean, fat, pct, score, visceral, notes, created_at, updated_at) in rows {
            sqlx::query(
                "INSERT OR REPLACE INTO body_scans (
                   scan_date, weight_kg, lean_mass_kg, fat_mass_kg, body_fat_pct,
                   score, visceral_fat_area, notes, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(&date)
            .bind(weight)
            .bind(lean)
            .bind(fat)
            .bind(pct)
            .bind(score)
            .bind(visceral)
            .bind(&notes)
            .bind(created_at)
            .bind(updated_at)
            .execute(target.pool())
            .await?;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(date: &str, weight: f64) -> BodyScanInput {
        BodyScanInput {
            scan_date: date.parse().unwrap(),
            weight_kg: weight,
            lean_mass_kg: Some(weight * 0.8),
            fat_mass_kg: Some(weight * 0.15),
            body_fat_pct: Some(15.0),
            score: Some(82.0),
            visceral_fat_area: Some(40.0),
            notes: "morning, fasted".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = Database::new_in_memory().await.unwrap();
        let created = db.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();
        assert_eq!(created.weight_kg, 80.0);

        let fetched = db
            .get_body_scan("2024-05-01".parse().unwrap())
            .await
            .unwrap()
            .expect("scan should exist");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_upsert_same_values_keeps_updated_at() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();

        sqlx::query("UPDATE body_scans SET updated_at = updated_at - 500")
            .execute(db.pool())
            .await
            .unwrap();
        let before = db
            .get_body_scan("2024-05-01".parse().unwrap())
            .await
            .unwrap()
            .unwrap();

        let after = db.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();
        assert_eq!(after.updated_at, before.updated_at, "identical write must not rotate");

        let changed = db.upsert_body_scan(&scan("2024-05-01", 79.5)).await.unwrap();
        assert!(changed.updated_at > before.updated_at);
        assert_eq!(changed.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();
        db.upsert_body_scan(&scan("2024-06-01", 79.0)).await.unwrap();

        let scans = db.list_body_scans().await.unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].scan_date.to_string(), "2024-06-01");
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new_in_memory().await.unwrap();
        db.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();

        assert!(db.delete_body_scan("2024-05-01".parse().unwrap()).await.unwrap());
        assert!(!db.delete_body_scan("2024-05-01".parse().unwrap()).await.unwrap());
        assert!(db.list_body_scans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_preserves_timestamps() {
        let source = Database::new_in_memory().await.unwrap();
        let target = Database::new_in_memory().await.unwrap();
        source.upsert_body_scan(&scan("2024-05-01", 80.0)).await.unwrap();
        sqlx::query("UPDATE body_scans SET created_at = 1111, updated_at = 2222")
            .execute(source.pool())
            .await
            .unwrap();

        let copied = source.copy_body_scans_into(&target).await.unwrap();
        assert_eq!(copied, 1);

        let scans = target.list_body_scans().await.unwrap();
        assert_eq!(scans[0].created_at, 1111);
        assert_eq!(scans[0].updated_at, 2222);
    }
}
