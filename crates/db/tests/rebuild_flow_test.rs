// Full-pipeline tests for the rebuild orchestrator: remote tabs → parser →
// reconciler → atomic swap → aggregator, driven through an in-memory fake
// of the remote spreadsheet.

use async_trait::async_trait;
use sheetlift_core::source::SheetSource;
use sheetlift_core::types::BodyScanInput;
use sheetlift_core::SourceError;
use sheetlift_db::{rebuild, RebuildError, StoreHandle};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

// ============================================================================
// Fake remote source
// ============================================================================

#[derive(Default)]
struct FakeSheet {
    tabs: Vec<String>,
    rows: HashMap<String, Vec<Vec<String>>>,
    fail_listing: bool,
    fail_fetch_of: Option<String>,
}

impl FakeSheet {
    fn with_tab(mut self, name: &str, rows: &[&[&str]]) -> Self {
        self.tabs.push(name.to_string());
        self.rows.insert(
            name.to_string(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        self
    }

    fn with_plain_tab(mut self, name: &str) -> Self {
        self.tabs.push(name.to_string());
        self
    }
}

#[async_trait]
impl SheetSource for FakeSheet {
    async fn list_tab_names(&self) -> Result<Vec<String>, SourceError> {
        if self.fail_listing {
            return Err(SourceError::transport("listing failed"));
        }
        Ok(self.tabs.clone())
    }

    async fn fetch_rows(&self, tab: &str) -> Result<Vec<Vec<String>>, SourceError> {
        if self.fail_fetch_of.as_deref() == Some(tab) {
            return Err(SourceError::transport("fetch failed"));
        }
        self.rows
            .get(tab)
            .cloned()
            .ok_or_else(|| SourceError::tab_not_found(tab))
    }
}

/// Two session tabs, 5 and 3 rows, one blank row in the first. Four rows
/// carry a log.
fn two_week_sheet() -> FakeSheet {
    FakeSheet::default()
        .with_plain_tab("Overview")
        .with_tab(
            "Push - 2024-05-13",
            &[
                &["A", "Bench Press", "3", "10", "60kg", "2min", "", "Done | RPE 8"],
                &["A", "Incline Press", "3", "12", "22,5", "90s", "", ""],
                &["", "", "", "", "", "", "", ""],
                &["B", "Fly", "3", "15", "10", "60s", "", "RPE 7"],
                &["B", "Pushdown", "3", "12", "25", "60s", "", "skipped"],
            ],
        )
        .with_tab(
            "Pull - 2024-05-15",
            &[
                &["A", "Deadlift", "2", "5", "140", "3min", "", "RPE 9,5"],
                &["A", "Row", "3", "8", "60", "2min", "", ""],
                &["B", "Curl", "3", "12", "15", "60s", "", ""],
            ],
        )
}

fn store_in(tmp: &TempDir) -> (StoreHandle, PathBuf) {
    let path = tmp.path().join("sheetlift.db");
    (StoreHandle::new(path.clone()), path)
}

/// Opt-in log capture: `RUST_LOG=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scan(date: &str, weight: f64) -> BodyScanInput {
    BodyScanInput {
        scan_date: date.parse().unwrap(),
        weight_kg: weight,
        lean_mass_kg: None,
        fat_mass_kg: None,
        body_fat_pct: Some(15.2),
        score: None,
        visceral_fat_area: None,
        notes: String::new(),
    }
}

// ============================================================================
// End-to-end counts
// ============================================================================

#[tokio::test]
async fn test_rebuild_reports_expected_counts() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    let report = rebuild(&two_week_sheet(), &store).await.unwrap();

    assert_eq!(report.sessions_scanned, 2);
    assert_eq!(report.sessions_imported, 2);
    assert_eq!(report.rows_imported, 8, "blank rows count during rebuild");
    assert_eq!(report.rows_with_logs, 4);
    assert_eq!(report.total_sessions, 2);
    assert_eq!(report.total_log_rows, 8);
    assert_eq!(report.total_exercises, 7);
}

#[tokio::test]
async fn test_rebuild_is_repeatable() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    let first = rebuild(&two_week_sheet(), &store).await.unwrap();
    let second = rebuild(&two_week_sheet(), &store).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rebuilt_store_serves_analytics() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();
    let db = store.acquire().await.unwrap();

    let rate = db.completion_rate(None).await.unwrap();
    assert_eq!(rate, 50.0, "4 of 8 rows carry a log");

    let recent = db.recent_sessions(1).await.unwrap();
    assert_eq!(recent[0].day_label, "Pull");

    let top = db.top_exercises(3).await.unwrap();
    assert_eq!(top[0].logged_rows, 1, "each logged exercise appears once");
}

// ============================================================================
// Naming-convention mismatch
// ============================================================================

#[tokio::test]
async fn test_no_session_tabs_is_a_named_condition() {
    let tmp = TempDir::new().unwrap();
    let (store, path) = store_in(&tmp);

    let source = FakeSheet::default()
        .with_plain_tab("Overview")
        .with_plain_tab("Template");
    let err = rebuild(&source, &store).await.unwrap_err();

    assert!(matches!(err, RebuildError::NoSessionTabs));
    assert!(!path.exists(), "no store may be created on failure");
}

// ============================================================================
// Failure before the swap leaves the live store untouched
// ============================================================================

#[tokio::test]
async fn test_transport_failure_preserves_live_store() {
    let tmp = TempDir::new().unwrap();
    let (store, path) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();
    let before = store.acquire().await.unwrap().store_totals().await.unwrap();

    let mut failing = two_week_sheet();
    failing.fail_fetch_of = Some("Pull - 2024-05-15".to_string());
    let err = rebuild(&failing, &store).await.unwrap_err();
    assert!(matches!(err, RebuildError::Source(_)));

    let after = store.acquire().await.unwrap().store_totals().await.unwrap();
    assert_eq!(before, after, "live store must be untouched");

    // The abandoned temp store is left for inspection…
    let tmp_store = PathBuf::from(format!("{}.rebuild", path.display()));
    assert!(tmp_store.exists());

    // …and the next successful rebuild clears and replaces it
    rebuild(&two_week_sheet(), &store).await.unwrap();
    assert!(!tmp_store.exists());
}

#[tokio::test]
async fn test_listing_failure_surfaces_transport_error() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    let mut source = two_week_sheet();
    source.fail_listing = true;
    let err = rebuild(&source, &store).await.unwrap_err();

    assert!(matches!(err, RebuildError::Source(SourceError::Transport { .. })));
}

// ============================================================================
// Atomic visibility
// ============================================================================

#[tokio::test]
async fn test_reader_holding_old_handle_survives_swap() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();
    let old_handle = store.acquire().await.unwrap();

    rebuild(&two_week_sheet(), &store).await.unwrap();

    // The pre-swap clone still answers queries against a consistent store
    let totals = old_handle.store_totals().await.unwrap();
    assert_eq!(totals.sessions, 2);

    // A fresh acquire sees the new store
    let new_handle = store.acquire().await.unwrap();
    assert_eq!(new_handle.store_totals().await.unwrap().sessions, 2);
}

#[tokio::test]
async fn test_concurrent_rebuild_rejected() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    let guard = store.try_begin_rebuild().expect("gate should be free");
    let err = rebuild(&two_week_sheet(), &store).await.unwrap_err();
    assert!(matches!(err, RebuildError::AlreadyRunning));
    drop(guard);

    rebuild(&two_week_sheet(), &store).await.unwrap();
}

// ============================================================================
// BodyScan preservation
// ============================================================================

#[tokio::test]
async fn test_body_scans_survive_rebuild_unchanged() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();
    let db = store.acquire().await.unwrap();
    db.upsert_body_scan(&scan("2024-05-14", 80.4)).await.unwrap();
    let before = db.list_body_scans().await.unwrap();

    rebuild(&two_week_sheet(), &store).await.unwrap();

    let after = store.acquire().await.unwrap().list_body_scans().await.unwrap();
    assert_eq!(before, after, "scans must be carried forward bit-for-bit");
}

#[tokio::test]
async fn test_scans_survive_rebuild_with_zero_importable_rows() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();
    let db = store.acquire().await.unwrap();
    db.upsert_body_scan(&scan("2024-05-14", 80.4)).await.unwrap();
    db.upsert_body_scan(&scan("2024-06-14", 79.1)).await.unwrap();

    // A sheet whose only session tab has no rows at all
    let empty = FakeSheet::default().with_tab("Rest - 2024-07-01", &[]);
    let report = rebuild(&empty, &store).await.unwrap();
    assert_eq!(report.rows_imported, 0);

    let scans = store.acquire().await.unwrap().list_body_scans().await.unwrap();
    assert_eq!(scans.len(), 2);
}

#[tokio::test]
async fn test_first_rebuild_without_live_store_has_no_scans() {
    let tmp = TempDir::new().unwrap();
    let (store, _) = store_in(&tmp);

    rebuild(&two_week_sheet(), &store).await.unwrap();

    let scans = store.acquire().await.unwrap().list_body_scans().await.unwrap();
    assert!(scans.is_empty());
}
