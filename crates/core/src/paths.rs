// crates/core/src/paths.rs
//! Centralized path functions for app storage locations.

use std::path::PathBuf;

/// App cache root: `~/Library/Caches/sheetlift/` (macOS) or
/// `~/.cache/sheetlift/` (Linux).
pub fn app_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("sheetlift"))
}

/// SQLite store file: `<app_cache_dir>/sheetlift.db`.
pub fn db_path() -> Option<PathBuf> {
    app_cache_dir().map(|d| d.join("sheetlift.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_cache_dir() {
        let dir = app_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("sheetlift"));
    }

    #[test]
    fn test_db_path() {
        let path = db_path().unwrap();
        assert!(path.to_string_lossy().ends_with("sheetlift.db"));
    }
}
