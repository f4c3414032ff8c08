/// Inline SQL migrations for the sheetlift store schema.
///
/// The schema is small enough that inline statements beat sqlx migration
/// files; `_migrations` in lib.rs tracks the applied version.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: exercises — canonical movement identities
    r#"
CREATE TABLE IF NOT EXISTS exercises (
    id             INTEGER PRIMARY KEY,
    canonical_name TEXT NOT NULL UNIQUE,
    aliases        TEXT NOT NULL DEFAULT '[]',
    first_seen_at  INTEGER NOT NULL
);
"#,
    // Migration 2: sessions — one training day per remote tab
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    id           INTEGER PRIMARY KEY,
    tab_name     TEXT NOT NULL,
    day_label    TEXT NOT NULL,
    session_date TEXT NOT NULL,
    origin       TEXT NOT NULL DEFAULT 'remote',
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL,
    UNIQUE (tab_name, day_label)
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(session_date DESC);"#,
    // Migration 3: log_rows — (session_id, ordinal) is the idempotency key
    r#"
CREATE TABLE IF NOT EXISTS log_rows (
    id          INTEGER PRIMARY KEY,
    session_id  INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    ordinal     INTEGER NOT NULL,
    block_label TEXT NOT NULL DEFAULT '',
    exercise_id INTEGER REFERENCES exercises(id),
    sets        TEXT NOT NULL DEFAULT '',
    reps        TEXT NOT NULL DEFAULT '',
    load        TEXT NOT NULL DEFAULT '',
    rest        TEXT NOT NULL DEFAULT '',
    notes       TEXT NOT NULL DEFAULT '',
    log_text    TEXT NOT NULL DEFAULT '',
    rating      REAL,
    log_note    TEXT NOT NULL DEFAULT '',
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    UNIQUE (session_id, ordinal)
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_log_rows_exercise ON log_rows(exercise_id);"#,
    // Migration 4: body_scans — locally entered, no remote counterpart
    r#"
CREATE TABLE IF NOT EXISTS body_scans (
    scan_date         TEXT PRIMARY KEY,
    weight_kg         REAL NOT NULL,
    lean_mass_kg      REAL,
    fat_mass_kg       REAL,
    body_fat_pct      REAL,
    score             REAL,
    visceral_fat_area REAL,
    notes             TEXT NOT NULL DEFAULT '',
    created_at        INTEGER NOT NULL,
    updated_at        INTEGER NOT NULL
);
"#,
    // Migration 5: sync_metadata — single-row rebuild freshness bookkeeping
    r#"
CREATE TABLE IF NOT EXISTS sync_metadata (
    id                       INTEGER PRIMARY KEY CHECK (id = 1),
    last_rebuild_at          INTEGER,
    last_rebuild_duration_ms INTEGER,
    sessions_imported        INTEGER NOT NULL DEFAULT 0,
    rows_imported            INTEGER NOT NULL DEFAULT 0
);
"#,
];
