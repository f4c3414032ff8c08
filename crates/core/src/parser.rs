// crates/core/src/parser.rs
//! Tolerant parsing of raw remote rows into structured workout entries.
//!
//! The log cell is hand-typed free text following an informal
//! `"<performance> | RPE <n> | Notes: <text>"` convention, with any subset
//! of the three parts present, in any order. Parsing is total: arbitrary
//! text never fails, it degrades to an empty rating and the trimmed
//! original text as the note.

use crate::types::{EntryInput, LogCell};
use regex_lite::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Number of columns in a remote row: block, exercise, sets, reps, load,
/// rest, notes, log.
pub const ROW_COLUMNS: usize = 8;

fn rpe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^RPE\s*:?\s*(\d{1,2}(?:[.,]\d+)?)$").unwrap())
}

fn note_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Notes?\s*:\s*(.*)$").unwrap())
}

/// Parse one raw log cell into `(rating, note)`.
///
/// - Parts are separated by `|` and classified independently.
/// - An RPE part accepts comma or period decimals; values outside [1, 10]
///   are treated as "no rating", and the recognized token is consumed
///   either way so it never leaks into the note.
/// - An explicit `Notes:` part wins as the note; otherwise the leftover
///   non-RPE parts are rejoined. Worst case: no rating, the trimmed
///   original text as the note.
pub fn parse_log_cell(raw: &str) -> LogCell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return LogCell::empty();
    }

    let mut rating: Option<f64> = None;
    let mut notes: Vec<&str> = Vec::new();
    let mut leftovers: Vec<&str> = Vec::new();

    for part in trimmed.split('|') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(caps) = rpe_regex().captures(part) {
            let normalized = caps[1].replace(',', ".");
            match normalized.parse::<f64>() {
                Ok(value) if (1.0..=10.0).contains(&value) => {
                    if rating.is_none() {
                        rating = Some(value);
                    }
                }
                Ok(value) => {
                    debug!(value, "RPE out of range, treating as unrated");
                }
                Err(_) => {}
            }
            continue;
        }

        if let Some(caps) = note_regex().captures(part) {
            let text = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !text.is_empty() {
                notes.push(text);
            }
            continue;
        }

        leftovers.push(part);
    }

    let note = if !notes.is_empty() {
        notes.join(" | ")
    } else {
        leftovers.join(" | ")
    };

    LogCell { rating, note }
}

/// Build a structured entry from one raw remote row.
///
/// Short rows are padded with empty columns; columns past [`ROW_COLUMNS`]
/// are ignored. All fields are trimmed; the log cell runs through
/// [`parse_log_cell`].
pub fn build_entry(raw_row: &[String]) -> EntryInput {
    let col = |i: usize| -> String {
        raw_row
            .get(i)
            .map(|c| c.trim().to_string())
            .unwrap_or_default()
    };

    let log_text = col(7);
    let cell = parse_log_cell(&log_text);

    EntryInput {
        block_label: col(0),
        exercise: col(1),
        sets: col(2),
        reps: col(3),
        load: col(4),
        rest: col(5),
        notes: col(6),
        log_text,
        rating: cell.rating,
        log_note: cell.note,
    }
}
