// crates/core/src/numbers.rs
//! Tolerant numeric extraction for prescribed fields.
//!
//! Sets/reps/load cells are free text ("3", "8-10", "60kg", "2,5"). The
//! aggregator needs a number out of each; the rule is "first numeric
//! substring found", with comma decimal separators normalized, defaulting
//! to zero so an unparseable cell zeroes its row's contribution instead of
//! erroring.

use regex_lite::Regex;
use std::sync::OnceLock;

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap())
}

/// First numeric substring in `text`, comma decimals accepted.
pub fn first_number(text: &str) -> Option<f64> {
    let normalized = text.replace(',', ".");
    let m = number_regex().find(&normalized)?;
    m.as_str().parse::<f64>().ok()
}

/// [`first_number`] defaulting to zero.
pub fn numeric_or_zero(text: &str) -> f64 {
    first_number(text).unwrap_or(0.0)
}

/// Volume contribution of one row: sets × reps × load.
pub fn row_volume(sets: &str, reps: &str, load: &str) -> f64 {
    numeric_or_zero(sets) * numeric_or_zero(reps) * numeric_or_zero(load)
}
