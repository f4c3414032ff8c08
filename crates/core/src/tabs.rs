// crates/core/src/tabs.rs
//! Weekly-session tab naming convention.
//!
//! Session tabs carry an ISO date (`YYYY-MM-DD`) somewhere in the name,
//! e.g. `"Push A - 2024-05-13"` or `"2024-05-13 Upper"`. The residual text
//! is the day label. Tabs without a valid date (title pages, template tabs,
//! the plan overview) are not session tabs.

use chrono::NaiveDate;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A remote tab recognized as one training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTab {
    pub tab_name: String,
    pub day_label: String,
    pub date: NaiveDate,
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap())
}

/// Parse a tab name against the session convention.
///
/// Returns `None` for tabs without a calendar-valid ISO date. The day label
/// is the name with the date and dangling separators stripped, falling back
/// to the full tab name when nothing remains.
pub fn parse_session_tab(name: &str) -> Option<SessionTab> {
    let caps = date_regex().captures(name)?;
    let whole = caps.get(0)?;

    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let mut label = String::new();
    label.push_str(&name[..whole.start()]);
    label.push(' ');
    label.push_str(&name[whole.end()..]);
    let label = label
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | ','))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let day_label = if label.is_empty() {
        name.trim().to_string()
    } else {
        label
    };

    Some(SessionTab {
        tab_name: name.to_string(),
        day_label,
        date,
    })
}

/// Filter tab names to session tabs and sort them chronologically.
///
/// Ties on the encoded date break by tab name so a rebuild imports in a
/// deterministic order.
pub fn filter_session_tabs(names: &[String]) -> Vec<SessionTab> {
    let mut tabs: Vec<SessionTab> = names
        .iter()
        .filter_map(|name| parse_session_tab(name))
        .collect();
    tabs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.tab_name.cmp(&b.tab_name)));
    tabs
}
