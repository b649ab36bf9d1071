//! Equipment identity inference from raw report text.
//!
//! TRAX exports do not carry a reliable asset field, so the name is inferred
//! with an ordered chain of strategies. Earlier strategies are more precise;
//! the first one that produces a candidate wins. The chain always terminates
//! in a timestamp-based synthetic name, so resolution never fails.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use crate::sanitize::sanitize;

/// Lines that sit under a "Substation" label in the TRAX header but are
/// column captions rather than names.
const STOPLIST: &[&str] = &[
    "position",
    "location",
    "test",
    "conditions",
    "weather",
    "temperature",
];

/// Labelled fields, positional phrases, then serial numbers. Order matters.
const PATTERNS: &[&str] = &[
    r"(?im)Substation[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test|Position|Job)",
    r"(?im)Station[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)Equipment[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)Transformer[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)Unit[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)Site[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)Location[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Substation|Date|Test)",
    r"(?im)Asset[:\s]+([A-Za-z0-9\s\-_]+?)(?:\n|Location|Date|Test)",
    r"(?im)at\s+([A-Za-z0-9\s\-_]+?)\s+(?:Substation|Station)",
    r"(?im)Test\s+Report\s+for\s+([A-Za-z0-9\s\-_]+?)(?:\n|at|Substation)",
    r"(?im)Serial\s*[#No.]*\s*[:\s]*([A-Za-z0-9\-_]+)",
    r"(?im)S/N[:\s]*([A-Za-z0-9\-_]+)",
];

static PATTERN_BANK: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

static EQUIPMENT_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-_]{2,15}$").ok());

type Strategy = fn(&str, &[&str]) -> Option<String>;

/// The strategy chain, tried in order.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("substation-label", substation_label),
    ("test-asset-section", test_asset_section),
    ("pattern-bank", pattern_bank),
    ("asset-id-label", asset_id_label),
    ("bare-identifier", bare_identifier),
];

/// Resolve the equipment identity of a report, using the current local time
/// for the synthetic fallback.
pub fn resolve_identity(text: &str) -> String {
    resolve_identity_at(text, Local::now().naive_local())
}

/// Resolve the equipment identity of a report with an explicit clock.
///
/// Falls back to `Transformer_YYYYMMDD_HHMMSS` when no strategy matches.
pub fn resolve_identity_at(text: &str, now: NaiveDateTime) -> String {
    let lines = report_lines(text);

    for (name, strategy) in STRATEGIES {
        if let Some(identity) = strategy(text, &lines) {
            debug!(strategy = name, identity = %identity, "equipment identity resolved");
            return identity;
        }
    }

    let fallback = format!("Transformer_{}", now.format("%Y%m%d_%H%M%S"));
    debug!(identity = %fallback, "no identity strategy matched, using timestamp");
    fallback
}

/// Trimmed, non-empty lines.
fn report_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn is_stopword(s: &str) -> bool {
    let lower = s.to_lowercase();
    STOPLIST.contains(&lower.as_str())
}

/// A line that is exactly "Substation", followed within three lines by a
/// short name that is not a column caption.
fn substation_label(_text: &str, lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().take(20).enumerate() {
        if !line.eq_ignore_ascii_case("substation") {
            continue;
        }
        for candidate in lines.iter().skip(i + 1).take(3) {
            if char_len(candidate) < 30 && !is_stopword(candidate) {
                return Some(sanitize(&format!("Substation_{candidate}")));
            }
        }
    }
    None
}

/// A "Test Asset" heading, a "substation" line within the next four lines,
/// and the identifier on the line after that.
fn test_asset_section(_text: &str, lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().take(15).enumerate() {
        if !line.to_lowercase().contains("test asset") {
            continue;
        }
        for j in 1..5 {
            let Some(next) = lines.get(i + j) else { break };
            if !next.to_lowercase().contains("substation") {
                continue;
            }
            if let Some(id) = lines.get(i + j + 1) {
                if char_len(id) < 20 {
                    return Some(sanitize(&format!("Substation_{id}")));
                }
            }
        }
    }
    None
}

/// First pattern in the bank whose capture is 2..=49 characters once
/// whitespace is normalised.
fn pattern_bank(text: &str, _lines: &[&str]) -> Option<String> {
    PATTERN_BANK.iter().find_map(|re| {
        let captured = re.captures(text)?.get(1)?.as_str();
        let name = captured.split_whitespace().collect::<Vec<_>>().join(" ");
        let len = char_len(&name);
        (len > 1 && len < 50).then(|| sanitize(&name))
    })
}

/// An "Asset ID" label with the identifier on the following line.
fn asset_id_label(_text: &str, lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(25)
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains("asset id"))
        .find_map(|(i, _)| {
            let id = lines.get(i + 1)?;
            (char_len(id) < 30 && !is_stopword(id)).then(|| sanitize(&format!("Asset_{id}")))
        })
}

/// A bare substation number (1..=9999) or an uppercase equipment code in the
/// first ten lines.
fn bare_identifier(_text: &str, lines: &[&str]) -> Option<String> {
    for line in lines.iter().take(10) {
        if line.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = line.parse::<u64>() {
                if (1..=9999).contains(&n) {
                    return Some(sanitize(&format!("Substation_{line}")));
                }
            }
        }
        if EQUIPMENT_CODE.as_ref().is_some_and(|re| re.is_match(line)) {
            return Some(sanitize(&format!("Equipment_{line}")));
        }
    }
    None
}
