//! Document date inference.
//!
//! The date a transformer was tested is taken from, in order:
//!
//! 1. the PDF's `CreationDate` metadata (`D:YYYYMMDD...`)
//! 2. the first date found in the first 20 lines of the report text
//! 3. the file's last-modified time
//! 4. today
//!
//! The chain always produces a date. A report with a missing or ambiguous
//! date must never stop a batch.

use std::fmt;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::debug;

const TEXT_SCAN_LINES: usize = 20;

/// Labelled fields first, then bare numeric forms (M/D/Y before Y/M/D),
/// long-form month names, and finally ISO.
const DATE_PATTERNS: &[&str] = &[
    r"(?i)(?:test\s+date|report\s+date|date)\s*[:\-]?\s*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})",
    r"(?i)(?:test\s+date|report\s+date|date)\s*[:\-]?\s*(\d{4}[/\-]\d{1,2}[/\-]\d{1,2})",
    r"(?i)(?:test\s+date|report\s+date|date)\s*[:\-]?\s*([A-Za-z]+\s+\d{1,2},\s*\d{4})",
    r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{4})\b",
    r"\b(\d{4}/\d{1,2}/\d{1,2})\b",
    r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{2})\b",
    r"(?i)\b((?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\s+\d{1,2},\s*\d{4})\b",
    r"\b(\d{4}-\d{2}-\d{2})\b",
];

/// Formats tried against a captured date string, in order.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%m-%d-%y", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y",
    "%d-%m-%y", "%Y/%m/%d", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y",
];

static DATE_BANK: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DATE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// The date the underlying test was performed, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentDate(NaiveDate);

impl DocumentDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }
}

impl fmt::Display for DocumentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for DocumentDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where the chain found its answer. Logged, and useful in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Metadata,
    Text,
    Modified,
    Today,
}

/// Run the full fallback chain, reporting which step answered.
///
/// `creation_date` is the raw PDF metadata string (if any), `modified` the
/// file's last-modified time (if readable).
pub fn resolve_with_source(
    creation_date: Option<&str>,
    text: &str,
    modified: Option<SystemTime>,
) -> (DocumentDate, DateSource) {
    let (date, source) = if let Some(date) = creation_date.and_then(date_from_metadata) {
        (date, DateSource::Metadata)
    } else if let Some(date) = date_from_text(text) {
        (date, DateSource::Text)
    } else if let Some(date) = modified.map(date_from_modified) {
        (date, DateSource::Modified)
    } else {
        (Local::now().date_naive(), DateSource::Today)
    };
    debug!(date = %date, source = ?source, "document date resolved");
    (DocumentDate(date), source)
}

/// Parse the PDF `D:YYYYMMDDHHmmSS...` convention. Only the date is used.
pub fn date_from_metadata(raw: &str) -> Option<NaiveDate> {
    let digits = raw.trim().strip_prefix("D:")?.get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// First parseable date in the first 20 lines of the report.
///
/// Lines are scanned in order; within a line the pattern bank is tried in
/// order. A match that no format can parse does not stop the scan.
pub fn date_from_text(text: &str) -> Option<NaiveDate> {
    text.lines()
        .take(TEXT_SCAN_LINES)
        .flat_map(|line| {
            DATE_BANK
                .iter()
                .filter_map(move |re| re.captures(line)?.get(1).map(|m| m.as_str()))
        })
        .find_map(parse_date_candidate)
}

/// Try every known format against a captured date string.
pub fn parse_date_candidate(candidate: &str) -> Option<NaiveDate> {
    let candidate = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&candidate, fmt)
            .ok()
            .filter(is_plausible)
    })
}

/// `%Y` happily parses "24" as year 24; two-digit years belong to `%y`.
fn is_plausible(date: &NaiveDate) -> bool {
    (1900..=2100).contains(&date.year())
}

fn date_from_modified(modified: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(modified).date_naive()
}
