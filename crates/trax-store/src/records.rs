//! Per-equipment JSON records: writing, and reloading for dashboard rebuilds.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};
use trax_core::StructuredRecord;

use crate::error::StoreError;

const RECORD_SUFFIX: &str = "_analysis.json";

/// Write a record as pretty-printed UTF-8 JSON. Non-ASCII text is kept as-is.
pub fn write_record_json(path: &Path, record: &StructuredRecord) -> Result<(), StoreError> {
    let mut json = serde_json::to_string_pretty(record).map_err(|e| StoreError::json(path, e))?;
    json.push('\n');
    std::fs::write(path, json).map_err(|e| StoreError::io(path, e))
}

/// Load every `*_analysis.json` in `dir`, keyed by equipment name.
///
/// Files that do not parse as a JSON object are skipped with a warning.
pub fn load_records(dir: &Path) -> Result<BTreeMap<String, StructuredRecord>, StoreError> {
    let entries = std::fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
    let mut records = BTreeMap::new();

    for entry in entries {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        let Some(equipment) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(RECORD_SUFFIX))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        match serde_json::from_str::<StructuredRecord>(&text) {
            Ok(record) => {
                records.insert(equipment, record);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
        }
    }

    info!(dir = %dir.display(), count = records.len(), "loaded analysis records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> StructuredRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn pretty_json_keeps_non_ascii_and_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("T1_analysis.json");
        let rec = record(json!({"zeta": {"unit": "mΩ"}, "alpha": 1}));
        write_record_json(&path, &rec).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("mΩ"));
        assert!(text.contains("\n  \"zeta\""));
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn load_round_trips_written_records() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_record_json(&tmp.path().join("B_analysis.json"), &record(json!({"b": 2}))).unwrap();
        write_record_json(&tmp.path().join("A_analysis.json"), &record(json!({"a": 1}))).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(tmp.path().join("Bad_analysis.json"), "[1, 2]").unwrap();

        let records = load_records(tmp.path()).unwrap();
        let names: Vec<_> = records.keys().map(String::as_str).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(records["A"]["a"], json!(1));
    }

    #[test]
    fn missing_dir_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = load_records(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
