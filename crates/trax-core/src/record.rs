//! Helpers for reading structured analysis records across schema revisions.
//!
//! The model's JSON has drifted over time: sections are renamed
//! (`tan_delta` / `tan_delta_main_insulation`), and nested lists arrive as a
//! bare list, a single object, or an object wrapping `measurements`. All of
//! that drift is absorbed here so the flattener can stay a plain loop.

use serde_json::{Map, Value};

/// The parsed JSON object from one analysis response.
pub type StructuredRecord = Map<String, Value>;

/// Tan-delta section names, newest first.
pub const TAN_DELTA_KEYS: &[&str] = &["tan_delta", "tan_delta_main_insulation"];

/// Bushing power-factor section names, newest first.
pub const BUSHING_KEYS: &[&str] = &["bushing_pf", "bushing_pf_c1"];

/// Health assessment section names, newest schema generation first.
pub const HEALTH_KEYS: &[&str] = &[
    "health_assessment_technical_complete",
    "health_assessment_master_enhanced",
    "health_assessment",
];

/// Return the first candidate key present in `record`, with its value.
pub fn first_present_key<'a>(
    record: &'a StructuredRecord,
    candidates: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    candidates
        .iter()
        .find_map(|&key| record.get(key).map(|value| (key, value)))
}

/// Like [`first_present_key`], but only yields the section if it is a mapping.
pub fn section<'a>(
    record: &'a StructuredRecord,
    candidates: &[&'static str],
) -> Option<&'a Map<String, Value>> {
    first_present_key(record, candidates).and_then(|(_, value)| value.as_object())
}

/// Normalise a value into the list of mappings it represents.
///
/// - an object with a `measurements` key is replaced by that key's value
/// - a non-list is treated as a one-element list
/// - elements that are not mappings are dropped
pub fn mapping_list(value: &Value) -> Vec<&Map<String, Value>> {
    let value = match value {
        Value::Object(obj) => obj.get("measurements").unwrap_or(value),
        other => other,
    };
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        other => other.as_object().into_iter().collect(),
    }
}

/// Render a JSON value as a CSV cell.
///
/// Strings are unquoted, `null` is empty, nested values are compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// A numeric field: rendered if present, `"0"` if absent.
pub fn numeric_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(render).unwrap_or_else(|| "0".to_string())
}

/// A string field: rendered if present, empty if absent.
pub fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(render).unwrap_or_default()
}

/// "tan_delta_main_insulation" → "Tan Delta Main Insulation".
///
/// Each run of letters is capitalised on its first letter and lowercased
/// elsewhere, so "bushing_pf_c1" becomes "Bushing Pf C1".
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
