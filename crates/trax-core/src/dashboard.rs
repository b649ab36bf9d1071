//! Flattening structured records into dashboard tables.
//!
//! Five tables are produced, one per measurement family. Every row carries
//! `equipment_name` as the join key. Missing sections contribute no rows;
//! missing fields default to `0` (numeric) or empty (text).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::record::{
    BUSHING_KEYS, HEALTH_KEYS, StructuredRecord, TAN_DELTA_KEYS, mapping_list, numeric_field,
    section, text_field, title_case,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindingRow {
    pub equipment_name: String,
    pub winding_type: String,
    pub phase: String,
    pub tap_position: String,
    pub resistance: String,
    pub unit: String,
    pub stability_percent: String,
    pub variation_percent: String,
}

impl WindingRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "equipment_name",
        "winding_type",
        "phase",
        "tap_position",
        "resistance",
        "unit",
        "stability_percent",
        "variation_percent",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TanDeltaRow {
    pub equipment_name: String,
    pub section: String,
    pub pf_20c_percent: String,
    pub status: String,
    pub threshold: String,
}

impl TanDeltaRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "equipment_name",
        "section",
        "pf_20c_percent",
        "status",
        "threshold",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BushingRow {
    pub equipment_name: String,
    pub bushing_id: String,
    pub pf_20c_percent: String,
    pub pf_1hz_percent: String,
    pub status: String,
    pub remarks: String,
}

impl BushingRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "equipment_name",
        "bushing_id",
        "pf_20c_percent",
        "pf_1hz_percent",
        "status",
        "remarks",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnsRatioRow {
    pub equipment_name: String,
    pub tap_position: String,
    pub nominal_ttr: String,
    pub measured_ttr: String,
    pub error_percent: String,
    pub excitation_current_ua: String,
    pub excitation_current_ma: String,
    pub phase_displacement_deg: String,
}

impl TurnsRatioRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "equipment_name",
        "tap_position",
        "nominal_ttr",
        "measured_ttr",
        "error_percent",
        "excitation_current_ua",
        "excitation_current_ma",
        "phase_displacement_deg",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRow {
    pub equipment_name: String,
    pub category: String,
    pub status: String,
    pub comments: String,
}

impl HealthRow {
    pub const COLUMNS: &'static [&'static str] = &["equipment_name", "category", "status", "comments"];
}

/// The five flat tables built from one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub winding: Vec<WindingRow>,
    pub tan_delta: Vec<TanDeltaRow>,
    pub bushing: Vec<BushingRow>,
    pub turns_ratio: Vec<TurnsRatioRow>,
    pub health: Vec<HealthRow>,
}

impl Dashboard {
    pub fn total_rows(&self) -> usize {
        self.winding.len()
            + self.tan_delta.len()
            + self.bushing.len()
            + self.turns_ratio.len()
            + self.health.len()
    }
}

/// Flatten every equipment record into the five dashboard tables.
pub fn flatten(records: &BTreeMap<String, StructuredRecord>) -> Dashboard {
    let mut dashboard = Dashboard::default();
    for (equipment, record) in records {
        push_winding(&mut dashboard.winding, equipment, record);
        push_tan_delta(&mut dashboard.tan_delta, equipment, record);
        push_bushing(&mut dashboard.bushing, equipment, record);
        push_turns_ratio(&mut dashboard.turns_ratio, equipment, record);
        push_health(&mut dashboard.health, equipment, record);
    }
    dashboard
}

/// (list key, winding type, resistance key, unit)
const WINDING_SIDES: &[(&str, &str, &str, &str)] = &[
    ("lv_windings", "LV", "resistance_mohm", "mΩ"),
    ("hv_windings", "HV", "resistance_ohm", "Ω"),
];

fn push_winding(rows: &mut Vec<WindingRow>, equipment: &str, record: &StructuredRecord) {
    let Some(winding) = record.get("winding_resistance").and_then(Value::as_object) else {
        return;
    };
    for &(list_key, winding_type, resistance_key, unit) in WINDING_SIDES {
        let Some(entries) = winding.get(list_key).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries.iter().filter_map(Value::as_object) {
            rows.push(WindingRow {
                equipment_name: equipment.to_string(),
                winding_type: winding_type.to_string(),
                phase: text_field(entry, "phase"),
                tap_position: text_field(entry, "tap_position"),
                resistance: numeric_field(entry, resistance_key),
                unit: unit.to_string(),
                stability_percent: numeric_field(entry, "stability_percent"),
                variation_percent: numeric_field(entry, "variation_percent"),
            });
        }
    }
}

/// Key/value pairs of a section whose values are mappings.
fn mapping_entries(section: &Map<String, Value>) -> impl Iterator<Item = (&String, &Map<String, Value>)> {
    section
        .iter()
        .filter_map(|(key, value)| value.as_object().map(|obj| (key, obj)))
}

fn push_tan_delta(rows: &mut Vec<TanDeltaRow>, equipment: &str, record: &StructuredRecord) {
    let Some(tan_delta) = section(record, TAN_DELTA_KEYS) else {
        return;
    };
    for (name, data) in mapping_entries(tan_delta) {
        rows.push(TanDeltaRow {
            equipment_name: equipment.to_string(),
            section: name.clone(),
            pf_20c_percent: numeric_field(data, "pf_20c_percent"),
            status: text_field(data, "status"),
            threshold: text_field(data, "threshold_applied"),
        });
    }
}

fn push_bushing(rows: &mut Vec<BushingRow>, equipment: &str, record: &StructuredRecord) {
    let Some(bushings) = section(record, BUSHING_KEYS) else {
        return;
    };
    for (bushing_id, data) in mapping_entries(bushings) {
        rows.push(BushingRow {
            equipment_name: equipment.to_string(),
            bushing_id: bushing_id.clone(),
            pf_20c_percent: numeric_field(data, "pf_20c_percent"),
            pf_1hz_percent: numeric_field(data, "pf_1hz_percent"),
            status: text_field(data, "status"),
            remarks: text_field(data, "remarks"),
        });
    }
}

fn push_turns_ratio(rows: &mut Vec<TurnsRatioRow>, equipment: &str, record: &StructuredRecord) {
    let Some(turns_ratio) = record.get("turns_ratio").filter(|v| !is_blank(v)) else {
        return;
    };
    for data in mapping_list(turns_ratio) {
        rows.push(TurnsRatioRow {
            equipment_name: equipment.to_string(),
            tap_position: text_field(data, "tap_position"),
            nominal_ttr: numeric_field(data, "nominal_ttr"),
            measured_ttr: numeric_field(data, "measured_ttr"),
            error_percent: numeric_field(data, "error_percent"),
            excitation_current_ua: numeric_field(data, "excitation_current_ua"),
            excitation_current_ma: numeric_field(data, "excitation_current_ma"),
            phase_displacement_deg: numeric_field(data, "phase_displacement_deg"),
        });
    }
}

fn push_health(rows: &mut Vec<HealthRow>, equipment: &str, record: &StructuredRecord) {
    let Some(health) = section(record, HEALTH_KEYS) else {
        return;
    };
    for (category, data) in mapping_entries(health) {
        rows.push(HealthRow {
            equipment_name: equipment.to_string(),
            category: title_case(category),
            status: text_field(data, "status"),
            comments: text_field(data, "comments"),
        });
    }
}

/// A section the model emitted but left empty.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(obj) => obj.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(entries: &[(&str, Value)]) -> BTreeMap<String, StructuredRecord> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.as_object().cloned().unwrap()))
            .collect()
    }

    #[test]
    fn winding_rows_for_both_sides() {
        let recs = records(&[(
            "Substation_1",
            json!({"winding_resistance": {
                "lv_windings": [
                    {"phase": "X1-X0", "tap_position": "1L", "resistance_mohm": 1.234,
                     "stability_percent": 99.98, "variation_percent": 0.02},
                ],
                "hv_windings": [
                    {"phase": "H1-H3", "tap_position": "N", "resistance_ohm": 0.456},
                    "stray",
                ],
            }}),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.winding.len(), 2);

        let lv = &dash.winding[0];
        assert_eq!(lv.winding_type, "LV");
        assert_eq!(lv.resistance, "1.234");
        assert_eq!(lv.unit, "mΩ");
        assert_eq!(lv.stability_percent, "99.98");

        let hv = &dash.winding[1];
        assert_eq!(hv.winding_type, "HV");
        assert_eq!(hv.resistance, "0.456");
        assert_eq!(hv.unit, "Ω");
        assert_eq!(hv.stability_percent, "0");
        assert_eq!(hv.variation_percent, "0");
    }

    #[test]
    fn tan_delta_section_order_preserved() {
        let recs = records(&[(
            "T1",
            json!({"tan_delta": {
                "CHL": {"pf_20c_percent": 0.28, "status": "OK", "threshold_applied": "< 0.3% = OK"},
                "CLG": {"pf_20c_percent": 0.64, "status": "CRITICAL"},
                "overall": "CRITICAL",
            }}),
        )]);
        let dash = flatten(&recs);
        let sections: Vec<_> = dash.tan_delta.iter().map(|r| r.section.as_str()).collect();
        assert_eq!(sections, ["CHL", "CLG"]);
        assert_eq!(dash.tan_delta[0].threshold, "< 0.3% = OK");
        assert_eq!(dash.tan_delta[1].threshold, "");
    }

    #[test]
    fn tan_delta_older_key() {
        let recs = records(&[(
            "T1",
            json!({"tan_delta_main_insulation": {"CHG": {"pf_20c_percent": 0.21}}}),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.tan_delta.len(), 1);
        assert_eq!(dash.tan_delta[0].section, "CHG");
    }

    #[test]
    fn bushing_rows() {
        let recs = records(&[(
            "T1",
            json!({"bushing_pf_c1": {
                "X0": {"pf_20c_percent": 0.95, "pf_1hz_percent": 1.1, "status": "CRITICAL",
                       "remarks": "Immediate action required"},
            }}),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.bushing.len(), 1);
        let row = &dash.bushing[0];
        assert_eq!(row.bushing_id, "X0");
        assert_eq!(row.pf_1hz_percent, "1.1");
        assert_eq!(row.remarks, "Immediate action required");
    }

    #[test]
    fn turns_ratio_wrapped_measurements() {
        let recs = records(&[(
            "T1",
            json!({"turns_ratio": {"vector_group": "Dyn1",
                "measurements": [{"tap_position": "1L", "nominal_ttr": 10}]}}),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.turns_ratio.len(), 1);
        assert_eq!(dash.turns_ratio[0].tap_position, "1L");
        assert_eq!(dash.turns_ratio[0].nominal_ttr, "10");
        assert_eq!(dash.turns_ratio[0].excitation_current_ma, "0");
    }

    #[test]
    fn turns_ratio_bare_object() {
        let recs = records(&[("T1", json!({"turns_ratio": {"tap_position": "1L"}}))]);
        let dash = flatten(&recs);
        assert_eq!(dash.turns_ratio.len(), 1);
        assert_eq!(dash.turns_ratio[0].tap_position, "1L");
    }

    #[test]
    fn turns_ratio_skips_stray_entries() {
        let recs = records(&[(
            "T1",
            json!({"turns_ratio": [{"tap_position": "1L"}, "stray string"]}),
        )]);
        assert_eq!(flatten(&recs).turns_ratio.len(), 1);
    }

    #[test]
    fn turns_ratio_empty_section_ignored() {
        let recs = records(&[("T1", json!({"turns_ratio": {}})), ("T2", json!({"turns_ratio": null}))]);
        assert!(flatten(&recs).turns_ratio.is_empty());
    }

    #[test]
    fn health_key_precedence() {
        let recs = records(&[(
            "T1",
            json!({
                "health_assessment": {"old_category": {"status": "OK"}},
                "health_assessment_technical_complete": {
                    "tan_delta_main_insulation": {"status": "CRITICAL", "comments": "CLG high"},
                    "overall_condition": "CRITICAL",
                },
            }),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.health.len(), 1);
        assert_eq!(dash.health[0].category, "Tan Delta Main Insulation");
        assert_eq!(dash.health[0].status, "CRITICAL");
        assert_eq!(dash.health[0].comments, "CLG high");
    }

    #[test]
    fn health_master_enhanced_beats_plain() {
        let recs = records(&[(
            "T1",
            json!({
                "health_assessment": {"a": {"status": "OK"}},
                "health_assessment_master_enhanced": {"b": {"status": "WARNING"}},
            }),
        )]);
        let dash = flatten(&recs);
        assert_eq!(dash.health.len(), 1);
        assert_eq!(dash.health[0].category, "B");
    }

    #[test]
    fn missing_sections_contribute_nothing() {
        let recs = records(&[("T1", json!({"report_metadata": {"file_name": "x"}}))]);
        let dash = flatten(&recs);
        assert_eq!(dash.total_rows(), 0);
    }

    #[test]
    fn rows_ordered_by_equipment() {
        let recs = records(&[
            ("Zulu", json!({"bushing_pf": {"H1": {}}})),
            ("Alpha", json!({"bushing_pf": {"H1": {}}})),
        ]);
        let dash = flatten(&recs);
        let names: Vec<_> = dash.bushing.iter().map(|r| r.equipment_name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Zulu"]);
    }

    #[test]
    fn column_lists_match_struct_fields() {
        let row = HealthRow {
            equipment_name: String::new(),
            category: String::new(),
            status: String::new(),
            comments: String::new(),
        };
        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, HealthRow::COLUMNS);
    }
}
