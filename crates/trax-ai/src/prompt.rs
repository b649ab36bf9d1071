//! Prompt construction for the TRAX analysis request.

use trax_core::DocumentDate;

const INSTRUCTIONS: &str = "\
You are a transformer diagnostics expert. Extract EXACT values from this TRAX report and return \
BOTH structured JSON data AND a diagnostic summary.

Return VALID JSON first, then the human-readable report after it. Do not put comments in the JSON.

Use this structure for the JSON object:
{
  \"report_metadata\": {\"file_name\": \"...\", \"test_date\": \"YYYY-MM-DD\"},
  \"winding_resistance\": {
    \"lv_windings\": [{\"phase\": \"X1-X0\", \"tap_position\": \"1L\", \"resistance_mohm\": 0.0,
                     \"stability_percent\": 0.0, \"variation_percent\": 0.0}],
    \"hv_windings\": [{\"phase\": \"H1-H3\", \"tap_position\": \"1L\", \"resistance_ohm\": 0.0,
                     \"stability_percent\": 0.0, \"variation_percent\": 0.0}]
  },
  \"turns_ratio\": [{\"tap_position\": \"1L\", \"nominal_ttr\": 0.0, \"measured_ttr\": 0.0,
                   \"error_percent\": 0.0, \"excitation_current_ua\": 0.0,
                   \"phase_displacement_deg\": 0.0}],
  \"tan_delta\": {\"CHL\": {\"pf_20c_percent\": 0.0, \"status\": \"OK|WARNING|CRITICAL\",
                          \"threshold_applied\": \"< 0.3% = OK, 0.3-0.5% = WARNING, > 0.5% = CRITICAL\"}},
  \"bushing_pf\": {\"H1\": {\"pf_20c_percent\": 0.0, \"pf_1hz_percent\": 0.0,
                          \"status\": \"OK|WARNING|CRITICAL\", \"remarks\": \"...\"}},
  \"demagnetization\": {\"initial_remanence_percent\": 0.0, \"final_remanence_percent\": 0.0,
                        \"effectiveness\": \"Effective|Ineffective\"},
  \"health_assessment\": {\"lv_winding_resistance\": {\"status\": \"OK\", \"comments\": \"...\"}},
  \"recommendations\": {\"immediate\": [], \"near_term_6_12_months\": [],
                        \"long_term_12_plus_months\": []}
}

Include every phase, tap position, insulation section (CHL, CLG, CLH, CHG) and bushing \
(H1-H3, X0-X3) present in the report. After the JSON, write a TRANSFORMER DIAGNOSTIC REPORT \
with sections for winding resistance, turns ratio and excitation current, tan delta, bushing \
power factor, demagnetization, a summary health assessment, and technical recommendations.";

/// Build the user prompt for one report.
///
/// The report text is cut to `max_chars` characters.
pub fn build_prompt(
    text: &str,
    document_date: DocumentDate,
    filename: &str,
    max_chars: usize,
) -> String {
    format!(
        "{INSTRUCTIONS}\n\n\
         Report file: {filename}\n\
         Test date: {document_date}\n\
         \n\
         TRAX REPORT TEXT TO ANALYZE:\n\
         {text}",
        text = truncate_chars(text, max_chars),
    )
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
