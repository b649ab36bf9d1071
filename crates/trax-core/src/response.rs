//! Splitting a model completion into its JSON record and narrative.
//!
//! The analyzer is asked for a JSON object followed by a human-readable
//! report. In practice the object may be wrapped in a code fence, preceded by
//! a sentence, or followed by more braces in the prose. The first complete
//! top-level object is the record; everything after it is the narrative.

use thiserror::Error;

use crate::record::StructuredRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("no JSON object found in analysis response")]
    NoJsonFound,

    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Result of splitting one response.
///
/// On failure the narrative is the entire raw response, since the split
/// point cannot be trusted.
#[derive(Debug, Clone)]
pub struct SplitResponse {
    pub record: Result<StructuredRecord, SplitError>,
    pub narrative: String,
}

impl SplitResponse {
    fn failed(raw: &str, error: SplitError) -> Self {
        Self {
            record: Err(error),
            narrative: raw.to_string(),
        }
    }
}

/// Split a raw completion into `(record, narrative)`.
pub fn split_response(raw: &str) -> SplitResponse {
    let Some(start) = raw.find('{') else {
        return SplitResponse::failed(raw, SplitError::NoJsonFound);
    };

    let Some(end) = matching_brace(raw, start) else {
        return SplitResponse::failed(
            raw,
            SplitError::JsonParse("unterminated JSON object".to_string()),
        );
    };

    let candidate = &raw[start..=end];
    match serde_json::from_str::<StructuredRecord>(candidate) {
        Ok(record) => SplitResponse {
            record: Ok(record),
            narrative: raw[end + 1..].trim().to_string(),
        },
        Err(e) => SplitResponse::failed(raw, SplitError::JsonParse(e.to_string())),
    }
}

/// Byte index of the `}` closing the `{` at `start`.
///
/// Braces inside JSON string literals do not count.
fn matching_brace(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in raw.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
