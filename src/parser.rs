use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::generator::StageOutput;

/// Returns the span from the first `{` to the last `}` inclusive, if the
/// first comes before the last.
pub fn locate_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start < end {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// Pulls a record out of text that is expected to contain one JSON object,
/// possibly wrapped in prose or markdown fences.
pub fn parse_record<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let candidate = locate_json_object(raw).ok_or(ParseError::NoJsonFound)?;
    serde_json::from_str(candidate).map_err(|e| ParseError::MalformedJson(e.to_string()))
}

pub fn parse_stage_output<T: DeserializeOwned>(output: &StageOutput) -> Result<T, ParseError> {
    match output.as_text() {
        Some(raw) => parse_record(raw),
        None => Err(ParseError::UnexpectedShape(output.kind())),
    }
}
