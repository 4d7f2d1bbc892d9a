//! Canonical rendering of structured-output schema definitions
//!
//! A schema definition may be written as a JSON-encoded string or as a
//! nested object. Both forms normalize to the same string, with object
//! keys sorted at every level, so a second apply never sees a diff.

use std::collections::BTreeMap;

use crate::value::entries_to_json;
use crate::{DynamicValue, Error, Result};

const ATTRIBUTE: &str = "schema_def";

/// Normalize a schema definition to its canonical JSON string.
///
/// Absent, null and empty-string input yield `Ok(None)`.
///
/// # Errors
///
/// Fails when a string form is not a JSON object, when a structured form
/// holds a non-finite number, or when the value is neither a string nor a map.
pub fn normalize(input: Option<&DynamicValue>) -> Result<Option<String>> {
    let Some(entries) = parse(input)? else {
        return Ok(None);
    };
    render(&entries).map(Some)
}

/// Parse a schema definition into its generic key/value mapping.
///
/// Structured input is converted to JSON and read back, so nested scalars
/// take the same typing a JSON-string input would give them.
///
/// # Errors
///
/// Same as [`normalize`].
pub fn parse(input: Option<&DynamicValue>) -> Result<Option<BTreeMap<String, DynamicValue>>> {
    match input {
        None | Some(DynamicValue::Null) => Ok(None),
        Some(DynamicValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(DynamicValue::String(s)) => DynamicValue::parse_object(ATTRIBUTE, s).map(Some),
        Some(DynamicValue::Map(entries)) => {
            let json = entries_to_json(entries, ATTRIBUTE)?;
            match DynamicValue::from(json) {
                DynamicValue::Map(reparsed) => Ok(Some(reparsed)),
                other => Err(Error::UnsupportedValue {
                    key: ATTRIBUTE.to_string(),
                    expected: "an object",
                    found: other.kind(),
                }),
            }
        }
        Some(other) => Err(Error::UnsupportedValue {
            key: ATTRIBUTE.to_string(),
            expected: "a JSON string or an object",
            found: other.kind(),
        }),
    }
}

/// Render a mapping as compact JSON with sorted keys
///
/// # Errors
///
/// Returns [`Error::Serialize`] if the encoder fails.
pub fn render(entries: &BTreeMap<String, DynamicValue>) -> Result<String> {
    Ok(serde_json::to_string(entries)?)
}
