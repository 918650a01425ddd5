use super::{Format, Mapping, NormalizedValue};
use crate::error::{ParseError, Position};

pub(super) fn parse(text: &str, limit: usize) -> Result<NormalizedValue, ParseError> {
    check_nesting(text, limit)?;
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| syntax_error(text, &e))?;
    Ok(normalize(value))
}

/// Reject input whose bracket nesting exceeds `limit` before handing it to
/// serde_json, so the bound is reported with a position instead of as a
/// recursion failure.
fn check_nesting(text: &str, limit: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return Err(ParseError::TooDeep {
                        limit,
                        position: Some(Position::at_offset(text, offset)),
                    });
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(text: &str, err: &serde_json::Error) -> ParseError {
    let full = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    let message = full.strip_suffix(&suffix).unwrap_or(&full).to_string();
    let position = (err.line() > 0).then(|| Position::at_line_column(text, err.line(), err.column()));
    ParseError::syntax(Format::Json, message, position)
}

fn normalize(value: serde_json::Value) -> NormalizedValue {
    match value {
        serde_json::Value::Null => NormalizedValue::Null,
        serde_json::Value::Bool(b) => NormalizedValue::Bool(b),
        serde_json::Value::Number(n) => NormalizedValue::Number(n.to_string()),
        serde_json::Value::String(s) => NormalizedValue::String(s),
        serde_json::Value::Array(items) => NormalizedValue::Sequence(items.into_iter().map(normalize).collect()),
        serde_json::Value::Object(object) => {
            // serde_json already resolved duplicate keys (last write wins)
            let mut map = Mapping::new();
            for (key, value) in object {
                map.push_unique(key, normalize(value));
            }
            NormalizedValue::Mapping(map)
        }
    }
}
