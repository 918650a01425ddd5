use serde_yaml::Value;

use super::{Format, Mapping, NormalizedValue};
use crate::error::{ParseError, Position};

/// `limit` is only reported: serde_yaml's own recursion guard sits above
/// every accepted bound, and the caller checks nesting after the parse.
pub(super) fn parse(text: &str, limit: usize) -> Result<NormalizedValue, ParseError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| to_parse_error(&e, limit))?;
    Ok(normalize(value))
}

fn to_parse_error(err: &serde_yaml::Error, limit: usize) -> ParseError {
    let position = err.location().map(|loc| Position {
        line: Some(loc.line()),
        column: Some(loc.column()),
        offset: Some(loc.index()),
    });
    let full = err.to_string();
    let message = match full.find(" at line ") {
        Some(cut) => full[..cut].to_string(),
        None => full,
    };
    if message.contains("recursion limit exceeded") {
        return ParseError::TooDeep { limit, position };
    }
    ParseError::syntax(Format::Yaml, message, position)
}

fn normalize(value: Value) -> NormalizedValue {
    match value {
        Value::Null => NormalizedValue::Null,
        Value::Bool(b) => NormalizedValue::Bool(b),
        Value::Number(n) => NormalizedValue::Number(n.to_string()),
        Value::String(s) => NormalizedValue::String(s),
        Value::Sequence(items) => NormalizedValue::Sequence(items.into_iter().map(normalize).collect()),
        Value::Mapping(mapping) => {
            let mut map = Mapping::new();
            for (key, value) in mapping {
                map.insert(key_text(key), normalize(value));
            }
            NormalizedValue::Mapping(map)
        }
        Value::Tagged(tagged) => normalize(tagged.value),
    }
}

/// YAML allows any value as a key; the graph needs text.
fn key_text(key: Value) -> String {
    match key {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Tagged(tagged) => key_text(tagged.value),
        complex => serde_yaml::to_string(&complex)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
