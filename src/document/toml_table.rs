use toml::Value;

use super::{Format, Mapping, NormalizedValue};
use crate::error::{ParseError, Position};

/// toml's parser stops at 80 nested arrays and inline tables with a plain
/// syntax error. Bounds are held below that so ours is the one reported.
pub(super) const NESTING_CEILING: usize = 64;

pub(super) fn parse(text: &str, limit: usize) -> Result<NormalizedValue, ParseError> {
    let limit = limit.min(NESTING_CEILING);
    check_nesting(text, limit)?;
    let table: toml::Table = text.parse().map_err(|e: toml::de::Error| {
        let position = e.span().map(|span| Position::at_offset(text, span.start));
        let message = e.message().trim();
        if message.contains("recursion limit") {
            return ParseError::TooDeep { limit, position };
        }
        ParseError::syntax(Format::Toml, message, position)
    })?;
    Ok(normalize(Value::Table(table)))
}

/// Bracket nesting of arrays, inline tables and headers, skipping strings
/// and comments. The document table itself counts as one level.
fn check_nesting(text: &str, limit: usize) -> Result<(), ParseError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                i = bytes[i..].iter().position(|&b| b == b'\n').map_or(bytes.len(), |nl| i + nl);
                continue;
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'[' | b'{' => {
                depth += 1;
                if depth + 1 > limit {
                    return Err(ParseError::TooDeep {
                        limit,
                        position: Some(Position::at_offset(text, i)),
                    });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

/// Index just past the string starting at `start`. Unterminated strings
/// end at the line break (or the text end); toml reports those itself.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let delimiter = [quote; 3];
    let multiline = bytes[start..].starts_with(&delimiter);
    let mut i = start + if multiline { 3 } else { 1 };
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 1,
            b'\n' if !multiline => return i + 1,
            b if b == quote && !multiline => return i + 1,
            b if b == quote && bytes[i..].starts_with(&delimiter) => return i + 3,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn normalize(value: Value) -> NormalizedValue {
    match value {
        Value::String(s) => NormalizedValue::String(s),
        Value::Integer(i) => NormalizedValue::Number(i.to_string()),
        Value::Float(f) => NormalizedValue::Number(f.to_string()),
        Value::Boolean(b) => NormalizedValue::Bool(b),
        Value::Datetime(dt) => NormalizedValue::String(dt.to_string()),
        Value::Array(items) => NormalizedValue::Sequence(items.into_iter().map(normalize).collect()),
        Value::Table(table) => {
            let mut map = Mapping::new();
            for (key, value) in table {
                map.push_unique(key, normalize(value));
            }
            NormalizedValue::Mapping(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_keep_document_order() {
        let value = parse("zeta = 1\nalpha = 2\n[server]\nport = 8080\n", 8).unwrap();
        let NormalizedValue::Mapping(map) = value else {
            panic!("expected mapping");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "server"]);
    }

    #[test]
    fn datetimes_become_strings() {
        let value = parse("at = 1979-05-27T07:32:00Z\n", 8).unwrap();
        let NormalizedValue::Mapping(map) = value else {
            panic!("expected mapping");
        };
        assert_eq!(
            map.get("at"),
            Some(&NormalizedValue::String("1979-05-27T07:32:00Z".into()))
        );
    }

    fn nested_arrays(depth: usize) -> String {
        format!("a = {}1{}\n", "[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn nesting_past_the_bound_is_too_deep() {
        for depth in [70, 85, 150] {
            let err = parse(&nested_arrays(depth), 64).unwrap_err();
            assert!(
                matches!(err, ParseError::TooDeep { limit: 64, position: Some(_) }),
                "depth {depth}: {err:?}"
            );
        }
    }

    #[test]
    fn bound_is_capped_below_the_toml_parser_limit() {
        let err = parse(&nested_arrays(90), 100).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: NESTING_CEILING, .. }));
        // within the ceiling: root table + 62 arrays
        assert!(parse(&nested_arrays(62), 100).is_ok());
    }

    #[test]
    fn brackets_in_strings_and_comments_do_not_count() {
        let text = "a = \"[[[[\" # [[[[[[\nb = '{{{{'\nc = \"\"\"\n[[[[\n\"\"\"\nd = \"\\\"[[\"\n";
        let value = parse(text, 3).unwrap();
        let NormalizedValue::Mapping(map) = value else {
            panic!("expected mapping");
        };
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("b"), Some(&NormalizedValue::String("{{{{".into())));
    }

    #[test]
    fn duplicate_keys_are_rejected_like_toml_does() {
        let err = parse("a = 1\na = 2\n", 8).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { format: Format::Toml, .. }));
        assert!(err.position().is_some());
    }
}
