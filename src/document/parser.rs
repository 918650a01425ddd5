//! Parser/validator: raw text in a declared format → [`NormalizedValue`].
//!
//! Pure function of its inputs. Every failure comes back as a
//! [`ParseError`]; blank input is an empty document, not an error.

use super::{csv_table, json, toml_table, xml, yaml, Format, NormalizedValue};
use crate::error::ParseError;

/// Largest nesting bound accepted. serde_json and serde_yaml stop recursing
/// at 128; TOML documents are further held to a lower ceiling of their own
/// because toml gives up sooner.
pub const MAX_DEPTH_CEILING: usize = 100;

/// Resource bounds applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum container nesting (see [`NormalizedValue::nesting`]).
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl ParseLimits {
    pub(crate) fn depth(&self) -> usize {
        self.max_depth.clamp(1, MAX_DEPTH_CEILING)
    }
}

/// Parse `text` with the default limits.
///
/// `Ok(None)` means the document is empty (blank text).
pub fn parse(text: &str, format: Format) -> Result<Option<NormalizedValue>, ParseError> {
    parse_with_limits(text, format, ParseLimits::default())
}

/// Parse `text` as `format`, rejecting input nested deeper than the limit.
pub fn parse_with_limits(
    text: &str,
    format: Format,
    limits: ParseLimits,
) -> Result<Option<NormalizedValue>, ParseError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let limit = limits.depth();
    let value = match format {
        Format::Json => json::parse(text, limit)?,
        Format::Yaml => yaml::parse(text, limit)?,
        Format::Toml => toml_table::parse(text, limit)?,
        Format::Xml => xml::parse(text, limit)?,
        Format::Csv => csv_table::parse(text)?,
    };

    if value.nesting() > limit {
        return Err(ParseError::TooDeep {
            limit,
            position: None,
        });
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty_document() {
        for format in Format::ALL {
            assert_eq!(parse("", format), Ok(None));
            assert_eq!(parse(" \n\t ", format), Ok(None));
        }
    }

    #[test]
    fn malformed_json_reports_message_and_position() {
        let err = parse(r#"{"a":}"#, Format::Json).unwrap_err();
        match &err {
            ParseError::Syntax { message, position, .. } => {
                assert!(!message.is_empty());
                let position = position.expect("position");
                assert_eq!(position.line, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // identical input, identical error
        assert_eq!(parse(r#"{"a":}"#, Format::Json).unwrap_err(), err);
    }

    #[test]
    fn depth_bound_applies_to_every_format() {
        let limits = ParseLimits { max_depth: 2 };
        let yaml = "a:\n  b:\n    c: 1\n";
        assert!(matches!(
            parse_with_limits(yaml, Format::Yaml, limits),
            Err(ParseError::TooDeep { limit: 2, .. })
        ));
        let toml = "[a.b]\nc = 1\n";
        assert!(matches!(
            parse_with_limits(toml, Format::Toml, limits),
            Err(ParseError::TooDeep { limit: 2, .. })
        ));
        assert!(parse_with_limits("a:\n  b: 1\n", Format::Yaml, limits).is_ok());
    }

    #[test]
    fn configured_depth_is_capped() {
        let limits = ParseLimits { max_depth: 10_000 };
        assert_eq!(limits.depth(), MAX_DEPTH_CEILING);
        let deep = format!("{}{}", "[".repeat(150), "]".repeat(150));
        assert!(matches!(
            parse_with_limits(&deep, Format::Json, limits),
            Err(ParseError::TooDeep { limit: MAX_DEPTH_CEILING, .. })
        ));
    }

    fn deep_text(format: Format, depth: usize) -> String {
        match format {
            Format::Json | Format::Yaml => format!("{}1{}", "[".repeat(depth), "]".repeat(depth)),
            Format::Toml => format!("a = {}1{}", "[".repeat(depth), "]".repeat(depth)),
            Format::Xml => format!("{}{}", "<e>".repeat(depth), "</e>".repeat(depth)),
            Format::Csv => unreachable!("csv nesting is fixed"),
        }
    }

    #[test]
    fn nesting_near_and_past_library_limits_is_too_deep() {
        let formats = [Format::Json, Format::Yaml, Format::Toml, Format::Xml];
        for format in formats {
            for depth in [70, 85, 120, 140] {
                let err = parse(&deep_text(format, depth), format).unwrap_err();
                assert!(
                    matches!(err, ParseError::TooDeep { .. }),
                    "{format} at depth {depth}: {err:?}"
                );
                assert!(crate::error::ViewerError::from(err).is_resource_limit());
            }
        }
    }

    #[test]
    fn nesting_within_bound_parses() {
        for format in [Format::Json, Format::Yaml, Format::Toml, Format::Xml] {
            assert!(parse(&deep_text(format, 40), format).is_ok(), "{format}");
        }
    }

    #[test]
    fn ceiling_bound_holds_for_every_format() {
        let limits = ParseLimits { max_depth: MAX_DEPTH_CEILING };
        for format in [Format::Json, Format::Yaml, Format::Toml, Format::Xml] {
            // TOML keeps its own lower ceiling
            let outcome = parse_with_limits(&deep_text(format, 90), format, limits);
            assert_eq!(outcome.is_ok(), format != Format::Toml, "{format}");
            let err = parse_with_limits(&deep_text(format, 140), format, limits).unwrap_err();
            assert!(matches!(err, ParseError::TooDeep { .. }), "{format}: {err:?}");
        }
    }

    #[test]
    fn csv_is_always_two_levels() {
        let limits = ParseLimits { max_depth: 1 };
        assert!(matches!(
            parse_with_limits("a\n1\n", Format::Csv, limits),
            Err(ParseError::TooDeep { limit: 1, .. })
        ));
        assert!(parse_with_limits("a\n1\n", Format::Csv, ParseLimits { max_depth: 2 }).is_ok());
    }

    #[test]
    fn same_structure_across_formats() {
        let json = parse(r#"{"name":"x","tags":["a","b"]}"#, Format::Json).unwrap();
        let yaml = parse("name: x\ntags:\n  - a\n  - b\n", Format::Yaml).unwrap();
        let toml = parse("name = \"x\"\ntags = [\"a\", \"b\"]\n", Format::Toml).unwrap();
        assert_eq!(json, yaml);
        assert_eq!(json, toml);
    }
}
