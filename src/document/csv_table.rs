use super::{Format, Mapping, NormalizedValue};
use crate::error::{ParseError, Position};

/// Parse CSV with a header row into a sequence of records.
pub(super) fn parse(text: &str) -> Result<NormalizedValue, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(|e| to_parse_error(text, &e))?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| to_parse_error(text, &e))?;
        let mut row = Mapping::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            // repeated header names: last column wins
            row.insert(header, typed_field(field));
        }
        rows.push(NormalizedValue::Mapping(row));
    }
    Ok(NormalizedValue::Sequence(rows))
}

fn typed_field(field: &str) -> NormalizedValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return NormalizedValue::Null;
    }
    match trimmed {
        "true" => return NormalizedValue::Bool(true),
        "false" => return NormalizedValue::Bool(false),
        _ => {}
    }
    let numeric = trimmed.parse::<i64>().is_ok() || trimmed.parse::<f64>().map_or(false, f64::is_finite);
    if numeric {
        NormalizedValue::Number(trimmed.to_string())
    } else {
        NormalizedValue::String(field.to_string())
    }
}

fn to_parse_error(text: &str, err: &csv::Error) -> ParseError {
    let position = err.position().map(|pos| {
        let byte = usize::try_from(pos.byte()).unwrap_or(usize::MAX);
        let mut position = Position::at_offset(text, byte);
        position.line = usize::try_from(pos.line()).ok();
        position
    });
    ParseError::syntax(Format::Csv, err.to_string(), position)
}
