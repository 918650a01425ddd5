//! XML → normalized value.
//!
//! Elements become mappings. Attributes are keys prefixed with `@`, text is
//! kept under `#text` (or is the whole value of a text-only element), and
//! repeated sibling elements collapse into a sequence in document order.
//! The result is a single-key mapping named after the root element.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Format, Mapping, NormalizedValue};
use crate::error::{ParseError, Position};

const TEXT_KEY: &str = "#text";
const ATTR_PREFIX: char = '@';

struct OpenElement {
    name: String,
    fields: Mapping,
    text: String,
}

impl OpenElement {
    fn finish(self) -> (String, NormalizedValue) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            if text.is_empty() {
                NormalizedValue::Null
            } else {
                NormalizedValue::String(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert(TEXT_KEY, NormalizedValue::String(text.to_string()));
            }
            NormalizedValue::Mapping(fields)
        };
        (self.name, value)
    }

    fn add_child(&mut self, name: String, value: NormalizedValue) {
        match self.fields.get_mut(&name) {
            // element values are never sequences, so an existing sequence
            // is a run of repeated siblings
            Some(NormalizedValue::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, NormalizedValue::Null);
                *existing = NormalizedValue::Sequence(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }
}

/// Byte offset of the current event. Turned into a [`Position`] only when
/// an error needs one, since that costs a scan from the start of the text.
#[derive(Clone, Copy)]
struct At<'a> {
    text: &'a str,
    offset: u64,
}

impl At<'_> {
    fn position(self) -> Position {
        Position::at_offset(self.text, usize::try_from(self.offset).unwrap_or(usize::MAX))
    }

    fn syntax(self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(Format::Xml, message, Some(self.position()))
    }

    fn too_deep(self, limit: usize) -> ParseError {
        ParseError::TooDeep {
            limit,
            position: Some(self.position()),
        }
    }
}

pub(super) fn parse(text: &str, limit: usize) -> Result<NormalizedValue, ParseError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, NormalizedValue)> = None;

    loop {
        let at = At {
            text,
            offset: reader.buffer_position() as u64,
        };
        let event = reader.read_event().map_err(|e| at.syntax(e.to_string()))?;

        match event {
            Event::Start(start) => {
                if stack.len() + 1 > limit {
                    return Err(at.too_deep(limit));
                }
                ensure_single_root(&root, at)?;
                stack.push(open(&start, at)?);
            }
            Event::Empty(start) => {
                if stack.len() + 1 > limit {
                    return Err(at.too_deep(limit));
                }
                ensure_single_root(&root, at)?;
                let element = open(&start, at)?;
                close(element.finish(), &mut stack, &mut root);
            }
            Event::End(_) => {
                // quick-xml has already matched the end name against the start
                let element = stack.pop().ok_or_else(|| at.syntax("unexpected closing tag"))?;
                close(element.finish(), &mut stack, &mut root);
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| at.syntax(e.to_string()))?;
                push_text(&mut stack, &content, at)?;
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&bytes), at)?;
            }
            Event::Eof => break,
            // comments, declarations, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::syntax(
            Format::Xml,
            format!("unclosed element <{}>", open.name),
            Some(Position::at_offset(text, text.len())),
        ));
    }

    let (name, value) = root.ok_or_else(|| ParseError::syntax(Format::Xml, "no root element", None))?;
    let mut map = Mapping::new();
    map.insert(name, value);
    Ok(NormalizedValue::Mapping(map))
}

fn ensure_single_root(root: &Option<(String, NormalizedValue)>, at: At<'_>) -> Result<(), ParseError> {
    match root {
        Some(_) => Err(at.syntax("multiple root elements")),
        None => Ok(()),
    }
}

fn open(start: &BytesStart<'_>, at: At<'_>) -> Result<OpenElement, ParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut fields = Mapping::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| at.syntax(e.to_string()))?;
        let key = format!("{ATTR_PREFIX}{}", String::from_utf8_lossy(attr.key.as_ref()));
        let value = attr.unescape_value().map_err(|e| at.syntax(e.to_string()))?;
        fields.insert(key, NormalizedValue::String(value.into_owned()));
    }
    Ok(OpenElement {
        name,
        fields,
        text: String::new(),
    })
}

fn close(
    (name, value): (String, NormalizedValue),
    stack: &mut [OpenElement],
    root: &mut Option<(String, NormalizedValue)>,
) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn push_text(stack: &mut [OpenElement], content: &str, at: At<'_>) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(open) => {
            open.text.push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(at.syntax("text outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(value: &NormalizedValue) -> &Mapping {
        match value {
            NormalizedValue::Mapping(map) => map,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn elements_attributes_and_text() {
        let value = parse(r#"<book id="7"><title>Dune</title><note lang="en">classic</note></book>"#, 8).unwrap();
        let book = mapping(mapping(&value).get("book").unwrap());
        assert_eq!(book.get("@id"), Some(&NormalizedValue::String("7".into())));
        assert_eq!(book.get("title"), Some(&NormalizedValue::String("Dune".into())));
        let note = mapping(book.get("note").unwrap());
        assert_eq!(note.get("#text"), Some(&NormalizedValue::String("classic".into())));
    }

    #[test]
    fn repeated_siblings_become_sequence() {
        let value = parse("<list><item>a</item><item>b</item><item/></list>", 8).unwrap();
        let list = mapping(mapping(&value).get("list").unwrap());
        assert_eq!(
            list.get("item"),
            Some(&NormalizedValue::Sequence(vec![
                NormalizedValue::String("a".into()),
                NormalizedValue::String("b".into()),
                NormalizedValue::Null,
            ]))
        );
    }

    #[test]
    fn rejects_mismatched_and_unclosed_tags() {
        assert!(parse("<a><b></a>", 8).is_err());
        assert!(parse("<a><b></b>", 8).is_err());
        assert!(parse("<a/><b/>", 8).is_err());
    }

    #[test]
    fn large_documents_parse_in_linear_time() {
        // ~1.3 MB of repeated siblings, then ~0.6 MB of distinct ones
        let mut xml = String::from("<root>");
        for i in 0..40_000 {
            xml.push_str(&format!("<item id=\"{i}\">value {i}</item>\n"));
        }
        xml.push_str("<other>");
        for i in 0..20_000 {
            xml.push_str(&format!("<field{i}>{i}</field{i}>\n"));
        }
        xml.push_str("</other></root>");

        let started = std::time::Instant::now();
        let value = parse(&xml, 8).unwrap();
        let elapsed = started.elapsed();

        let root = mapping(mapping(&value).get("root").unwrap());
        assert_eq!(root.get("item").map(NormalizedValue::len), Some(40_000));
        assert_eq!(mapping(root.get("other").unwrap()).len(), 20_000);
        assert!(elapsed < std::time::Duration::from_secs(10), "took {elapsed:?}");
    }

    #[test]
    fn errors_still_carry_positions() {
        let err = parse("<a>\n<b></c></a>", 8).unwrap_err();
        assert_eq!(err.position().and_then(|p| p.line), Some(2));
    }

    #[test]
    fn depth_bound() {
        let err = parse("<a><b><c/></b></a>", 2);
        assert!(matches!(err, Err(ParseError::TooDeep { limit: 2, .. })));
    }
}
