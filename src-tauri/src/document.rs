// serde_json decides validity and builds the value. A second pass over the same text records
// the byte span of every node so a search hit can be mapped back to its path.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::tree::NodePath;

/// Where one node lives in the source text. `start..end` is a byte range; a member's span
/// starts at its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpan {
    pub path: NodePath,
    pub start: usize,
    pub end: usize,
    pub composite: bool,
}

impl NodeSpan {
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Node spans in pre-order: a parent precedes its children, siblings are disjoint. Members
/// overwritten by a later duplicate key are not indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanIndex {
    spans: Vec<NodeSpan>,
}

impl SpanIndex {
    pub fn build(source: &str) -> Result<Self, ParseError> {
        let mut walker = Walker {
            bytes: source.as_bytes(),
            source,
            pos: 0,
            spans: Vec::new(),
        };
        walker.value(NodePath::root(), None)?;
        Ok(Self {
            spans: drop_superseded(walker.spans),
        })
    }

    pub fn spans(&self) -> &[NodeSpan] {
        &self.spans
    }

    pub fn span_of(&self, path: &NodePath) -> Option<&NodeSpan> {
        self.spans.iter().find(|s| &s.path == path)
    }

    /// The deepest node whose span contains `offset`.
    pub fn span_at(&self, offset: usize) -> Option<&NodeSpan> {
        let mut found = None;
        for span in &self.spans {
            if span.start > offset {
                break;
            }
            if span.contains(offset) {
                found = Some(span);
            }
        }
        found
    }

    pub fn path_at(&self, offset: usize) -> Option<&NodePath> {
        self.span_at(offset).map(|s| &s.path)
    }
}

// Keeps the last span of each path, which is the member serde_json kept, and drops everything
// nested inside an earlier one.
fn drop_superseded(spans: Vec<NodeSpan>) -> Vec<NodeSpan> {
    let mut live = vec![true; spans.len()];
    let mut seen = HashSet::new();
    for (i, span) in spans.iter().enumerate().rev() {
        if !seen.insert(&span.path) {
            live[i] = false;
        }
    }
    let mut dead_until = 0;
    for (i, span) in spans.iter().enumerate() {
        if !live[i] || span.start < dead_until {
            live[i] = false;
            dead_until = dead_until.max(span.end);
        }
    }
    spans
        .into_iter()
        .zip(live)
        .filter_map(|(span, keep)| keep.then_some(span))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub value: Value,
    pub index: SpanIndex,
}

// Recursion on deeply nested input grows the stack in chunks instead of overflowing it.
pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;
pub(crate) const STACK_CHUNK: usize = 1024 * 1024;

/// Parses `text` with no nesting limit. Unpaired surrogate escapes decode to U+FFFD.
pub fn parse_document(text: &str) -> Result<Document, ParseError> {
    let text = replace_lone_surrogates(text);
    let value = parse_value(&text).map_err(|e| ParseError::from_serde(&e))?;
    let index = SpanIndex::build(&text)?;
    Ok(Document { value, index })
}

fn parse_value(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

// `\ud800` and `\ufffd` are both six bytes, so offsets into the result hold for the input.
fn replace_lone_surrogates(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let Some(unit) = unicode_escape(bytes, i) else {
            // any other escape, including `\\`
            i += 2;
            continue;
        };
        let paired = (0xD800..0xDC00).contains(&unit)
            && unicode_escape(bytes, i + 6).is_some_and(|low| (0xDC00..0xE000).contains(&low));
        if paired {
            i += 12;
        } else if (0xD800..0xE000).contains(&unit) {
            let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
            buf.push_str(&text[copied..i]);
            buf.push_str("\\ufffd");
            i += 6;
            copied = i;
        } else {
            i += 6;
        }
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

// The code unit of a `\uXXXX` escape starting at `at`.
fn unicode_escape(bytes: &[u8], at: usize) -> Option<u16> {
    let escape = bytes.get(at..at + 6)?;
    if escape[0] != b'\\' || escape[1] != b'u' || !escape[2..].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    escape[2..]
        .iter()
        .try_fold(0u16, |acc, &b| Some(acc * 16 + (b as char).to_digit(16)? as u16))
}

struct Walker<'a> {
    bytes: &'a [u8],
    source: &'a str,
    pos: usize,
    spans: Vec<NodeSpan>,
}

impl Walker<'_> {
    fn error(&self, message: &str) -> ParseError {
        let consumed = &self.source[..self.pos.min(self.source.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        ParseError {
            line,
            column,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        self.skip_ws();
        if self.peek() != Some(byte) {
            return Err(self.error(&format!("expected `{}`", byte as char)));
        }
        self.pos += 1;
        Ok(())
    }

    fn value(&mut self, path: NodePath, member_start: Option<usize>) -> Result<(), ParseError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_CHUNK, || self.node(path, member_start))
    }

    fn node(&mut self, path: NodePath, member_start: Option<usize>) -> Result<(), ParseError> {
        self.skip_ws();
        let value_start = self.pos;
        let composite = matches!(self.peek(), Some(b'{' | b'['));
        let slot = self.spans.len();
        self.spans.push(NodeSpan {
            path: path.clone(),
            start: member_start.unwrap_or(value_start),
            end: value_start,
            composite,
        });
        match self.peek() {
            Some(b'{') => self.object(&path)?,
            Some(b'[') => self.array(&path)?,
            Some(b'"') => {
                self.string()?;
            }
            Some(_) => self.scalar(),
            None => return Err(self.error("unexpected end of input")),
        }
        self.spans[slot].end = self.pos;
        Ok(())
    }

    fn object(&mut self, path: &NodePath) -> Result<(), ParseError> {
        self.pos += 1;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b',') => self.pos += 1,
                Some(b'"') => {
                    let key_start = self.pos;
                    let key = self.string()?;
                    self.expect(b':')?;
                    self.value(path.child_key(key), Some(key_start))?;
                }
                _ => return Err(self.error("expected object key")),
            }
        }
    }

    fn array(&mut self, path: &NodePath) -> Result<(), ParseError> {
        self.pos += 1;
        let mut index = 0;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b',') => self.pos += 1,
                Some(_) => {
                    self.value(path.child_index(index), None)?;
                    index += 1;
                }
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    // Consumes a string literal and returns its decoded content.
    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut escaped = false;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                let raw = &self.source[start..self.pos];
                return serde_json::from_str(raw).map_err(|e| ParseError::from_serde(&e));
            }
        }
        Err(self.error("unterminated string"))
    }

    fn scalar(&mut self) {
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SAMPLE: &str = r#"{"a": "foo", "b": {"c": "foobar"}}"#;

    fn pointer_at(doc: &Document, needle: &str) -> String {
        let offset = SAMPLE.find(needle).unwrap();
        doc.index.path_at(offset).unwrap().pointer()
    }

    #[test]
    fn valid_text_parses_to_value() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(doc.value, json!({"a": "foo", "b": {"c": "foobar"}}));
    }

    #[test]
    fn invalid_text_is_a_parse_error() {
        let err = parse_document("{\"a\": ").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(parse_document("").is_err());
        assert!(parse_document("{'a': 1}").is_err());
        assert!(parse_document("[1, 2,]").is_err());
    }

    #[test]
    fn object_key_order_is_preserved() {
        let doc = parse_document(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&String> = doc.value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn spans_are_preorder_and_nested() {
        let doc = parse_document(SAMPLE).unwrap();
        let pointers: Vec<String> = doc.index.spans().iter().map(|s| s.path.pointer()).collect();
        assert_eq!(pointers, vec!["", "/a", "/b", "/b/c"]);

        let root = &doc.index.spans()[0];
        assert_eq!((root.start, root.end), (0, SAMPLE.len()));
        assert!(root.composite);

        let member_b = doc.index.span_of(&NodePath::root().child_key("b")).unwrap();
        assert_eq!(&SAMPLE[member_b.start..member_b.end], r#""b": {"c": "foobar"}"#);
    }

    #[test]
    fn offsets_map_to_deepest_node() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(pointer_at(&doc, "foo\""), "/a");
        assert_eq!(pointer_at(&doc, "foobar"), "/b/c");
        assert_eq!(pointer_at(&doc, "\"c\""), "/b/c");
        assert_eq!(pointer_at(&doc, "{\"c"), "/b");
        assert_eq!(doc.index.path_at(0).unwrap().pointer(), "");
        assert!(doc.index.path_at(SAMPLE.len()).is_none());
    }

    #[test]
    fn arrays_and_escaped_keys() {
        let text = "[\n  1,\n  {\"k\\\"ey\": [true, null]}\n]";
        let doc = parse_document(text).unwrap();
        let pointers: Vec<String> = doc.index.spans().iter().map(|s| s.path.pointer()).collect();
        assert_eq!(pointers, vec!["", "/0", "/1", "/1/k\"ey", "/1/k\"ey/0", "/1/k\"ey/1"]);

        let null_at = text.find("null").unwrap();
        assert_eq!(doc.index.path_at(null_at).unwrap().pointer(), "/1/k\"ey/1");
    }

    #[test]
    fn leading_whitespace_belongs_to_no_node() {
        let doc = parse_document("  [1]").unwrap();
        assert!(doc.index.path_at(0).is_none());
        assert_eq!(doc.index.path_at(2).unwrap().pointer(), "");
    }

    #[test]
    fn scalar_root() {
        let doc = parse_document(" 42 ").unwrap();
        assert_eq!(doc.value, json!(42));
        let root = &doc.index.spans()[0];
        assert_eq!((root.start, root.end), (1, 3));
        assert!(!root.composite);
    }

    #[test]
    fn duplicate_keys_index_only_the_surviving_member() {
        let text = r#"{"a": "foo", "a": {"x": "bar"}, "b": 1}"#;
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.value, json!({"a": {"x": "bar"}, "b": 1}));
        let pointers: Vec<String> = doc.index.spans().iter().map(|s| s.path.pointer()).collect();
        assert_eq!(pointers, vec!["", "/a", "/a/x", "/b"]);

        assert_eq!(doc.index.path_at(text.find("foo").unwrap()).unwrap().pointer(), "");
        assert_eq!(doc.index.path_at(text.find("bar").unwrap()).unwrap().pointer(), "/a/x");
        let a = doc.index.span_of(&NodePath::root().child_key("a")).unwrap();
        assert_eq!(&text[a.start..a.end], r#""a": {"x": "bar"}"#);
    }

    #[test]
    fn children_of_a_superseded_member_are_dropped() {
        let text = r#"{"a": {"x": "foo"}, "a": 2}"#;
        let doc = parse_document(text).unwrap();
        let pointers: Vec<String> = doc.index.spans().iter().map(|s| s.path.pointer()).collect();
        assert_eq!(pointers, vec!["", "/a"]);
        assert_eq!(doc.index.path_at(text.find("foo").unwrap()).unwrap().pointer(), "");
    }

    #[test]
    fn lone_surrogates_become_replacement_characters() {
        let text = r#"{"k\ud800": "a\udc00b", "p": "😀", "s": "\\ud800"}"#;
        let doc = parse_document(text).unwrap();
        assert_eq!(
            doc.value,
            json!({"k\u{fffd}": "a\u{fffd}b", "p": "\u{1f600}", "s": "\\ud800"})
        );
        let b_at = text.find("b\"").unwrap();
        assert_eq!(doc.index.path_at(b_at).unwrap().pointer(), "/k\u{fffd}");
    }

    #[test]
    fn surrogate_replacement_keeps_length() {
        let text = r#""\ud800 \\udc00 \udbff\udfff \udc00""#;
        let clean = replace_lone_surrogates(text);
        assert_eq!(clean.len(), text.len());
        assert_eq!(clean, r#""\ufffd \\udc00 \udbff\udfff \ufffd""#);
        assert!(matches!(replace_lone_surrogates(r#"["A"]"#), Cow::Borrowed(_)));
    }

    #[test]
    fn nesting_has_no_depth_limit() {
        let depth = 1000;
        let text = format!("{}0{}", "[".repeat(depth), "]".repeat(depth));
        let doc = parse_document(&text).unwrap();
        assert_eq!(doc.index.spans().len(), depth + 1);
        assert_eq!(doc.index.path_at(depth).unwrap().depth(), depth);
    }
}
