use std::collections::HashMap;

use serde_json::Value;

use crate::document::{Document, STACK_CHUNK, STACK_RED_ZONE};
use crate::expansion::ExpansionOverlay;
use crate::search::SearchState;
use crate::tree::NodePath;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<'a> {
    /// The source was not valid JSON and is shown verbatim.
    Raw(&'a str),
    Tree(Vec<Row>),
}

impl Rendered<'_> {
    pub fn to_text(&self) -> String {
        match self {
            Rendered::Raw(text) => (*text).to_string(),
            Rendered::Tree(rows) => rows.iter().map(Row::text).collect::<Vec<_>>().join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Opening bracket of an expanded object or array.
    Open(char),
    Close(char),
    /// A collapsed object or array, e.g. `{2 items}`.
    Collapsed(String),
    Leaf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub path: NodePath,
    pub depth: usize,
    pub label: Option<String>,
    pub kind: RowKind,
    /// Non-empty composite that can be toggled.
    pub expandable: bool,
    /// Indices into the match list of the hits that fall in this node.
    pub matches: Vec<usize>,
    pub current: bool,
}

impl Row {
    pub fn text(&self) -> String {
        let mut out = INDENT.repeat(self.depth);
        if let Some(label) = &self.label {
            out.push_str(label);
            out.push_str(": ");
        }
        match &self.kind {
            RowKind::Open(c) | RowKind::Close(c) => out.push(*c),
            RowKind::Collapsed(s) | RowKind::Leaf(s) => out.push_str(s),
        }
        out
    }
}

pub fn item_summary(open: char, count: usize, close: char) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    format!("{open}{count} {noun}{close}")
}

struct RowBuilder<'a> {
    overlay: &'a ExpansionOverlay,
    owned: HashMap<&'a NodePath, Vec<usize>>,
    current: Option<usize>,
    rows: Vec<Row>,
}

impl RowBuilder<'_> {
    fn push(&mut self, path: &NodePath, label: Option<String>, kind: RowKind, expandable: bool) {
        let matches = self.owned.get(path).cloned().unwrap_or_default();
        let current = self.current.is_some_and(|c| matches.contains(&c));
        self.rows.push(Row {
            path: path.clone(),
            depth: path.depth(),
            label,
            kind,
            expandable,
            matches,
            current,
        });
    }

    fn node(&mut self, path: NodePath, value: &Value) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_CHUNK, || self.rows_for(path, value))
    }

    fn rows_for(&mut self, path: NodePath, value: &Value) {
        let label = (!path.is_root()).then(|| path.label());
        let (open, close, count) = match value {
            Value::Object(m) => ('{', '}', m.len()),
            Value::Array(a) => ('[', ']', a.len()),
            leaf => {
                self.push(&path, label, RowKind::Leaf(leaf.to_string()), false);
                return;
            }
        };
        if count == 0 {
            self.push(&path, label, RowKind::Leaf(format!("{open}{close}")), false);
            return;
        }
        if !self.overlay.is_expanded(&path) {
            self.push(&path, label, RowKind::Collapsed(item_summary(open, count, close)), true);
            return;
        }
        self.push(&path, label, RowKind::Open(open), true);
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    self.node(path.child_key(k.as_str()), v);
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    self.node(path.child_index(i), v);
                }
            }
            _ => {}
        }
        self.rows.push(Row {
            depth: path.depth(),
            path,
            label: None,
            kind: RowKind::Close(close),
            expandable: false,
            matches: Vec::new(),
            current: false,
        });
    }
}

/// Rows for every node reachable through expanded parents, in document order.
pub fn render_rows(doc: &Document, overlay: &ExpansionOverlay, search: &SearchState) -> Vec<Row> {
    let mut owned: HashMap<&NodePath, Vec<usize>> = HashMap::new();
    for (i, m) in search.matches().iter().enumerate() {
        if let Some(path) = doc.index.path_at(m.start) {
            owned.entry(path).or_default().push(i);
        }
    }
    let mut builder = RowBuilder {
        overlay,
        owned,
        current: search.current_index(),
        rows: Vec::new(),
    };
    builder.node(NodePath::root(), &doc.value);
    builder.rows
}
