use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::expansion::ExpansionOverlay;
use crate::types::Node;

/// Label shown for the document root, also used when copying a scalar root.
pub const ROOT_LABEL: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Structural address of a node: the keys and indices leading to it from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn ancestors(&self) -> Vec<NodePath> {
        (0..self.0.len()).map(|n| Self(self.0[..n].to_vec())).collect()
    }

    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// What the tree shows in front of the node: its key, its index, or `root`.
    pub fn label(&self) -> String {
        match self.0.last() {
            None => ROOT_LABEL.to_string(),
            Some(PathSegment::Key(k)) => k.clone(),
            Some(PathSegment::Index(i)) => i.to_string(),
        }
    }

    /// RFC 6901 JSON Pointer; the empty string for the root.
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            out.push('/');
            match segment {
                PathSegment::Key(k) => out.push_str(&escape_pointer_token(k)),
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pointer())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}

// JSON Pointer token escape (~0, ~1)
pub fn escape_pointer_token(raw: &str) -> String {
    raw.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

pub fn value_at<'a>(root: &'a Value, path: &NodePath) -> Option<&'a Value> {
    path.segments().iter().try_fold(root, |current, segment| match (current, segment) {
        (Value::Object(map), PathSegment::Key(k)) => map.get(k),
        (Value::Array(arr), PathSegment::Index(i)) => arr.get(*i),
        _ => None,
    })
}

/// Turns a JSON Pointer into a structural path, using the document to tell array indices
/// from object keys that look numeric.
pub fn resolve_pointer(root: &Value, pointer: &str) -> Option<NodePath> {
    if pointer.is_empty() {
        return Some(NodePath::root());
    }
    let rest = pointer.strip_prefix('/')?;
    let mut current = root;
    let mut path = NodePath::root();
    for raw in rest.split('/') {
        let token = unescape_pointer_token(raw);
        match current {
            Value::Object(map) => {
                current = map.get(&token)?;
                path = path.child_key(token);
            }
            Value::Array(arr) => {
                let index: usize = token.parse().ok()?;
                current = arr.get(index)?;
                path = path.child_index(index);
            }
            _ => return None,
        }
    }
    Some(path)
}

pub fn is_composite(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_))
}

pub fn value_type(v: &Value) -> &'static str {
    match v {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

pub fn preview(v: &Value, truncate_limit: Option<usize>) -> String {
    match v {
        Value::Object(m) if m.is_empty() => "{} 0 keys".to_string(),
        Value::Object(m) => format!("{{…}} {} keys", m.len()),
        Value::Array(a) if a.is_empty() => "[] 0 items".to_string(),
        Value::Array(a) => format!("[…] {} items", a.len()),
        Value::String(s) => match truncate_limit {
            Some(limit) => truncate(s, limit),
            None => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".into(),
    }
}

pub fn to_node(path: &NodePath, v: &Value, overlay: &ExpansionOverlay, truncate_limit: Option<usize>) -> Node {
    let child_count = match v {
        Value::Object(m) => m.len(),
        Value::Array(a) => a.len(),
        _ => 0,
    };
    Node {
        pointer: path.pointer(),
        key: (!path.is_root()).then(|| path.label()),
        value_type: value_type(v).into(),
        has_children: child_count > 0,
        child_count,
        expanded: is_composite(v) && overlay.is_expanded(path),
        preview: preview(v, truncate_limit),
    }
}

/// One page of the children of the node at `path`; scalars have none.
pub fn list_children(
    root: &Value,
    path: &NodePath,
    overlay: &ExpansionOverlay,
    offset: usize,
    limit: usize,
    truncate_limit: Option<usize>,
) -> Vec<Node> {
    match value_at(root, path) {
        Some(Value::Object(map)) => map
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(k, v)| to_node(&path.child_key(k.as_str()), v, overlay, truncate_limit))
            .collect(),
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, v)| to_node(&path.child_index(i), v, overlay, truncate_limit))
            .collect(),
        _ => vec![],
    }
}
