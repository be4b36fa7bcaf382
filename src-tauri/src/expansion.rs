// Expansion is presentation state: a default flag plus per-node overrides keyed by JSON
// Pointer. Bulk commands drop the overrides and move the default.

use std::collections::HashMap;

use crate::tree::NodePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionOverlay {
    default_expanded: bool,
    overrides: HashMap<String, bool>,
}

impl Default for ExpansionOverlay {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ExpansionOverlay {
    pub fn new(default_expanded: bool) -> Self {
        Self {
            default_expanded,
            overrides: HashMap::new(),
        }
    }

    pub fn default_expanded(&self) -> bool {
        self.default_expanded
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.overrides
            .get(&path.pointer())
            .copied()
            .unwrap_or(self.default_expanded)
    }

    pub fn set(&mut self, path: &NodePath, expanded: bool) {
        self.overrides.insert(path.pointer(), expanded);
    }

    /// Flips one node and returns its new state.
    pub fn toggle(&mut self, path: &NodePath) -> bool {
        let next = !self.is_expanded(path);
        self.set(path, next);
        next
    }

    pub fn expand_all(&mut self) {
        self.reset(true);
    }

    pub fn collapse_all(&mut self) {
        self.reset(false);
    }

    pub fn reset(&mut self, default_expanded: bool) {
        self.overrides.clear();
        self.default_expanded = default_expanded;
    }

    /// Forces `path` and all of its ancestors open. Siblings and the default stay as they are.
    pub fn reveal(&mut self, path: &NodePath) {
        self.open_ancestors(path);
        self.set(path, true);
    }

    pub fn open_ancestors(&mut self, path: &NodePath) {
        for ancestor in path.ancestors() {
            self.set(&ancestor, true);
        }
    }

    /// Pointers of the nodes with an explicit override set to expanded.
    pub fn expanded_overrides(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .overrides
            .iter()
            .filter(|(_, expanded)| **expanded)
            .map(|(ptr, _)| ptr.as_str())
            .collect();
        out.sort_unstable();
        out
    }
}
