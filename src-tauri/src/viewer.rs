// When the current match changes, the node holding it is looked up in the span index and
// its ancestors are forced open.

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::document::{parse_document, Document};
use crate::error::{Error, ParseError, Result};
use crate::expansion::ExpansionOverlay;
use crate::node::node_copy_text;
use crate::render::{render_rows, Rendered};
use crate::search::{SearchMatch, SearchOptions, SearchState};
use crate::tree::{self, is_composite, resolve_pointer, value_at, NodePath};
use crate::types::Node;

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Tree(Document),
    /// Not valid JSON: the source is shown as-is.
    Raw(ParseError),
}

#[derive(Debug, Clone)]
pub struct JsonViewer {
    source: String,
    content: Content,
    search: SearchState,
    expansion: ExpansionOverlay,
    preview_limit: usize,
}

impl JsonViewer {
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_config(source, &ViewerConfig::default())
    }

    pub fn with_config(source: impl Into<String>, config: &ViewerConfig) -> Self {
        let source = source.into();
        let content = parse_content(&source);
        let mut viewer = Self {
            source,
            content,
            search: SearchState::new(SearchOptions {
                match_case: config.match_case,
                whole_word: config.whole_word,
            }),
            expansion: ExpansionOverlay::new(config.expand_all),
            preview_limit: config.preview_limit,
        };
        viewer.search.recompute(&viewer.source);
        viewer.reveal_current();
        viewer
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.content {
            Content::Tree(doc) => Some(doc),
            Content::Raw(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.document().map(|d| &d.value)
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.content {
            Content::Raw(err) => Some(err),
            Content::Tree(_) => None,
        }
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn expansion(&self) -> &ExpansionOverlay {
        &self.expansion
    }

    /// Replaces the text. The expansion overlay is reset; the expand-all default is kept.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.load(source.into());
        let default = self.expansion.default_expanded();
        self.expansion.reset(default);
        self.reveal_current();
    }

    /// Replaces the text but keeps per-node expansion, for re-parses that keep the same shape.
    pub fn set_source_keep_expansion(&mut self, source: impl Into<String>) {
        self.load(source.into());
        self.reveal_current();
    }

    fn load(&mut self, source: String) {
        self.content = parse_content(&source);
        self.source = source;
        self.search.recompute(&self.source);
        info!(bytes = self.source.len(), valid = self.document().is_some(), "viewer source replaced");
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.set_term(term, &self.source);
        self.reveal_current();
    }

    pub fn set_search_options(&mut self, options: SearchOptions) {
        self.search.set_options(options, &self.source);
        self.reveal_current();
    }

    pub fn set_search(&mut self, term: impl Into<String>, options: SearchOptions) {
        let term = term.into();
        if term == self.search.term() && options == self.search.options() {
            return;
        }
        self.search = SearchState::new(options);
        self.set_search_term(term);
    }

    pub fn toggle_match_case(&mut self) {
        let mut options = self.search.options();
        options.match_case = !options.match_case;
        self.set_search_options(options);
    }

    pub fn toggle_whole_word(&mut self) {
        let mut options = self.search.options();
        options.whole_word = !options.whole_word;
        self.set_search_options(options);
    }

    pub fn next_match(&mut self) -> bool {
        let moved = self.search.next();
        if moved {
            self.reveal_current();
        }
        moved
    }

    pub fn previous_match(&mut self) -> bool {
        let moved = self.search.previous();
        if moved {
            self.reveal_current();
        }
        moved
    }

    pub fn select_match(&mut self, index: usize) -> bool {
        let moved = self.search.select(index);
        if moved {
            self.reveal_current();
        }
        moved
    }

    pub fn current_match(&self) -> Option<SearchMatch> {
        self.search.current().copied()
    }

    pub fn match_display(&self) -> String {
        self.search.display()
    }

    pub fn path_at(&self, offset: usize) -> Option<&NodePath> {
        self.document().and_then(|d| d.index.path_at(offset))
    }

    pub fn current_match_path(&self) -> Option<&NodePath> {
        self.current_match().and_then(|m| self.path_at(m.start))
    }

    fn reveal_current(&mut self) {
        let Some(current) = self.search.current().copied() else { return; };
        let Content::Tree(doc) = &self.content else { return; };
        let Some(span) = doc.index.span_at(current.start) else { return; };
        if span.composite {
            self.expansion.reveal(&span.path);
        } else {
            self.expansion.open_ancestors(&span.path);
        }
        debug!(offset = current.start, path = %span.path, "revealed current match");
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    /// Whether a composite node shows its children. Scalars and unknown paths never do.
    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.value()
            .and_then(|root| value_at(root, path))
            .is_some_and(|v| is_composite(v) && self.expansion.is_expanded(path))
    }

    /// Flips a composite node, returning its new state.
    pub fn toggle_node(&mut self, path: &NodePath) -> Result<bool> {
        self.composite_at(path)?;
        Ok(self.expansion.toggle(path))
    }

    pub fn set_expanded(&mut self, path: &NodePath, expanded: bool) -> Result<()> {
        self.composite_at(path)?;
        self.expansion.set(path, expanded);
        Ok(())
    }

    fn composite_at(&self, path: &NodePath) -> Result<&Value> {
        let root = self.value().ok_or(Error::NoDocument)?;
        value_at(root, path)
            .filter(|v| is_composite(v))
            .ok_or_else(|| Error::InvalidPointer(path.pointer()))
    }

    pub fn resolve(&self, pointer: &str) -> Result<NodePath> {
        let root = self.value().ok_or(Error::NoDocument)?;
        resolve_pointer(root, pointer).ok_or_else(|| Error::InvalidPointer(pointer.to_string()))
    }

    pub fn render(&self) -> Rendered<'_> {
        match &self.content {
            Content::Raw(_) => Rendered::Raw(&self.source),
            Content::Tree(doc) => Rendered::Tree(render_rows(doc, &self.expansion, &self.search)),
        }
    }

    pub fn copy_text(&self, pointer: &str) -> Result<String> {
        let path = self.resolve(pointer)?;
        let root = self.value().ok_or(Error::NoDocument)?;
        let value = value_at(root, &path).ok_or_else(|| Error::InvalidPointer(pointer.to_string()))?;
        node_copy_text(value, &path.label())
    }

    pub fn children(&self, pointer: &str, offset: usize, limit: usize) -> Result<Vec<Node>> {
        let path = self.resolve(pointer)?;
        let root = self.value().ok_or(Error::NoDocument)?;
        Ok(tree::list_children(root, &path, &self.expansion, offset, limit, Some(self.preview_limit)))
    }
}

fn parse_content(source: &str) -> Content {
    match parse_document(source) {
        Ok(doc) => Content::Tree(doc),
        Err(err) => {
            debug!(error = %err, "falling back to raw text");
            Content::Raw(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{"a": "foo", "b": {"c": "foobar"}, "d": [1, {"e": "foo"}]}"#;

    fn path(p: &str, viewer: &JsonViewer) -> NodePath {
        viewer.resolve(p).unwrap()
    }

    #[test]
    fn invalid_json_falls_back_to_raw() {
        let viewer = JsonViewer::new("not json {");
        assert!(viewer.parse_error().is_some());
        assert_eq!(viewer.render(), Rendered::Raw("not json {"));
        assert!(matches!(viewer.copy_text(""), Err(Error::NoDocument)));
    }

    #[test]
    fn search_still_counts_in_raw_text() {
        let mut viewer = JsonViewer::new("foo bar foo");
        viewer.set_search_term("foo");
        assert_eq!(viewer.match_display(), "1 / 2");
        assert!(viewer.current_match_path().is_none());
    }

    #[test]
    fn first_match_is_revealed_after_recompute() {
        let mut viewer = JsonViewer::new(SAMPLE);
        assert!(!viewer.is_expanded(&NodePath::root()));

        viewer.set_search_term("foobar");
        assert_eq!(viewer.current_match_path().unwrap().pointer(), "/b/c");
        assert!(viewer.is_expanded(&NodePath::root()));
        assert!(viewer.is_expanded(&path("/b", &viewer)));
        assert!(!viewer.is_expanded(&path("/d", &viewer)));
    }

    #[test]
    fn collapse_all_then_navigate_opens_only_that_chain() {
        let mut viewer = JsonViewer::new(SAMPLE);
        viewer.set_search_term("foo");
        assert_eq!(viewer.search().matches().len(), 3);
        viewer.next_match();
        assert!(viewer.is_expanded(&path("/b", &viewer)));

        viewer.expand_all();
        viewer.collapse_all();
        assert!(!viewer.is_expanded(&NodePath::root()));

        viewer.next_match();
        assert_eq!(viewer.current_match_path().unwrap().pointer(), "/d/1/e");
        assert_eq!(viewer.expansion().expanded_overrides(), vec!["", "/d", "/d/1"]);
        assert!(!viewer.is_expanded(&path("/b", &viewer)));
    }

    #[test]
    fn toggles_only_apply_to_composites() {
        let mut viewer = JsonViewer::new(SAMPLE);
        let b = path("/b", &viewer);
        assert!(viewer.toggle_node(&b).unwrap());
        assert!(!viewer.toggle_node(&b).unwrap());
        assert!(matches!(
            viewer.toggle_node(&path("/a", &viewer)),
            Err(Error::InvalidPointer(p)) if p == "/a"
        ));
    }

    #[test]
    fn set_source_resets_overlay_unless_asked_to_keep_it() {
        let mut viewer = JsonViewer::new(SAMPLE);
        let b = path("/b", &viewer);
        viewer.set_expanded(&b, true).unwrap();

        viewer.set_source_keep_expansion(SAMPLE.replace("foobar", "baz"));
        assert!(viewer.is_expanded(&b));

        viewer.set_source(SAMPLE);
        assert!(!viewer.is_expanded(&b));
    }

    #[test]
    fn expand_all_survives_reparse() {
        let mut viewer = JsonViewer::new(SAMPLE);
        viewer.expand_all();
        viewer.set_source(r#"{"x": {"y": []}}"#);
        assert!(viewer.is_expanded(&path("/x", &viewer)));
    }

    #[test]
    fn option_toggles_recompute() {
        let mut viewer = JsonViewer::new(SAMPLE);
        viewer.set_search_term("FOO");
        assert_eq!(viewer.search().matches().len(), 3);
        viewer.toggle_match_case();
        assert_eq!(viewer.match_display(), "0 / 0");
        viewer.toggle_match_case();
        viewer.toggle_whole_word();
        assert_eq!(viewer.search().matches().len(), 2);
    }

    #[test]
    fn copy_uses_node_label() {
        let viewer = JsonViewer::new(r#"{"count": 42, "list": [true]}"#);
        assert_eq!(viewer.copy_text("/count").unwrap(), "{\n  \"count\": 42\n}");
        assert_eq!(viewer.copy_text("/list/0").unwrap(), "{\n  \"0\": true\n}");
        assert_eq!(viewer.copy_text("/list").unwrap(), "[\n  true\n]");
    }

    #[test]
    fn children_page_reports_expansion() {
        let mut viewer = JsonViewer::new(SAMPLE);
        viewer.expand_all();
        let nodes = viewer.children("", 0, 10).unwrap();
        let expanded: Vec<(String, bool)> = nodes.into_iter().map(|n| (n.pointer, n.expanded)).collect();
        assert_eq!(
            expanded,
            vec![
                ("/a".to_string(), false),
                ("/b".to_string(), true),
                ("/d".to_string(), true),
            ]
        );
    }
}
