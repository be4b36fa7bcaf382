use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::types::{SearchHit, SearchResponse};
use crate::viewer::JsonViewer;

/// Characters of context shown on each side of a hit.
const CONTEXT_RADIUS: usize = 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub match_case: bool,
    pub whole_word: bool,
}

/// One occurrence of the search term. `start..end` is a byte range into the source text;
/// `offset` is the same start counted in characters, which is what the front end sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    pub offset: usize,
}

/// Non-overlapping matches, ascending by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    matches: Vec<SearchMatch>,
}

impl MatchSet {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SearchMatch> {
        self.matches.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchMatch> {
        self.matches.iter()
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.matches.iter().map(|m| m.offset).collect()
    }
}

/// Builds the matcher for a literal term. The term is escaped, so any user input compiles;
/// `None` means there is nothing to search for.
pub fn compile_pattern(term: &str, options: SearchOptions) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    let escaped = regex::escape(term);
    let pattern = if options.whole_word {
        // ASCII word boundary: accented letters count as separators
        format!(r"(?-u:\b){escaped}(?-u:\b)")
    } else {
        escaped
    };
    match RegexBuilder::new(&pattern)
        .case_insensitive(!options.match_case)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            // only reachable through the compiled size limit on absurdly long terms
            warn!(error = %e, "search pattern rejected");
            None
        }
    }
}

pub fn find_matches(source: &str, term: &str, options: SearchOptions) -> MatchSet {
    let Some(re) = compile_pattern(term, options) else {
        return MatchSet::default();
    };
    let mut chars = 0;
    let mut counted = 0;
    let matches = re
        .find_iter(source)
        .map(|m| {
            chars += source[counted..m.start()].chars().count();
            counted = m.start();
            SearchMatch {
                start: m.start(),
                end: m.end(),
                offset: chars,
            }
        })
        .collect();
    MatchSet { matches }
}

/// `"<current+1> / <total>"`, or `"0 / 0"` when nothing matched.
pub fn match_display(current: usize, total: usize) -> String {
    if total == 0 {
        "0 / 0".to_string()
    } else {
        format!("{} / {}", current + 1, total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    term: String,
    options: SearchOptions,
    matches: MatchSet,
    current: usize,
}

impl SearchState {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn matches(&self) -> &MatchSet {
        &self.matches
    }

    pub fn set_term(&mut self, term: impl Into<String>, source: &str) {
        self.term = term.into();
        self.recompute(source);
    }

    pub fn set_options(&mut self, options: SearchOptions, source: &str) {
        self.options = options;
        self.recompute(source);
    }

    /// Rebuilds the match list and moves the cursor back to the first match.
    pub fn recompute(&mut self, source: &str) {
        self.matches = find_matches(source, &self.term, self.options);
        self.current = 0;
        debug!(term = %self.term, total = self.matches.len(), "search recomputed");
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.matches.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.current_index().and_then(|i| self.matches.get(i))
    }

    /// Advances with wrap-around. Returns `false` when there is nothing to navigate.
    pub fn next(&mut self) -> bool {
        let total = self.matches.len();
        if total == 0 {
            return false;
        }
        self.current = (self.current + 1) % total;
        true
    }

    pub fn previous(&mut self) -> bool {
        let total = self.matches.len();
        if total == 0 {
            return false;
        }
        self.current = (self.current + total - 1) % total;
        true
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.matches.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn display(&self) -> String {
        match_display(self.current, self.matches.len())
    }
}

/// Up to `radius` characters around `start..end`, on char boundaries, newlines flattened.
pub fn snippet(source: &str, start: usize, end: usize, radius: usize) -> String {
    let from = source[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = source[end..]
        .char_indices()
        .nth(radius)
        .map_or(source.len(), |(i, _)| end + i);
    source[from..to].replace(['\n', '\r'], " ")
}

fn build_response(viewer: &JsonViewer, offset: usize, limit: usize) -> SearchResponse {
    let search = viewer.search();
    let total_count = search.matches().len();
    let current = search.current_index();
    let hits = search
        .matches()
        .iter()
        .enumerate()
        .skip(offset)
        .take(limit)
        .map(|(index, m)| SearchHit {
            index,
            offset: m.offset,
            pointer: viewer.path_at(m.start).map(|p| p.pointer()),
            context: snippet(viewer.source(), m.start, m.end, CONTEXT_RADIUS),
            current: current == Some(index),
        })
        .collect();
    SearchResponse {
        hits,
        total_count,
        has_more: offset.saturating_add(limit) < total_count,
        current,
        display: search.display(),
    }
}

/// Sets the search term and flags on the open document and returns one page of hits.
pub fn search(
    query: String,
    options: SearchOptions,
    offset: usize,
    limit: usize,
    state: &AppState,
) -> Result<SearchResponse> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else {
        return Err(Error::NoDocument);
    };
    viewer.set_search(query, options);
    Ok(build_response(viewer, offset, limit))
}

pub fn next_match(limit: usize, state: &AppState) -> Result<SearchResponse> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else {
        return Err(Error::NoDocument);
    };
    viewer.next_match();
    Ok(build_response(viewer, 0, limit))
}

pub fn previous_match(limit: usize, state: &AppState) -> Result<SearchResponse> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else {
        return Err(Error::NoDocument);
    };
    viewer.previous_match();
    Ok(build_response(viewer, 0, limit))
}

pub fn select_match(index: usize, limit: usize, state: &AppState) -> Result<SearchResponse> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else {
        return Err(Error::NoDocument);
    };
    if !viewer.select_match(index) {
        return Err(Error::InvalidMatch(index));
    }
    Ok(build_response(viewer, 0, limit))
}
