use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::types::Node;

/// Size of the first page of top-level nodes handed back after a load.
pub const FIRST_PAGE: usize = 100;

/// Loads `text` into the viewer and returns the first page of top-level nodes.
///
/// Text that is not valid JSON is still loaded, so the raw view is available, but the parse
/// error is returned to the caller.
pub fn open_text(text: impl Into<String>, state: &AppState) -> Result<Vec<Node>> {
    state.load_text(text);
    let guard = state.viewer.read();
    let Some(viewer) = guard.as_ref() else { return Err(Error::NoDocument); };
    if let Some(err) = viewer.parse_error() {
        return Err(err.clone().into());
    }
    viewer.children("", 0, FIRST_PAGE)
}

pub fn open_file(path: &Path, state: &AppState) -> Result<Vec<Node>> {
    let text = std::fs::read_to_string(path)?;
    info!(path = %path.display(), bytes = text.len(), "opened file");
    open_text(text, state)
}

// Load JSON from the system clipboard (expects UTF-8 text containing a JSON value).
pub fn open_clipboard(state: &AppState) -> Result<Vec<Node>> {
    use arboard::Clipboard;
    let mut cb = Clipboard::new().map_err(|e| Error::Clipboard(format!("Clipboard init failed: {e}")))?;
    let text = cb
        .get_text()
        .map_err(|e| Error::Clipboard(format!("Failed reading clipboard text: {e}")))?;
    info!(bytes = text.len(), "opened clipboard text");
    open_text(text, state)
}

pub fn load_children(pointer: &str, offset: usize, limit: usize, state: &AppState) -> Result<Vec<Node>> {
    let guard = state.viewer.read();
    let Some(viewer) = guard.as_ref() else { return Err(Error::NoDocument); };
    viewer.children(pointer, offset, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_file_lists_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"b": 1, "a": {"x": true}}"#).unwrap();

        let state = AppState::default();
        let top = open_file(&path, &state).unwrap();
        let pointers: Vec<&str> = top.iter().map(|n| n.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["/b", "/a"]);

        let children = load_children("/a", 0, 10, &state).unwrap();
        assert_eq!(children[0].pointer, "/a/x");
        assert!(matches!(load_children("/zz", 0, 10, &state), Err(Error::InvalidPointer(_))));
    }

    #[test]
    fn invalid_json_still_loads_as_raw() {
        let state = AppState::default();
        let err = open_text("{not json", &state).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        let guard = state.viewer.read();
        assert_eq!(guard.as_ref().unwrap().source(), "{not json");
    }

    #[test]
    fn missing_file_and_empty_state() {
        let state = AppState::default();
        assert!(matches!(open_file(Path::new("/no/such/file.json"), &state), Err(Error::Io(_))));
        assert!(matches!(load_children("", 0, 1, &state), Err(Error::NoDocument)));
    }
}
