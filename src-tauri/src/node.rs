use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::state::AppState;

/// Text placed on the clipboard for a node.
///
/// Objects and arrays are copied as their own pretty JSON. Scalars carry no name of their own,
/// so they are wrapped as `{ "<label>": value }`.
pub fn node_copy_text(value: &Value, label: &str) -> Result<String> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(serde_json::to_string_pretty(value)?),
        _ => {
            let mut wrapper = Map::new();
            wrapper.insert(label.to_string(), value.clone());
            Ok(serde_json::to_string_pretty(&Value::Object(wrapper))?)
        }
    }
}

pub fn set_clipboard_text(text: String) -> Result<()> {
    use arboard::Clipboard;
    let mut cb = Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
    cb.set_text(text).map_err(|e| Error::Clipboard(e.to_string()))
}

/// Compact JSON of the node at `pointer` (the whole document for an empty pointer).
pub fn get_node_value(pointer: &str, state: &AppState) -> Result<String> {
    let guard = state.viewer.read();
    let Some(viewer) = guard.as_ref() else { return Err(Error::NoDocument); };
    let root = viewer.value().ok_or(Error::NoDocument)?;

    let value = if pointer.is_empty() {
        root
    } else {
        root.pointer(pointer).ok_or_else(|| Error::InvalidPointer(pointer.to_string()))?
    };

    Ok(serde_json::to_string(value)?)
}

// Copy a node straight to the system clipboard instead of shipping the JSON back to the shell
// only for it to be copied again.
pub fn copy_node_value(pointer: &str, state: &AppState) -> Result<String> {
    let text = {
        let guard = state.viewer.read();
        let Some(viewer) = guard.as_ref() else { return Err(Error::NoDocument); };
        viewer.copy_text(pointer)?
    };
    set_clipboard_text(text.clone())?;
    info!(pointer, bytes = text.len(), "copied node to clipboard");
    Ok(text)
}

/// Flips the node at `pointer` open or closed and returns its new state.
pub fn toggle_node(pointer: &str, state: &AppState) -> Result<bool> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else { return Err(Error::NoDocument); };
    let path = viewer.resolve(pointer)?;
    viewer.toggle_node(&path)
}

pub fn set_all_expanded(expanded: bool, state: &AppState) -> Result<()> {
    let mut guard = state.viewer.write();
    let Some(viewer) = guard.as_mut() else { return Err(Error::NoDocument); };
    if expanded {
        viewer.expand_all();
    } else {
        viewer.collapse_all();
    }
    Ok(())
}

// The visible rows as indented text, or the raw source when it did not parse.
pub fn render_tree(state: &AppState) -> Result<String> {
    let guard = state.viewer.read();
    let Some(viewer) = guard.as_ref() else { return Err(Error::NoDocument); };
    Ok(viewer.render().to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scalar_is_wrapped_with_its_label() {
        assert_eq!(node_copy_text(&json!(42), "count").unwrap(), "{\n  \"count\": 42\n}");
        assert_eq!(
            node_copy_text(&json!("x"), "0").unwrap(),
            "{\n  \"0\": \"x\"\n}"
        );
        assert_eq!(node_copy_text(&Value::Null, "gone").unwrap(), "{\n  \"gone\": null\n}");
    }

    #[test]
    fn composite_is_copied_without_wrapper() {
        let value = json!({"b": [1, true]});
        assert_eq!(
            node_copy_text(&value, "ignored").unwrap(),
            "{\n  \"b\": [\n    1,\n    true\n  ]\n}"
        );
        assert_eq!(node_copy_text(&json!([]), "list").unwrap(), "[]");
    }

    #[test]
    fn get_node_value_needs_a_document() {
        let state = AppState::default();
        assert!(matches!(get_node_value("", &state), Err(Error::NoDocument)));

        state.load_text(r#"{"a": {"b": [1, 2]}}"#);
        assert_eq!(get_node_value("/a/b", &state).unwrap(), "[1,2]");
        assert_eq!(get_node_value("", &state).unwrap(), r#"{"a":{"b":[1,2]}}"#);
        assert!(matches!(
            get_node_value("/nope", &state),
            Err(Error::InvalidPointer(p)) if p == "/nope"
        ));
    }

    #[test]
    fn toggling_and_expanding_through_shared_state() {
        let state = AppState::default();
        assert!(matches!(render_tree(&state), Err(Error::NoDocument)));

        state.load_text(r#"{"a": {"b": 1}, "c": []}"#);
        assert_eq!(render_tree(&state).unwrap(), "{2 items}");

        assert!(toggle_node("", &state).unwrap());
        assert_eq!(render_tree(&state).unwrap(), "{\n  a: {1 item}\n  c: []\n}");
        assert!(matches!(toggle_node("/a/b", &state), Err(Error::InvalidPointer(_))));
        assert!(matches!(toggle_node("/zzz", &state), Err(Error::InvalidPointer(_))));

        set_all_expanded(true, &state).unwrap();
        assert_eq!(
            render_tree(&state).unwrap(),
            "{\n  a: {\n    b: 1\n  }\n  c: []\n}"
        );
        set_all_expanded(false, &state).unwrap();
        assert_eq!(render_tree(&state).unwrap(), "{2 items}");
    }

    #[test]
    fn render_tree_shows_raw_text_for_invalid_json() {
        let state = AppState::default();
        state.load_text("{nope");
        assert_eq!(render_tree(&state).unwrap(), "{nope");
    }
}
