// Webview entry points. Each one unwraps tauri state and defers to the plain functions, which
// carry the behavior and the tests. Errors cross the bridge as their display text.

use std::path::Path;

use tauri::State;

use crate::config::ConfigStore;
use crate::request::RequestData;
use crate::search::SearchOptions;
use crate::state::AppState;
use crate::types::{Node, SearchResponse};
use crate::{file, node, search as find};

// async so a large file parses off the main thread
#[tauri::command]
pub async fn open_file(path: String, state: State<'_, AppState>) -> Result<Vec<Node>, String> {
    file::open_file(Path::new(&path), &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn open_clipboard(state: State<'_, AppState>) -> Result<Vec<Node>, String> {
    file::open_clipboard(&state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn load_children(
    pointer: String,
    offset: usize,
    limit: usize,
    state: State<'_, AppState>,
) -> Result<Vec<Node>, String> {
    file::load_children(&pointer, offset, limit, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn render_tree(state: State<'_, AppState>) -> Result<String, String> {
    node::render_tree(&state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn toggle_node(pointer: String, state: State<'_, AppState>) -> Result<bool, String> {
    node::toggle_node(&pointer, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn expand_all(state: State<'_, AppState>) -> Result<(), String> {
    node::set_all_expanded(true, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn collapse_all(state: State<'_, AppState>) -> Result<(), String> {
    node::set_all_expanded(false, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn search(
    query: String,
    options: SearchOptions,
    offset: usize,
    limit: usize,
    state: State<'_, AppState>,
) -> Result<SearchResponse, String> {
    find::search(query, options, offset, limit, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn next_match(limit: usize, state: State<'_, AppState>) -> Result<SearchResponse, String> {
    find::next_match(limit, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn previous_match(limit: usize, state: State<'_, AppState>) -> Result<SearchResponse, String> {
    find::previous_match(limit, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn select_match(
    index: usize,
    limit: usize,
    state: State<'_, AppState>,
) -> Result<SearchResponse, String> {
    find::select_match(index, limit, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_node_value(pointer: String, state: State<'_, AppState>) -> Result<String, String> {
    node::get_node_value(&pointer, &state).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn copy_node_value(pointer: String, state: State<'_, AppState>) -> Result<(), String> {
    node::copy_node_value(&pointer, &state)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn save_last_opened_file(file_path: String, store: State<'_, ConfigStore>) -> Result<(), String> {
    store
        .save_last_opened_file(Path::new(&file_path))
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn load_last_opened_file(store: State<'_, ConfigStore>) -> Result<String, String> {
    store
        .load_last_opened_file()
        .map(|p| p.display().to_string())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn clear_last_opened_file(store: State<'_, ConfigStore>) -> Result<(), String> {
    store.clear_last_opened_file().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn import_curl(command: String, state: State<'_, AppState>) -> Result<RequestData, String> {
    let mut session = state.session.lock();
    session
        .import_curl(&command)
        .cloned()
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn export_curl(state: State<'_, AppState>) -> String {
    state.session.lock().export_curl()
}
