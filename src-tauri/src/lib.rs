// JSON viewing and a small API client: a searchable, collapsible JSON tree plus request
// composing, sending, history, collections and cURL import/export.

pub mod collections;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod curl;
pub mod document;
pub mod error;
pub mod expansion;
pub mod file;
pub mod history;
pub mod node;
pub mod render;
pub mod request;
pub mod search;
pub mod send;
pub mod session;
pub mod state;
pub mod tree;
pub mod types;
pub mod viewer;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use error::{Error, ParseError, Result};
pub use state::AppState;
pub use viewer::JsonViewer;

/// Installs the stderr log subscriber. `RUST_LOG` wins over `default` when set.
pub fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(feature = "desktop")]
pub fn run() {
    use tauri::Manager;
    use tracing::warn;

    use crate::config::ConfigStore;

    init_tracing("info");
    tauri::Builder::default()
        .manage(AppState::default())
        .setup(|app| {
            let store = match ConfigStore::default_location() {
                Ok(store) => store,
                Err(_) => ConfigStore::new(app.path().app_config_dir()?),
            };
            match store.load() {
                Ok(config) => app.state::<AppState>().apply_config(config),
                Err(e) => warn!(error = %e, "using default config"),
            }
            app.manage(store);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::open_file,
            commands::open_clipboard,
            commands::load_children,
            commands::render_tree,
            commands::toggle_node,
            commands::expand_all,
            commands::collapse_all,
            commands::search,
            commands::next_match,
            commands::previous_match,
            commands::select_match,
            commands::get_node_value,
            commands::copy_node_value,
            commands::save_last_opened_file,
            commands::load_last_opened_file,
            commands::clear_last_opened_file,
            commands::import_curl,
            commands::export_curl,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
