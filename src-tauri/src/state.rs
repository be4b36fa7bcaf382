use parking_lot::{Mutex, RwLock};

use crate::config::AppConfig;
use crate::session::Session;
use crate::viewer::JsonViewer;

/// State shared by every front-end command.
pub struct AppState {
    pub viewer: RwLock<Option<JsonViewer>>,
    pub session: Mutex<Session>,
    pub config: RwLock<AppConfig>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(AppConfig::default())
    }
}

impl AppState {
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            viewer: RwLock::new(None),
            session: Mutex::new(Session::new(config.history_limit)),
            config: RwLock::new(config),
        }
    }

    // Adopt a freshly loaded config. The history keeps its newest entries up to the new limit.
    pub fn apply_config(&self, config: AppConfig) {
        self.session.lock().history_mut().set_limit(config.history_limit);
        *self.config.write() = config;
    }

    /// Replaces the open document with a fresh viewer over `text`, using the configured
    /// viewer defaults. Invalid JSON still loads and shows as raw text.
    pub fn load_text(&self, text: impl Into<String>) {
        let viewer = JsonViewer::with_config(text, &self.config.read().viewer);
        *self.viewer.write() = Some(viewer);
    }

    pub fn close_document(&self) {
        *self.viewer.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_text_uses_viewer_config() {
        let mut config = AppConfig::default();
        config.viewer.expand_all = true;
        config.history_limit = 3;
        let state = AppState::with_config(config);
        assert_eq!(state.session.lock().history().limit(), 3);

        state.load_text(r#"{"a": [1]}"#);
        assert!(state.viewer.read().as_ref().unwrap().expansion().default_expanded());

        state.close_document();
        assert!(state.viewer.read().is_none());
    }

    #[test]
    fn apply_config_resizes_history() {
        let state = AppState::default();
        assert_eq!(state.session.lock().history().limit(), 20);

        let mut config = AppConfig::default();
        config.history_limit = 5;
        config.viewer.whole_word = true;
        state.apply_config(config);
        assert_eq!(state.session.lock().history().limit(), 5);
        assert!(state.config.read().viewer.whole_word);
    }
}
