use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;

const APP_DIR: &str = "dostman";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Initial expand-all default for new documents.
    pub expand_all: bool,
    pub match_case: bool,
    pub whole_word: bool,
    /// Characters of a string value shown in node previews.
    pub preview_limit: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            expand_all: false,
            match_case: false,
            whole_word: false,
            preview_limit: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub viewer: ViewerConfig,
    pub history_limit: usize,
    pub last_opened_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewer: ViewerConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            last_opened_file: None,
        }
    }
}

/// Reads and writes [`AppConfig`] as JSON inside one directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<platform config dir>/dostman`.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("Failed to get app config dir".into()))?;
        Ok(Self::new(base.join(APP_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Get the config file path, creating the directory on the way
    fn config_file_path(&self) -> Result<PathBuf> {
        create_dir_all(&self.dir)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        Ok(self.dir.join(CONFIG_FILE))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<AppConfig> {
        let path = self.path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        let path = self.config_file_path()?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&path, content)
            .map_err(|e| Error::Config(format!("Failed to save config file: {e}")))?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn save_last_opened_file(&self, file_path: &Path) -> Result<()> {
        let mut config = self.load()?;
        config.last_opened_file = Some(file_path.to_path_buf());
        self.save(&config)
    }

    pub fn load_last_opened_file(&self) -> Result<PathBuf> {
        let config = self.load()?;
        let file_path = config
            .last_opened_file
            .ok_or_else(|| Error::Config("No last opened file recorded".into()))?;

        // Check if the file still exists
        if !file_path.exists() {
            return Err(Error::Config("Last opened file no longer exists".into()));
        }
        Ok(file_path)
    }

    pub fn clear_last_opened_file(&self) -> Result<()> {
        let mut config = self.load()?;
        if config.last_opened_file.take().is_some() {
            self.save(&config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), AppConfig::default());
        assert_eq!(AppConfig::default().history_limit, 20);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        let mut config = AppConfig::default();
        config.viewer.expand_all = true;
        config.history_limit = 50;
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        std::fs::write(store.path(), r#"{"viewer": {"matchCase": true}}"#).unwrap();
        let config = store.load().unwrap();
        assert!(config.viewer.match_case);
        assert_eq!(config.viewer.preview_limit, 120);
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        std::fs::write(store.path(), "{").unwrap();
        assert!(matches!(store.load(), Err(Error::Config(_))));
    }

    #[test]
    fn last_opened_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("cfg"));
        assert!(store.load_last_opened_file().is_err());

        let doc = dir.path().join("doc.json");
        std::fs::write(&doc, "{}").unwrap();
        store.save_last_opened_file(&doc).unwrap();
        assert_eq!(store.load_last_opened_file().unwrap(), doc);

        std::fs::remove_file(&doc).unwrap();
        let err = store.load_last_opened_file().unwrap_err();
        assert!(err.to_string().contains("no longer exists"));

        store.clear_last_opened_file().unwrap();
        assert_eq!(store.load().unwrap().last_opened_file, None);
    }
}
