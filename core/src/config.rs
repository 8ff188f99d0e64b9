//! Plugin settings and where they are stored.
//!
//! # Design
//! `Settings` is the flat record the host persists: credentials, the cached
//! token, the link-placement toggles and the service endpoints. Keys are
//! camelCase and every field has a default, so a partial or older file loads
//! without migration. Storage is behind `ConfigStore`; the host either hands
//! over its own implementation or uses `JsonFileStore`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{DidaApi, DEFAULT_API_BASE};
use crate::error::{DidaError, Result};
use crate::link::{Links, DEFAULT_WEB_BASE};
use crate::session::{Session, SessionStore};

/// Which links the commands write back into the note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkOptions {
    /// Prompt for project/task titles instead of using the derived one.
    pub enable_input_prompt: bool,
    /// Master switch for writing task links into the note.
    pub enable_dida_task_link: bool,
    pub enable_selection_to_dida_task_link: bool,
    pub enable_line_to_dida_task_link: bool,
    #[serde(rename = "enableFrontMatterToDidaTaskLink")]
    pub enable_frontmatter_to_dida_task_link: bool,
    #[serde(rename = "enableFrontMatterToDidaProjectLink")]
    pub enable_frontmatter_to_dida_project_link: bool,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub username: String,
    pub password: String,
    pub token: String,
    #[serde(flatten)]
    pub options: LinkOptions,
    pub api_base_url: String,
    pub web_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            token: String::new(),
            options: LinkOptions::default(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            web_base_url: DEFAULT_WEB_BASE.to_string(),
        }
    }
}

impl Settings {
    pub fn session(&self) -> Session {
        Session::new(&self.username, &self.password).with_token(&self.token)
    }

    pub fn api(&self) -> DidaApi {
        DidaApi::new(&self.api_base_url, Links::new(&self.web_base_url))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("options", &self.options)
            .field("api_base_url", &self.api_base_url)
            .field("web_base_url", &self.web_base_url)
            .finish_non_exhaustive()
    }
}

/// Loads and saves `Settings`.
pub trait ConfigStore {
    fn load(&self) -> Result<Settings>;
    fn save(&mut self, settings: &Settings) -> Result<()>;
}

/// Settings kept as pretty-printed JSON in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    /// A missing file yields the defaults.
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map_err(|e| DidaError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| DidaError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Settings held in memory, for hosts that persist them elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    pub settings: Settings,
    pub saves: usize,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        self.settings = settings.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Writes a refreshed session back into `Settings` and saves them.
pub struct SettingsSessionStore<'a, C> {
    settings: &'a mut Settings,
    config: &'a mut C,
}

impl<'a, C: ConfigStore> SettingsSessionStore<'a, C> {
    pub fn new(settings: &'a mut Settings, config: &'a mut C) -> Self {
        Self { settings, config }
    }
}

impl<C: ConfigStore> SessionStore for SettingsSessionStore<'_, C> {
    fn save(&mut self, session: &Session) -> Result<()> {
        self.settings.username = session.username.clone();
        self.settings.password = session.password.clone();
        self.settings.token = session.token.clone();
        self.config.save(&*self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_dida365() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "https://api.dida365.com/api/v2");
        assert_eq!(settings.web_base_url, "https://dida365.com/webapp");
        assert!(!settings.options.enable_dida_task_link);
        assert!(!settings.session().has_token());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"username":"me","enableDidaTaskLink":true}"#).unwrap();
        assert_eq!(settings.username, "me");
        assert!(settings.options.enable_dida_task_link);
        assert!(!settings.options.enable_input_prompt);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn keys_match_the_stored_layout() {
        let mut settings = Settings::default();
        settings.options.enable_frontmatter_to_dida_project_link = true;
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["enableFrontMatterToDidaProjectLink"], true);
        assert_eq!(json["enableFrontMatterToDidaTaskLink"], false);
        assert_eq!(json["enableSelectionToDidaTaskLink"], false);
        assert!(json.get("options").is_none());
        assert!(json.get("apiBaseUrl").is_some());
    }

    #[test]
    fn json_file_store_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn json_file_store_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("plugin").join("data.json"));
        let mut settings = Settings::default();
        settings.username = "me@example.com".into();
        settings.token = "tok".into();
        settings.options.enable_line_to_dida_task_link = true;
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::new(path).load().unwrap_err();
        assert!(matches!(err, DidaError::Storage(_)));
    }

    #[test]
    fn settings_session_store_persists_token() {
        let mut settings = Settings::default();
        let mut config = MemoryConfigStore::default();
        {
            let mut store = SettingsSessionStore::new(&mut settings, &mut config);
            store
                .save(&Session::new("me", "pw").with_token("fresh"))
                .unwrap();
        }
        assert_eq!(settings.token, "fresh");
        assert_eq!(config.saves, 1);
        assert_eq!(config.settings.token, "fresh");
        assert_eq!(config.settings.username, "me");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut settings = Settings::default();
        settings.password = "hunter2".into();
        settings.token = "tok-secret".into();
        let dbg = format!("{settings:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("tok-secret"));
    }
}
