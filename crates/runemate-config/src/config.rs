use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "RUNEMATE_CONFIG";

/// Pointer file next to the default config that redirects to another path
pub const POINTER_FILE: &str = ".runemate_config_path";

/// Review endpoint used when `submission-url` is not configured
pub const DEFAULT_SUBMISSION_URL: &str = "https://www20230922135246.runemate.com/developer/submit";

/// Keys accepted by [`Config::get`] and [`Config::set`]
pub const KEYS: &[&str] = &["submission-key", "submission-url"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_url: Option<String>,
}

impl Config {
    /// Directory holding the default config file and the pointer file
    pub fn default_dir() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir().map(|home| home.join(".config"));

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir();

        base.unwrap_or_else(|| PathBuf::from(".")).join("runemate")
    }

    pub fn pointer_path() -> PathBuf {
        Self::default_dir().join(POINTER_FILE)
    }

    pub fn path() -> PathBuf {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        if let Some(redirect) = Self::pointer_target() {
            return redirect;
        }

        Self::default_dir().join("runemate.toml")
    }

    /// Path recorded in the pointer file, if one is set
    pub fn pointer_target() -> Option<PathBuf> {
        let contents = fs::read_to_string(Self::pointer_path()).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Redirect future lookups to `target` by writing the pointer file
    pub fn set_pointer(target: &str) -> Result<PathBuf, ConfigError> {
        let pointer = Self::pointer_path();
        if let Some(parent) = pointer.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&pointer, target.as_bytes()).map_err(|source| ConfigError::Io {
            path: pointer.clone(),
            source,
        })?;
        Ok(pointer)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    /// Defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "submission-key" => self.submission_key.clone(),
            "submission-url" => self.submission_url.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "submission-key" => self.submission_key = Some(value),
            "submission-url" => self.submission_url = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.submission_key.is_none() && self.submission_url.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn submission_url(&self) -> &str {
        self.submission_url
            .as_deref()
            .unwrap_or(DEFAULT_SUBMISSION_URL)
    }
}
