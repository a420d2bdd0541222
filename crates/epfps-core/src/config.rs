//! Application settings.
//!
//! Settings are stored at `~/.config/epfps/config.json` and can be
//! overridden from the environment (`.env` files are loaded by the binary):
//!
//! - `EPFPS_API_URL`: backend base URL
//! - `EPFPS_UPLOAD_URL`, `EPFPS_UPLOAD_BUCKET`: object storage target
//! - `EPFPS_STORAGE_DIR`: where client state is persisted

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "epfps";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub const ENV_API_URL: &str = "EPFPS_API_URL";
pub const ENV_UPLOAD_URL: &str = "EPFPS_UPLOAD_URL";
pub const ENV_UPLOAD_BUCKET: &str = "EPFPS_UPLOAD_BUCKET";
pub const ENV_STORAGE_DIR: &str = "EPFPS_STORAGE_DIR";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub upload_bucket: Option<String>,
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default)]
    pub last_email: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            upload_url: None,
            upload_bucket: None,
            storage_dir: None,
            last_email: None,
        }
    }
}

impl Settings {
    /// Effective settings: the config file with environment overrides applied.
    ///
    /// Never `save` the result; overrides would be written into the file.
    /// Use `load_file` for the document on disk.
    pub fn load() -> Result<Self> {
        Ok(Self::load_file()?.effective(|name| std::env::var(name).ok()))
    }

    /// The settings document as stored on disk, without overrides.
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Record the last signed-in email in the config file.
    pub fn remember_email(email: &str) -> Result<()> {
        Self::remember_email_at(&Self::config_path()?, email)
    }

    fn remember_email_at(path: &Path, email: &str) -> Result<()> {
        let mut document = Self::load_from(path)?;
        document.last_email = Some(email.to_string());
        document.save_to(path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// A copy of these settings with overrides from `lookup` applied.
    pub fn effective(&self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = self.clone();
        settings.apply_overrides(lookup);
        settings
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = value(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(url) = value(ENV_UPLOAD_URL) {
            self.upload_url = Some(url);
        }
        if let Some(bucket) = value(ENV_UPLOAD_BUCKET) {
            self.upload_bucket = Some(bucket);
        }
        if let Some(dir) = value(ENV_STORAGE_DIR) {
            self.storage_dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory holding persisted client state.
    pub fn state_dir(&self) -> Result<PathBuf, StorageError> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(StorageError::Unavailable)
    }

    /// Upload endpoint and bucket, when both are configured
    pub fn upload_target(&self) -> Option<(&str, &str)> {
        match (&self.upload_url, &self.upload_bucket) {
            (Some(url), Some(bucket)) => Some((url.as_str(), bucket.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://api.epfps.cm"),
            (ENV_UPLOAD_BUCKET, "documents"),
            (ENV_UPLOAD_URL, "  "),
            (ENV_STORAGE_DIR, "/var/lib/epfps"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api_url, "https://api.epfps.cm");
        assert_eq!(settings.upload_bucket.as_deref(), Some("documents"));
        assert_eq!(settings.upload_url, None);
        assert_eq!(settings.state_dir().unwrap(), PathBuf::from("/var/lib/epfps"));
    }

    #[test]
    fn test_remember_email_keeps_overrides_out_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(APP_NAME).join(CONFIG_FILE);

        let effective = Settings::load_from(&path)
            .unwrap()
            .effective(|name| (name == ENV_API_URL).then(|| "https://staging.example".to_string()));
        assert_eq!(effective.api_url, "https://staging.example");

        Settings::remember_email_at(&path, "prof@epfps.cm").unwrap();

        let document = Settings::load_from(&path).unwrap();
        assert_eq!(document.api_url, DEFAULT_API_URL);
        assert_eq!(document.last_email.as_deref(), Some("prof@epfps.cm"));
    }

    #[test]
    fn test_remember_email_preserves_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let stored = Settings {
            api_url: "https://api.epfps.cm".into(),
            upload_bucket: Some("documents".into()),
            ..Default::default()
        };
        stored.save_to(&path).unwrap();

        Settings::remember_email_at(&path, "admin@epfps.cm").unwrap();

        let document = Settings::load_from(&path).unwrap();
        assert_eq!(document.api_url, "https://api.epfps.cm");
        assert_eq!(document.upload_bucket.as_deref(), Some("documents"));
        assert_eq!(document.last_email.as_deref(), Some("admin@epfps.cm"));
    }

    #[test]
    fn test_upload_target_needs_both_parts() {
        let mut settings = Settings {
            upload_url: Some("https://s3.example.com".into()),
            ..Default::default()
        };
        assert_eq!(settings.upload_target(), None);

        settings.upload_bucket = Some("epfps".into());
        assert_eq!(settings.upload_target(), Some(("https://s3.example.com", "epfps")));
    }
}
