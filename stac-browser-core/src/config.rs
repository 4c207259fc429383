//! Persisted browser settings
//!
//! Holds the configured API hrefs and a cache of the last loaded
//! catalogs. The cache is trusted for `api_update_interval_seconds`
//! after `last_update`; past that, catalogs are loaded again.
//!
//! Stored as `settings.yaml` in the platform config directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::catalog::{Api, DEFAULT_LIMIT};
use crate::http::DEFAULT_TIMEOUT_SECONDS;

/// Default catalog refresh interval (one day)
pub const DEFAULT_API_UPDATE_INTERVAL_SECONDS: u64 = 24 * 60 * 60;

/// Default STAC API
pub const DEFAULT_API_HREF: &str = "https://sat-api.developmentseed.org";

/// Settings file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "settings.yaml";

/// Browser settings and the cached catalog set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// When catalogs were last loaded (Unix timestamp)
    #[serde(default)]
    pub last_update: Option<i64>,

    /// How long cached catalogs stay fresh
    #[serde(default = "default_update_interval")]
    pub api_update_interval_seconds: u64,

    /// Cached catalogs in hydrated form (`{href, data, collections}`)
    #[serde(default)]
    pub apis: Vec<Value>,

    /// APIs to load
    #[serde(default = "default_api_hrefs")]
    pub api_hrefs: Vec<String>,

    /// Page size for item search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// HTTP timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_update_interval() -> u64 {
    DEFAULT_API_UPDATE_INTERVAL_SECONDS
}

fn default_api_hrefs() -> Vec<String> {
    vec![DEFAULT_API_HREF.to_string()]
}

fn default_search_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            last_update: None,
            api_update_interval_seconds: default_update_interval(),
            apis: Vec::new(),
            api_hrefs: default_api_hrefs(),
            search_limit: default_search_limit(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl BrowserConfig {
    /// Whether the cached catalogs are younger than the update interval
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.last_update {
            Some(last) => {
                let age = now.timestamp().saturating_sub(last);
                age < self.api_update_interval_seconds as i64
            }
            None => false,
        }
    }

    pub fn cached_apis(&self) -> Vec<Api> {
        self.apis.iter().map(Api::from_json).collect()
    }

    /// Replace the cached catalogs and stamp them with `now`
    pub fn record_apis(&mut self, apis: &[Api], now: DateTime<Utc>) {
        self.apis = apis.iter().map(Api::to_json).collect();
        self.last_update = Some(now.timestamp());
    }

    /// Whether `apis` holds every configured href
    ///
    /// A partial set is never cached; otherwise an outage would be
    /// remembered as fresh for the whole update interval.
    pub fn is_complete(&self, apis: &[Api]) -> bool {
        self.api_hrefs.iter().all(|href| {
            let href = href.trim_end_matches('/');
            apis.iter().any(|api| api.href() == href)
        })
    }

    pub fn clear_cache(&mut self) {
        self.apis.clear();
        self.last_update = None;
    }

    /// Add an API href; the cache is invalidated so the next load sees it
    pub fn add_api(&mut self, href: &str) -> Result<()> {
        let href = href.trim_end_matches('/');

        if !href.starts_with("http://") && !href.starts_with("https://") {
            anyhow::bail!("API URL must start with http:// or https://");
        }

        if self.api_hrefs.iter().any(|h| h.trim_end_matches('/') == href) {
            anyhow::bail!("API '{}' is already configured", href);
        }

        self.api_hrefs.push(href.to_string());
        self.clear_cache();
        Ok(())
    }

    pub fn remove_api(&mut self, href: &str) -> Result<()> {
        let href = href.trim_end_matches('/');
        let initial_len = self.api_hrefs.len();
        self.api_hrefs.retain(|h| h.trim_end_matches('/') != href);

        if self.api_hrefs.len() == initial_len {
            anyhow::bail!("API '{}' not found", href);
        }

        self.clear_cache();
        Ok(())
    }
}

/// Loads and saves [`BrowserConfig`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: BrowserConfig,
    config_path: PathBuf,
}

impl ConfigStore {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(config_path)
    }

    /// Load settings from a specific path; a missing file yields defaults
    pub fn load_from_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read settings: {}", config_path.display())
            })?;
            serde_yaml_ng::from_str(&content).with_context(|| {
                format!("Failed to parse settings: {}", config_path.display())
            })?
        } else {
            BrowserConfig::default()
        };

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Get the default settings file path
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "stac-browser")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BrowserConfig {
        &mut self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current settings
    pub fn save(&self) -> Result<()> {
        save_config(&self.config, &self.config_path)
    }
}

/// Write `config` to `path`, creating parent directories
pub fn save_config(config: &BrowserConfig, path: &Path) -> Result<()> {
    let content = serde_yaml_ng::to_string(config).context("Failed to serialize settings")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write settings: {}", path.display()))?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert_eq!(config.api_hrefs, vec![DEFAULT_API_HREF.to_string()]);
        assert_eq!(config.search_limit, 50);
        assert!(config.last_update.is_none());
        assert!(!config.is_fresh(now()));
    }

    #[test]
    fn test_freshness_window() {
        let mut config = BrowserConfig {
            api_update_interval_seconds: 3600,
            ..Default::default()
        };
        config.record_apis(&[], now());

        assert!(config.is_fresh(now()));
        assert!(config.is_fresh(now() + Duration::seconds(3599)));
        assert!(!config.is_fresh(now() + Duration::seconds(3600)));
    }

    #[test]
    fn test_record_and_restore_apis() {
        let api = Api::from_json(&json!({
            "href": "https://example.com",
            "data": { "title": "Example" },
            "collections": [{ "id": "a", "title": "A" }],
        }));

        let mut config = BrowserConfig::default();
        config.record_apis(&[api], now());

        let cached = config.cached_apis();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].title(), Some("Example"));
        assert_eq!(cached[0].collections()[0].id(), Some("a"));
        assert_eq!(config.last_update, Some(now().timestamp()));

        config.clear_cache();
        assert!(config.apis.is_empty());
        assert!(config.last_update.is_none());
    }

    #[test]
    fn test_complete_load() {
        let loaded = Api::from_json(&json!({ "href": "https://a.example.com" }));
        let config = BrowserConfig {
            api_hrefs: vec![
                "https://a.example.com/".to_string(),
                "https://b.example.com".to_string(),
            ],
            ..Default::default()
        };

        assert!(!config.is_complete(&[]));
        assert!(!config.is_complete(std::slice::from_ref(&loaded)));
        assert!(config.is_complete(&[
            loaded,
            Api::from_json(&json!({ "href": "https://b.example.com" })),
        ]));

        let nothing_configured = BrowserConfig {
            api_hrefs: Vec::new(),
            ..Default::default()
        };
        assert!(nothing_configured.is_complete(&[]));
    }

    #[test]
    fn test_add_and_remove_api() {
        let mut config = BrowserConfig::default();
        config.record_apis(&[], now());

        config.add_api("https://earth-search.example.com/").unwrap();
        assert_eq!(config.api_hrefs.len(), 2);
        assert_eq!(config.api_hrefs[1], "https://earth-search.example.com");
        assert!(config.last_update.is_none(), "adding an API invalidates the cache");

        assert!(config.add_api("https://earth-search.example.com").is_err());
        assert!(config.add_api("ftp://example.com").is_err());

        config.remove_api("https://earth-search.example.com").unwrap();
        assert_eq!(config.api_hrefs.len(), 1);
        assert!(config.remove_api("https://missing.example.com").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::load_from_path(temp_dir.path().join("settings.yaml")).unwrap();
        assert_eq!(store.config(), &BrowserConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.yaml");

        {
            let mut store = ConfigStore::load_from_path(config_path.clone()).unwrap();
            let api = Api::from_json(&json!({
                "href": "https://example.com",
                "data": { "title": "Example", "links": [] },
                "collections": [{ "id": "a" }],
            }));
            store.config_mut().record_apis(&[api], now());
            store.config_mut().api_update_interval_seconds = 60;
            store.save().unwrap();
        }

        {
            let store = ConfigStore::load_from_path(config_path).unwrap();
            assert_eq!(store.config().api_update_interval_seconds, 60);
            assert_eq!(store.config().last_update, Some(now().timestamp()));
            assert_eq!(store.config().cached_apis()[0].href(), "https://example.com");
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.yaml");
        std::fs::write(&config_path, "search_limit: 10\n").unwrap();

        let store = ConfigStore::load_from_path(config_path).unwrap();
        assert_eq!(store.config().search_limit, 10);
        assert_eq!(
            store.config().api_update_interval_seconds,
            DEFAULT_API_UPDATE_INTERVAL_SECONDS
        );
        assert_eq!(store.config().api_hrefs, vec![DEFAULT_API_HREF.to_string()]);
    }
}
