//! Runtime configuration.
//!
//! Defaults, then an optional JSON file (`<config dir>/waybill/config.json`),
//! then `WAYBILL_*` environment variables. A missing or unreadable file
//! yields defaults.

use crate::gazetteer::SourceSettings;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
    pub access_token: Option<String>,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            spreadsheet_id: None,
            sheet_name: "Cities".to_string(),
            access_token: None,
            cache_ttl_secs: 300,
            fetch_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load from the given file (or the default location) and the process environment.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config = Self::read_file(&path).unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waybill")
            .join("config.json")
    }

    fn read_file(path: &Path) -> Option<Self> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Self>(&data) {
            Ok(config) => Some(config.normalized()),
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str| {
            let raw = text(key)?;
            match raw.parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("Ignoring {}={:?}: not a whole number", key, raw);
                    None
                }
            }
        };

        if let Some(v) = text("WAYBILL_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = text("WAYBILL_SPREADSHEET_ID") {
            self.spreadsheet_id = Some(v);
        }
        if let Some(v) = text("WAYBILL_SHEET_NAME") {
            self.sheet_name = v;
        }
        if let Some(v) = text("WAYBILL_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(n) = number("WAYBILL_CACHE_TTL_SECS") {
            self.cache_ttl_secs = n;
        }
        if let Some(n) = number("WAYBILL_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = n;
        }
    }

    fn normalized(mut self) -> Self {
        let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.api_key = blank_to_none(self.api_key);
        self.spreadsheet_id = blank_to_none(self.spreadsheet_id);
        self.access_token = blank_to_none(self.access_token);
        if self.sheet_name.trim().is_empty() {
            self.sheet_name = Self::default().sheet_name;
        }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn source_settings(&self) -> SourceSettings {
        let ttl_secs = i64::try_from(self.cache_ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        SourceSettings {
            api_key: self.api_key.clone(),
            dataset_id: self.spreadsheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            ttl: chrono::Duration::seconds(ttl_secs),
        }
    }
}
