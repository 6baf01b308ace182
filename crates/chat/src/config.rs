//! Client settings for the notes engine
//!
//! Loaded in layers (later wins):
//! 1. Built-in defaults
//! 2. JSON file (~/.config/parley/client.json), when present
//! 3. Environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notes::OverlapPolicy;

/// Settings filename in the Parley config directory
const SETTINGS_FILE: &str = "client.json";

/// Overrides `selection_debounce_ms`
pub const DEBOUNCE_ENV: &str = "PARLEY_SELECTION_DEBOUNCE_MS";
/// Overrides `overlap_policy` (`inclusive` or `half_open`)
pub const OVERLAP_POLICY_ENV: &str = "PARLEY_OVERLAP_POLICY";

/// Tunables shared by the selection tracker and the note store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Quiet period before a selection is evaluated
    pub selection_debounce_ms: u64,
    /// Prefix marking client-generated note ids
    pub temp_id_prefix: String,
    pub overlap_policy: OverlapPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            selection_debounce_ms: 100,
            temp_id_prefix: "temp-".to_string(),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl ClientSettings {
    /// Load settings from the config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let settings: Self = config::load_json_or_default(SETTINGS_FILE)?;
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse client settings JSON")
    }

    /// Apply overrides looked up by environment variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DEBOUNCE_ENV) {
            self.selection_debounce_ms = value
                .trim()
                .parse()
                .with_context(|| format!("{DEBOUNCE_ENV} must be a number of milliseconds"))?;
        }
        if let Some(value) = lookup(OVERLAP_POLICY_ENV) {
            self.overlap_policy = value.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(self)
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    /// Get the default settings file path (~/.config/parley/client.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Write the settings to the Parley config directory
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self)
    }
}
