//! Configuration loading.
//!
//! `config.json` in the config directory, overlaid with `OSC_PANEL_*`
//! environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};

use crate::constants::{CONFIG_FILE_NAME, LOG_FILE_NAME, RECONNECT_INTERVAL, STORE_FILE_NAME};
use crate::panel::PanelOptions;

/// Configuration for osc-panel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Milliseconds between reconnect attempts.
    pub reconnect_interval_ms: u64,
    /// Echo suppression window in milliseconds (0 disables it).
    pub echo_guard_ms: u64,
    /// Application parameter definitions to load at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: u64::try_from(RECONNECT_INTERVAL.as_millis()).unwrap_or(1000),
            echo_guard_ms: 0,
            params_file: None,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `#[cfg(test)]` (unit tests): `tmp/osc-panel-test`
    /// 2. `OSC_PANEL_CONFIG_DIR` env var: explicit override
    /// 3. Default: platform config dir (Linux: ~/.config/osc-panel)
    ///
    /// # Errors
    ///
    /// Returns an error if no config directory can be determined or created.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                // Unit tests: keep files inside the crate's tmp/
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/osc-panel-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(dir) = std::env::var("OSC_PANEL_CONFIG_DIR") {
                    PathBuf::from(dir)
                } else {
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("osc-panel")
                }
            }
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is unusable or the file
    /// exists but is not valid JSON.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", config_path.display()))
    }

    /// Overlay values from `var` (the environment, in production).
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = var("OSC_PANEL_RECONNECT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => self.reconnect_interval_ms = ms,
                Err(_) => log::warn!("[config] Ignoring OSC_PANEL_RECONNECT_MS={raw:?}"),
            }
        }

        if let Some(raw) = var("OSC_PANEL_ECHO_GUARD_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => self.echo_guard_ms = ms,
                Err(_) => log::warn!("[config] Ignoring OSC_PANEL_ECHO_GUARD_MS={raw:?}"),
            }
        }

        if let Some(path) = var("OSC_PANEL_PARAMS") {
            self.params_file = Some(PathBuf::from(path));
        }
    }

    /// Path of the key-value store file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is unusable.
    pub fn store_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(STORE_FILE_NAME))
    }

    /// Path of the log file: `OSC_PANEL_LOG_FILE`, else in the config dir.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is unusable.
    pub fn log_path() -> Result<PathBuf> {
        match std::env::var("OSC_PANEL_LOG_FILE") {
            Ok(path) => Ok(PathBuf::from(path)),
            Err(_) => Ok(Self::config_dir()?.join(LOG_FILE_NAME)),
        }
    }

    /// Whether `RUST_LOG` picked the log level for this process.
    #[must_use]
    pub fn log_filter_is_explicit() -> bool {
        std::env::var_os("RUST_LOG").is_some()
    }

    /// Panel tunables derived from this configuration.
    ///
    /// With an explicit log filter the `debugLog` toggle leaves the level
    /// alone.
    #[must_use]
    pub fn panel_options(&self, explicit_log_filter: bool) -> PanelOptions {
        PanelOptions {
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms.max(1)),
            echo_window: Duration::from_millis(self.echo_guard_ms),
            drive_log_level: !explicit_log_filter,
        }
    }
}
