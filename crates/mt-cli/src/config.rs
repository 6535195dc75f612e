//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use anyhow::bail;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use mt_core::TrackerConfig;
use mt_core::duration::from_seconds_f64;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Daily total, in hours, for a day to count as effective.
    pub effective_day_hours: f64,

    /// Live timer refresh period in milliseconds.
    pub refresh_interval_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("effective_day_hours", &self.effective_day_hours)
            .field("refresh_interval_ms", &self.refresh_interval_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("mt.db"),
            effective_day_hours: 4.0,
            refresh_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MT_*)
        figment = figment.merge(Env::prefixed("MT_"));

        figment.extract()
    }

    /// Converts the user-facing settings into tracker tunables.
    pub fn tracker_config(&self) -> anyhow::Result<TrackerConfig> {
        let Some(threshold) = from_seconds_f64(self.effective_day_hours * 3600.0) else {
            bail!(
                "effective_day_hours must be a non-negative number, got {}",
                self.effective_day_hours
            );
        };
        if self.refresh_interval_ms == 0 {
            bail!("refresh_interval_ms must be greater than zero");
        }
        Ok(TrackerConfig {
            effective_day_threshold: threshold,
            refresh_interval: StdDuration::from_millis(self.refresh_interval_ms),
        })
    }
}

/// Returns the platform-specific config directory for mt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mt"))
}

/// Returns the platform-specific data directory for mt.
///
/// On Linux: `~/.local/share/mt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("mt"))
}
