use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::{clog_debug, Error, Result};

const DEFAULT_FALLBACK_DURATION_DAYS: u32 = 1;
const DEFAULT_FALLBACK_DISPLAY_ORDER: i32 = 1000;

/// Engine settings read from `~/.cascade/cascade.toml`.
///
/// Every field is optional in the file; missing fields take the defaults
/// below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Duration for tasks whose category has no configured default.
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration_days: u32,
    /// Display order for categories without a configured default.
    #[serde(default = "default_fallback_display_order")]
    pub fallback_display_order: i32,
    /// Reject cascade writes when the stored span changed since it was read.
    #[serde(default)]
    pub compare_and_swap: bool,
    /// Location of the JSON schedule file used by the CLI.
    pub data_file: Option<String>,
}

fn default_fallback_duration() -> u32 {
    DEFAULT_FALLBACK_DURATION_DAYS
}

fn default_fallback_display_order() -> i32 {
    DEFAULT_FALLBACK_DISPLAY_ORDER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_duration_days: DEFAULT_FALLBACK_DURATION_DAYS,
            fallback_display_order: DEFAULT_FALLBACK_DISPLAY_ORDER,
            compare_and_swap: false,
            data_file: None,
        }
    }
}

impl Config {
    pub fn cascade_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".cascade"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::cascade_dir()?.join("cascade.toml"))
    }

    /// Resolved path of the schedule data file.
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::cascade_dir()?.join("schedule.json")),
        }
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        clog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            clog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::from_toml(&fs::read_to_string(&path)?)?;
        clog_debug!(
            "Config loaded: fallback_duration_days={}, fallback_display_order={}, \
             compare_and_swap={}",
            config.fallback_duration_days,
            config.fallback_display_order,
            config.compare_and_swap
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.fallback_duration_days == 0 {
            return Err(Error::Validation(
                "fallback_duration_days must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(config)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
