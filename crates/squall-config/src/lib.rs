//! Configuration for the squall overlay.
//!
//! The configuration lives in `config.toml` inside the platform config
//! directory (for example `~/.config/squall/config.toml` on Linux). A missing
//! file is not an error; defaults are used instead.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use squall_core::{PrecipType, WeatherParameters};

/// File name of the configuration inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Default UI tick in milliseconds (~30 fps).
const DEFAULT_FRAME_MS: u64 = 33;

/// Errors raised while reading or writing the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    Io(std::io::Error),
    /// The file exists but is not valid TOML for [`Config`].
    Parse(toml::de::Error),
    /// The configuration could not be serialized.
    Serialize(toml::ser::Error),
    /// No home directory could be determined for this platform.
    NoConfigDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config file: {e}"),
            ConfigError::Serialize(e) => write!(f, "failed to serialize config: {e}"),
            ConfigError::NoConfigDir => write!(f, "could not determine config directory"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::NoConfigDir => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial overlay parameters.
    pub weather: WeatherParameters,
    /// Drive the overlay from current conditions fetched online.
    pub live_weather: bool,
    /// Location for live weather (empty for auto-detect).
    pub location: String,
    /// UI tick in milliseconds.
    pub frame_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherParameters {
                angle: 10,
                speed: 45,
                emission_rate: 40.0,
                fade_out_percent: 1.0,
                precip_type: PrecipType::Rain,
            },
            live_weather: false,
            location: String::new(),
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

impl Config {
    /// Path of the configuration file for the current platform.
    pub fn path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "squall")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration from the platform config directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load the configuration from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config.sanitized())
    }

    /// Save the configuration to the platform config directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// A zero tick would spin the event loop.
    fn sanitized(mut self) -> Self {
        if self.frame_ms == 0 {
            log::warn!("frame_ms must be positive, using {DEFAULT_FRAME_MS}");
            self.frame_ms = DEFAULT_FRAME_MS;
        }
        self
    }
}
