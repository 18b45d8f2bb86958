//! TOML-based configuration persistence for the host.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\AirMouse\config.toml`
//! - Linux:    `~/.config/airmouse/config.toml`
//! - macOS:    `~/Library/Application Support/AirMouse/config.toml`
//!
//! Every field carries a serde default so the host works on first run,
//! before any file exists, and keeps working when an older file is missing
//! newer fields.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
}

/// General host behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"`. `RUST_LOG` overrides this.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Network port and bind-address settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// UDP port for device discovery broadcasts. Devices hard-code this,
    /// so change it only together with the device app.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// IP address to bind all sockets to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Screen dimensions used by the headless pointer actuator.
///
/// A real OS actuator reports its own screen size; these values only matter
/// when the host runs headless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_discovery_port() -> u16 {
    airmouse_core::protocol::discovery::DISCOVERY_PORT
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_screen_width() -> u32 {
    1920
}
fn default_screen_height() -> u32 {
    1080
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk, creating the config directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory plus the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("AirMouse"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("airmouse"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("AirMouse")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_expected_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.network.discovery_port, 8337);
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert_eq!(cfg.host.log_level, "info");
        assert_eq!(cfg.screen.width, 1920);
        assert_eq!(cfg.screen.height, 1080);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = AppConfig::default();
        cfg.network.discovery_port = 9000;
        cfg.screen.width = 2560;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        // An older or hand-edited file listing only one section still loads.
        let cfg: AppConfig = toml::from_str("[network]\ndiscovery_port = 9999\n").expect("parse");

        assert_eq!(cfg.network.discovery_port, 9999);
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert_eq!(cfg.host.log_level, "info");
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_garbage_file_is_a_parse_error() {
        assert!(toml::from_str::<AppConfig>("not toml at all [").is_err());
    }
}
