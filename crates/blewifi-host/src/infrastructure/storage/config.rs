//! TOML-based configuration persistence for the provisioning host.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\BleWifi\config.toml`
//! - Linux:    `~/.config/blewifi/config.toml`
//! - macOS:    `~/Library/Application Support/BleWifi/config.toml`
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so the app
//! works on first run (before a config file exists) and when upgrading from
//! an older file that is missing newer fields.
//!
//! Every tunable of the transfer protocol lives here: the original sources
//! vary the pacing, settle, and rescan intervals between versions, so none
//! of them is treated as a fixed protocol constant.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::connection::ConnectionConfig;
use crate::application::discovery::DiscoveryConfig;

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

    /// A value violates a startup precondition.
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub credentials: CredentialsSection,
}

/// General host behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which devices to provision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Advertised-name prefix identifying provisionable devices.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

/// Scan cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySection {
    /// Length of one scan cycle, in seconds.
    #[serde(default = "default_scan_window_secs")]
    pub scan_window_secs: u64,
    /// Wait between an empty cycle and the next scan, in seconds.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
}

/// Per-connection transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSection {
    /// Overall budget for connect plus all sends, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest fragment per characteristic write, in bytes. Must be ≥ 1.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Wait between consecutive fragments of one message, in milliseconds.
    #[serde(default = "default_inter_chunk_delay_ms")]
    pub inter_chunk_delay_ms: u64,
    /// Wait after the final fragment of each message, in seconds.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
}

/// Where the WiFi credentials come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialsSection {
    /// Path of the wpa_supplicant configuration holding `ssid=`/`psk=`.
    #[serde(default = "default_wpa_supplicant_path")]
    pub wpa_supplicant_path: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_name_prefix() -> String {
    "LICN".to_string()
}
fn default_scan_window_secs() -> u64 {
    10
}
fn default_scan_interval_secs() -> u64 {
    5
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_chunk_size() -> usize {
    blewifi_core::protocol::messages::DEFAULT_CHUNK_SIZE
}
fn default_inter_chunk_delay_ms() -> u64 {
    100
}
fn default_settle_delay_secs() -> u64 {
    3
}
fn default_wpa_supplicant_path() -> PathBuf {
    PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf")
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
        }
    }
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            scan_window_secs: default_scan_window_secs(),
            scan_interval_secs: default_scan_interval_secs(),
        }
    }
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            inter_chunk_delay_ms: default_inter_chunk_delay_ms(),
            settle_delay_secs: default_settle_delay_secs(),
        }
    }
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            wpa_supplicant_path: default_wpa_supplicant_path(),
        }
    }
}

// ── Validation and conversion ─────────────────────────────────────────────────

impl AppConfig {
    /// Checks the startup preconditions the protocol depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero chunk size, connection
    /// timeout, or scan window – all of which would wedge or panic the
    /// transfer loop at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                reason: "connection.chunk_size must be at least 1".to_string(),
            });
        }
        if self.connection.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "connection.timeout_secs must be at least 1".to_string(),
            });
        }
        if self.discovery.scan_window_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "discovery.scan_window_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The discovery-loop view of this configuration.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            device_prefix: self.device.name_prefix.clone(),
            scan_window: Duration::from_secs(self.discovery.scan_window_secs),
            scan_interval: Duration::from_secs(self.discovery.scan_interval_secs),
        }
    }

    /// The connection-manager view of this configuration.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            connection_timeout: Duration::from_secs(self.connection.timeout_secs),
            chunk_size: self.connection.chunk_size,
            inter_chunk_delay: Duration::from_millis(self.connection.inter_chunk_delay_ms),
            settle_delay: Duration::from_secs(self.connection.settle_delay_secs),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from an explicit path (used by tests).
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
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

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("BleWifi"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("blewifi"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/BleWifi
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("BleWifi")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
