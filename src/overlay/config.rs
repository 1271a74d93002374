// Configuration module for KZ Record Overlay

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

// =============================================================================
// CONFIGURATION STRUCTURES
// =============================================================================

/// How the game state reaches the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedTransport {
    /// WebSocket stream pushing a JSON snapshot on every change
    Push,
    /// HTTP endpoint returning the current snapshot, polled every refresh
    Pull,
}

/// Game state feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_transport")]
    pub transport: FeedTransport,
    /// `ws://` URL for push, `http://` URL for pull
    #[serde(default = "default_feed_url")]
    pub url: String,
}

fn default_transport() -> FeedTransport {
    FeedTransport::Push
}
fn default_feed_url() -> String {
    "ws://127.0.0.1:9999/gsi".to_string()
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            url: default_feed_url(),
        }
    }
}

/// Records service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsSettings {
    /// Base URL serving `/wrs` and `/pbs`
    #[serde(default = "default_records_url")]
    pub url: String,
    /// Request timeout in seconds. None = wait as long as the service takes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_records_url() -> String {
    "http://127.0.0.1:9999".to_string()
}

impl Default for RecordsSettings {
    fn default() -> Self {
        Self {
            url: default_records_url(),
            timeout_secs: None,
        }
    }
}

impl RecordsSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Refresh loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    3000
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl RefreshSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Where the overlay text goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// One text file per region
    Files,
    /// Log every display change
    Console,
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_sink")]
    pub sink: SinkKind,
    /// Directory for the region files (relative to the config file or absolute)
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_sink() -> SinkKind {
    SinkKind::Files
}
fn default_output_dir() -> String {
    "overlay".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Write logs to stdout
    #[serde(default = "default_console")]
    pub console: bool,
    /// Log file path (relative to the config file or absolute). Empty = no file logging.
    #[serde(default)]
    pub log_file: String,
}

fn default_console() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console: default_console(),
            log_file: String::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub records: RecordsSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

// =============================================================================
// CONFIG LOADING
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config file path")]
    PathError,
    #[error("Failed to read config file: {0}")]
    ReadError(#[source] std::io::Error),
    #[error("Failed to write default config file: {0}")]
    WriteError(#[source] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid {field} URL `{url}`: expected {expected}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        expected: &'static str,
    },
}

impl Config {
    pub const CONFIG_FILENAME: &'static str = "config.toml";
    /// Config shipped next to the binary
    pub const SIDECAR_FILENAME: &'static str = "kz_record_overlay.toml";
    const CONFIG_DIR: &'static str = "kz_record_overlay";

    /// Platform config directory for the overlay
    ///
    /// `$XDG_CONFIG_HOME/kz_record_overlay` (falling back to `~/.config`) on
    /// Unix, `%APPDATA%\kz_record_overlay` on Windows.
    pub fn default_dir() -> Option<PathBuf> {
        #[cfg(windows)]
        let base = std::env::var_os("APPDATA").map(PathBuf::from);

        #[cfg(not(windows))]
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

        base.map(|dir| dir.join(Self::CONFIG_DIR))
    }

    /// Load the config from `path`, or from the first default location.
    ///
    /// Without an explicit path, a `kz_record_overlay.toml` next to the
    /// executable wins over the platform config directory. A default config
    /// file is created in the platform directory if neither exists. An
    /// explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let config_path = Self::resolve_path(path, exe_dir.as_deref(), Self::default_dir())?;

        debug!(path = %config_path.display(), "[config] Loading config");

        let contents = fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let mut config = Self::from_toml(&contents)?;
        config.base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        info!(path = %config_path.display(), "[config] Loaded config");
        Ok(config)
    }

    /// Pick the config file to read, writing the default file if needed
    fn resolve_path(
        explicit: Option<&Path>,
        exe_dir: Option<&Path>,
        default_dir: Option<PathBuf>,
    ) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Some(beside_exe) = exe_dir.map(|dir| dir.join(Self::SIDECAR_FILENAME)) {
            if beside_exe.is_file() {
                return Ok(beside_exe);
            }
        }

        let path = default_dir
            .ok_or(ConfigError::PathError)?
            .join(Self::CONFIG_FILENAME);
        if !path.exists() {
            Self::write_default(&path)?;
        }
        Ok(path)
    }

    /// Parse and validate a config file's contents
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn write_default(path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ConfigError::WriteError)?;
        }
        let contents = toml::to_string_pretty(&Config::default())
            .expect("default config serializes to TOML");
        fs::write(path, contents).map_err(ConfigError::WriteError)?;
        info!(path = %path.display(), "[config] Created default config");
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let feed_schemes: &[&str] = match self.feed.transport {
            FeedTransport::Push => &["ws://", "wss://"],
            FeedTransport::Pull => &["http://", "https://"],
        };
        if !feed_schemes.iter().any(|s| self.feed.url.starts_with(s)) {
            return Err(ConfigError::InvalidUrl {
                field: "feed",
                url: self.feed.url.clone(),
                expected: match self.feed.transport {
                    FeedTransport::Push => "ws:// or wss://",
                    FeedTransport::Pull => "http:// or https://",
                },
            });
        }

        if !["http://", "https://"]
            .iter()
            .any(|s| self.records.url.starts_with(s))
        {
            return Err(ConfigError::InvalidUrl {
                field: "records",
                url: self.records.url.clone(),
                expected: "http:// or https://",
            });
        }

        Ok(())
    }

    /// Resolve a config-relative path
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Log file location, if file logging is enabled
    pub fn log_file_path(&self) -> Option<PathBuf> {
        if self.logging.log_file.is_empty() {
            None
        } else {
            Some(self.resolve(&self.logging.log_file))
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.display.output_dir)
    }
}
