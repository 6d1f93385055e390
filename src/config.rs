//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub plot: PlotConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Measurement store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("stratus").join("weather.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./weather.db".to_string())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Device used by browser requests that name no device
    #[serde(default = "default_device_name")]
    pub default_device: String,

    /// Earliest date offered by the navigation controls
    #[serde(default = "default_navigation_start")]
    pub navigation_start: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

fn default_device_name() -> String {
    "esp8266_1".to_string()
}

fn default_navigation_start() -> String {
    "2021-01-01".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            default_device: default_device_name(),
            navigation_start: default_navigation_start(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// UDP ingestion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_port")]
    pub port: u16,

    #[serde(default = "default_ingest_enabled")]
    pub enabled: bool,
}

fn default_ingest_port() -> u16 {
    2222
}

fn default_ingest_enabled() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            port: default_ingest_port(),
            enabled: default_ingest_enabled(),
        }
    }
}

/// Chart rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PlotConfig {
    /// Default figure width for desktop viewports (pixels)
    #[serde(default = "default_figure_width")]
    pub figure_width: u32,

    /// Default figure height for desktop viewports (pixels)
    #[serde(default = "default_figure_height")]
    pub figure_height: u32,

    /// Axis label font size
    #[serde(default = "default_label_font_size")]
    pub label_font_size: u32,

    /// Y tick label font size
    #[serde(default = "default_tick_font_size")]
    pub tick_font_size: u32,

    /// X (date) tick label font size
    #[serde(default = "default_date_tick_font_size")]
    pub date_tick_font_size: u32,

    /// Temperature panel y-range (°C)
    #[serde(default = "default_temp_ylim")]
    pub temp_ylim: [f64; 2],

    /// Pressure panel y-range (hPa)
    #[serde(default = "default_pressure_ylim")]
    pub pressure_ylim: [f64; 2],

    /// Font family handed to the renderer; deployments without a CJK font
    /// can swap this for one that has the glyphs
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_figure_width() -> u32 {
    980
}

fn default_figure_height() -> u32 {
    640
}

fn default_label_font_size() -> u32 {
    10
}

fn default_tick_font_size() -> u32 {
    9
}

fn default_date_tick_font_size() -> u32 {
    9
}

fn default_temp_ylim() -> [f64; 2] {
    [-10.0, 40.0]
}

fn default_pressure_ylim() -> [f64; 2] {
    [960.0, 1030.0]
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            figure_width: default_figure_width(),
            figure_height: default_figure_height(),
            label_font_size: default_label_font_size(),
            tick_font_size: default_tick_font_size(),
            date_tick_font_size: default_date_tick_font_size(),
            temp_ylim: default_temp_ylim(),
            pressure_ylim: default_pressure_ylim(),
            font_family: default_font_family(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("stratus").join("config.toml")),
            Some(PathBuf::from("/etc/stratus/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STRATUS_DB_PATH") {
            self.database.path = path;
        }

        if let Ok(host) = std::env::var("STRATUS_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("STRATUS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(device) = std::env::var("STRATUS_DEFAULT_DEVICE") {
            self.api.default_device = device;
        }

        if let Ok(port) = std::env::var("STRATUS_INGEST_PORT") {
            if let Ok(p) = port.parse() {
                self.ingest.port = p;
            }
        }

        if let Ok(level) = std::env::var("STRATUS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STRATUS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Stratus Configuration
#
# Environment variables override these settings:
# - STRATUS_DB_PATH
# - STRATUS_API_HOST
# - STRATUS_API_PORT
# - STRATUS_DEFAULT_DEVICE
# - STRATUS_INGEST_PORT
# - STRATUS_LOG_LEVEL
# - STRATUS_LOG_FORMAT

[database]
# SQLite database file
path = "~/.local/share/stratus/weather.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins (empty = permissive)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Device used by browser requests that name no device
default_device = "esp8266_1"

# Earliest date offered by the navigation controls
navigation_start = "2021-01-01"

[ingest]
# UDP port receiving sensor datagrams
port = 2222

# Enable the UDP listener
enabled = true

[plot]
# Default figure size for desktop viewports (pixels)
figure_width = 980
figure_height = 640

# Font sizes
label_font_size = 10
tick_font_size = 9
date_tick_font_size = 9

# Fixed panel y-ranges
temp_ylim = [-10.0, 40.0]
pressure_ylim = [960.0, 1030.0]

# Chart font family; needs CJK glyphs for the localized titles
font_family = "sans-serif"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
