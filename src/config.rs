//! Configuration file management for certaudit.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! command-line arguments. Every field is optional so partial layers merge.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certaudit.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! input = "domains.txt"
//! json_output = "ssl_results.json"
//! csv_output = "ssl_results.csv"
//! port = 443
//! timeout_secs = 10
//! concurrency = 1
//! exit_code = 0
//! summary = false
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "certaudit.toml";

/// Main configuration structure for certaudit.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    /// File with one domain per line
    pub input: Option<String>,
    /// Destination of the JSON report
    pub json_output: Option<String>,
    /// Destination of the CSV report
    pub csv_output: Option<String>,
    /// TLS port to connect to
    pub port: Option<u16>,
    /// Connect plus handshake budget per domain, in seconds
    pub timeout_secs: Option<u64>,
    /// Number of domains checked at the same time
    pub concurrency: Option<usize>,
    /// Exit code to use when at least one domain failed
    pub exit_code: Option<i32>,
    /// Print a summary table to stdout
    pub summary: Option<bool>,
    /// Log level: error, warn, info, debug, trace
    pub log_level: Option<String>,
    /// PEM bundle of extra trusted root certificates
    pub ca_file: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Built-in defaults, matching the file names the tool has always used.
    ///
    /// - `input`: "domains.txt"
    /// - `json_output`: "ssl_results.json"
    /// - `csv_output`: "ssl_results.csv"
    /// - `port`: 443
    /// - `timeout_secs`: 10
    /// - `concurrency`: 1 (sequential)
    /// - `exit_code`: 0 (don't fail the process on failed domains)
    /// - `summary`: false
    /// - `log_level`: "info"
    /// - `ca_file`: None
    pub fn defaults() -> Self {
        Config {
            input: Some("domains.txt".to_string()),
            json_output: Some("ssl_results.json".to_string()),
            csv_output: Some("ssl_results.csv".to_string()),
            port: Some(443),
            timeout_secs: Some(10),
            concurrency: Some(1),
            exit_code: Some(0),
            summary: Some(false),
            log_level: Some("info".to_string()),
            ca_file: None,
        }
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) override file and default
    /// layers. Flags that were not given must be passed as `None`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_cli_args(
        input: Option<String>,
        json_output: Option<String>,
        csv_output: Option<String>,
        port: Option<u16>,
        timeout_secs: Option<u64>,
        concurrency: Option<usize>,
        exit_code: Option<i32>,
        summary: Option<bool>,
        log_level: Option<String>,
        ca_file: Option<String>,
    ) -> Self {
        Config {
            input,
            json_output,
            csv_output,
            port,
            timeout_secs,
            concurrency,
            exit_code,
            summary,
            log_level,
            ca_file,
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.input.is_some() {
            self.input = other.input;
        }
        if other.json_output.is_some() {
            self.json_output = other.json_output;
        }
        if other.csv_output.is_some() {
            self.csv_output = other.csv_output;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.ca_file.is_some() {
            self.ca_file = other.ca_file;
        }
        self
    }

    /// Rejects values no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == Some(0) {
            return Err(ConfigError::Validation("port must be greater than 0".into()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "concurrency must be greater than 0".into(),
            ));
        }
        if let Some(level) = &self.log_level {
            level.parse::<log::LevelFilter>().map_err(|_| {
                ConfigError::Validation(format!("unknown log level '{}'", level))
            })?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            ca_file: Some("internal-ca.pem".to_string()),
            concurrency: Some(4),
            summary: Some(true),
            exit_code: Some(1),
            ..Config::defaults()
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (out of range or unknown values)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
