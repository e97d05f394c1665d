//! Configuration management for the ziftr mining client
//!
//! Supports configuration via command line arguments, environment variables,
//! and configuration files (YAML/JSON) with proper validation and defaults.

use crate::{utils, Error, Header, Result, Target};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Complete configuration for the mining client
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "ziftr-mining-client",
    version = env!("CARGO_PKG_VERSION"),
    about = "ZiftrCOIN CPU Mining Client",
    long_about = "A multi-threaded CPU mining client for the ZiftrCOIN chained proof-of-work algorithm with proof-of-kernel support"
)]
pub struct Config {
    /// Print program info and exit
    #[arg(long)]
    #[serde(default)]
    pub info: bool,

    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(default)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Block header template to mine, as 160 hex characters
    #[arg(short = 'H', long)]
    pub header: Option<String>,

    /// Proof-of-work target as 64 hex characters, most significant first
    #[arg(short = 't', long)]
    pub target: Option<String>,

    /// First nonce to try
    #[arg(long, default_value = "0")]
    #[serde(default)]
    pub nonce_start: u32,

    /// Upper bound of the nonce range (exclusive)
    #[arg(long, default_value = "4294967295")]
    #[serde(default = "default_nonce_max")]
    pub nonce_max: u32,

    /// Number of concurrent mining threads (0 = one per logical CPU)
    #[arg(short = 'c', long, default_value = "0")]
    #[serde(default)]
    pub thread_count: usize,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Mine a fixed zero header against an impossible target to measure the
    /// hash rate
    #[arg(long)]
    #[serde(default)]
    pub benchmark: bool,
}

impl Config {
    /// Load configuration from CLI arguments and an optional config file
    pub async fn load() -> Result<Self> {
        let mut config = Self::parse();

        // Load from config file if specified
        if let Some(config_file) = &config.config_file {
            let file_config = Self::load_from_file(config_file).await?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Merge CLI config with file config (CLI takes precedence)
    fn merge_with_file(mut self, file_config: Self) -> Self {
        // Only the job inputs come from the file; the remaining fields carry
        // their CLI values, defaults included
        if self.header.is_none() {
            self.header = file_config.header;
        }

        if self.target.is_none() {
            self.target = file_config.target;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(header) = &self.header {
            utils::validate_hex_string(header, Some(Header::SIZE * 2))
                .map_err(|e| Error::config(format!("Invalid header: {}", e)))?;
        }

        if let Some(target) = &self.target {
            utils::validate_hex_string(target, Some(64))
                .map_err(|e| Error::config(format!("Invalid target: {}", e)))?;
        }

        if self.nonce_start >= self.nonce_max {
            return Err(Error::config(
                "Nonce range is empty: nonce-start must be below nonce-max",
            ));
        }

        Ok(())
    }

    /// Get the parsed header template, if configured
    pub fn header(&self) -> Result<Option<Header>> {
        self.header.as_deref().map(Header::from_hex).transpose()
    }

    /// Get the parsed target, if configured
    pub fn target(&self) -> Result<Option<Target>> {
        self.target.as_deref().map(Target::from_str).transpose()
    }
}

// Default value functions for serde
fn default_nonce_max() -> u32 {
    u32::MAX
}
fn default_log_level() -> LogLevel {
    LogLevel::Info
}
