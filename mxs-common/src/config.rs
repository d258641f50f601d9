//! Bootstrap configuration loaded from TOML
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Arguments and environment variables are handled by the binaries through
//! clap; this module covers the file and the defaults. A missing file is not
//! an error: the service starts with defaults and reports where it looked,
//! so the binary can warn once logging is up.

use crate::protocol::JobLimits;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Server bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request line, in bytes
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Largest accepted `matrix_size`
    #[serde(default = "default_max_matrix_size")]
    pub max_matrix_size: usize,

    /// Largest accepted `workers`
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_request_bytes() -> usize {
    crate::codec::DEFAULT_MAX_MESSAGE_BYTES
}

fn default_max_matrix_size() -> usize {
    crate::protocol::DEFAULT_MAX_MATRIX_SIZE
}

fn default_max_workers() -> usize {
    crate::protocol::DEFAULT_MAX_WORKERS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_bytes: default_max_request_bytes(),
            max_matrix_size: default_max_matrix_size(),
            max_workers: default_max_workers(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults if it is missing
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<LoadedConfig> {
        if !path.exists() {
            return Ok(LoadedConfig {
                config: Self::default(),
                source: ConfigSource::Defaults {
                    missing: Some(path.to_path_buf()),
                },
            });
        }

        let text = std::fs::read_to_string(path)?;
        Ok(LoadedConfig {
            config: Self::from_toml_str(&text)?,
            source: ConfigSource::File(path.to_path_buf()),
        })
    }

    /// Load from an explicit path, or from the platform default location
    pub fn resolve(explicit: Option<&Path>) -> Result<LoadedConfig> {
        match explicit {
            Some(path) => Self::load_or_default(path),
            None => match default_config_path() {
                Some(path) => Self::load_or_default(&path),
                None => Ok(LoadedConfig {
                    config: Self::default(),
                    source: ConfigSource::Defaults { missing: None },
                }),
            },
        }
    }

    /// Request limits enforced by every session
    pub fn job_limits(&self) -> JobLimits {
        JobLimits {
            max_matrix_size: self.max_matrix_size,
            max_workers: self.max_workers,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_request_bytes == 0 {
            return Err(Error::Config("max_request_bytes must be > 0".to_string()));
        }
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Configuration together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// Built-in defaults; `missing` is the file that was looked for, if any
    Defaults { missing: Option<PathBuf> },
}

/// Default config file location: `<config_dir>/mxs/server.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mxs").join("server.toml"))
}
