// Registry configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the registry and the CLI around it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// URI scheme accepted by resolution
    #[serde(default = "default_uri_scheme")]
    pub uri_scheme: String,

    /// Reject spends larger than the account's unconfirmed balance
    #[serde(default)]
    pub enforce_balances: bool,

    /// Longest accepted claim name, in bytes
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,

    /// Confirmations used by balance queries that do not ask for a level
    #[serde(default)]
    pub default_confirmations: u64,

    /// Directory holding the sled database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_uri_scheme() -> String {
    "lbry".to_string()
}

fn default_max_name_length() -> usize {
    255
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("claimtrie-data")
}

fn default_log_filter() -> String {
    "claimtrie=info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            uri_scheme: default_uri_scheme(),
            enforce_balances: false,
            max_name_length: default_max_name_length(),
            default_confirmations: 0,
            data_dir: default_data_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl RegistryConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uri_scheme = scheme.into();
        self
    }

    pub fn with_enforce_balances(mut self, enforce: bool) -> Self {
        self.enforce_balances = enforce;
        self
    }

    pub fn with_max_name_length(mut self, len: usize) -> Self {
        self.max_name_length = len;
        self
    }

    pub fn with_default_confirmations(mut self, confirmations: u64) -> Self {
        self.default_confirmations = confirmations;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri_scheme.is_empty() || !self.uri_scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
            return Err(ConfigError::Invalid(format!("uri_scheme {:?} is not a valid scheme", self.uri_scheme)));
        }
        if self.max_name_length == 0 {
            return Err(ConfigError::Invalid("max_name_length must be > 0".to_string()));
        }
        Ok(())
    }
}
