use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Process configuration, read once at startup and passed by reference to
/// the adapter and storage constructors.
///
/// ```toml
/// [coinbase]
/// api_key = "..."
/// api_secret = "..."
/// api_passphrase = "..."
///
/// [storage]
/// cluster = ["10.0.0.1:9042", "10.0.0.2:9042"]
/// keyspace = "tapebot"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, alias = "gdax", skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<CoinbaseConfig>,
    #[serde(default, alias = "cassandra")]
    pub storage: StorageConfig,
}

/// Coinbase API credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseConfig {
    pub api_key: String,
    /// Base64-encoded signing secret.
    pub api_secret: String,
    pub api_passphrase: String,
}

impl fmt::Debug for CoinbaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinbaseConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_passphrase", &"<redacted>")
            .finish()
    }
}

/// Storage cluster descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Node addresses, in connection preference order.
    #[serde(default)]
    pub cluster: Vec<String>,
    #[serde(default)]
    pub keyspace: String,
}

impl Config {
    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Write the configuration back to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
