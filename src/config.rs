/*!
 * Client settings for DCOR access
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Host used when a locator does not name one
pub const DEFAULT_HOST: &str = "dcor.mpl.mpg.de";

/// Settings shared by every remote dataset opened by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host for bare resource identifiers
    #[serde(default = "default_host")]
    pub host: String,

    /// Use https (disable only for testing)
    #[serde(default = "default_true")]
    pub use_ssl: bool,

    /// API key for private resources (empty = anonymous)
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            use_ssl: true,
            api_key: String::new(),
            timeout_secs: default_timeout(),
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Plain HTTP against a local test server
    pub fn local_preset(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            use_ssl: false,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "dcor.mpl.mpg.de");
        assert!(config.use_ssl);
        assert!(config.api_key.is_empty());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_local_preset() {
        let config = ClientConfig::local_preset("127.0.0.1:5000");
        assert_eq!(config.host, "127.0.0.1:5000");
        assert!(!config.use_ssl);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("api_key = \"secret\"\n").unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.use_ssl);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = ClientConfig {
            host: "example.org".to_string(),
            log_level: LogLevel::Debug,
            ..Default::default()
        };
        config.to_file(file.path()).unwrap();
        let loaded = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "use_ssl = \"maybe\"").unwrap();
        assert!(ClientConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
