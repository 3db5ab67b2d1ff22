use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Directory holding the `<collection>.json` seed files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Upper bound applied to every caller-supplied limit
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    #[serde(default)]
    pub ephemeris: EphemerisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemerisConfig {
    #[serde(default = "default_sbdb_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_max_limit() -> usize {
    1000
}

fn default_sbdb_url() -> String {
    "https://ssd-api.jpl.nasa.gov/sbdb.api".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    2
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            data_dir: default_data_dir(),
            max_limit: default_max_limit(),
            ephemeris: EphemerisConfig::default(),
        }
    }
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            base_url: default_sbdb_url(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay_seconds(),
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: BackendConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\nmax_limit = 50\n\n[ephemeris]\nmax_retries = 5").unwrap();

        let config = BackendConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.ephemeris.max_retries, 5);
        assert_eq!(config.ephemeris.timeout_seconds, 60);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.max_limit, 1000);
        assert_eq!(config.ephemeris.base_url, default_sbdb_url());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_limit = \"lots\"").unwrap();
        assert!(BackendConfig::load_or_default(file.path()).is_err());
    }
}
