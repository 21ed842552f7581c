use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use geopair::google::{ClientConfig, DEFAULT_BASE_URL};
use geopair::TravelMode;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub client: ClientSection,
    pub run: RunSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientSection {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub requests_per_second: Option<u32>,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 500,
            requests_per_second: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunSection {
    pub concurrency: usize,
    pub mode: TravelMode,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            concurrency: 8,
            mode: TravelMode::Driving,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.client.base_url.clone(),
            timeout: Duration::from_secs(self.client.timeout_secs),
            max_retries: self.client.max_retries,
            retry_base_delay: Duration::from_millis(self.client.retry_base_delay_ms),
            requests_per_second: self.client.requests_per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [client]
            max_retries = 5
            requests_per_second = 40

            [run]
            mode = "walking"
            "#,
        )
        .unwrap();

        assert_eq!(config.client.max_retries, 5);
        assert_eq!(config.client.requests_per_second, Some(40));
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.client.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.run.mode, TravelMode::Walking);
        assert_eq!(config.run.concurrency, 8);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let client = config.client_config();

        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(client.retry_base_delay, Duration::from_millis(500));
        assert_eq!(client.max_retries, 2);
        assert!(client.requests_per_second.is_none());
        assert_eq!(config.run.mode, TravelMode::Driving);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geopair.toml");
        fs::write(&path, "[run]\nconcurrency = 2\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.run.concurrency, 2);

        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
