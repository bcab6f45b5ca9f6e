// Runtime configuration
// Everything comes from environment variables; CLI flags override a few
// of them in cli.rs. The data directory defaults to the platform data dir.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::youtube::api::{DEFAULT_API_BASE, DEFAULT_SUGGEST_URL};

const APP_DIR: &str = "soundwave";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("could not determine a data directory; set SOUNDWAVE_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub server_url: String,
    pub data_dir: PathBuf,
    pub upstream_timeout: Duration,
    pub api_base: String,
    pub suggest_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    // Separate from from_env() so tests don't have to touch the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = match get("SOUNDWAVE_HOST") {
            Some(value) => value.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                name: "SOUNDWAVE_HOST",
                expected: "an IPv4 or IPv6 address",
                value,
            })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let port = match get("SOUNDWAVE_PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "SOUNDWAVE_PORT",
                expected: "a port between 0 and 65535",
                value,
            })?,
            None => 3000,
        };

        let upstream_timeout = match get("SOUNDWAVE_UPSTREAM_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "SOUNDWAVE_UPSTREAM_TIMEOUT_SECS",
                    expected: "a positive number of seconds",
                    value,
                })?,
            None => Duration::from_secs(10),
        };

        let data_dir = match get("SOUNDWAVE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Config {
            api_key: get("YOUTUBE_API_KEY"),
            host,
            port,
            server_url: get("SOUNDWAVE_SERVER_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{port}")),
            data_dir,
            upstream_timeout,
            api_base: get("YOUTUBE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            suggest_url: get("YOUTUBE_SUGGEST_URL")
                .unwrap_or_else(|| DEFAULT_SUGGEST_URL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // Keep tests independent of the machine's data dir
        map.entry("SOUNDWAVE_DATA_DIR".to_string())
            .or_insert_with(|| "/tmp/soundwave-test".to_string());
        map
    }

    #[test]
    fn defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.server_url, "http://127.0.0.1:3000");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = Config::from_vars(vars(&[("YOUTUBE_API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn port_feeds_default_server_url() {
        let pairs = [("SOUNDWAVE_PORT", "8088"), ("YOUTUBE_API_KEY", "k")];
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:8088");
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_vars(vars(&[("SOUNDWAVE_PORT", "eighty")])).is_err());
        assert!(Config::from_vars(vars(&[("SOUNDWAVE_HOST", "localhost")])).is_err());
        assert!(Config::from_vars(vars(&[("SOUNDWAVE_UPSTREAM_TIMEOUT_SECS", "0")])).is_err());
    }
}
