//! Configuration for the homework watcher.
//!
//! Credentials always come from the environment (a `.env` file is loaded by
//! the binary beforehand). Tunables live in an optional YAML file; every field
//! has a default, so the file may be omitted entirely.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::practicum::PRACTICUM_ENDPOINT;

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub practicum: Practicum,
}

/// Loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub retry_secs: u64,
}

/// Homework API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    /// Honour `HTTPS_PROXY`/`NO_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for App {
    fn default() -> Self {
        Self { retry_secs: 600 }
    }
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            endpoint: PRACTICUM_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            use_system_proxy: true,
        }
    }
}

impl Config {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.app.retry_secs)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.practicum.endpoint.trim())
            .map_err(|_| ConfigError::Invalid("practicum.endpoint must be a valid URL"))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.retry_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_secs must be > 0"));
    }
    if cfg.practicum.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("practicum.request_timeout_secs must be > 0"));
    }
    if cfg.practicum.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("practicum.endpoint must be non-empty"));
    }
    cfg.endpoint_url()?;
    Ok(())
}

/// Example YAML with every supported key set to its default.
pub fn example() -> &'static str {
    r#"app:
  retry_secs: 600

practicum:
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"
  request_timeout_secs: 30
  use_system_proxy: true
"#
}

/// Tokens required before polling may start.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Resolve all three credentials; empty or whitespace-only values count as missing.
    /// The error lists every missing name, not only the first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut fetch = |name: &'static str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let creds = Self {
            practicum_token: fetch(PRACTICUM_TOKEN),
            telegram_token: fetch(TELEGRAM_TOKEN),
            telegram_chat_id: fetch(TELEGRAM_CHAT_ID),
        };

        if missing.is_empty() {
            Ok(creds)
        } else {
            Err(ConfigError::MissingCredentials(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn defaults_without_file() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg.retry_interval(), Duration::from_secs(600));
        assert_eq!(cfg.endpoint_url().unwrap().as_str(), PRACTICUM_ENDPOINT);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = serde_yaml::from_str("app:\n  retry_secs: 60\n").unwrap();
        assert_eq!(cfg.app.retry_secs, 60);
        assert_eq!(cfg.practicum, Practicum::default());
    }

    #[test]
    fn invalid_values() {
        let mut cfg = Config::default();
        cfg.app.retry_secs = 0;
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("retry_secs")),
            _ => panic!("wrong error"),
        }

        let mut cfg = Config::default();
        cfg.practicum.endpoint = "not a url".into();
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("endpoint")),
            _ => panic!("wrong error"),
        }

        let mut cfg = Config::default();
        cfg.practicum.request_timeout_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, "practicum:\n  endpoint: \"http://localhost:8080/hw/\"\n").unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.practicum.endpoint, "http://localhost:8080/hw/");
        assert_eq!(cfg.app.retry_secs, 600);
        assert!(cfg.practicum.use_system_proxy);
    }

    #[test]
    fn proxy_can_be_disabled() {
        let cfg: Config = serde_yaml::from_str("practicum:\n  use_system_proxy: false\n").unwrap();
        assert!(!cfg.practicum.use_system_proxy);
        assert_eq!(cfg.practicum.request_timeout_secs, 30);
    }

    #[test]
    fn load_missing_file_fails() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn credentials_present() {
        let vars = env(&[
            (PRACTICUM_TOKEN, "p"),
            (TELEGRAM_TOKEN, "t"),
            (TELEGRAM_CHAT_ID, " 42 "),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.telegram_chat_id, "42");
        assert!(!format!("{creds:?}").contains("\"p\""));
    }

    #[test]
    fn each_missing_credential_is_named() {
        let vars = env(&[(PRACTICUM_TOKEN, "p"), (TELEGRAM_TOKEN, "   ")]);
        match Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err() {
            ConfigError::MissingCredentials(names) => {
                assert_eq!(names, vec![TELEGRAM_TOKEN, TELEGRAM_CHAT_ID])
            }
            other => panic!("wrong error: {other}"),
        }
    }

    #[test]
    fn all_missing() {
        let err = Credentials::from_lookup(|_| None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variables: PRACTICUM_TOKEN, TELEGRAM_TOKEN, TELEGRAM_CHAT_ID"
        );
    }
}
