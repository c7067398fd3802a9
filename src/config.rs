//! Runtime configuration: tunables from a JSON settings file, endpoints and
//! credentials from the environment.

use log::{info, warn};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use ticket_api::{ClientConfig, DEFAULT_PROJECT};

pub const DEFAULT_SAYORI_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_JIRA_BASE_URL: &str = "https://jira.example.com";
pub const DEFAULT_TABLE_NAME: &str = "roaster-for-slack-test-users";
pub const DEFAULT_LOCAL_DYNAMODB_ENDPOINT: &str = "http://localhost:4566";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("could not determine a settings directory")]
    NoSettingsDir,
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_retry_max_attempts() -> usize {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

fn default_sayori_project() -> String {
    DEFAULT_PROJECT.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

/// Tunables persisted as JSON. Missing keys take their defaults.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    pub cooldown_ms: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: usize,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_sayori_project")]
    pub sayori_project: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            cooldown_ms: 0,
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            sayori_project: default_sayori_project(),
            table_name: default_table_name(),
        }
    }
}

/// Loads [`Settings`] from a fixed path.
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Manager bound to an explicit settings file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manager bound to `settings.json` in the platform config directory.
    pub fn platform_default() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("com", "sovego", "jira-roaster")
            .ok_or(ConfigError::NoSettingsDir)?;
        Ok(Self::at(dirs.config_dir().join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                warn!(
                    "Ignoring invalid settings file {}: {}",
                    self.path.display(),
                    err
                );
                Settings::default()
            }),
            Err(err) => {
                warn!("Could not read settings file {}: {}", self.path.display(), err);
                Settings::default()
            }
        }
    }

}

#[derive(Clone)]
pub struct AppConfig {
    pub sayori_base_url: String,
    pub jira_base_url: String,
    pub jira_token: String,
    pub is_local: bool,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub settings: Settings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("sayori_base_url", &self.sayori_base_url)
            .field("jira_base_url", &self.jira_base_url)
            .field("jira_token", &"<redacted>")
            .field("is_local", &self.is_local)
            .field("dynamodb_endpoint", &self.dynamodb_endpoint)
            .field("aws_region", &self.aws_region)
            .field("settings", &self.settings)
            .finish()
    }
}

impl AppConfig {
    /// Reads the process environment (after loading `.env`, if present).
    pub fn from_env(settings: Settings) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(settings, |name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(mut settings: Settings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let jira_token = var("JIRA_TOKEN").ok_or(ConfigError::MissingVar("JIRA_TOKEN"))?;
        let is_local = var("IS_LOCAL").as_deref() == Some("True");

        if let Some(raw) = var("MAX_CONCURRENT_FETCHES") {
            settings.max_concurrent_fetches = match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::InvalidVar {
                        name: "MAX_CONCURRENT_FETCHES",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Ok(limit) => limit,
                Err(err) => {
                    return Err(ConfigError::InvalidVar {
                        name: "MAX_CONCURRENT_FETCHES",
                        value: raw,
                        reason: err.to_string(),
                    })
                }
            };
        }

        let dynamodb_endpoint = var("DYNAMODB_ENDPOINT")
            .or_else(|| is_local.then(|| DEFAULT_LOCAL_DYNAMODB_ENDPOINT.to_string()));

        Ok(Self {
            sayori_base_url: var("SAYORI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SAYORI_BASE_URL.to_string()),
            jira_base_url: var("JIRA_BASE_URL").unwrap_or_else(|| DEFAULT_JIRA_BASE_URL.to_string()),
            jira_token,
            is_local,
            dynamodb_endpoint,
            aws_region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            settings,
        })
    }

    /// Sayori is called without credentials.
    pub fn sayori_client_config(&self) -> ClientConfig {
        self.client_config(&self.sayori_base_url)
    }

    pub fn jira_client_config(&self) -> ClientConfig {
        self.client_config(&self.jira_base_url)
            .with_token(self.jira_token.clone())
    }

    fn client_config(&self, base_url: &str) -> ClientConfig {
        let settings = &self.settings;
        ClientConfig::new(base_url)
            .with_timeout(Duration::from_secs(settings.request_timeout_secs))
            .with_connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .with_cooldown(Duration::from_millis(settings.cooldown_ms))
            .with_retry(
                settings.retry_max_attempts,
                Duration::from_millis(settings.retry_base_delay_ms),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, Settings, SettingsManager};
    use std::collections::HashMap;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn unique_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        env::temp_dir().join(format!("jira-roaster-tests-{name}-{nanos}/settings.json"))
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_settings_have_expected_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_concurrent_fetches, 4);
        assert_eq!(settings.retry_max_attempts, 3);
        assert_eq!(settings.sayori_project, "APIGEE");
        assert_eq!(settings.table_name, "roaster-for-slack-test-users");
    }

    #[test]
    fn load_missing_file_returns_default() {
        let manager = SettingsManager::at(unique_path("missing"));
        assert_eq!(manager.load(), Settings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let path = unique_path("override");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(
            &path,
            r#"{"max_concurrent_fetches": 8, "sayori_project": "OPS"}"#,
        )
        .expect("write settings");

        let expected = Settings {
            max_concurrent_fetches: 8,
            sayori_project: "OPS".to_string(),
            ..Settings::default()
        };
        assert_eq!(SettingsManager::at(path.clone()).load(), expected);

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = unique_path("partial");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(&path, r#"{"cooldown_ms": 100}"#).expect("write settings");

        let loaded = SettingsManager::at(path.clone()).load();
        assert_eq!(loaded.cooldown_ms, 100);
        assert_eq!(loaded.max_concurrent_fetches, 4);
        assert_eq!(loaded.table_name, "roaster-for-slack-test-users");

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn invalid_json_falls_back_to_default() {
        let path = unique_path("invalid");
        let parent = path.parent().expect("parent must exist");
        fs::create_dir_all(parent).expect("create temp directory");
        fs::write(&path, "not-valid-json").expect("write invalid settings");

        assert_eq!(SettingsManager::at(path.clone()).load(), Settings::default());

        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn missing_jira_token_is_fatal() {
        let err = AppConfig::from_lookup(Settings::default(), lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("JIRA_TOKEN")));
        assert_eq!(err.to_string(), "JIRA_TOKEN environment variable is required");
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config =
            AppConfig::from_lookup(Settings::default(), lookup(&[("JIRA_TOKEN", "abc")])).unwrap();
        assert_eq!(config.sayori_base_url, "http://localhost:8080");
        assert_eq!(config.jira_base_url, "https://jira.example.com");
        assert!(!config.is_local);
        assert!(config.dynamodb_endpoint.is_none());
        assert_eq!(config.aws_region, "us-east-1");
        assert!(!format!("{config:?}").contains("abc"));
    }

    #[test]
    fn local_mode_points_at_local_dynamodb() {
        let config = AppConfig::from_lookup(
            Settings::default(),
            lookup(&[("JIRA_TOKEN", "abc"), ("IS_LOCAL", "True")]),
        )
        .unwrap();
        assert!(config.is_local);
        assert_eq!(
            config.dynamodb_endpoint.as_deref(),
            Some("http://localhost:4566")
        );

        let not_local = AppConfig::from_lookup(
            Settings::default(),
            lookup(&[("JIRA_TOKEN", "abc"), ("IS_LOCAL", "true")]),
        )
        .unwrap();
        assert!(!not_local.is_local);
    }

    #[test]
    fn concurrency_override_is_validated() {
        let config = AppConfig::from_lookup(
            Settings::default(),
            lookup(&[("JIRA_TOKEN", "abc"), ("MAX_CONCURRENT_FETCHES", "9")]),
        )
        .unwrap();
        assert_eq!(config.settings.max_concurrent_fetches, 9);

        for bad in ["0", "many"] {
            let err = AppConfig::from_lookup(
                Settings::default(),
                lookup(&[("JIRA_TOKEN", "abc"), ("MAX_CONCURRENT_FETCHES", bad)]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidVar { .. }));
        }
    }

    #[test]
    fn client_configs_carry_settings() {
        let settings = Settings {
            request_timeout_secs: 3,
            retry_max_attempts: 5,
            ..Settings::default()
        };
        let config = AppConfig::from_lookup(settings, lookup(&[("JIRA_TOKEN", "abc")])).unwrap();

        let jira = config.jira_client_config();
        assert_eq!(jira.token.as_deref(), Some("abc"));
        assert_eq!(jira.timeout, Duration::from_secs(3));
        assert_eq!(jira.retry_max_attempts, 5);
        assert!(config.sayori_client_config().token.is_none());
    }
}
