//! Application-level configuration loading: storage backend selection and tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::user_store::{StoreBackend, retry::RetryPolicy};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREKEEPER_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const BACKEND_ENV: &str = "STORE_BACKEND";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the HTTP server binds to.
    pub port: u16,
    /// Storage backend holding player records.
    pub backend: StoreBackend,
    /// Upper bound on a single storage call.
    pub operation_timeout: Duration,
    /// Bounds on version-conflict retries of optimistic score updates.
    pub score_update_retry: RetryPolicy,
}

impl AppConfig {
    /// Load the configuration file (if any) and apply environment overrides on top.
    pub fn load() -> Self {
        let raw = read_config_file().unwrap_or_default();
        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge a parsed configuration file with overrides looked up through `lookup_env`.
    fn from_sources(raw: RawConfig, lookup_env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup_env("PORT")
            .or_else(|| lookup_env("SERVER_PORT"))
            .and_then(|value| value.parse::<u16>().ok())
            .or(raw.port)
            .unwrap_or(defaults.port);

        let backend = match lookup_env(BACKEND_ENV) {
            Some(value) => value.parse().unwrap_or_else(|err| {
                warn!(error = %err, "ignoring STORE_BACKEND override; using configured backend");
                raw.backend.unwrap_or(defaults.backend)
            }),
            None => raw.backend.unwrap_or(defaults.backend),
        };

        let operation_timeout = raw
            .operation_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.operation_timeout);

        let score_update_retry = raw
            .score_update_retry
            .map(|retry| retry.into_policy(defaults.score_update_retry))
            .unwrap_or(defaults.score_update_retry);

        Self {
            port,
            backend,
            operation_timeout,
            score_update_retry,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend: StoreBackend::default(),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            score_update_retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    backend: Option<StoreBackend>,
    operation_timeout_ms: Option<u64>,
    score_update_retry: Option<RawRetry>,
}

#[derive(Debug, Deserialize)]
struct RawRetry {
    max_attempts: Option<u32>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
}

impl RawRetry {
    fn into_policy(self, defaults: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: self
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: self
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
        }
    }
}

/// Read and parse the configuration file, logging why it was skipped otherwise.
fn read_config_file() -> Option<RawConfig> {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                Some(raw)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            None
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let config = AppConfig::from_sources(RawConfig::default(), env_of(&[]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn file_values_are_applied() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "port": 9000,
                "backend": "memory",
                "operation_timeout_ms": 250,
                "score_update_retry": { "max_attempts": 3, "max_backoff_ms": 50 }
            }"#,
        )
        .unwrap();

        let config = AppConfig::from_sources(raw, env_of(&[]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
        assert_eq!(config.score_update_retry.max_attempts, 3);
        assert_eq!(
            config.score_update_retry.initial_backoff,
            RetryPolicy::default().initial_backoff
        );
        assert_eq!(
            config.score_update_retry.max_backoff,
            Duration::from_millis(50)
        );
    }

    #[test]
    fn environment_overrides_file() {
        let raw: RawConfig = serde_json::from_str(r#"{ "port": 9000 }"#).unwrap();
        let config = AppConfig::from_sources(
            raw,
            env_of(&[("SERVER_PORT", "7000"), ("STORE_BACKEND", "memory")]),
        );
        assert_eq!(config.port, 7000);
        assert_eq!(config.backend, StoreBackend::Memory);
    }

    #[test]
    fn invalid_backend_override_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{ "backend": "memory" }"#).unwrap();
        let config = AppConfig::from_sources(raw, env_of(&[("STORE_BACKEND", "redis")]));
        assert_eq!(config.backend, StoreBackend::Memory);
    }

    #[test]
    fn zero_attempts_are_clamped() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "score_update_retry": { "max_attempts": 0 } }"#).unwrap();
        let config = AppConfig::from_sources(raw, env_of(&[]));
        assert_eq!(config.score_update_retry.max_attempts, 1);
    }
}
