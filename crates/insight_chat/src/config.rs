//! Backend connection settings.
//!
//! Resolved in order: defaults, `.insight/settings.json` under the working
//! root, then `INSIGHT_API_URL` / `INSIGHT_TIMEOUT_SECS`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{InsightError, InsightResult};

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_API_URL: &str = "INSIGHT_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "INSIGHT_TIMEOUT_SECS";

/// Connection settings for [`DocumentClient`](crate::client::DocumentClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Keep cookies between requests
    pub with_credentials: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            with_credentials: true,
        }
    }
}

/// On-disk settings; every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub with_credentials: Option<bool>,
}

impl ClientConfig {
    /// Resolve settings file and environment on top of the defaults
    pub fn load(workspace_root: impl AsRef<Path>) -> InsightResult<Self> {
        Self::load_with(workspace_root, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load), reading variables through `lookup`
    pub fn load_with<F>(workspace_root: impl AsRef<Path>, lookup: F) -> InsightResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default()
            .merge_settings_file(workspace_root)?
            .merge_env_with(lookup)
    }

    /// Set and validate the base URL
    pub fn with_base_url(mut self, base_url: &str) -> InsightResult<Self> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Apply `.insight/settings.json` if it exists
    pub fn merge_settings_file(self, workspace_root: impl AsRef<Path>) -> InsightResult<Self> {
        let settings_path = workspace_root.as_ref().join(".insight").join("settings.json");
        if !settings_path.exists() {
            return Ok(self);
        }

        let content = std::fs::read_to_string(&settings_path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            InsightError::Config(format!("Invalid {}: {}", settings_path.display(), e))
        })?;

        tracing::debug!(path = %settings_path.display(), "Loaded settings");
        self.merge_settings(settings)
    }

    pub fn merge_settings(mut self, settings: Settings) -> InsightResult<Self> {
        if let Some(url) = settings.api_url {
            self = self.with_base_url(&url)?;
        }
        if let Some(timeout) = settings.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(with_credentials) = settings.with_credentials {
            self.with_credentials = with_credentials;
        }
        Ok(self)
    }

    /// Apply environment overrides
    pub fn merge_env(self) -> InsightResult<Self> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` instead of the process environment
    pub fn merge_env_with<F>(mut self, lookup: F) -> InsightResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self = self.with_base_url(&url)?;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.is_empty()) {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                InsightError::Config(format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))
            })?;
        }

        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> InsightResult<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| InsightError::Config(format!("Invalid API URL '{}': {}", raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(InsightError::Config(format!(
            "API URL must be http or https: {}",
            raw
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.with_credentials);
    }

    #[test]
    fn test_base_url_normalized() {
        let config = ClientConfig::default()
            .with_base_url("https://insight.example.com/api/")
            .unwrap();
        assert_eq!(config.base_url, "https://insight.example.com/api");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(ClientConfig::default().with_base_url("not a url").is_err());
        assert!(ClientConfig::default().with_base_url("ftp://host").is_err());
    }

    #[test]
    fn test_settings_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".insight");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("settings.json"),
            r#"{"apiUrl": "http://10.0.0.5:8080", "timeoutSecs": 5, "withCredentials": false}"#,
        )
        .unwrap();

        let config = ClientConfig::default().merge_settings_file(temp.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.with_credentials);
    }

    #[test]
    fn test_missing_settings_file_keeps_defaults() {
        let temp = tempdir().unwrap();
        let config = ClientConfig::default().merge_settings_file(temp.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    fn write_settings(root: &Path, json: &str) {
        let dir = root.join(".insight");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.json"), json).unwrap();
    }

    fn env_of(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_env_overrides_settings() {
        let temp = tempdir().unwrap();
        write_settings(
            temp.path(),
            r#"{"apiUrl": "http://settings-host:8080", "timeoutSecs": 5, "withCredentials": false}"#,
        );

        let config = ClientConfig::load_with(
            temp.path(),
            env_of(&[(ENV_API_URL, "http://envhost:1234/"), (ENV_TIMEOUT_SECS, "7")]),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://envhost:1234");
        assert_eq!(config.timeout_secs, 7);
        // not settable from the environment
        assert!(!config.with_credentials);
    }

    #[test]
    fn test_load_without_overrides() {
        let temp = tempdir().unwrap();
        write_settings(temp.path(), r#"{"timeoutSecs": 12}"#);

        let config = ClientConfig::load_with(temp.path(), env_of(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 12);

        let empty = ClientConfig::load_with(temp.path(), env_of(&[(ENV_API_URL, "")])).unwrap();
        assert_eq!(empty.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_bad_env_timeout_is_config_error() {
        let err = ClientConfig::default()
            .merge_env_with(env_of(&[(ENV_TIMEOUT_SECS, "abc")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));

        let err = ClientConfig::default()
            .merge_env_with(env_of(&[(ENV_API_URL, "ftp://envhost")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }

    #[test]
    fn test_malformed_settings_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(".insight");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.json"), "{ nope").unwrap();

        let err = ClientConfig::default().merge_settings_file(temp.path()).unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }
}
