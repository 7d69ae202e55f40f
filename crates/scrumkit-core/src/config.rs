//! Backend configuration.
//!
//! Every key is required. Values come from the environment (after loading a
//! `.env` file when present) and may be layered over an optional TOML file.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

pub const ENV_API_KEY: &str = "SCRUMKIT_API_KEY";
pub const ENV_AUTH_DOMAIN: &str = "SCRUMKIT_AUTH_DOMAIN";
pub const ENV_PROJECT_ID: &str = "SCRUMKIT_PROJECT_ID";
pub const ENV_STORAGE_BUCKET: &str = "SCRUMKIT_STORAGE_BUCKET";
pub const ENV_MESSAGING_SENDER_ID: &str = "SCRUMKIT_MESSAGING_SENDER_ID";
pub const ENV_APP_ID: &str = "SCRUMKIT_APP_ID";
pub const ENV_REDIS_URL: &str = "REDIS_URL";

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Required keys, in reporting order.
pub const REQUIRED_KEYS: [&str; 6] = [
    ENV_API_KEY,
    ENV_AUTH_DOMAIN,
    ENV_PROJECT_ID,
    ENV_STORAGE_BUCKET,
    ENV_MESSAGING_SENDER_ID,
    ENV_APP_ID,
];

/// Credentials and endpoints of the hosted backend.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub redis_url: String,
}

/// On-disk form; every field optional so the environment can fill gaps.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    auth_domain: Option<String>,
    project_id: Option<String>,
    storage_bucket: Option<String>,
    messaging_sender_id: Option<String>,
    app_id: Option<String>,
    redis_url: Option<String>,
}

impl FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            ENV_API_KEY => self.api_key.clone(),
            ENV_AUTH_DOMAIN => self.auth_domain.clone(),
            ENV_PROJECT_ID => self.project_id.clone(),
            ENV_STORAGE_BUCKET => self.storage_bucket.clone(),
            ENV_MESSAGING_SENDER_ID => self.messaging_sender_id.clone(),
            ENV_APP_ID => self.app_id.clone(),
            ENV_REDIS_URL => self.redis_url.clone(),
            _ => None,
        }
    }
}

/// Where configuration values come from: the process environment, then an
/// optional TOML file underneath it.
#[derive(Debug, Default)]
pub struct ConfigSource {
    file: Option<FileConfig>,
}

impl ConfigSource {
    /// Read `.env` if present and parse `path` when given.
    pub fn new(path: Option<&Path>) -> CoreResult<Self> {
        dotenvy::dotenv().ok();
        let file = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: FileConfig = toml::from_str(&raw)
                    .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
                Some(parsed)
            }
            None => None,
        };
        Ok(Self { file })
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.file.as_ref().and_then(|f| f.get(key)))
    }

    pub fn load(&self) -> CoreResult<BackendConfig> {
        BackendConfig::from_lookup(|key| self.lookup(key))
    }
}

impl BackendConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> CoreResult<Self> {
        ConfigSource::new(None)?.load()
    }

    /// Load from the environment layered over a TOML file.
    pub fn from_file_and_env(path: &Path) -> CoreResult<Self> {
        ConfigSource::new(Some(path))?.load()
    }

    /// Build from an arbitrary key lookup. Blank values count as missing.
    ///
    /// Reports every missing key at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|key| read(**key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::MissingConfig(missing));
        }

        let required = |key: &str| read(key).unwrap_or_default();
        Ok(Self {
            api_key: required(ENV_API_KEY),
            auth_domain: required(ENV_AUTH_DOMAIN),
            project_id: required(ENV_PROJECT_ID),
            storage_bucket: required(ENV_STORAGE_BUCKET),
            messaging_sender_id: required(ENV_MESSAGING_SENDER_ID),
            app_id: required(ENV_APP_ID),
            redis_url: read(ENV_REDIS_URL).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
        })
    }

    /// Key prefix isolating this backend project's documents.
    pub fn store_namespace(&self) -> &str {
        &self.project_id
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &"<redacted>")
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("redis_url", &self.redis_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        REQUIRED_KEYS
            .iter()
            .map(|k| (*k, format!("value-of-{}", k)))
            .collect()
    }

    #[test]
    fn test_complete_config_loads() {
        let env = full_env();
        let config = BackendConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.project_id, "value-of-SCRUMKIT_PROJECT_ID");
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.store_namespace(), config.project_id);
    }

    #[test]
    fn test_missing_and_blank_keys_reported_together() {
        let mut env = full_env();
        env.remove(ENV_API_KEY);
        env.insert(ENV_APP_ID, "   ".to_string());
        let err = BackendConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        match err {
            CoreError::MissingConfig(keys) => {
                assert_eq!(keys, vec![ENV_API_KEY.to_string(), ENV_APP_ID.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let env = full_env();
        let config = BackendConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        let shown = format!("{:?}", config);
        assert!(!shown.contains("value-of-SCRUMKIT_API_KEY"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_file_config_parses() {
        let file: FileConfig = toml::from_str(
            r#"
            project_id = "demo"
            redis_url = "redis://cache:6379"
            "#,
        )
        .unwrap();
        assert_eq!(file.get(ENV_PROJECT_ID).as_deref(), Some("demo"));
        assert_eq!(file.get(ENV_REDIS_URL).as_deref(), Some("redis://cache:6379"));
        assert_eq!(file.get(ENV_API_KEY), None);
    }

    #[test]
    fn test_source_reads_file_under_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrumkit.toml");
        std::fs::write(
            &path,
            r#"
            api_key = "k"
            auth_domain = "demo.example.com"
            project_id = "from-file"
            storage_bucket = "bucket"
            messaging_sender_id = "42"
            app_id = "app"
            "#,
        )
        .unwrap();
        let source = ConfigSource::new(Some(&path)).unwrap();
        assert!(source.lookup(ENV_AUTH_DOMAIN).is_some());
        assert!(source.load().is_ok());
    }

    #[test]
    fn test_source_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "project_id = ").unwrap();
        assert!(matches!(ConfigSource::new(Some(&path)), Err(CoreError::Config(_))));
    }
}
