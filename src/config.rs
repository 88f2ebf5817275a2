//! Configuration management for the library client

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend API, e.g. `http://localhost:8000/api`
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the last successfully authenticated identity
    pub hint_path: PathBuf,
}

/// What an identity matching no rule resolves to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// No roles at all
    FailClosed,
    /// `System Manager`, the legacy fail-open behaviour
    SystemManager,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RolesConfig {
    pub admin_identity: String,
    pub librarian_markers: Vec<String>,
    pub member_markers: Vec<String>,
    pub unmatched_policy: UnmatchedPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Optional base file, then the environment-specific one
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables, e.g. LIBRARY_API__BASE_URL
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("api.api_key", env::var("LIBRARY_API_KEY").ok())?
            .set_override_option("api.api_secret", env::var("LIBRARY_API_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl ApiConfig {
    /// Value for the `Authorization: token` header when both halves are set
    pub fn token(&self) -> Option<String> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(format!("{}:{}", key, secret))
            }
            _ => None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            api_key: None,
            api_secret: None,
            timeout_seconds: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hint_path: PathBuf::from(".library-client/last_identity.json"),
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin_identity: "administrator".to_string(),
            librarian_markers: vec!["librarian".to_string(), "testlib".to_string()],
            member_markers: vec!["member".to_string(), "testmem".to_string()],
            unmatched_policy: UnmatchedPolicy::FailClosed,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
