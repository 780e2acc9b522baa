//! truthbot/crates/configs/src/lib.rs
//!
//! Layered settings, lowest precedence first:
//!
//! 1. compiled defaults
//! 2. optional TOML file (`TRUTHBOT_CONFIG`)
//! 3. `TRUTHBOT__SECTION__KEY` environment variables
//! 4. the short names `DATABASE_URL`, `OPENROUTER_API_KEY`, `OPENROUTER_MODEL`, `JWT_SECRET`
//!
//! `.env` is read into the process environment before any of this.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_PATH_VAR: &str = "TRUTHBOT_CONFIG";
const ENV_PREFIX: &str = "TRUTHBOT";
/// One year; keeps `chrono::Duration::minutes` in range.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Short variable names and the keys they override.
const SHORT_OVERRIDES: [(&str, &str); 4] = [
    ("DATABASE_URL", "database.url"),
    ("OPENROUTER_API_KEY", "llm.api_key"),
    ("OPENROUTER_MODEL", "llm.model"),
    ("JWT_SECRET", "auth.jwt_secret"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mount point of the JSON API, e.g. `/api`.
    pub api_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Unset means the in-memory store.
    pub url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub referer: Option<String>,
    pub app_title: Option<String>,
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub llm: LlmSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Reads `.env`, then layers the process environment over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), ".env loaded");
        }
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds settings from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.api_prefix", "/api")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_ttl_minutes", 30)?
            .set_default("llm.base_url", "https://openrouter.ai/api/v1")?
            .set_default("llm.model", "mistralai/mistral-7b-instruct:free")?
            .set_default("llm.timeout_seconds", 30)?
            .set_default("llm.referer", "https://truthbot.local")?
            .set_default("llm.app_title", "TruthBot")?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;

        if let Some(path) = vars.get(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone().into_iter().collect())),
        );

        for (var, key) in SHORT_OVERRIDES {
            let value = vars.get(var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(key, value)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("server.api_prefix must start with '/'".into()));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.auth.token_ttl_minutes) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            )));
        }
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must be set (JWT_SECRET)".into()));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("llm.timeout_seconds must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// `api_prefix` without a trailing slash; empty means the root.
    pub fn api_prefix(&self) -> &str {
        self.server.api_prefix.trim_end_matches('/')
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_ref().map(|u| u.expose_secret()).filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_need_only_a_secret() {
        let s = Settings::from_vars(vars(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.api_prefix(), "/api");
        assert_eq!(s.auth.token_ttl_minutes, 30);
        assert_eq!(s.llm.model, "mistralai/mistral-7b-instruct:free");
        assert_eq!(s.llm.timeout(), Duration::from_secs(30));
        assert!(s.llm.api_key.is_none());
        assert!(s.database_url().is_none());
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Settings::from_vars(HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("jwt_secret")));
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let s = Settings::from_vars(vars(&[
            ("TRUTHBOT__AUTH__JWT_SECRET", "abc"),
            ("TRUTHBOT__SERVER__PORT", "9090"),
            ("TRUTHBOT__LOG__JSON", "true"),
            ("TRUTHBOT__LLM__MODEL", "from-prefixed"),
        ]))
        .unwrap();
        assert_eq!(s.bind_addr(), "0.0.0.0:9090");
        assert!(s.log.json);
        assert_eq!(s.llm.model, "from-prefixed");
    }

    #[test]
    fn short_names_win_over_prefixed() {
        let s = Settings::from_vars(vars(&[
            ("JWT_SECRET", "abc"),
            ("TRUTHBOT__LLM__MODEL", "from-prefixed"),
            ("OPENROUTER_MODEL", "from-short"),
            ("OPENROUTER_API_KEY", "sk-or-1"),
            ("DATABASE_URL", "postgres://u:p@localhost/truthbot"),
        ]))
        .unwrap();
        assert_eq!(s.llm.model, "from-short");
        assert_eq!(s.llm.api_key.as_ref().map(|k| k.expose_secret().to_string()).as_deref(), Some("sk-or-1"));
        assert_eq!(s.database_url(), Some("postgres://u:p@localhost/truthbot"));
    }

    #[test]
    fn blank_short_names_are_ignored() {
        let s = Settings::from_vars(vars(&[("JWT_SECRET", "abc"), ("OPENROUTER_API_KEY", "  ")])).unwrap();
        assert!(s.llm.api_key.is_none());
    }

    #[test]
    fn zero_port_and_ttl_are_invalid() {
        let err = Settings::from_vars(vars(&[("JWT_SECRET", "x"), ("TRUTHBOT__SERVER__PORT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = Settings::from_vars(vars(&[("JWT_SECRET", "x"), ("TRUTHBOT__AUTH__TOKEN_TTL_MINUTES", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_ttl_is_invalid() {
        let huge = i64::MAX.to_string();
        let err = Settings::from_vars(vars(&[("JWT_SECRET", "x"), ("TRUTHBOT__AUTH__TOKEN_TTL_MINUTES", huge.as_str())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let max = MAX_TOKEN_TTL_MINUTES.to_string();
        let s = Settings::from_vars(vars(&[("JWT_SECRET", "x"), ("TRUTHBOT__AUTH__TOKEN_TTL_MINUTES", max.as_str())])).unwrap();
        assert_eq!(s.auth.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES);
    }

    #[test]
    fn toml_file_sits_between_defaults_and_env() {
        let path = std::env::temp_dir().join(format!("truthbot-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nport = 7000\napi_prefix = \"/v1/\"\n\n[auth]\njwt_secret = \"file\"\n")
            .unwrap();
        let path_str = path.to_string_lossy().to_string();

        let s = Settings::from_vars(vars(&[(CONFIG_PATH_VAR, &path_str)])).unwrap();
        assert_eq!(s.server.port, 7000);
        assert_eq!(s.api_prefix(), "/v1");

        let s = Settings::from_vars(vars(&[(CONFIG_PATH_VAR, &path_str), ("TRUTHBOT__SERVER__PORT", "7001")]))
            .unwrap();
        assert_eq!(s.server.port, 7001);
        std::fs::remove_file(path).ok();
    }
}
