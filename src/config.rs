//! Configuration
//!
//! Read once at startup from the environment, after loading `.env` from the
//! working directory and `<config dir>/dilemmai/.env`. Variables already set
//! in the process environment win over both files.
//!
//! | Variable                    | Default                                          |
//! |-----------------------------|--------------------------------------------------|
//! | `DILEMMAI_API_KEY`          | required (falls back to `GROQ_API_KEY`)          |
//! | `DILEMMAI_API_URL`          | `https://api.groq.com/openai/v1/chat/completions`|
//! | `DILEMMAI_MODEL`            | `llama3-70b-8192`                                |
//! | `DILEMMAI_TEMPERATURE`      | `0.7`                                            |
//! | `DILEMMAI_TIMEOUT_SECS`     | `60`                                             |
//! | `DILEMMAI_STRICT_DECISION`  | `false`                                          |

use crate::engine::DecisionStrictness;
use crate::error::ConfigError;
use crate::provider::chat::{DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT};
use crate::provider::ProviderConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY: &str = "DILEMMAI_API_KEY";
pub const LEGACY_API_KEY: &str = "GROQ_API_KEY";
pub const API_URL: &str = "DILEMMAI_API_URL";
pub const MODEL: &str = "DILEMMAI_MODEL";
pub const TEMPERATURE: &str = "DILEMMAI_TEMPERATURE";
pub const TIMEOUT_SECS: &str = "DILEMMAI_TIMEOUT_SECS";
pub const STRICT_DECISION: &str = "DILEMMAI_STRICT_DECISION";

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub strictness: DecisionStrictness,
}

/// `<config dir>/dilemmai/.env`, e.g. `~/.config/dilemmai/.env` on Linux
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dilemmai").join(".env"))
}

/// Load a dotenv file if it exists. Existing variables are not overridden.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "loaded env file");
    Ok(true)
}

impl Config {
    /// Load env files, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_file(Path::new(".env"))?;
        if let Some(path) = user_env_file() {
            load_env_file(&path)?;
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY)
            .or_else(|| get(LEGACY_API_KEY))
            .ok_or(ConfigError::MissingApiKey)?;

        let temperature = match get(TEMPERATURE) {
            Some(raw) => parse_temperature(&raw)?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout = match get(TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let strict = match get(STRICT_DECISION) {
            Some(raw) => parse_flag(STRICT_DECISION, &raw)?,
            None => false,
        };
        let strictness = if strict {
            DecisionStrictness::Strict
        } else {
            DecisionStrictness::Lenient
        };

        let provider = ProviderConfig::new(api_key)
            .with_api_url(get(API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()))
            .with_model(get(MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()))
            .with_temperature(temperature)
            .with_timeout(timeout);

        Ok(Self {
            provider,
            strictness,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_temperature(raw: &str) -> Result<f32, ConfigError> {
    let value: f32 = raw
        .parse()
        .map_err(|_| invalid(TEMPERATURE, raw, "not a number"))?;
    if !value.is_finite() || !(0.0..=2.0).contains(&value) {
        return Err(invalid(TEMPERATURE, raw, "must be between 0.0 and 2.0"));
    }
    Ok(value)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(TIMEOUT_SECS, raw, "must be greater than zero")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(invalid(TIMEOUT_SECS, raw, "not a whole number of seconds")),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected true or false")),
    }
}
