//! Startup configuration
//!
//! Everything is read from the process environment, after loading a `.env`
//! file when one is present. Only `OPENAI_API_KEY` is required.

use secrecy::SecretString;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::conversation::DEFAULT_MAX_SESSIONS;
use crate::llm::openai::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::llm::{GenerationConfig, OpenAiConfig};
use crate::relay::Persona;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required configuration missing: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub bind: SocketAddr,
    pub persona: Persona,
    pub system_prompt: String,
    pub clean_output: bool,
    pub history_limit: Option<usize>,
    pub max_sessions: usize,
    pub generation: GenerationConfig,
    pub timeout: Duration,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;

        let persona = match get("MENTORBOT_PERSONA") {
            Some(raw) => parse_var("MENTORBOT_PERSONA", raw)?,
            None => Persona::default(),
        };

        let system_prompt = get("MENTORBOT_SYSTEM_PROMPT")
            .unwrap_or_else(|| persona.system_prompt().to_string());

        let clean_output = match get("MENTORBOT_CLEAN_OUTPUT") {
            Some(raw) => parse_flag("MENTORBOT_CLEAN_OUTPUT", raw)?,
            None => persona.cleans_output(),
        };

        let bind = parse_var(
            "MENTORBOT_BIND",
            get("MENTORBOT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        )?;

        let history_limit = get("MENTORBOT_HISTORY_LIMIT")
            .map(|raw| parse_var::<usize>("MENTORBOT_HISTORY_LIMIT", raw))
            .transpose()?;
        if history_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                var: "MENTORBOT_HISTORY_LIMIT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let max_sessions = match get("MENTORBOT_MAX_SESSIONS") {
            Some(raw) => parse_var::<usize>("MENTORBOT_MAX_SESSIONS", raw)?,
            None => DEFAULT_MAX_SESSIONS,
        };
        if max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                var: "MENTORBOT_MAX_SESSIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut generation = GenerationConfig::new();
        if let Some(raw) = get("MENTORBOT_MAX_TOKENS") {
            generation = generation.with_max_tokens(parse_var("MENTORBOT_MAX_TOKENS", raw)?);
        }
        if let Some(raw) = get("MENTORBOT_TEMPERATURE") {
            let temperature: f32 = parse_var("MENTORBOT_TEMPERATURE", raw.clone())?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    var: "MENTORBOT_TEMPERATURE",
                    value: raw,
                    reason: "must be between 0 and 2".to_string(),
                });
            }
            generation = generation.with_temperature(temperature);
        }
        if let Some(raw) = get("MENTORBOT_TOP_P") {
            let top_p: f32 = parse_var("MENTORBOT_TOP_P", raw.clone())?;
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::InvalidValue {
                    var: "MENTORBOT_TOP_P",
                    value: raw,
                    reason: "must be between 0 and 1".to_string(),
                });
            }
            generation = generation.with_top_p(top_p);
        }
        if let Some(raw) = get("MENTORBOT_STOP") {
            // Comma separated
            let stop: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !stop.is_empty() {
                generation = generation.with_stop_sequences(stop);
            }
        }

        let timeout = match get("MENTORBOT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("MENTORBOT_TIMEOUT_SECS", raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key: SecretString::new(api_key),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("MENTORBOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind,
            persona,
            system_prompt,
            clean_output,
            history_limit,
            max_sessions,
            generation,
            timeout,
        })
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone())
            .with_timeout(self.timeout)
    }
}

fn parse_var<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
        value: raw,
    })
}

fn parse_flag(var: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "expected true/false, 1/0 or yes/no".to_string(),
        }),
    }
}
