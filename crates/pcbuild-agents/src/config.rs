//! Chat-completion endpoint configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables (`LLM_PROVIDER`, `OPENAI_MODEL`, ...)
//! 2. Built-in defaults (OpenAI `gpt-4o-mini`, Ollama `llama3.1:8b` on localhost)
//!
//! Both providers are reached through the OpenAI-compatible
//! `/chat/completions` route; Ollama serves it under `/v1`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
/// Ollama accepts any non-empty key.
const OLLAMA_API_KEY: &str = "ollama";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ENV_LLM_PROVIDER: &str = "LLM_PROVIDER";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_LLM_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum LlmConfigError {
    #[error("unknown LLM provider '{0}' (use 'openai' or 'ollama')")]
    UnknownProvider(String),

    #[error("OpenAI API key not found; set OPENAI_API_KEY")]
    MissingApiKey,

    #[error("environment variable {var}={value:?} is not valid")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn parse(raw: &str) -> Result<Self, LlmConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(LlmConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// OpenAI honours `response_format: json_object`; Ollama's compat layer
    /// is not relied on for it.
    pub fn supports_json_mode(self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// One resolved endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Base URL ending in `/v1`; `/chat/completions` is appended per request.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, LlmConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve from an arbitrary variable source so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let provider = match lookup(ENV_LLM_PROVIDER) {
            Some(raw) => LlmProvider::parse(&raw)?,
            None => LlmProvider::OpenAi,
        };

        let timeout_secs = match lookup(ENV_LLM_TIMEOUT_SECS) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(LlmConfigError::InvalidEnv {
                        var: ENV_LLM_TIMEOUT_SECS,
                        value: raw,
                    })
                }
            },
        };

        let config = match provider {
            LlmProvider::OpenAi => {
                let api_key = lookup(ENV_OPENAI_API_KEY)
                    .filter(|key| !key.trim().is_empty())
                    .ok_or(LlmConfigError::MissingApiKey)?;
                Self {
                    provider,
                    base_url: lookup(ENV_OPENAI_BASE_URL)
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    api_key,
                    model: lookup(ENV_OPENAI_MODEL)
                        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                    timeout_secs,
                }
            }
            LlmProvider::Ollama => {
                let root = lookup(ENV_OLLAMA_BASE_URL)
                    .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string());
                Self {
                    provider,
                    base_url: format!("{}/v1", root.trim_end_matches('/')),
                    api_key: OLLAMA_API_KEY.to_string(),
                    model: lookup(ENV_OLLAMA_MODEL)
                        .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                    timeout_secs,
                }
            }
        };
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_openai_defaults() {
        let config = LlmConfig::from_lookup(lookup(&[(ENV_OPENAI_API_KEY, "sk-test")])).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert_eq!(config.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.provider.supports_json_mode());
    }

    #[test]
    fn test_openai_requires_key() {
        let err = LlmConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, LlmConfigError::MissingApiKey));

        let err = LlmConfig::from_lookup(lookup(&[(ENV_OPENAI_API_KEY, "  ")])).unwrap_err();
        assert!(matches!(err, LlmConfigError::MissingApiKey));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig::from_lookup(lookup(&[
            (ENV_LLM_PROVIDER, "Ollama"),
            (ENV_OLLAMA_BASE_URL, "http://gpu-box:11434/"),
            (ENV_OLLAMA_MODEL, "qwen2.5:14b"),
            (ENV_LLM_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.base_url, "http://gpu-box:11434/v1");
        assert_eq!(config.model, "qwen2.5:14b");
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.provider.supports_json_mode());
    }

    #[test]
    fn test_rejects_unknown_provider_and_bad_timeout() {
        let err = LlmConfig::from_lookup(lookup(&[(ENV_LLM_PROVIDER, "bard")])).unwrap_err();
        assert!(err.to_string().contains("bard"));

        let err = LlmConfig::from_lookup(lookup(&[
            (ENV_LLM_PROVIDER, "ollama"),
            (ENV_LLM_TIMEOUT_SECS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, LlmConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = LlmConfig::from_lookup(lookup(&[(ENV_OPENAI_API_KEY, "sk-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
