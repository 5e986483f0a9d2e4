//! Default LLM configs loaded strictly from environment variables.
//!
//! Two profiles are produced: **chat** (role-play, jokes, retrieval-augmented
//! test logs, weather summaries) and **embedding** (index building and query
//! embedding). The provider is chosen with `LLM_KIND`.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = `azure` (default) | `openai` | `ollama`
//! - `LLM_TEMPERATURE` = chat temperature (f32, default `1.5`, range `0..=2`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional whole-request timeout for chat calls (u64)
//!
//! Azure OpenAI:
//! - `AZURE_OPENAI_ENDPOINT` or `AZURE_OPENAI_API_INSTANCE_NAME` (mandatory)
//! - `AZURE_OPENAI_API_VERSION` (mandatory)
//! - `AZURE_OPENAI_API_KEY` (mandatory)
//! - `AZURE_OPENAI_API_DEPLOYMENT_NAME` (mandatory)
//! - `AZURE_OPENAI_API_EMBEDDINGS_DEPLOYMENT_NAME` or
//!   `AZURE_EMBEDDING_DEPLOYMENT_NAME` (mandatory)
//!
//! OpenAI:
//! - `OPENAI_API_KEY`, `OPENAI_MODEL` (mandatory)
//! - `OPENAI_EMBEDDING_MODEL` (default `text-embedding-3-small`)
//! - `OPENAI_BASE_URL` (default `https://api.openai.com`)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` (mandatory)
//! - `OLLAMA_MODEL`, `EMBEDDING_MODEL` (mandatory)

use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, EnvLookup, opt_f32, opt_u32, opt_u64, must_var, std_env,
        validate_http_endpoint, validate_range_f32,
    },
};

/// Default chat temperature; the relay's personas are meant to be lively.
pub const DEFAULT_CHAT_TEMPERATURE: f32 = 1.5;

/// Embedding calls are short; keep them bounded.
const EMBEDDING_TIMEOUT_SECS: u64 = 30;

/// Chat + embedding profiles resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfigs {
    pub chat: LlmModelConfig,
    pub embedding: LlmModelConfig,
}

/// Resolves both profiles from the process environment.
///
/// # Errors
/// [`AiLlmError::Config`] if a mandatory variable is missing or a value is
/// malformed.
pub fn profiles_from_env() -> Result<ProfileConfigs, AiLlmError> {
    profiles_from_lookup(&std_env)
}

/// Same as [`profiles_from_env`] but reads variables through `env`.
pub fn profiles_from_lookup(env: EnvLookup<'_>) -> Result<ProfileConfigs, AiLlmError> {
    let provider = match env("LLM_KIND") {
        Some(kind) if !kind.trim().is_empty() => kind.parse::<LlmProvider>()?,
        _ => LlmProvider::AzureOpenAI,
    };

    let profiles = match provider {
        LlmProvider::AzureOpenAI => azure_profiles(env)?,
        LlmProvider::OpenAI => openai_profiles(env)?,
        LlmProvider::Ollama => ollama_profiles(env)?,
    };

    validate_http_endpoint("endpoint", &profiles.chat.endpoint)?;
    if let Some(t) = profiles.chat.temperature {
        validate_range_f32("LLM_TEMPERATURE", t, 0.0, 2.0)?;
    }

    info!(
        provider = %provider,
        chat_model = %profiles.chat.model,
        embedding_model = %profiles.embedding.model,
        endpoint = %profiles.chat.endpoint,
        "LLM profiles resolved from environment"
    );

    Ok(profiles)
}

/// Chat knobs shared by every provider.
struct ChatKnobs {
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

fn chat_knobs(env: EnvLookup<'_>) -> Result<ChatKnobs, AiLlmError> {
    Ok(ChatKnobs {
        temperature: Some(opt_f32(env, "LLM_TEMPERATURE")?.unwrap_or(DEFAULT_CHAT_TEMPERATURE)),
        max_tokens: opt_u32(env, "LLM_MAX_TOKENS")?,
        timeout_secs: opt_u64(env, "LLM_TIMEOUT_SECS")?,
    })
}

fn non_empty(env: EnvLookup<'_>, name: &str) -> Option<String> {
    env(name).filter(|v| !v.trim().is_empty())
}

/// Resolves the Azure resource endpoint.
///
/// Precedence:
/// 1. `AZURE_OPENAI_ENDPOINT` if present and non-empty
/// 2. `AZURE_OPENAI_API_INSTANCE_NAME` → `https://{instance}.openai.azure.com`
fn azure_endpoint(env: EnvLookup<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = non_empty(env, "AZURE_OPENAI_ENDPOINT") {
        return Ok(url.trim().trim_end_matches('/').to_string());
    }
    if let Some(instance) = non_empty(env, "AZURE_OPENAI_API_INSTANCE_NAME") {
        return Ok(format!("https://{}.openai.azure.com", instance.trim()));
    }
    Err(ConfigError::MissingVar("AZURE_OPENAI_ENDPOINT or AZURE_OPENAI_API_INSTANCE_NAME").into())
}

fn azure_profiles(env: EnvLookup<'_>) -> Result<ProfileConfigs, AiLlmError> {
    let endpoint = azure_endpoint(env)?;
    let api_version = must_var(env, "AZURE_OPENAI_API_VERSION")?;
    let api_key = must_var(env, "AZURE_OPENAI_API_KEY")?;
    let deployment = must_var(env, "AZURE_OPENAI_API_DEPLOYMENT_NAME")?;
    let embedding_deployment = non_empty(env, "AZURE_OPENAI_API_EMBEDDINGS_DEPLOYMENT_NAME")
        .or_else(|| non_empty(env, "AZURE_EMBEDDING_DEPLOYMENT_NAME"))
        .ok_or(ConfigError::MissingVar(
            "AZURE_OPENAI_API_EMBEDDINGS_DEPLOYMENT_NAME or AZURE_EMBEDDING_DEPLOYMENT_NAME",
        ))?;
    let knobs = chat_knobs(env)?;

    Ok(ProfileConfigs {
        chat: LlmModelConfig {
            provider: LlmProvider::AzureOpenAI,
            model: deployment,
            endpoint: endpoint.clone(),
            api_key: Some(api_key.clone()),
            api_version: Some(api_version.clone()),
            max_tokens: knobs.max_tokens,
            temperature: knobs.temperature,
            top_p: None,
            timeout_secs: knobs.timeout_secs,
        },
        embedding: LlmModelConfig {
            provider: LlmProvider::AzureOpenAI,
            model: embedding_deployment,
            endpoint,
            api_key: Some(api_key),
            api_version: Some(api_version),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(EMBEDDING_TIMEOUT_SECS),
        },
    })
}

fn openai_profiles(env: EnvLookup<'_>) -> Result<ProfileConfigs, AiLlmError> {
    let endpoint = non_empty(env, "OPENAI_BASE_URL")
        .unwrap_or_else(|| "https://api.openai.com".to_string());
    let api_key = must_var(env, "OPENAI_API_KEY")?;
    let model = must_var(env, "OPENAI_MODEL")?;
    let embedding_model = non_empty(env, "OPENAI_EMBEDDING_MODEL")
        .unwrap_or_else(|| "text-embedding-3-small".to_string());
    let knobs = chat_knobs(env)?;

    Ok(ProfileConfigs {
        chat: LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model,
            endpoint: endpoint.clone(),
            api_key: Some(api_key.clone()),
            api_version: None,
            max_tokens: knobs.max_tokens,
            temperature: knobs.temperature,
            top_p: None,
            timeout_secs: knobs.timeout_secs,
        },
        embedding: LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: embedding_model,
            endpoint,
            api_key: Some(api_key),
            api_version: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(EMBEDDING_TIMEOUT_SECS),
        },
    })
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint(env: EnvLookup<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = non_empty(env, "OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = non_empty(env, "OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

fn ollama_profiles(env: EnvLookup<'_>) -> Result<ProfileConfigs, AiLlmError> {
    let endpoint = ollama_endpoint(env)?;
    let model = must_var(env, "OLLAMA_MODEL")?;
    let embedding_model = must_var(env, "EMBEDDING_MODEL")?;
    let knobs = chat_knobs(env)?;

    Ok(ProfileConfigs {
        chat: LlmModelConfig {
            provider: LlmProvider::Ollama,
            model,
            endpoint: endpoint.clone(),
            api_key: None,
            api_version: None,
            max_tokens: knobs.max_tokens,
            temperature: knobs.temperature,
            top_p: None,
            timeout_secs: knobs.timeout_secs,
        },
        embedding: LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: embedding_model,
            endpoint,
            api_key: None,
            api_version: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(EMBEDDING_TIMEOUT_SECS),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn azure_is_default_and_builds_instance_url() {
        let env = lookup(&[
            ("AZURE_OPENAI_API_INSTANCE_NAME", "contoso"),
            ("AZURE_OPENAI_API_VERSION", "2024-02-01"),
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_EMBEDDING_DEPLOYMENT_NAME", "ada"),
        ]);
        let p = profiles_from_lookup(&env).unwrap();
        assert_eq!(p.chat.provider, LlmProvider::AzureOpenAI);
        assert_eq!(p.chat.endpoint, "https://contoso.openai.azure.com");
        assert_eq!(p.chat.model, "gpt-4o");
        assert_eq!(p.chat.temperature, Some(DEFAULT_CHAT_TEMPERATURE));
        assert_eq!(p.embedding.model, "ada");
        assert_eq!(p.embedding.api_version.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn azure_missing_key_fails() {
        let env = lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://x.openai.azure.com/"),
            ("AZURE_OPENAI_API_VERSION", "2024-02-01"),
            ("AZURE_OPENAI_API_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_EMBEDDING_DEPLOYMENT_NAME", "ada"),
        ]);
        let err = profiles_from_lookup(&env).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("AZURE_OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn ollama_port_fallback_and_bad_temperature() {
        let env = lookup(&[
            ("LLM_KIND", "ollama"),
            ("OLLAMA_PORT", "11434"),
            ("OLLAMA_MODEL", "llama3"),
            ("EMBEDDING_MODEL", "bge-m3"),
        ]);
        let p = profiles_from_lookup(&env).unwrap();
        assert_eq!(p.chat.endpoint, "http://localhost:11434");
        assert_eq!(p.embedding.model, "bge-m3");

        let env = lookup(&[
            ("LLM_KIND", "ollama"),
            ("OLLAMA_URL", "http://gpu:11434"),
            ("OLLAMA_MODEL", "llama3"),
            ("EMBEDDING_MODEL", "bge-m3"),
            ("LLM_TEMPERATURE", "7"),
        ]);
        assert!(matches!(
            profiles_from_lookup(&env),
            Err(AiLlmError::Config(ConfigError::OutOfRange { .. }))
        ));
    }
}
