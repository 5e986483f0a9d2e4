//! Health probes for LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth (best-effort model existence check)
//! - Azure OpenAI: `GET {endpoint}/openai/models?api-version=..` with `api-key`
//!   (reachability + auth only; deployment names are not listed there)
//!
//! [`HealthService::check`] never fails: errors map to `ok=false`. The
//! provider-specific probes (`try_*`) return strict `Result`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single profile.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "AzureOpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model or deployment name the profile uses.
    pub model: Option<String>,
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker that reuses a single HTTP client.
#[derive(Debug)]
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional probe timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(timeout_secs = timeout.as_secs(), "HealthService initialized");

        Ok(Self { client })
    }

    /// Checks one profile, routing to the provider-specific probe.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            warn!(
                provider = %cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.try_probe_openai(cfg).await,
            LlmProvider::AzureOpenAI => self.try_probe_azure(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks several profiles sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// `GET {endpoint}/api/tags`, then look for `cfg.model` among the tags.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        let (resp, latency) = self.get_checked(cfg, &url, None).await?;

        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        Ok(match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                // `llama3` is reported as `llama3:latest`
                let exists = models.iter().any(|m| {
                    m.name == cfg.model || m.name.strip_suffix(":latest") == Some(cfg.model.as_str())
                });
                if exists {
                    HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available")
                } else {
                    HealthStatus::new(
                        cfg,
                        false,
                        latency,
                        "Ollama is up, but model not found in /api/tags",
                    )
                }
            }
            Ok(Tags { models: None }) => HealthStatus::new(
                cfg,
                true,
                latency,
                "Ollama is healthy; tags response without `models` field",
            ),
            Err(e) => {
                warn!(error = %e, "failed to decode /api/tags; treating server as reachable");
                HealthStatus::new(
                    cfg,
                    true,
                    latency,
                    format!("Ollama is reachable; failed to decode /api/tags: {e}"),
                )
            }
        })
    }

    /// `GET {endpoint}/v1/models` with Bearer auth, then look for `cfg.model`.
    async fn try_probe_openai(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/v1/models", cfg.endpoint.trim_end_matches('/'));
        let api_key = cfg
            .api_key
            .as_ref()
            .ok_or_else(|| HealthError::Decode("missing OpenAI API key".into()))?;
        let auth = (header::AUTHORIZATION, format!("Bearer {api_key}"));
        let (resp, latency) = self.get_checked(cfg, &url, Some(auth)).await?;

        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        Ok(match resp.json::<Models>().await {
            Ok(models) if models.data.iter().any(|m| m.id == cfg.model) => {
                HealthStatus::new(cfg, true, latency, "OpenAI is healthy; model is available")
            }
            Ok(_) => HealthStatus::new(
                cfg,
                false,
                latency,
                "OpenAI is up, but model not found in /v1/models",
            ),
            Err(e) => HealthStatus::new(
                cfg,
                true,
                latency,
                format!("OpenAI is reachable; failed to decode /v1/models: {e}"),
            ),
        })
    }

    /// `GET {endpoint}/openai/models?api-version=..` with the `api-key` header.
    async fn try_probe_azure(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let version = cfg
            .api_version
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing Azure api-version".into()))?;
        let api_key = cfg
            .api_key
            .as_ref()
            .ok_or_else(|| HealthError::Decode("missing Azure API key".into()))?;
        let url = format!(
            "{}/openai/models?api-version={version}",
            cfg.endpoint.trim_end_matches('/')
        );
        let auth = (header::HeaderName::from_static("api-key"), api_key.clone());
        let (_resp, latency) = self.get_checked(cfg, &url, Some(auth)).await?;

        Ok(HealthStatus::new(
            cfg,
            true,
            latency,
            "Azure OpenAI is reachable; credentials accepted",
        ))
    }

    /// Sends a GET and maps non-2xx answers to [`HealthError::HttpStatus`].
    async fn get_checked(
        &self,
        cfg: &LlmModelConfig,
        url: &str,
        auth: Option<(header::HeaderName, String)>,
    ) -> Result<(reqwest::Response, u128), AiLlmError> {
        let mut req = self.client.get(url);
        if let Some((name, value)) = auth {
            let mut value = header::HeaderValue::from_str(&value)
                .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
            value.set_sensitive(true);
            req = req.header(name, value);
        }

        let start = Instant::now();
        debug!(provider = %cfg.provider, model = %cfg.model, "GET {}", url);
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if resp.status().is_success() {
            return Ok((resp, latency));
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        error!(
            provider = %cfg.provider,
            %url,
            %status,
            %snippet,
            latency_ms = latency,
            "health probe returned non-success status"
        );

        Err(HealthError::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        })
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_endpoint_reports_not_ok_without_network() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3".into(),
            endpoint: "localhost".into(),
            api_key: None,
            api_version: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.provider, "Ollama");
        assert_eq!(status.latency_ms, 0);
    }
}
