//! OpenAI-compatible chat and embeddings client (OpenAI and Azure OpenAI).
//!
//! Both providers speak the same JSON; only URL layout and auth differ:
//!
//! | provider    | chat URL                                                                 | auth               |
//! |-------------|--------------------------------------------------------------------------|--------------------|
//! | OpenAI      | `{endpoint}/v1/chat/completions`                                         | `Authorization: Bearer` |
//! | AzureOpenAI | `{endpoint}/openai/deployments/{model}/chat/completions?api-version={v}` | `api-key` header   |
//!
//! Embeddings follow the same pattern (`/v1/embeddings` and
//! `/openai/deployments/{model}/embeddings`).
//!
//! Streaming uses `stream: true` and decodes the SSE body incrementally.

use std::time::{Duration, Instant};

use chat_history::Message;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    completion::TextStream,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
    services::{
        stream_decoder::{decode_lines, openai_sse_frame},
        wire_role,
    },
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Thin client for OpenAI-compatible APIs.
///
/// Keeps a preconfigured `reqwest::Client` (auth + content-type headers) and
/// the resolved URLs.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is Ollama
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if the endpoint is empty or not http/https, or if
    ///   Azure is configured without `api_version`
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let provider = cfg.provider;
        if provider == LlmProvider::Ollama {
            return Err(ProviderError::new(provider, ProviderErrorKind::InvalidProvider).into());
        }

        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::new(provider, ProviderErrorKind::MissingApiKey))?;

        let (url_chat, url_embeddings) = endpoints(&cfg)?;

        let mut headers = header::HeaderMap::new();
        let (auth_name, auth_value) = match provider {
            LlmProvider::AzureOpenAI => (header::HeaderName::from_static("api-key"), api_key),
            _ => (header::AUTHORIZATION, format!("Bearer {api_key}")),
        };
        let mut auth_value = header::HeaderValue::from_str(&auth_value).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        auth_value.set_sensitive(true);
        headers.insert(auth_name, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .default_headers(headers);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        info!(
            provider = %provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = ?cfg.timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Non-streaming chat completion over the full message sequence.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - `Decode` if the JSON cannot be parsed
    /// - `EmptyChoices` if no choice carries content
    pub async fn chat(&self, messages: &[Message]) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, messages, false);

        let resp = self.post_checked(&self.url_chat, &body, started).await?;

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    provider = %self.cfg.provider,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completion response"
                );
                return Err(self.provider_error(ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                ))));
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| self.provider_error(ProviderErrorKind::EmptyChoices))?;

        info!(
            provider = %self.cfg.provider,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            answer_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Streaming chat completion.
    ///
    /// Resolves after the upstream accepted the request; the returned stream
    /// yields content deltas in arrival order.
    pub async fn chat_stream(&self, messages: &[Message]) -> Result<TextStream, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, messages, true);

        let resp = self.post_checked(&self.url_chat, &body, started).await?;

        debug!(
            provider = %self.cfg.provider,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat stream opened"
        );

        let provider = self.cfg.provider;
        Ok(decode_lines(resp.bytes_stream(), move |line| {
            openai_sse_frame(provider, line)
        }))
    }

    /// Retrieves a single embeddings vector.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - `Decode` if the JSON cannot be parsed or `data` is empty
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        let resp = self
            .post_checked(&self.url_embeddings, &body, started)
            .await?;

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                provider = %self.cfg.provider,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode embeddings response"
            );
            self.provider_error(ProviderErrorKind::Decode(format!(
                "serde error: {e}; expected `data[0].embedding`"
            )))
        })?;

        let first = out.data.into_iter().next().ok_or_else(|| {
            self.provider_error(ProviderErrorKind::Decode(
                "empty `data` in embeddings response".into(),
            ))
        })?;

        debug!(
            provider = %self.cfg.provider,
            model = %self.cfg.model,
            dims = first.embedding.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(first.embedding)
    }

    /// POSTs `body` and turns a non-2xx answer into `HttpStatus`.
    async fn post_checked<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        started: Instant,
    ) -> Result<reqwest::Response, AiLlmError> {
        debug!(
            provider = %self.cfg.provider,
            model = %self.cfg.model,
            "POST {}", url
        );

        let resp = self.client.post(url).json(body).send().await?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            provider = %self.cfg.provider,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "provider returned non-success status"
        );

        Err(self.provider_error(ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        })))
    }

    fn provider_error(&self, kind: ProviderErrorKind) -> AiLlmError {
        ProviderError::new(self.cfg.provider, kind).into()
    }
}

/// Resolves `(chat, embeddings)` URLs for the configured provider.
fn endpoints(cfg: &LlmModelConfig) -> Result<(String, String), AiLlmError> {
    let endpoint = cfg.endpoint.trim();
    if endpoint.is_empty() || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            cfg.provider,
            ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
        )
        .into());
    }
    let base = endpoint.trim_end_matches('/');

    match cfg.provider {
        LlmProvider::AzureOpenAI => {
            let version = cfg
                .api_version
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ProviderError::new(
                        cfg.provider,
                        ProviderErrorKind::InvalidEndpoint("missing api-version".into()),
                    )
                })?;
            let deployment = format!("{base}/openai/deployments/{}", cfg.model);
            Ok((
                format!("{deployment}/chat/completions?api-version={version}"),
                format!("{deployment}/embeddings?api-version={version}"),
            ))
        }
        _ => Ok((
            format!("{base}/v1/chat/completions"),
            format!("{base}/v1/embeddings"),
        )),
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, messages: &'a [Message], stream: bool) -> Self {
        Self {
            model: &cfg.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: wire_role(m.role()),
                    content: m.content(),
                })
                .collect(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
