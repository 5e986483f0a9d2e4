//! Lightweight Ollama client for chat and embeddings.
//!
//! - `POST {endpoint}/api/chat`      : chat, `stream=false` or NDJSON stream
//! - `POST {endpoint}/api/embeddings`: embeddings retrieval
//!
//! Sampling knobs go into `options` (`temperature`, `top_p`, `num_predict`).

use std::time::{Duration, Instant};

use chat_history::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    completion::TextStream,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
    services::{
        stream_decoder::{decode_lines, ollama_ndjson_frame},
        wire_role,
    },
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]; reuses one HTTP client.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/api/chat");
        let url_embeddings = format!("{base}/api/embeddings");

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

    /// Non-streaming chat via `/api/chat`.
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[Message]) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages, false);
        let resp = self.post_checked(&self.url_chat, &body, started).await?;

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `message.content` with `stream=false`"
                )),
            )
        })?;

        debug!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = out.message.content.len(),
            "chat completed"
        );
        Ok(out.message.content)
    }

    /// Streaming chat via `/api/chat` (NDJSON body).
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat_stream(&self, messages: &[Message]) -> Result<TextStream, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages, true);
        let resp = self.post_checked(&self.url_chat, &body, started).await?;

        debug!(latency_ms = started.elapsed().as_millis(), "chat stream opened");
        Ok(decode_lines(resp.bytes_stream(), ollama_ndjson_frame))
    }

    /// Retrieves embeddings via `/api/embeddings`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };
        let resp = self
            .post_checked(&self.url_embeddings, &body, started)
            .await?;

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        if out.embedding.is_empty() {
            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode("empty embedding (is this an embedding model?)".into()),
            )
            .into());
        }

        Ok(out.embedding)
    }

    async fn post_checked<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        started: Instant,
    ) -> Result<reqwest::Response, AiLlmError> {
        debug!("POST {}", url);
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
            latency_ms = started.elapsed().as_millis(),
            "Ollama returned non-success status"
        );

        Err(ProviderError::new(
            LlmProvider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into())
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, messages: &'a [Message], stream: bool) -> Self {
        let options = ChatOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };
        let has_options = options.temperature.is_some()
            || options.top_p.is_some()
            || options.num_predict.is_some();

        Self {
            model: &cfg.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: wire_role(m.role()),
                    content: m.content(),
                })
                .collect(),
            stream,
            options: has_options.then_some(options),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3".into(),
            endpoint: "http://localhost:11434/".into(),
            api_key: None,
            api_version: None,
            max_tokens: Some(256),
            temperature: Some(1.5),
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn chat_request_carries_options_and_roles() {
        let c = cfg();
        let messages = vec![Message::system("directive"), Message::human("hi")];
        let body = serde_json::to_value(ChatRequest::from_cfg(&c, &messages, true)).unwrap();

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body["options"].get("top_p").is_none());
    }

    #[test]
    fn constructor_validates_provider_and_endpoint() {
        let svc = OllamaService::new(cfg()).unwrap();
        assert_eq!(svc.url_chat, "http://localhost:11434/api/chat");

        let mut bad = cfg();
        bad.endpoint = "localhost:11434".into();
        assert!(OllamaService::new(bad).is_err());

        let mut wrong = cfg();
        wrong.provider = LlmProvider::OpenAI;
        assert!(OllamaService::new(wrong).is_err());
    }
}
