//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Provider clients are built eagerly, so configuration mistakes surface at
//!   startup instead of on the first request.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{CompletionClient, LlmServiceProfiles};
//! use ai_llm_service::config::default_config::profiles_from_env;
//! use chat_history::Message;
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let profiles = profiles_from_env()?;
//! let svc = Arc::new(LlmServiceProfiles::new(profiles.chat, profiles.embedding, Some(10))?);
//!
//! let answer = svc.invoke(&[Message::system("Be brief."), Message::human("Hi")]).await?;
//! let vector = svc.embed("Ferris").await?;
//! # let _ = (answer, vector);
//! # Ok(()) }
//! ```

use async_trait::async_trait;
use chat_history::Message;
use tracing::info;

use crate::{
    completion::{CompletionClient, TextStream},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// A provider client bound to one profile.
#[derive(Debug)]
enum Backend {
    OpenAi(OpenAiService),
    Ollama(OllamaService),
}

impl Backend {
    fn build(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        match cfg.provider {
            LlmProvider::AzureOpenAI | LlmProvider::OpenAI => {
                Ok(Backend::OpenAi(OpenAiService::new(cfg)?))
            }
            LlmProvider::Ollama => Ok(Backend::Ollama(OllamaService::new(cfg)?)),
        }
    }

    fn config(&self) -> &LlmModelConfig {
        match self {
            Backend::OpenAi(s) => s.config(),
            Backend::Ollama(s) => s.config(),
        }
    }
}

/// Chat + embedding profiles behind one handle.
#[derive(Debug)]
pub struct LlmServiceProfiles {
    chat: Backend,
    embedding: Backend,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates the service.
    ///
    /// - `chat`: profile used for every completion.
    /// - `embedding`: profile used by [`LlmServiceProfiles::embed`].
    /// - `health_timeout_secs`: optional timeout for health probes.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if a provider client rejects its config or the
    /// HTTP client cannot be built.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let chat = Backend::build(chat)?;
        let embedding = Backend::build(embedding)?;

        info!(
            chat_provider = %chat.config().provider,
            chat_model = %chat.config().model,
            embedding_model = %embedding.config().model,
            "LLM service profiles ready"
        );

        Ok(Self {
            chat,
            embedding,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match &self.embedding {
            Backend::OpenAi(s) => s.embeddings(input).await,
            Backend::Ollama(s) => s.embeddings(input).await,
        }
    }

    /// Health snapshot for every distinct profile.
    ///
    /// If both profiles point at the same config it is checked only once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.chat.config().clone()];
        if self.embedding.config() != self.chat.config() {
            list.push(self.embedding.config().clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (self.chat.config(), self.embedding.config())
    }
}

#[async_trait]
impl CompletionClient for LlmServiceProfiles {
    async fn invoke(&self, messages: &[Message]) -> Result<String, AiLlmError> {
        if messages.is_empty() {
            return Err(AiLlmError::EmptyConversation);
        }
        match &self.chat {
            Backend::OpenAi(s) => s.chat(messages).await,
            Backend::Ollama(s) => s.chat(messages).await,
        }
    }

    async fn stream(&self, messages: &[Message]) -> Result<TextStream, AiLlmError> {
        if messages.is_empty() {
            return Err(AiLlmError::EmptyConversation);
        }
        match &self.chat {
            Backend::OpenAi(s) => s.chat_stream(messages).await,
            Backend::Ollama(s) => s.chat_stream(messages).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            api_version: None,
            max_tokens: None,
            temperature: Some(1.5),
            top_p: None,
            timeout_secs: None,
        }
    }

    #[tokio::test]
    async fn empty_conversation_is_rejected_before_any_request() {
        let svc = LlmServiceProfiles::new(ollama("llama3"), ollama("bge-m3"), Some(1)).unwrap();
        assert!(matches!(
            svc.invoke(&[]).await,
            Err(AiLlmError::EmptyConversation)
        ));
        assert!(matches!(
            svc.stream(&[]).await,
            Err(AiLlmError::EmptyConversation)
        ));
    }

    #[test]
    fn invalid_profile_fails_at_construction() {
        let mut bad = ollama("llama3");
        bad.endpoint = "not-a-url".into();
        assert!(LlmServiceProfiles::new(bad, ollama("bge-m3"), None).is_err());

        let svc = LlmServiceProfiles::new(ollama("llama3"), ollama("bge-m3"), None).unwrap();
        let (chat, emb) = svc.profiles();
        assert_eq!(chat.model, "llama3");
        assert_eq!(emb.model, "bge-m3");
    }
}
