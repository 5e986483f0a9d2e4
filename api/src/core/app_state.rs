use std::sync::Arc;

use ai_llm_service::{CompletionClient, LlmServiceProfiles, health_service::HealthStatus};
use async_trait::async_trait;
use chat_history::{ConversationHistory, Message};
use rag_base::{ContextRetriever, IndexInfo};
use weather_context::WeatherCache;

/// Best-effort backend probes behind `GET /health`.
#[async_trait]
pub trait BackendHealth: Send + Sync {
    async fn backends(&self) -> Vec<HealthStatus>;
}

#[async_trait]
impl BackendHealth for LlmServiceProfiles {
    async fn backends(&self) -> Vec<HealthStatus> {
        self.health_all().await
    }
}

/// Shared state for all HTTP handlers. Built once at startup, read-only after.
pub struct AppState {
    pub completion: Arc<dyn CompletionClient>,
    pub retriever: Arc<dyn ContextRetriever>,
    /// Latest weather summary; `None` when weather injection is disabled.
    pub weather: Option<WeatherCache>,
    pub health: Option<Arc<dyn BackendHealth>>,
    pub index: Option<IndexInfo>,
}

impl AppState {
    pub fn new(completion: Arc<dyn CompletionClient>, retriever: Arc<dyn ContextRetriever>) -> Self {
        Self {
            completion,
            retriever,
            weather: None,
            health: None,
            index: None,
        }
    }

    pub fn with_weather(mut self, weather: WeatherCache) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_health(mut self, health: Arc<dyn BackendHealth>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_index(mut self, index: IndexInfo) -> Self {
        self.index = Some(index);
        self
    }

    /// Starts a request history: `directive`, then the cached weather
    /// summary (if any), then the replayed client messages.
    pub fn history<I>(&self, directive: impl Into<String>, client_history: I) -> ConversationHistory
    where
        I: IntoIterator<Item = Message>,
    {
        let ambient = self.weather.as_ref().and_then(WeatherCache::ambient_directive);
        ConversationHistory::create_with_ambient(directive, ambient, client_history)
    }
}
