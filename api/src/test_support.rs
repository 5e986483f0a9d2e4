//! Mocks and request helpers shared by the route tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::{AiLlmError, CompletionClient, TextStream, health_service::HealthStatus};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
};
use chat_history::Message;
use futures::{StreamExt, stream};
use http_body_util::BodyExt;
use rag_base::{ContextRetriever, Fragment, RagBaseError};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    core::app_state::{AppState, BackendHealth},
    router,
};

enum Reply {
    Text(String),
    Chunks(Vec<String>),
    Fail,
}

pub struct MockCompletion {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Vec<Message>>,
}

impl MockCompletion {
    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn streaming(chunks: &[&str]) -> Arc<Self> {
        Self::with(Reply::Chunks(chunks.iter().map(|c| c.to_string()).collect()))
    }

    pub fn failing() -> Arc<Self> {
        Self::with(Reply::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.last.lock().unwrap().clone()
    }

    fn record(&self, messages: &[Message]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = messages.to_vec();
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn invoke(&self, messages: &[Message]) -> Result<String, AiLlmError> {
        self.record(messages);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Chunks(chunks) => Ok(chunks.concat()),
            Reply::Fail => Err(AiLlmError::EmptyConversation),
        }
    }

    async fn stream(&self, messages: &[Message]) -> Result<TextStream, AiLlmError> {
        self.record(messages);
        let chunks = match &self.reply {
            Reply::Text(text) => vec![text.clone()],
            Reply::Chunks(chunks) => chunks.clone(),
            Reply::Fail => return Err(AiLlmError::EmptyConversation),
        };
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

pub struct MockRetriever {
    texts: Option<Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl MockRetriever {
    pub fn with(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            texts: Some(texts.iter().map(|t| t.to_string()).collect()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::with(&[])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            texts: None,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContextRetriever for MockRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Fragment>, RagBaseError> {
        self.queries.lock().unwrap().push(query.to_string());
        let texts = self
            .texts
            .as_ref()
            .ok_or_else(|| RagBaseError::InvalidConfig("index unavailable".into()))?;
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| Fragment {
                id: format!("chunk-{i:05}"),
                text: text.clone(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect())
    }
}

/// Probe reporting one backend per flag.
pub struct StaticHealth(pub Vec<bool>);

#[async_trait]
impl BackendHealth for StaticHealth {
    async fn backends(&self) -> Vec<HealthStatus> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, ok)| HealthStatus {
                provider: "Ollama".into(),
                endpoint: format!("http://backend-{i}:11434"),
                model: Some("llama3".into()),
                ok: *ok,
                latency_ms: 3,
                message: if *ok { "ok".into() } else { "connection refused".into() },
            })
            .collect()
    }
}

pub fn state_with(completion: Arc<MockCompletion>, retriever: Arc<MockRetriever>) -> AppState {
    AppState::new(completion, retriever)
}

pub fn post_json(uri: &str, body: Value) -> Request<String> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

pub async fn send(state: AppState, req: Request<String>) -> Response {
    router(Arc::new(state)).oneshot(req.map(Body::from)).await.unwrap()
}

pub async fn read_text(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn read_json(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
