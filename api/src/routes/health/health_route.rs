//! GET /health: backend probes plus loaded index summary.

use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{Json, extract::State, http::StatusCode};
use rag_base::IndexInfo;
use serde::Serialize;
use tracing::warn;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub backends: Vec<HealthStatus>,
    pub index: Option<IndexInfo>,
}

/// Handler: GET /health
///
/// 200 when every probe succeeds, 503 otherwise. Never fails itself.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let backends = match &state.health {
        Some(probe) => probe.backends().await,
        None => Vec::new(),
    };
    let ok = backends.iter().all(|b| b.ok);
    if !ok {
        let failing: Vec<&str> = backends
            .iter()
            .filter(|b| !b.ok)
            .map(|b| b.endpoint.as_str())
            .collect();
        warn!(?failing, "health check found unreachable backends");
    }

    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            ok,
            backends,
            index: state.index.clone(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use rag_base::IndexInfo;

    use crate::test_support::{MockCompletion, MockRetriever, StaticHealth, read_json, send, state_with};

    fn index() -> IndexInfo {
        IndexInfo {
            chunks: 12,
            dim: 3,
            model: "text-embedding-3-small".into(),
        }
    }

    #[tokio::test]
    async fn all_backends_up_is_200() {
        let state = state_with(MockCompletion::replying("x"), MockRetriever::empty())
            .with_health(Arc::new(StaticHealth(vec![true, true])))
            .with_index(index());

        let res = send(state, Request::get("/health").body(String::new()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["backends"].as_array().unwrap().len(), 2);
        assert_eq!(body["index"]["chunks"], 12);
    }

    #[tokio::test]
    async fn one_failing_backend_is_503() {
        let state = state_with(MockCompletion::replying("x"), MockRetriever::empty())
            .with_health(Arc::new(StaticHealth(vec![true, false])));

        let res = send(state, Request::get("/health").body(String::new()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = read_json(res).await;
        assert_eq!(body["ok"], false);
        assert!(body["index"].is_null());
    }
}
