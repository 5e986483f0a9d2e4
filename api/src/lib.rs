//! HTTP surface of the relay.
//!
//! - `GET /` one-shot joke
//! - `POST /` streamed role-play with client history
//! - `POST /scp` streamed test log grounded in the vector index
//! - `GET /health` backend probes

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub use crate::core::{
    app_state::{AppState, BackendHealth},
    server_config::ServerConfig,
};
pub use crate::error_handler::AppError;

use crate::{
    middleware_layer::json_extractor::{ensure_request_id, json_error_mapper},
    routes::{
        chat::{joke_route::tell_joke, role_play_route::role_play},
        health::health_route::health,
        scp::scp_route::scp_test_log,
    },
};

/// All routes with CORS, tracing and the JSON error / request id layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(tell_joke).post(role_play))
        .route("/scp", post(scp_test_log))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `cfg` and serves until Ctrl+C.
pub async fn start(state: AppState, cfg: &ServerConfig) -> Result<(), AppError> {
    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr).await.map_err(AppError::Bind)?;
    info!(%addr, "server listening");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode, header};

    use crate::test_support::{MockCompletion, MockRetriever, read_json, send, state_with};

    #[tokio::test]
    async fn unknown_route_is_json_404_with_request_id() {
        let state = state_with(MockCompletion::replying("x"), MockRetriever::empty());

        let res = send(state, Request::get("/nope").body(String::new()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(read_json(res).await["error"], "Not Found");
    }

    #[tokio::test]
    async fn incoming_request_id_is_echoed() {
        let state = state_with(MockCompletion::replying("x"), MockRetriever::empty());

        let req = Request::get("/")
            .header("x-request-id", "abc-123")
            .body(String::new())
            .unwrap();
        let res = send(state, req).await;
        assert_eq!(res.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let state = state_with(MockCompletion::replying("x"), MockRetriever::empty());

        let req = Request::get("/")
            .header(header::ORIGIN, "http://example.test")
            .body(String::new())
            .unwrap();
        let res = send(state, req).await;
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
