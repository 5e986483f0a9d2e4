use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ai_llm_service::AiLlmError;
use rag_base::RagBaseError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// `error` value of every 500 body.
pub const UPSTREAM_ERROR: &str = "Something went wrong!";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    /// Client input problem; the message is sent verbatim as `error`.
    #[error("{0}")]
    BadRequest(&'static str),

    /// Body extractor rejection (malformed JSON, wrong field types, ...).
    #[error("{message}")]
    Rejection { status: StatusCode, message: String },

    /// Completion, embedding or retrieval failed before any byte was sent.
    #[error("{0}")]
    Upstream(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejection { status, .. } => *status,
            AppError::MissingEnv(_)
            | AppError::InvalidEnv { .. }
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody<'_> {
        match self {
            AppError::BadRequest(msg) => ErrorBody {
                error: msg,
                message: None,
            },
            AppError::Rejection { status, message } => ErrorBody {
                error: status.canonical_reason().unwrap_or("Bad Request"),
                message: Some(message.clone()),
            },
            AppError::Upstream(message) => ErrorBody {
                error: UPSTREAM_ERROR,
                message: Some(message.clone()),
            },
            other => ErrorBody {
                error: UPSTREAM_ERROR,
                message: Some(other.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::Rejection {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<AiLlmError> for AppError {
    fn from(err: AiLlmError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<RagBaseError> for AppError {
    fn from(err: RagBaseError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_carries_only_the_error_key() {
        let (status, body) = body_json(AppError::BadRequest("Please send a body with a prompt property")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Please send a body with a prompt property"}));
    }

    #[tokio::test]
    async fn upstream_failure_exposes_the_raw_message() {
        let (status, body) = body_json(AppError::Upstream("401 Unauthorized".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Something went wrong!", "message": "401 Unauthorized"})
        );
    }

    #[tokio::test]
    async fn rejection_keeps_its_status() {
        let err = AppError::Rejection {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field".into(),
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Unprocessable Entity");
        assert_eq!(body["message"], "missing field");
    }
}
