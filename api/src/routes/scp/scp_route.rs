//! POST /scp: test log generation grounded in the vector index.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::Response,
};
use rag_base::join_fragments;
use tracing::{debug, info};

use crate::{
    core::{
        app_state::AppState,
        directives::{SCP_FIELDS_MISSING, scp_directive, scp_prompt},
        streaming::text_stream_response,
    },
    error_handler::{AppError, AppResult},
    middleware_layer::json_extractor::request_id,
    routes::{json_or_default, non_empty, scp::scp_request::ScpRequest},
};

/// Handler: POST /scp
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:3000/scp \
///   -H 'content-type: application/json' \
///   -d '{"input":"a pocket watch","setting":"Very Fine"}'
/// ```
pub async fn scp_test_log(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ScpRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    let body = json_or_default(body)?;
    let (Some(input), Some(setting)) = (non_empty(body.input), non_empty(body.setting)) else {
        return Err(AppError::BadRequest(SCP_FIELDS_MISSING));
    };

    let prompt = scp_prompt(&input, &setting);
    let fragments = state.retriever.retrieve(&prompt).await?;
    info!(request_id, fragments = fragments.len(), "context retrieved");

    let context = join_fragments(&fragments);
    let mut history = state.history(scp_directive(&context), std::iter::empty());
    history
        .append_user_prompt(prompt)
        .map_err(|_| AppError::BadRequest(SCP_FIELDS_MISSING))?;

    debug!(request_id, messages = history.len(), "streaming test log");
    let stream = state.completion.stream(history.messages()).await?;
    Ok(text_stream_response(stream, request_id))
}
