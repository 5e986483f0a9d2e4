//! POST /: streamed role-play with client-supplied history.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::Response,
};
use chat_history::client_history;
use tracing::debug;

use crate::{
    core::{
        app_state::AppState,
        directives::{PROMPT_MISSING, ROLE_PLAY_DIRECTIVE},
        streaming::text_stream_response,
    },
    error_handler::{AppError, AppResult},
    middleware_layer::json_extractor::request_id,
    routes::{chat::chat_request::ChatRequest, json_or_default, non_empty},
};

/// Handler: POST /
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:3000/ \
///   -H 'content-type: application/json' \
///   -d '{"prompt":"Good morning!","history":[["human","Hi"],["ai","Sit down."]]}'
/// ```
pub async fn role_play(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);
    let body = json_or_default(body)?;
    let prompt = non_empty(body.prompt).ok_or(AppError::BadRequest(PROMPT_MISSING))?;

    let replay = client_history::from_json(body.history.as_ref());
    let mut history = state.history(ROLE_PLAY_DIRECTIVE, replay);
    history
        .append_user_prompt(prompt)
        .map_err(|_| AppError::BadRequest(PROMPT_MISSING))?;

    debug!(request_id, messages = history.len(), "streaming role-play reply");
    let stream = state.completion.stream(history.messages()).await?;
    Ok(text_stream_response(stream, request_id))
}
