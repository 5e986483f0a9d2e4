//! GET /: one-shot joke, no client history.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::info;

use crate::{
    core::{app_state::AppState, directives::JOKE_DIRECTIVE},
    error_handler::AppResult,
    middleware_layer::json_extractor::request_id,
    routes::chat::chat_request::JokeResponse,
};

/// Handler: GET /
///
/// # Example
/// ```bash
/// curl http://127.0.0.1:3000/
/// ```
pub async fn tell_joke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<JokeResponse>> {
    let history = state.history(JOKE_DIRECTIVE, std::iter::empty());
    let funny_joke = state.completion.invoke(history.messages()).await?;

    info!(request_id = request_id(&headers), len = funny_joke.len(), "joke generated");
    Ok(Json(JokeResponse { funny_joke }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use chat_history::Role;
    use serde_json::json;
    use weather_context::WeatherCache;

    use crate::test_support::{MockCompletion, MockRetriever, read_json, send, state_with};

    #[tokio::test]
    async fn returns_the_completion_as_funny_joke() {
        let completion = MockCompletion::replying("Why did the robot cross the road?");
        let state = state_with(completion.clone(), MockRetriever::empty());

        let res = send(state, Request::get("/").body(String::new()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            read_json(res).await,
            json!({"funnyJoke": "Why did the robot cross the road?"})
        );

        let sent = completion.last_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].role(), Role::System);
        assert!(sent[0].content().contains("1970s New York"));
    }

    #[tokio::test]
    async fn weather_summary_sits_right_after_the_directive() {
        let completion = MockCompletion::replying("ha");
        let state = state_with(completion.clone(), MockRetriever::empty())
            .with_weather(WeatherCache::fixed("Clear and cold."));

        send(state, Request::get("/").body(String::new()).unwrap()).await;

        let sent = completion.last_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].role(), Role::System);
        assert_eq!(sent[1].content(), "Current local weather: Clear and cold.");
    }

    #[tokio::test]
    async fn provider_failure_is_a_500_with_message() {
        let state = state_with(MockCompletion::failing(), MockRetriever::empty());

        let res = send(state, Request::get("/").body(String::new()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(res).await;
        assert_eq!(body["error"], "Something went wrong!");
        assert!(body["message"].is_string());
    }
}
