use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub prompt: Option<String>,
    /// Prior turns as `[role, content]` pairs; decoded fail-open.
    pub history: Option<Value>,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct JokeResponse {
    #[serde(rename = "funnyJoke")]
    pub funny_joke: String,
}
