use ai_llm_service::AiLlmError;
use chat_history::HistoryError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// `WEATHER_ENABLED=true` without the values needed to use it.
    #[error("[Weather] invalid configuration: {0}")]
    Config(String),

    #[error("[Weather] failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: &'static str, value: String },

    #[error("[Weather] transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("[Weather] weather API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("[Weather] unexpected weather payload: {0}")]
    Decode(String),

    /// The completion call that turns raw data into prose failed.
    #[error("[Weather] summary failed: {0}")]
    Summary(#[from] AiLlmError),

    #[error("[Weather] {0}")]
    History(#[from] HistoryError),

    #[error("[Weather] model returned an empty summary")]
    EmptySummary,
}
