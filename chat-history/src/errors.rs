use thiserror::Error;

/// Errors produced while building a conversation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The user prompt was empty or whitespace only.
    #[error("prompt must not be empty")]
    EmptyPrompt,
}
