//! The completion seam shared by HTTP handlers and background tasks.

use async_trait::async_trait;
use chat_history::Message;
use futures::stream::BoxStream;

use crate::error_handler::AiLlmError;

/// Ordered stream of decoded text chunks from a streaming completion.
///
/// Chunks arrive in production order. An `Err` item ends the stream.
pub type TextStream = BoxStream<'static, Result<String, AiLlmError>>;

/// Language-model completion over an ordered message sequence.
///
/// Implementations must not reorder or drop messages; the first message is
/// the system directive built by `chat_history::ConversationHistory`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single-shot completion returning the whole answer.
    async fn invoke(&self, messages: &[Message]) -> Result<String, AiLlmError>;

    /// Streaming completion.
    ///
    /// The returned future resolves once the upstream accepted the request
    /// (status checked), so errors surfacing here can still be reported to
    /// the caller before any byte of the answer was written.
    async fn stream(&self, messages: &[Message]) -> Result<TextStream, AiLlmError>;
}
