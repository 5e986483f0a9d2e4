//! Role-safe conversation assembly.
//!
//! A [`ConversationHistory`] lives for a single request. It always starts with
//! the server's directive, optionally followed by ambient directives (e.g. the
//! cached weather summary), then the replayed client messages and finally the
//! new user prompt. Client messages carrying the `system` role are dropped on
//! replay: only the server decides what the model is instructed to do.

use tracing::debug;

use crate::{
    errors::HistoryError,
    message::{Message, Role},
};

/// Ordered, append-only message sequence for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Starts a history with `directive` as the only system message and
    /// replays `client_history` in order, skipping `system` entries.
    pub fn create<I>(directive: impl Into<String>, client_history: I) -> Self
    where
        I: IntoIterator<Item = Message>,
    {
        Self::create_with_ambient(directive, std::iter::empty::<String>(), client_history)
    }

    /// Same as [`ConversationHistory::create`], with every non-empty
    /// `ambient` directive inserted as a system message right after the
    /// primary one.
    pub fn create_with_ambient<A, S, I>(
        directive: impl Into<String>,
        ambient: A,
        client_history: I,
    ) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
        I: IntoIterator<Item = Message>,
    {
        let mut messages = vec![Message::system(directive)];

        messages.extend(
            ambient
                .into_iter()
                .map(|s| -> String { s.into() })
                .filter(|s| !s.trim().is_empty())
                .map(Message::system),
        );

        let mut dropped = 0usize;
        for message in client_history {
            match message.role() {
                Role::System => dropped += 1,
                Role::Human | Role::Ai | Role::Tool => messages.push(message),
            }
        }
        if dropped > 0 {
            debug!(dropped, "ignored client-supplied system messages");
        }

        Self { messages }
    }

    /// Appends the new user turn.
    ///
    /// # Errors
    /// [`HistoryError::EmptyPrompt`] if `prompt` is empty or whitespace only.
    pub fn append_user_prompt(&mut self, prompt: impl Into<String>) -> Result<(), HistoryError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(HistoryError::EmptyPrompt);
        }
        self.messages.push(Message::human(prompt));
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true for a history built through the constructors; kept for the
    /// usual `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
