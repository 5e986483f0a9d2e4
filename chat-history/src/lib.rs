//! Conversation assembly for the relay.
//!
//! Public API:
//! - [`Message`] / [`Role`]: immutable role-tagged conversation units.
//! - [`ConversationHistory`]: per-request, append-only message sequence whose
//!   first entry is always the server's system directive.
//! - [`client_history::from_json`]: fail-open decoding of the untrusted
//!   `history` field sent by clients.

pub mod client_history;
mod errors;
mod history;
mod message;

pub use errors::HistoryError;
pub use history::ConversationHistory;
pub use message::{Message, Role};
