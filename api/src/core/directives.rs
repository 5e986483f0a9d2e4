//! Fixed system directives and client-facing validation messages.
//!
//! Client values are interpolated verbatim into [`scp_prompt`] and retrieved
//! text into [`scp_directive`]; nothing is escaped.

pub const JOKE_DIRECTIVE: &str =
    "You are a stand-up comedian from 1970s New York. Tell a joke about the future";

pub const ROLE_PLAY_DIRECTIVE: &str = "You are a fictional CEO who is known for being evil and firing people without notice. You're overly friendly and don't seem to care about your employees at all. The employee you're about to fire has just walked into your office. Keep your replies between one and five sentences.";

pub const PROMPT_MISSING: &str = "Please send a body with a prompt property";

pub const SCP_FIELDS_MISSING: &str = "Please send a body with an input and setting property";

/// Human turn and retrieval query for `POST /scp`.
pub fn scp_prompt(input: &str, setting: &str) -> String {
    format!("Produce a test log. The input is {input}. The setting is {setting}.")
}

/// System directive for `POST /scp`, carrying the retrieved context.
pub fn scp_directive(context: &str) -> String {
    format!(
        "You will produce test logs based on the human's input and the context. Everything after this sentence is the context. {context}"
    )
}
