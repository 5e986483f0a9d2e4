pub mod ollama_service;
pub mod open_ai_service;
mod stream_decoder;

use chat_history::Role;

/// Role name understood by the chat APIs (OpenAI, Azure OpenAI and Ollama
/// agree on these).
pub(crate) fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::Human => "user",
        Role::Ai => "assistant",
        Role::Tool => "tool",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_chat_api_names() {
        assert_eq!(wire_role(Role::System), "system");
        assert_eq!(wire_role(Role::Human), "user");
        assert_eq!(wire_role(Role::Ai), "assistant");
        assert_eq!(wire_role(Role::Tool), "tool");
    }
}
