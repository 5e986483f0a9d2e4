use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which backend to use (Azure OpenAI, OpenAI, Ollama).
/// - `model`: Model identifier. For Azure this is the **deployment name**.
/// - `endpoint`: Base URL (`https://<instance>.openai.azure.com`,
///   `https://api.openai.com`, `http://localhost:11434`).
/// - `api_key`: API key for providers that require authentication.
/// - `api_version`: Azure `api-version` query parameter (ignored elsewhere).
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic, up to 2.0).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: Optional whole-request timeout in seconds. Left unset for
///   chat profiles so long streams are not cut off.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}
