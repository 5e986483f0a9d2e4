//! LLM access layer for the relay.
//!
//! - [`completion::CompletionClient`]: the seam used by HTTP handlers and the
//!   weather refresher (`invoke` for whole answers, `stream` for text chunks).
//! - [`service_profiles::LlmServiceProfiles`]: the production implementation,
//!   holding a **chat** and an **embedding** profile.
//! - Providers: Azure OpenAI, OpenAI and Ollama (`services`).
//! - [`health_service::HealthService`]: best-effort backend probes.
//! - [`telemetry`]: tracing subscriber setup shared by the binaries.

pub mod completion;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use completion::{CompletionClient, TextStream};
pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use service_profiles::LlmServiceProfiles;
