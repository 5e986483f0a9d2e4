//! Text → vector seam used by both the indexer and the retriever.

use ai_llm_service::LlmServiceProfiles;
use async_trait::async_trait;

use crate::errors::rag_base_error::RagBaseError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded in the index manifest.
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagBaseError>;
}

/// The embedding profile of the shared LLM service.
#[async_trait]
impl Embedder for LlmServiceProfiles {
    fn model_name(&self) -> &str {
        &self.profiles().1.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagBaseError> {
        LlmServiceProfiles::embed(self, text)
            .await
            .map_err(|e| RagBaseError::Embedding(e.to_string()))
    }
}
