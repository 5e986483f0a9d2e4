//! Context retrieval: query text → top-k fragments.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::embedding::Embedder;
use crate::errors::rag_base_error::RagBaseError;
use crate::structs::fragment::Fragment;
use crate::structs::index_manifest::IndexInfo;
use crate::vector_store::LocalVectorStore;

/// Given a query, returns the most relevant fragments, best first.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Fragment>, RagBaseError>;
}

/// Embeds the query and scans a [`LocalVectorStore`].
pub struct VectorRetriever {
    store: LocalVectorStore,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(store: LocalVectorStore, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        let index_model = &store.manifest().embedding_model;
        if index_model != embedder.model_name() {
            warn!(
                index_model = %index_model,
                embedder_model = %embedder.model_name(),
                "index was built with a different embedding model; rebuild with build-index"
            );
        }
        Self {
            store,
            embedder,
            top_k,
        }
    }

    pub fn index_info(&self) -> IndexInfo {
        self.store.info()
    }
}

#[async_trait]
impl ContextRetriever for VectorRetriever {
    #[instrument(skip_all, fields(query_len = query.len(), k = self.top_k))]
    async fn retrieve(&self, query: &str) -> Result<Vec<Fragment>, RagBaseError> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&vector, self.top_k)?;
        debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or_default(),
            "retrieval finished"
        );
        Ok(hits)
    }
}
