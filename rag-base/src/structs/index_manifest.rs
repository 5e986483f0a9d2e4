//! On-disk shapes of the index directory.

use serde::{Deserialize, Serialize};

/// Bumped whenever the layout of `chunks.jsonl` or the manifest changes.
pub const INDEX_FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.jsonl";

/// `manifest.json`: describes how the index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Embedding model (or Azure deployment) that produced the vectors.
    pub embedding_model: String,
    pub dim: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    /// blake3 hex digest of the source document.
    pub source_hash: String,
    /// RFC3339 UTC.
    pub created_at: String,
}

impl IndexManifest {
    /// True when an index built with these inputs would be identical.
    pub fn matches(
        &self,
        source_hash: &str,
        embedding_model: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> bool {
        self.format_version == INDEX_FORMAT_VERSION
            && self.source_hash == source_hash
            && self.embedding_model == embedding_model
            && self.chunk_size == chunk_size
            && self.chunk_overlap == chunk_overlap
    }
}

/// One line of `chunks.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Summary of a loaded index, exposed by `/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexInfo {
    pub chunks: usize,
    pub dim: usize,
    pub model: String,
}
