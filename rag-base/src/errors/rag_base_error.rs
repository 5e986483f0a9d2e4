//! Unified error type for the rag-base crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the RAG base module.
#[derive(Debug, Error)]
pub enum RagBaseError {
    // ── Configuration / environment ──────────────────────────────────────────
    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O & filesystem ────────────────────────────────────────────────────
    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Index directory ─────────────────────────────────────────────────────
    /// The index directory has no manifest; run `build-index` first.
    #[error("vector index not found at {}", path.display())]
    IndexMissing { path: PathBuf },

    /// Manifest and chunk file disagree, or a line is unreadable.
    #[error("corrupt vector index: {0}")]
    IndexCorrupt(String),

    /// Query vector and index vectors have different dimensions.
    #[error("embedding dimension mismatch: index has {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    // ── Embeddings backend ──────────────────────────────────────────────────
    /// Embedding backend failed to embed inputs.
    #[error("embedding error: {0}")]
    Embedding(String),
}
