//! Configuration layer: reads retrieval and indexing settings from
//! environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::rag_base_error::RagBaseError;

/// Default index directory, relative to the working directory.
pub const DEFAULT_INDEX_DIR: &str = "scp-914Vectors";
/// Fragments returned per query.
pub const DEFAULT_TOP_K: usize = 4;
/// Characters per chunk for the recursive splitter.
pub const DEFAULT_CHUNK_SIZE: usize = 350;
/// Characters carried over between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 35;

/// Runtime configuration for retrieval and index building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory holding `manifest.json` and `chunks.jsonl`.
    pub index_dir: PathBuf,
    /// Number of fragments returned per query.
    pub top_k: usize,
    /// Max concurrent embedding requests while building an index.
    pub embed_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            top_k: DEFAULT_TOP_K,
            embed_concurrency: 4,
        }
    }
}

impl RagConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `INDEX_DIR` (default: `scp-914Vectors`)
    /// - `RAG_TOP_K` (default: 4)
    /// - `EMBEDDING_CONCURRENCY` (default: 4)
    pub fn from_env() -> Result<Self, RagBaseError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    /// Same as [`RagConfig::from_env`] but reads variables through `env`.
    pub fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, RagBaseError> {
        let defaults = Self::default();

        let index_dir = env("INDEX_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.index_dir);
        let top_k = read_usize(env, "RAG_TOP_K")?.unwrap_or(defaults.top_k);
        let embed_concurrency =
            read_usize(env, "EMBEDDING_CONCURRENCY")?.unwrap_or(defaults.embed_concurrency);

        if top_k == 0 {
            return Err(RagBaseError::InvalidConfig("RAG_TOP_K must be > 0".into()));
        }
        if embed_concurrency == 0 {
            return Err(RagBaseError::InvalidConfig(
                "EMBEDDING_CONCURRENCY must be > 0".into(),
            ));
        }

        Ok(Self {
            index_dir,
            top_k,
            embed_concurrency,
        })
    }
}

/// Reads an optional `usize`; unset or empty yields `Ok(None)`.
fn read_usize(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<usize>, RagBaseError> {
    match env(key) {
        Some(v) if !v.trim().is_empty() => {
            v.trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| RagBaseError::EnvParse {
                    key: key.into(),
                    value: v,
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = RagConfig::from_lookup(&|_| None).unwrap();
        assert_eq!(cfg, RagConfig::default());
        assert_eq!(cfg.index_dir, PathBuf::from("scp-914Vectors"));
        assert_eq!(cfg.top_k, 4);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        let zero = |k: &str| (k == "RAG_TOP_K").then(|| "0".to_string());
        assert!(matches!(
            RagConfig::from_lookup(&zero),
            Err(RagBaseError::InvalidConfig(_))
        ));

        let garbage = |k: &str| (k == "RAG_TOP_K").then(|| "four".to_string());
        assert!(matches!(
            RagConfig::from_lookup(&garbage),
            Err(RagBaseError::EnvParse { .. })
        ));
    }
}
