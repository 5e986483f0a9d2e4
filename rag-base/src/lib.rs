//! Retrieval-augmented context for the relay.
//!
//! Public API:
//! - [`indexer::build_index`]: split a source document, embed every chunk and
//!   write an index directory (`manifest.json` + `chunks.jsonl`).
//! - [`vector_store::LocalVectorStore`]: read-only in-memory copy of that
//!   directory with cosine top-k search.
//! - [`retriever::ContextRetriever`]: the seam used by HTTP handlers;
//!   [`retriever::VectorRetriever`] is the default implementation.

pub mod embedding;
pub mod errors;
pub mod indexer;
pub mod retriever;
pub mod splitter;
pub mod structs;
pub mod vector_store;

pub use embedding::Embedder;
pub use errors::rag_base_error::RagBaseError;
pub use retriever::{ContextRetriever, VectorRetriever};
pub use structs::fragment::{Fragment, join_fragments};
pub use structs::index_manifest::IndexInfo;
pub use structs::rag_base_config::RagConfig;
