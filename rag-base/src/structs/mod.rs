pub mod fragment;
pub mod index_manifest;
pub mod rag_base_config;
