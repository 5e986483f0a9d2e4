//! Offline index building: source document → chunks → vectors → index dir.

use std::path::PathBuf;
use std::time::Instant;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::info;

use crate::embedding::Embedder;
use crate::errors::rag_base_error::RagBaseError;
use crate::splitter::RecursiveCharacterSplitter;
use crate::structs::index_manifest::{INDEX_FORMAT_VERSION, IndexManifest, StoredChunk};
use crate::vector_store::{LocalVectorStore, read_manifest};

/// Inputs of one `build-index` run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub out_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Rebuild even if the existing manifest matches.
    pub force: bool,
    pub embed_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// A new index was written.
    Built(IndexManifest),
    /// The existing index already matches the inputs.
    UpToDate(IndexManifest),
}

/// Builds (or skips rebuilding) the index described by `opts`.
///
/// # Errors
/// I/O failures, invalid chunking parameters, embedding failures, or
/// inconsistent embedding dimensions.
pub async fn build_index(
    opts: &BuildOptions,
    embedder: &dyn Embedder,
) -> Result<BuildOutcome, RagBaseError> {
    let started = Instant::now();
    let splitter = RecursiveCharacterSplitter::new(opts.chunk_size, opts.chunk_overlap)?;

    let source = tokio::fs::read_to_string(&opts.source).await?;
    let source_hash = blake3::hash(source.as_bytes()).to_hex().to_string();
    let model = embedder.model_name().to_string();

    if !opts.force {
        if let Some(existing) = read_manifest(&opts.out_dir).await? {
            if existing.matches(&source_hash, &model, opts.chunk_size, opts.chunk_overlap) {
                info!(
                    out = %opts.out_dir.display(),
                    chunks = existing.chunk_count,
                    "index is up to date; skipping (use --force to rebuild)"
                );
                return Ok(BuildOutcome::UpToDate(existing));
            }
        }
    }

    let pieces = splitter.split_text(&source);
    if pieces.is_empty() {
        return Err(RagBaseError::InvalidConfig(format!(
            "source document {} has no text",
            opts.source.display()
        )));
    }
    info!(
        "Document split into {} chunks. Now saving into vector store",
        pieces.len()
    );

    let chunks = embed_chunks(pieces, embedder, opts.embed_concurrency.max(1)).await?;
    let dim = chunks.first().map(|c| c.vector.len()).unwrap_or_default();
    if let Some(bad) = chunks.iter().find(|c| c.vector.len() != dim) {
        return Err(RagBaseError::DimensionMismatch {
            expected: dim,
            got: bad.vector.len(),
        });
    }

    let manifest = IndexManifest {
        format_version: INDEX_FORMAT_VERSION,
        embedding_model: model,
        dim,
        chunk_size: opts.chunk_size,
        chunk_overlap: opts.chunk_overlap,
        chunk_count: chunks.len(),
        source_hash,
        created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };
    LocalVectorStore::write(&opts.out_dir, &manifest, &chunks).await?;

    info!(
        out = %opts.out_dir.display(),
        chunks = manifest.chunk_count,
        dim,
        duration_ms = started.elapsed().as_millis(),
        "index built"
    );
    Ok(BuildOutcome::Built(manifest))
}

/// Embeds chunks with bounded concurrency, preserving document order.
async fn embed_chunks(
    pieces: Vec<String>,
    embedder: &dyn Embedder,
    concurrency: usize,
) -> Result<Vec<StoredChunk>, RagBaseError> {
    stream::iter(pieces.into_iter().enumerate())
        .map(|(i, text)| async move {
            let vector = embedder.embed(&text).await?;
            Ok::<_, RagBaseError>(StoredChunk {
                id: format!("chunk-{i:05}"),
                text,
                vector,
            })
        })
        .buffered(concurrency)
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::structs::rag_base_config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

    fn default_options(source: &Path, out_dir: &Path) -> BuildOptions {
        BuildOptions {
            source: source.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            force: false,
            embed_concurrency: 4,
        }
    }

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagBaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0, 0.5])
        }
    }

    #[tokio::test]
    async fn builds_then_skips_unchanged_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.txt");
        let text = (0..60)
            .map(|i| format!("Sentence number {i} about the machine."))
            .collect::<Vec<_>>()
            .join(" ");
        tokio::fs::write(&source, &text).await.unwrap();
        let out = dir.path().join("index");

        let embedder = CountingEmbedder::default();
        let opts = default_options(&source, &out);

        let first = build_index(&opts, &embedder).await.unwrap();
        let BuildOutcome::Built(manifest) = first else {
            panic!("expected a fresh build");
        };
        assert!(manifest.chunk_count > 1);
        assert_eq!(manifest.dim, 3);
        assert_eq!(manifest.embedding_model, "counting");
        let calls_after_build = embedder.calls.load(Ordering::SeqCst);
        assert_eq!(calls_after_build, manifest.chunk_count);

        let store = LocalVectorStore::open(&out).await.unwrap();
        assert_eq!(store.info().chunks, manifest.chunk_count);

        let second = build_index(&opts, &embedder).await.unwrap();
        assert!(matches!(second, BuildOutcome::UpToDate(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_build);

        let forced = BuildOptions {
            force: true,
            ..opts.clone()
        };
        assert!(matches!(
            build_index(&forced, &embedder).await.unwrap(),
            BuildOutcome::Built(_)
        ));
    }

    #[tokio::test]
    async fn changed_chunking_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.txt");
        tokio::fs::write(&source, "alpha beta gamma delta").await.unwrap();
        let out = dir.path().join("index");
        let embedder = CountingEmbedder::default();

        let opts = default_options(&source, &out);
        build_index(&opts, &embedder).await.unwrap();

        let smaller = BuildOptions {
            chunk_size: 10,
            chunk_overlap: 2,
            ..opts
        };
        assert!(matches!(
            build_index(&smaller, &embedder).await.unwrap(),
            BuildOutcome::Built(_)
        ));
    }
}
