//! Read-only local vector index (`manifest.json` + `chunks.jsonl`).
//!
//! The whole index is loaded into memory once at startup; search is an
//! exhaustive cosine scan, which is plenty for a single source document.

use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info};

use crate::errors::rag_base_error::RagBaseError;
use crate::structs::fragment::Fragment;
use crate::structs::index_manifest::{
    CHUNKS_FILE, INDEX_FORMAT_VERSION, IndexInfo, IndexManifest, MANIFEST_FILE, StoredChunk,
};

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    text: String,
    vector: Vec<f32>,
    norm: f32,
}

/// In-memory copy of an index directory.
#[derive(Debug, Clone)]
pub struct LocalVectorStore {
    manifest: IndexManifest,
    entries: Vec<Entry>,
}

impl LocalVectorStore {
    /// Loads and validates an index directory.
    ///
    /// # Errors
    /// - [`RagBaseError::IndexMissing`] if `manifest.json` does not exist
    /// - [`RagBaseError::IndexCorrupt`] on version, count or dimension mismatches
    pub async fn open(dir: &Path) -> Result<Self, RagBaseError> {
        let manifest = match read_manifest(dir).await? {
            Some(m) => m,
            None => {
                return Err(RagBaseError::IndexMissing {
                    path: dir.to_path_buf(),
                });
            }
        };
        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(RagBaseError::IndexCorrupt(format!(
                "unsupported format version {} (expected {INDEX_FORMAT_VERSION})",
                manifest.format_version
            )));
        }

        let file = File::open(dir.join(CHUNKS_FILE)).await?;
        let mut lines = BufReader::new(file).lines();
        let mut entries = Vec::with_capacity(manifest.chunk_count);
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let chunk: StoredChunk = serde_json::from_str(&line).map_err(|e| {
                RagBaseError::IndexCorrupt(format!("{CHUNKS_FILE} line {line_no}: {e}"))
            })?;
            if chunk.vector.len() != manifest.dim {
                return Err(RagBaseError::IndexCorrupt(format!(
                    "{CHUNKS_FILE} line {line_no}: vector has {} dims, manifest says {}",
                    chunk.vector.len(),
                    manifest.dim
                )));
            }
            let norm = l2_norm(&chunk.vector);
            entries.push(Entry {
                id: chunk.id,
                text: chunk.text,
                vector: chunk.vector,
                norm,
            });
        }

        if entries.len() != manifest.chunk_count {
            return Err(RagBaseError::IndexCorrupt(format!(
                "manifest lists {} chunks, found {}",
                manifest.chunk_count,
                entries.len()
            )));
        }

        info!(
            dir = %dir.display(),
            chunks = entries.len(),
            dim = manifest.dim,
            model = %manifest.embedding_model,
            "vector index loaded"
        );

        Ok(Self { manifest, entries })
    }

    /// Writes `chunks.jsonl` and then `manifest.json` into `dir`.
    ///
    /// Any previous manifest is removed first, so an interrupted write never
    /// leaves a manifest pointing at a partial chunk file.
    pub async fn write(
        dir: &Path,
        manifest: &IndexManifest,
        chunks: &[StoredChunk],
    ) -> Result<(), RagBaseError> {
        fs::create_dir_all(dir).await?;
        let manifest_path = dir.join(MANIFEST_FILE);
        if fs::try_exists(&manifest_path).await? {
            fs::remove_file(&manifest_path).await?;
        }

        let mut out = BufWriter::new(File::create(dir.join(CHUNKS_FILE)).await?);
        for chunk in chunks {
            let mut line = serde_json::to_vec(chunk)?;
            line.push(b'\n');
            out.write_all(&line).await?;
        }
        out.flush().await?;

        fs::write(&manifest_path, serde_json::to_vec_pretty(manifest)?).await?;
        debug!(dir = %dir.display(), chunks = chunks.len(), "index written");
        Ok(())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn info(&self) -> IndexInfo {
        IndexInfo {
            chunks: self.entries.len(),
            dim: self.manifest.dim,
            model: self.manifest.embedding_model.clone(),
        }
    }

    /// Top-`k` fragments by cosine similarity, best first.
    ///
    /// # Errors
    /// [`RagBaseError::DimensionMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Fragment>, RagBaseError> {
        if query.len() != self.manifest.dim {
            return Err(RagBaseError::DimensionMismatch {
                expected: self.manifest.dim,
                got: query.len(),
            });
        }
        let q_norm = l2_norm(query);

        let mut scored: Vec<(f32, &Entry)> = self
            .entries
            .iter()
            .map(|e| (cosine(query, q_norm, &e.vector, e.norm), e))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, e)| Fragment {
                id: e.id.clone(),
                text: e.text.clone(),
                score,
            })
            .collect())
    }
}

/// Reads `manifest.json` if present.
pub(crate) async fn read_manifest(dir: &Path) -> Result<Option<IndexManifest>, RagBaseError> {
    let path = dir.join(MANIFEST_FILE);
    if !fs::try_exists(&path).await? {
        return Ok(None);
    }
    let raw = fs::read(&path).await?;
    Ok(Some(serde_json::from_slice(&raw)?))
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}
