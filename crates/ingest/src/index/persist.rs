use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chunker::Chunk;
use crate::embedding::EmbeddingIdentity;

use super::{IndexError, VectorIndex};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const BLOB_FILE: &str = "index.bin";
pub const FORMAT_VERSION: u32 = 1;

/// Describes a persisted index: who embedded it and what the blob must hash to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub embedding: EmbeddingIdentity,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    /// SHA-256 hex digest of `index.bin` as written.
    pub checksum: String,
}

impl IndexManifest {
    pub fn read(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(IndexError::Missing {
                dir: dir.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| corrupt(dir, format!("unreadable manifest: {e}")))
    }
}

#[derive(Serialize, Deserialize)]
struct IndexBlob {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

fn corrupt(dir: &Path, reason: impl Into<String>) -> IndexError {
    IndexError::Corrupt {
        dir: dir.to_path_buf(),
        reason: reason.into(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write `bytes` to a temp file next to `target`, then rename over it.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, target)?;
    Ok(())
}

impl VectorIndex {
    /// Persist to `dir`, replacing any index already there.
    ///
    /// The blob is renamed into place before the manifest; a crash in
    /// between leaves a checksum mismatch that `load` reports as corrupt.
    pub fn save(&self, dir: &Path) -> Result<IndexManifest, IndexError> {
        fs::create_dir_all(dir)?;

        let blob = IndexBlob {
            chunks: self.chunks().to_vec(),
            vectors: self.vectors().to_vec(),
        };
        let encoded = rmp_serde::to_vec(&blob).map_err(|e| IndexError::Serialize(e.to_string()))?;
        let compressed = zstd::encode_all(encoded.as_slice(), 3)?;

        let manifest = IndexManifest {
            version: FORMAT_VERSION,
            embedding: self.identity().clone(),
            chunk_count: self.len(),
            created_at: Utc::now(),
            checksum: sha256_hex(&compressed),
        };
        let manifest_json =
            serde_json::to_vec_pretty(&manifest).map_err(|e| IndexError::Serialize(e.to_string()))?;

        write_atomic(&dir.join(BLOB_FILE), &compressed)?;
        write_atomic(&dir.join(MANIFEST_FILE), &manifest_json)?;

        tracing::info!(
            dir = %dir.display(),
            chunks = manifest.chunk_count,
            bytes = compressed.len(),
            "Saved vector index"
        );
        Ok(manifest)
    }

    /// Load a persisted index wholesale. Any inconsistency is an error;
    /// a partially readable index is never returned.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let manifest = IndexManifest::read(dir)?;
        if manifest.version != FORMAT_VERSION {
            return Err(corrupt(
                dir,
                format!("unsupported format version {}", manifest.version),
            ));
        }

        let blob_path = dir.join(BLOB_FILE);
        if !blob_path.exists() {
            return Err(corrupt(dir, format!("{BLOB_FILE} is missing")));
        }
        let compressed = fs::read(&blob_path)?;
        if sha256_hex(&compressed) != manifest.checksum {
            return Err(corrupt(dir, "checksum mismatch"));
        }

        let encoded = zstd::decode_all(compressed.as_slice())
            .map_err(|e| corrupt(dir, format!("decompression failed: {e}")))?;
        let blob: IndexBlob = rmp_serde::from_slice(&encoded)
            .map_err(|e| corrupt(dir, format!("undecodable blob: {e}")))?;

        if blob.chunks.len() != manifest.chunk_count {
            return Err(corrupt(
                dir,
                format!(
                    "manifest lists {} chunks, blob holds {}",
                    manifest.chunk_count,
                    blob.chunks.len()
                ),
            ));
        }

        let index = Self::from_parts(manifest.embedding, blob.chunks, blob.vectors)
            .map_err(|e| corrupt(dir, e.to_string()))?;
        tracing::debug!(dir = %dir.display(), chunks = index.len(), "Loaded vector index");
        Ok(index)
    }

    /// Load for querying, failing fast when the index was embedded by a
    /// different provider, model or dimensionality than `expected`.
    pub fn open(dir: &Path, expected: &EmbeddingIdentity) -> Result<Self, IndexError> {
        let index = Self::load(dir)?;
        if index.identity() != expected {
            return Err(IndexError::EmbeddingMismatch {
                stored: index.identity().clone(),
                configured: expected.clone(),
            });
        }
        Ok(index)
    }
}
