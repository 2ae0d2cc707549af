//! File-backed persistence: an append-only log of length-prefixed records
//! plus an in-memory index rebuilt on open, matching the teacher's
//! "development / single-node" tier (`src.legacy`'s selection guide lists
//! `FilesystemVectorStore` as the persisted counterpart to the in-memory
//! provider). Deletes are tombstones (Open Question (c)): a record with
//! `deleted = true` rather than a removed byte range, so `compact()` is the
//! only operation that ever shrinks the file.

use super::codec::{self, Record};
use super::{
    cosine_similarity, validate_for_upsert, validate_query_dimension, Filters, ScoredId,
    VectorStore, VectorStoreStats,
};
use crate::config::RetryConfig;
use crate::error::{cancellable, Error, Result};
use crate::types::CodeChunk;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

struct State {
    records: HashMap<String, Record>,
}

pub struct FilesystemVectorStore {
    path: PathBuf,
    retry: RetryConfig,
    state: RwLock<State>,
}

impl FilesystemVectorStore {
    /// Open (creating if absent) the log file at `path`, replaying every
    /// record to rebuild the in-memory index.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::replay(&path).await?;
        Ok(Self {
            path,
            retry: RetryConfig::default(),
            state: RwLock::new(State { records }),
        })
    }

    async fn replay(path: &Path) -> Result<HashMap<String, Record>> {
        let mut records = HashMap::new();
        let mut file = match tokio::fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(Error::from(e)),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(Error::from)?;

        let mut cursor = 0usize;
        while cursor + 4 <= bytes.len() {
            let len = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
            cursor += 4;
            if cursor + len > bytes.len() {
                tracing::warn!("truncated trailing record in vector store log, stopping replay");
                break;
            }
            let record = codec::decode(&bytes[cursor..cursor + len])?;
            cursor += len;
            records.insert(record.chunk.id.clone(), record);
        }
        Ok(records)
    }

    async fn append(&self, bytes: Vec<u8>) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            codec::write_framed(&mut file, &bytes)?;
            file.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| Error::storage(format!("append task panicked: {e}")))??;
        Ok(())
    }

    /// Rewrite the log containing only the current live records, dropping
    /// tombstones and superseded versions. Preserves each surviving
    /// record's `trailing` bytes untouched (spec §6: unknown fields must
    /// be preserved on rewrite).
    pub async fn compact(&self) -> Result<()> {
        let live: Vec<Vec<u8>> = {
            let state = self.state.read().unwrap();
            state
                .records
                .values()
                .filter(|r| !r.deleted)
                .map(codec::encode_record)
                .collect()
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let tmp_path = path.with_extension("compacting");
            let mut tmp = std::fs::File::create(&tmp_path)?;
            for bytes in &live {
                codec::write_framed(&mut tmp, bytes)?;
            }
            tmp.flush()?;
            std::fs::rename(&tmp_path, &path)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::storage(format!("compact task panicked: {e}")))??;
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.state
            .read()
            .unwrap()
            .records
            .values()
            .filter(|r| !r.deleted)
            .find_map(|r| r.chunk.embedding.as_ref().map(|e| e.len()))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl VectorStore for FilesystemVectorStore {
    async fn upsert(&self, chunk: CodeChunk, cancel: &CancellationToken) -> Result<()> {
        validate_for_upsert(&chunk)?;
        let config = self.retry;
        cancellable(cancel, super::retry_storage(&config, || async {
            let bytes = codec::encode(&chunk);
            self.append(bytes.clone()).await?;
            let record = codec::decode(&bytes)?;
            self.state.write().unwrap().records.insert(record.chunk.id.clone(), record);
            Ok(())
        }))
        .await
    }

    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        let existing = self.state.read().unwrap().records.get(id).cloned();
        let Some(record) = existing else {
            return Ok(());
        };
        if record.deleted {
            return Ok(());
        }
        let config = self.retry;
        cancellable(cancel, super::retry_storage(&config, || async {
            let bytes = codec::encode_tombstone(&record.chunk, record.trailing.clone());
            self.append(bytes.clone()).await?;
            let tombstone = codec::decode(&bytes)?;
            self.state
                .write()
                .unwrap()
                .records
                .insert(tombstone.chunk.id.clone(), tombstone);
            Ok(())
        }))
        .await
    }

    async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Option<CodeChunk>> {
        cancellable(cancel, async {
            let state = self.state.read().unwrap();
            Ok(state
                .records
                .get(id)
                .filter(|r| !r.deleted)
                .map(|r| r.chunk.clone()))
        })
        .await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
        filters: &Filters,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScoredId>> {
        cancellable(cancel, async {
            validate_query_dimension(query_embedding, self.dimension())?;
            let state = self.state.read().unwrap();
            let mut scored: Vec<ScoredId> = state
                .records
                .values()
                .filter(|r| !r.deleted)
                .map(|r| &r.chunk)
                .filter(|c| filters.matches(c))
                .filter_map(|c| {
                    c.embedding
                        .as_deref()
                        .map(|e| ScoredId { id: c.id.clone(), score: cosine_similarity(query_embedding, e) })
                })
                .filter(|s| s.score >= min_score)
                .collect();
            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            scored.truncate(top_k);
            Ok(scored)
        })
        .await
    }

    async fn stats(&self, cancel: &CancellationToken) -> Result<VectorStoreStats> {
        cancellable(cancel, async {
            let state = self.state.read().unwrap();
            let live: Vec<&Record> = state.records.values().filter(|r| !r.deleted).collect();
            let mut by_language = std::collections::HashMap::new();
            let mut last_updated: Option<i64> = None;
            for r in &live {
                *by_language.entry(r.chunk.language).or_insert(0) += 1;
                last_updated = Some(last_updated.map_or(r.chunk.last_modified, |t| t.max(r.chunk.last_modified)));
            }
            Ok(VectorStoreStats {
                chunk_count: live.len(),
                by_language,
                last_updated,
            })
        })
        .await
    }
}
