//! Memory-only backend: no persistence, lowest latency (spec §4.2 Non-goals
//! explicitly scope out a distributed store; this is the development/test
//! tier the teacher's own selection guide lists first).

use super::{
    cosine_similarity, validate_for_upsert, validate_query_dimension, Filters, ScoredId,
    VectorStore, VectorStoreStats,
};
use crate::error::{cancellable, Result};
use crate::types::CodeChunk;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: RwLock<HashMap<String, CodeChunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn dimension(&self) -> usize {
        self.chunks
            .read()
            .unwrap()
            .values()
            .find_map(|c| c.embedding.as_ref().map(|e| e.len()))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, chunk: CodeChunk, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, async {
            validate_for_upsert(&chunk)?;
            self.chunks.write().unwrap().insert(chunk.id.clone(), chunk);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, async {
            self.chunks.write().unwrap().remove(id);
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Option<CodeChunk>> {
        cancellable(cancel, async { Ok(self.chunks.read().unwrap().get(id).cloned()) }).await
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
            let chunks = self.chunks.read().unwrap();
            let mut scored: Vec<ScoredId> = chunks
                .values()
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
            let chunks = self.chunks.read().unwrap();
            let mut by_language = std::collections::HashMap::new();
            let mut last_updated: Option<i64> = None;
            for c in chunks.values() {
                *by_language.entry(c.language).or_insert(0) += 1;
                last_updated = Some(last_updated.map_or(c.last_modified, |t| t.max(c.last_modified)));
            }
            Ok(VectorStoreStats {
                chunk_count: chunks.len(),
                by_language,
                last_updated,
            })
        })
        .await
    }
}
