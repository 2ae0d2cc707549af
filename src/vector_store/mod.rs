//! C4 — Vector Store.
//!
//! | Backend | Persistence | Use case |
//! |---------|-------------|----------|
//! | [`InMemoryVectorStore`] | none | tests, ephemeral runs |
//! | [`FilesystemVectorStore`] | append log, bit-exact wire layout | single-node persistence |
//!
//! Both implement the same [`VectorStore`] trait; callers depend on the
//! trait object, never a concrete backend.

#[cfg(feature = "filesystem-store")]
mod codec;
#[cfg(feature = "filesystem-store")]
mod filesystem;
mod in_memory;

#[cfg(feature = "filesystem-store")]
pub use filesystem::FilesystemVectorStore;
pub use in_memory::InMemoryVectorStore;

use crate::error::{Error, Result};
use crate::types::{CodeChunk, Language};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Query filters applied before (or alongside) similarity ranking.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub file_path_glob: Option<String>,
    pub language: Option<Language>,
    pub path_prefix: Option<String>,
    pub created_after: Option<i64>,
    pub created_before: Option<i64>,
}

impl Filters {
    fn matches(&self, chunk: &CodeChunk) -> bool {
        if let Some(lang) = self.language {
            if chunk.language != lang {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !chunk.file_path.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(glob) = &self.file_path_glob {
            if let Ok(pattern) = glob::Pattern::new(glob) {
                if !pattern.matches(&chunk.file_path) {
                    return false;
                }
            }
        }
        if let Some(after) = self.created_after {
            if chunk.last_modified < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if chunk.last_modified > before {
                return false;
            }
        }
        true
    }
}

/// One result of [`VectorStore::search`] (spec §4.2: `search(...) →
/// [ScoredId]`): a chunk id paired with its cosine-similarity score
/// against the query embedding.
#[derive(Debug, Clone)]
pub struct ScoredId {
    pub id: String,
    pub score: f32,
}

/// Point-in-time counters surfaced by [`VectorStore::stats`] (spec §4.2:
/// `stats() -> { chunk_count, by_language, last_updated }`).
#[derive(Debug, Clone, Default)]
pub struct VectorStoreStats {
    pub chunk_count: usize,
    pub by_language: std::collections::HashMap<Language, usize>,
    /// Unix milliseconds of the most recently written live chunk's
    /// `last_modified`, or `None` for an empty store.
    pub last_updated: Option<i64>,
}

/// Storage boundary for indexed chunks (spec §4.2 / §6).
///
/// Upsert and delete are idempotent by id (spec §7). Implementations that
/// hit durable storage must retry `StorageError` with bounded exponential
/// backoff per [`crate::config::RetryConfig`] before surfacing it.
///
/// Every method is a suspension point (spec §5): implementations race the
/// underlying work against `cancel` via [`crate::error::cancellable`] and
/// return [`crate::error::Error::Cancelled`] promptly rather than waiting
/// out an already-cancelled caller.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Rejects `chunk.embedding == None` and malformed structural fields
    /// (empty id/file_path, non-positive line numbers) with
    /// `ValidationError` before committing (spec §7).
    async fn upsert(&self, chunk: CodeChunk, cancel: &CancellationToken) -> Result<()>;
    async fn upsert_batch(&self, chunks: Vec<CodeChunk>, cancel: &CancellationToken) -> Result<()> {
        for chunk in chunks {
            self.upsert(chunk, cancel).await?;
        }
        Ok(())
    }
    async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()>;
    async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Option<CodeChunk>>;
    async fn get_batch(&self, ids: &[String], cancel: &CancellationToken) -> Result<Vec<CodeChunk>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(chunk) = self.get(id, cancel).await? {
                out.push(chunk);
            }
        }
        Ok(out)
    }
    /// Cosine-similarity search against `query_embedding`, restricted to
    /// chunks matching `filters` and scoring at least `min_score`,
    /// returning at most `top_k` ids ordered by descending score
    /// (spec §4.2: `search(query_vec, { top_k, min_score, filters })`).
    ///
    /// Rejects a `query_embedding` whose length differs from the store's
    /// dimensionality with `ValidationError` (spec §7) rather than
    /// silently truncating the shorter vector.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
        filters: &Filters,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScoredId>>;
    async fn stats(&self, cancel: &CancellationToken) -> Result<VectorStoreStats>;
}

/// Cosine similarity on unit-norm vectors reduces to a dot product (I3).
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Validate a chunk at the upsert boundary: structural fields via
/// `validator::Validate`, plus the embedding-presence rule `validator`
/// cannot express on an `Option<Vec<f32>>` field (spec §7: "Missing
/// embedding on upsert -> ValidationError").
pub(crate) fn validate_for_upsert(chunk: &CodeChunk) -> Result<()> {
    use validator::Validate;
    chunk
        .validate()
        .map_err(|e| Error::validation(e.to_string()))?;
    if chunk.embedding.is_none() {
        return Err(Error::validation(format!(
            "chunk {} has no embedding",
            chunk.id
        )));
    }
    Ok(())
}

/// Validate a query embedding's length against the store's dimensionality
/// before scoring (spec §7: "Dimension mismatch on search ->
/// ValidationError"). `store_dim == 0` means the store is empty; any
/// query length is accepted since there is nothing to compare against.
pub(crate) fn validate_query_dimension(query_embedding: &[f32], store_dim: usize) -> Result<()> {
    if store_dim != 0 && query_embedding.len() != store_dim {
        return Err(Error::validation(format!(
            "query embedding has dimension {} but store expects {}",
            query_embedding.len(),
            store_dim
        )));
    }
    Ok(())
}

/// Retry an async storage operation with bounded exponential backoff,
/// per [`crate::config::RetryConfig`] and the spec §7 StorageError policy.
pub async fn retry_storage<F, Fut, T>(config: &crate::config::RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.retryable() && attempt + 1 < config.max_attempts => {
                let delay = config.base_delay_ms * 2u64.pow(attempt);
                tracing::warn!(attempt, delay_ms = delay, "retrying storage operation");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
