//! C2 — Embedding Provider (interface only; generation is an external
//! capability, per spec §1 Non-goals).

use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Produces a fixed-dimension, unit-norm vector for a text (spec §6).
///
/// Implementations must be deterministic for identical input within a
/// deployment and must return vectors of the same dimension `D` across
/// calls. Per spec §9 Open Question (a), there is no hash-based fallback
/// in a production implementation: an `EmbeddingProvider` that cannot
/// compute a real embedding must fail closed with [`crate::error::Error::NetworkError`]
/// or [`crate::error::Error::Llm`] rather than guess.
///
/// `embed`/`embed_batch` are suspension points (spec §5): a remote call
/// can outlive the caller's interest in it, so both accept a
/// `CancellationToken` and must return [`crate::error::Error::Cancelled`]
/// promptly once it fires rather than waiting out the in-flight request.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Implementations should prefer batching
    /// over repeated single calls where the backend supports it.
    async fn embed_batch(&self, texts: &[String], cancel: &CancellationToken) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, cancel).await?);
        }
        Ok(out)
    }

    /// Fixed output dimension `D`.
    fn dimensions(&self) -> usize;

    /// Provider identifier, for logging and cost-table lookups.
    fn provider_name(&self) -> &str;
}

/// Normalize a vector to unit length in place. Embedding providers that
/// produce non-normalized output should call this before returning,
/// satisfying invariant I3.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
