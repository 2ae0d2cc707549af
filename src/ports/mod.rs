//! Boundary traits the core depends on but does not implement in full.
//!
//! Per spec §9, embedding generation, vector storage, and model invocation
//! are each modeled as an abstract capability; concrete backends register
//! once at startup and are passed in explicitly (no ambient singletons).

pub mod embedding;

pub use embedding::EmbeddingProvider;
