//! PRISM — a context pipeline for LLM developer assistants.
//!
//! Given a free-form query and an indexed repository, select and compress
//! the smallest set of code fragments that preserves enough information
//! for a correct answer, then route the resulting prompt to the cheapest
//! viable model. The crate is organized leaf-first, matching the spec's
//! component dependency order:
//!
//! | Component | Module |
//! |-----------|--------|
//! | C1 Token Counter | [`token_counter`] |
//! | C2 Embedding Provider (port) | [`ports::embedding`] |
//! | C3 Indexer | [`indexer`] |
//! | C4 Vector Store | [`vector_store`] |
//! | C5 Intent Detector | [`intent`] |
//! | C6 Scorer | [`scorer`] |
//! | C7 Chunk Selector | [`selector`] |
//! | C8 Compressor | [`compressor`] |
//! | C9 Complexity Analyzer | [`complexity`] |
//! | C10 Budget Tracker | [`budget`] |
//! | C11 Model Router | [`router`] |
//!
//! [`pipeline`] composes all eleven into the single request flow described
//! in the specification's system overview. Wire protocols, CLI ergonomics,
//! daemonization, and plugin packaging are explicitly out of scope; this
//! crate is a library other processes embed.

pub mod budget;
pub mod compressor;
pub mod complexity;
pub mod config;
pub mod error;
pub mod indexer;
pub mod intent;
pub mod pipeline;
pub mod ports;
pub mod router;
pub mod scorer;
pub mod selector;
pub mod token_counter;
pub mod types;
pub mod vector_store;

pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOutput};
