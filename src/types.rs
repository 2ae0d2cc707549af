//! Core data model shared by every component (spec §3).
//!
//! `CodeChunk` is the unit of retrieval; everything downstream of the
//! Indexer operates on it. `Query`, `Intent`, `ScoreBreakdown`,
//! `ComplexityFactors` and `ModelSpec` are the per-request types threaded
//! through the context pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Closed language enumeration (spec §3). Lowercase tags, matching the
/// wire-layout enum tag requirement in spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Typescript,
    Javascript,
    Python,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    Csharp,
    Php,
    Ruby,
    Kotlin,
    Swift,
    Shell,
    Yaml,
    Json,
    Markdown,
    Text,
}

impl Language {
    /// Map a file extension (without the dot) to a language tag.
    /// Unrecognized extensions fall through to `Text`.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "ts" | "tsx" => Language::Typescript,
            "js" | "jsx" | "mjs" | "cjs" => Language::Javascript,
            "py" | "pyi" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "cs" => Language::Csharp,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            "sh" | "bash" | "zsh" => Language::Shell,
            "yaml" | "yml" => Language::Yaml,
            "json" => Language::Json,
            "md" | "markdown" => Language::Markdown,
            _ => Language::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Typescript => "typescript",
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Shell => "shell",
            Language::Yaml => "yaml",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Text => "text",
        }
    }

    /// Languages with a tree-sitter grammar meaningful enough to yield
    /// function/class/method/interface declarations (spec §4.1 supplemental).
    pub fn has_declaration_grammar(&self) -> bool {
        !matches!(
            self,
            Language::Shell | Language::Yaml | Language::Json | Language::Markdown | Language::Text
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chunk kind (spec §3 closed enumeration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Function,
    Class,
    Method,
    Interface,
    Variable,
    Block,
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Method => "method",
            ChunkKind::Interface => "interface",
            ChunkKind::Variable => "variable",
            ChunkKind::Block => "block",
        };
        write!(f, "{s}")
    }
}

/// Unit of retrieval produced by the Indexer (spec §3).
///
/// Two chunks compare equal iff their `id`s are equal (I1): `id` is a
/// content-addressed fingerprint of `(file_path, start_byte, end_byte,
/// content)`, computed by [`crate::indexer::chunk_id`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CodeChunk {
    /// Stable content-addressed fingerprint, hex-encoded.
    #[validate(length(min = 1, message = "chunk id cannot be empty"))]
    pub id: String,
    /// Repository-relative, forward-slash normalized path.
    #[validate(length(min = 1, message = "file_path cannot be empty"))]
    pub file_path: String,
    pub language: Language,
    pub kind: ChunkKind,
    /// Human-readable identifier; empty for anonymous blocks.
    pub name: String,
    pub content: String,
    /// 1-indexed, inclusive (I4: `end_line >= start_line >= 1`).
    #[validate(range(min = 1, message = "start_line must be positive"))]
    pub start_line: u32,
    #[validate(range(min = 1, message = "end_line must be positive"))]
    pub end_line: u32,
    /// Identifiers defined or referenced in the chunk.
    pub symbols: BTreeSet<String>,
    /// Module/path references.
    pub imports: BTreeSet<String>,
    /// Unix milliseconds; source = file mtime at index time.
    pub last_modified: i64,
    /// Present-or-absent, never partial (I3: unit-norm, dimension D).
    pub embedding: Option<Vec<f32>>,
    /// Cached output of the Token Counter (C1).
    pub estimated_tokens: u32,
}

impl CodeChunk {
    /// I3: `‖embedding‖₂ = 1 ± 1e-5` when present.
    pub fn embedding_is_unit_norm(&self, tolerance: f32) -> bool {
        match &self.embedding {
            None => true,
            Some(v) => {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                (norm - 1.0).abs() <= tolerance
            }
        }
    }
}

impl PartialEq for CodeChunk {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for CodeChunk {}

/// Output of [`crate::indexer::Indexer::parse`] (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub chunks: Vec<CodeChunk>,
    /// Declaration names the walker recognized, independent of final chunk
    /// boundaries (a class with five methods yields one class entry and
    /// five function entries even if chunking merges small methods).
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub has_errors: bool,
}

/// Feedback-loop record consumed by the Scorer's frequency feature (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    pub chunk_id: String,
    pub timestamp_ms: i64,
    pub helpful: bool,
}

/// Per-provider budget snapshot (spec §3 / §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetState {
    pub used: f64,
    pub resets_at: i64,
    pub daily_limit: f64,
}

/// Transient per-request query (spec §3).
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    /// Unit-norm vector of the same dimension D as chunk embeddings.
    pub embedding: Option<Vec<f32>>,
    pub intent: Option<Intent>,
    /// Reference timestamp in ms, injected for testability.
    pub now: i64,
    /// Anchors proximity scoring when present.
    pub current_file: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>, now: i64) -> Self {
        Self {
            text: text.into(),
            embedding: None,
            intent: None,
            now,
            current_file: None,
        }
    }
}

/// Caller-supplied context replacing the duck-typed bag the source passed
/// around (spec §9 Design Notes).
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub current_file: Option<String>,
    pub current_language: Option<Language>,
    pub chunk_corpus_size: Option<usize>,
    pub history: Option<Vec<UsageEntry>>,
}

/// Classification produced by the Intent Detector (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentType {
    BugFix,
    FeatureAdd,
    Explain,
    Refactor,
    Test,
    Search,
    General,
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntentType::BugFix => "bug_fix",
            IntentType::FeatureAdd => "feature_add",
            IntentType::Explain => "explain",
            IntentType::Refactor => "refactor",
            IntentType::Test => "test",
            IntentType::Search => "search",
            IntentType::General => "general",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    CurrentFile,
    CurrentDir,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Symbol,
    File,
    Keyword,
    Type,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionLevel {
    Light,
    Medium,
    Aggressive,
}

/// Selector/Compressor tunables derived from the detected intent (spec §4.3).
#[derive(Debug, Clone, Copy)]
pub struct IntentOptions {
    pub max_chunks: usize,
    pub min_relevance: f32,
    pub compression_level: CompressionLevel,
    pub prefer_diversity: bool,
}

#[derive(Debug, Clone)]
pub struct Intent {
    pub intent_type: IntentType,
    pub scope: Scope,
    pub entities: Vec<Entity>,
    pub complexity: f32,
    pub requires_history: bool,
    pub estimated_budget: u32,
    pub options: IntentOptions,
}

/// Per-chunk score breakdown (spec §4.4). Always returned alongside
/// `total` for introspection and testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreBreakdown {
    pub semantic: f32,
    pub symbol_match: f32,
    pub file_proximity: f32,
    pub recency: f32,
    pub frequency: f32,
    pub total: f32,
}

/// Query-complexity factor breakdown (spec §4.7).
#[derive(Debug, Clone, Default)]
pub struct ComplexityFactors {
    pub length: f32,
    pub keyword: f32,
    pub structure: f32,
    pub dependencies: f32,
    pub ambiguity: f32,
    pub score: f32,
    /// Trail of which lexicon/pattern hits fired, for explainability.
    pub reasoning: Vec<String>,
}

/// Provider tag, closed enumeration (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTag {
    Local,
    CloudFree,
    PaidCheap,
    PaidBalanced,
    PaidPremium,
}

impl std::fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderTag::Local => "local",
            ProviderTag::CloudFree => "cloud_free",
            ProviderTag::PaidCheap => "paid_cheap",
            ProviderTag::PaidBalanced => "paid_balanced",
            ProviderTag::PaidPremium => "paid_premium",
        };
        write!(f, "{s}")
    }
}

/// A model configured at startup (spec §4.9: "a table configured at
/// startup").
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: String,
    pub provider: ProviderTag,
    pub context_window: u32,
    pub price_in_per_1m: f64,
    pub price_out_per_1m: f64,
    /// Recommended complexity band, inclusive lower / exclusive upper.
    pub complexity_band: (f32, f32),
}

impl ModelSpec {
    pub fn fits_complexity(&self, complexity: f32) -> bool {
        complexity >= self.complexity_band.0 && complexity < self.complexity_band.1
    }
}

/// Output of the Model Router (spec §6: `(model_name, provider_tag,
/// estimated_cost_usd, reason_string)`).
#[derive(Debug, Clone)]
pub struct ModelChoice {
    pub model: String,
    pub provider: ProviderTag,
    pub estimated_cost: f64,
    pub reason: String,
}
