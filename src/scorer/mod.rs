//! C6 — Scorer.
//!
//! Blends five fixed-weight features into a single relevance score with a
//! returned breakdown for introspection (spec §4.4). No direct teacher
//! analog exists; the closest kin is the "blend several signals" shape of
//! `adapters/hybrid_search`, generalized here to the spec's exact five
//! features and weights instead of BM25-plus-vector fusion.

mod levenshtein;

use crate::config::ScorerWeights;
use crate::types::{CodeChunk, EntityKind, Query, QueryContext, ScoreBreakdown};
use levenshtein::levenshtein;

const MS_PER_DAY: i64 = 86_400_000;
const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

pub struct Scorer {
    weights: ScorerWeights,
}

impl Scorer {
    pub fn new(weights: ScorerWeights) -> Self {
        Self { weights }
    }

    /// `score(chunk, query, now) → {total, breakdown}` (spec §4.4). `now`
    /// is read from `query.now`; usage history for the frequency feature
    /// comes from the optional `context`, matching the
    /// `detect(query, optional_context)` shape the Intent Detector uses.
    pub fn score(
        &self,
        chunk: &CodeChunk,
        query: &Query,
        context: Option<&QueryContext>,
    ) -> ScoreBreakdown {
        let semantic = semantic_feature(chunk, query);
        let symbol_match = symbol_match_feature(chunk, query);
        let file_proximity = file_proximity_feature(chunk, query);
        let recency = recency_feature(chunk, query.now);
        let frequency = frequency_feature(chunk, context);

        let w = &self.weights;
        let total = w.semantic * semantic
            + w.symbol_match * symbol_match
            + w.file_proximity * file_proximity
            + w.recency * recency
            + w.frequency * frequency;

        ScoreBreakdown {
            semantic,
            symbol_match,
            file_proximity,
            recency,
            frequency,
            total: total.clamp(0.0, 1.0),
        }
    }
}

fn semantic_feature(chunk: &CodeChunk, query: &Query) -> f32 {
    match (&chunk.embedding, &query.embedding) {
        (Some(a), Some(b)) if a.len() == b.len() => {
            a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>().clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Only `symbol` and `keyword` entities participate (spec §4.4).
fn symbol_match_feature(chunk: &CodeChunk, query: &Query) -> f32 {
    let Some(intent) = &query.intent else {
        return 0.0;
    };
    intent
        .entities
        .iter()
        .filter(|e| matches!(e.kind, EntityKind::Symbol | EntityKind::Keyword))
        .map(|e| entity_match_score(chunk, &e.value))
        .fold(0.0_f32, f32::max)
}

fn entity_match_score(chunk: &CodeChunk, value: &str) -> f32 {
    let value_lower = value.to_lowercase();
    let best_symbol = chunk
        .symbols
        .iter()
        .map(|s| symbol_similarity(s, &value_lower))
        .fold(0.0_f32, f32::max);
    let name_similarity = if !chunk.name.is_empty() {
        symbol_similarity(&chunk.name, &value_lower)
    } else {
        0.0
    };
    best_symbol.max(name_similarity)
}

fn symbol_similarity(symbol: &str, value_lower: &str) -> f32 {
    let symbol_lower = symbol.to_lowercase();
    if symbol_lower == *value_lower {
        return 1.0;
    }
    if symbol_lower.contains(value_lower) || value_lower.contains(&symbol_lower) {
        return 0.8;
    }
    let max_len = symbol_lower.len().max(value_lower.len());
    if max_len == 0 {
        return 0.0;
    }
    let distance = levenshtein(&symbol_lower, value_lower);
    0.6 * (1.0 - distance as f32 / max_len as f32)
}

fn file_proximity_feature(chunk: &CodeChunk, query: &Query) -> f32 {
    let Some(current_file) = &query.current_file else {
        return 0.5;
    };
    let current = normalize_path(current_file);
    let candidate = normalize_path(&chunk.file_path);

    if candidate == current {
        return 1.0;
    }

    let current_dir: Vec<&str> = dir_components(&current);
    let candidate_dir: Vec<&str> = dir_components(&candidate);

    if current_dir == candidate_dir {
        return 0.8;
    }

    let common = current_dir
        .iter()
        .zip(candidate_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return 0.05;
    }

    let path_distance = (current_dir.len() - common) + (candidate_dir.len() - common);
    (0.8 - 0.1 * path_distance as f32).max(0.1)
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

fn dir_components(normalized_path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = normalized_path.split('/').collect();
    parts.pop();
    parts
}

fn recency_feature(chunk: &CodeChunk, now: i64) -> f32 {
    if chunk.last_modified == 0 {
        return 0.5;
    }
    if chunk.last_modified > now {
        return 1.0;
    }
    let age_days = (now - chunk.last_modified) as f64 / MS_PER_DAY as f64;
    let value = 0.5_f64.powf(age_days / RECENCY_HALF_LIFE_DAYS);
    value.max(0.1) as f32
}

fn frequency_feature(chunk: &CodeChunk, context: Option<&QueryContext>) -> f32 {
    let Some(history) = context.and_then(|c| c.history.as_deref()) else {
        return 0.0;
    };
    let relevant: Vec<_> = history.iter().filter(|e| e.chunk_id == chunk.id).collect();
    if relevant.is_empty() {
        return 0.0;
    }
    let helpful = relevant.iter().filter(|e| e.helpful).count();
    let total = relevant.len();
    (helpful as f32 / total as f32) * (total as f32 / 10.0).min(1.0)
}
