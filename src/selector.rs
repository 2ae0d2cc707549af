//! C7 — Chunk Selector.
//!
//! Density-guided 0/1-knapsack over scored candidates: filter by
//! `min_relevance`, sort by density (relevance / tokens) descending, take
//! greedily within budget, admit one high-value overage chunk if nothing
//! above 0.8 relevance made it in, run a diversity pass across files, then
//! cap and re-sort by relevance (spec §4.5). Authored directly from the
//! spec pseudocode: the teacher has no knapsack-shaped selection step, so
//! this module borrows its iterator-composition style (`itertools`) from
//! the Scorer rather than any single teacher file.

use crate::types::{CodeChunk, IntentOptions, ScoreBreakdown};
use itertools::Itertools;
use std::collections::HashMap;

/// A candidate paired with its score breakdown, as produced by the Scorer.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: CodeChunk,
    pub score: ScoreBreakdown,
}

/// `select(scored, budget, options) → [CodeChunk]` (spec §4.5).
pub fn select(scored: Vec<ScoredChunk>, budget: u32, options: &IntentOptions) -> Vec<CodeChunk> {
    let candidates: Vec<ScoredChunk> = scored
        .into_iter()
        .filter(|c| c.score.total >= options.min_relevance)
        .collect();

    if candidates.is_empty() || budget == 0 {
        return Vec::new();
    }

    let distinct_files = candidates
        .iter()
        .map(|c| c.chunk.file_path.as_str())
        .unique()
        .count();

    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        density(b)
            .partial_cmp(&density(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });

    let mut selected: Vec<ScoredChunk> = Vec::new();
    let mut remaining: Vec<ScoredChunk> = Vec::new();
    let mut total_tokens: u64 = 0;

    for candidate in sorted {
        let tokens = candidate.chunk.estimated_tokens as u64;
        if total_tokens + tokens <= budget as u64 {
            total_tokens += tokens;
            selected.push(candidate);
        } else {
            remaining.push(candidate);
        }
    }

    // High-value overage (spec §4.5 step 4): if nothing at relevance >=
    // 0.8 was selected, admit the highest-relevance remaining chunk even
    // if it exceeds budget, as long as the overage stays within 10%.
    if !selected.iter().any(|c| c.score.total >= 0.8) {
        if let Some((idx, _)) = remaining
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.score
                    .total
                    .partial_cmp(&b.score.total)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        {
            let candidate = &remaining[idx];
            let tokens = candidate.chunk.estimated_tokens as u64;
            let overage_limit = (budget as f64 * 1.1).ceil() as u64;
            if total_tokens + tokens <= overage_limit {
                let candidate = remaining.remove(idx);
                total_tokens += candidate.chunk.estimated_tokens as u64;
                selected.push(candidate);
            }
        }
    }

    if options.prefer_diversity {
        diversity_pass(&mut selected, &mut remaining, distinct_files, options.min_relevance);
    }

    // Cap: truncate to max_chunks by relevance.
    if selected.len() > options.max_chunks {
        selected.sort_by(|a, b| {
            b.score
                .total
                .partial_cmp(&a.score.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        selected.truncate(options.max_chunks);
    }

    selected.sort_by(|a, b| {
        b.score
            .total
            .partial_cmp(&a.score.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });

    selected.into_iter().map(|c| c.chunk).collect()
}

fn density(c: &ScoredChunk) -> f32 {
    c.score.total / (c.chunk.estimated_tokens as f32).max(1.0)
}

/// Swap the lowest-density instance of an over-represented file for the
/// highest-density unselected chunk from an under-represented file, while
/// any file contributes more than `ceil(N / F)` of the selection
/// (spec §4.5 step 5).
fn diversity_pass(
    selected: &mut Vec<ScoredChunk>,
    remaining: &mut Vec<ScoredChunk>,
    distinct_files: usize,
    min_relevance: f32,
) {
    if distinct_files == 0 {
        return;
    }
    // Bounded by the selection size: each swap strictly reduces the
    // over-represented file's contribution, so this always terminates.
    for _ in 0..selected.len() {
        let n = selected.len();
        let cap = n.div_ceil(distinct_files).max(1);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for c in selected.iter() {
            *counts.entry(c.chunk.file_path.as_str()).or_insert(0) += 1;
        }
        let Some((&over_file, _)) = counts.iter().find(|(_, &count)| count > cap) else {
            break;
        };
        let over_file = over_file.to_string();

        let represented: std::collections::HashSet<&str> =
            selected.iter().map(|c| c.chunk.file_path.as_str()).collect();

        let Some((remaining_idx, _)) = remaining
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.score.total >= min_relevance && !represented.contains(c.chunk.file_path.as_str())
            })
            .max_by(|(_, a), (_, b)| {
                density(a)
                    .partial_cmp(&density(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        else {
            break;
        };

        let Some(selected_idx) = selected
            .iter()
            .enumerate()
            .filter(|(_, c)| c.chunk.file_path == over_file)
            .min_by(|(_, a), (_, b)| {
                density(a)
                    .partial_cmp(&density(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)
        else {
            break;
        };

        let replacement = remaining.remove(remaining_idx);
        let evicted = std::mem::replace(&mut selected[selected_idx], replacement);
        remaining.push(evicted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkKind, CompressionLevel, Language};
    use std::collections::BTreeSet;

    fn chunk(id: &str, file: &str, tokens: u32) -> CodeChunk {
        CodeChunk {
            id: id.to_string(),
            file_path: file.to_string(),
            language: Language::Rust,
            kind: ChunkKind::Function,
            name: id.to_string(),
            content: "fn f() {}".into(),
            start_line: 1,
            end_line: 1,
            symbols: BTreeSet::new(),
            imports: BTreeSet::new(),
            last_modified: 0,
            embedding: None,
            estimated_tokens: tokens,
        }
    }

    fn scored(chunk: CodeChunk, relevance: f32) -> ScoredChunk {
        ScoredChunk {
            chunk,
            score: ScoreBreakdown {
                total: relevance,
                ..Default::default()
            },
        }
    }

    fn options(max_chunks: usize, min_relevance: f32, prefer_diversity: bool) -> IntentOptions {
        IntentOptions {
            max_chunks,
            min_relevance,
            compression_level: CompressionLevel::Light,
            prefer_diversity,
        }
    }

    /// Spec §8 scenario 5: budget 100, A{0.9,200} B{0.85,50} C{0.4,40}.
    /// Density order B, C, A. Greedy picks B then C (50+40=90<=100). B has
    /// relevance >= 0.8 so no high-value overage kicks in. Output [B, C].
    #[test]
    fn spec_scenario_five_greedy_knapsack() {
        let candidates = vec![
            scored(chunk("A", "a.rs", 200), 0.9),
            scored(chunk("B", "b.rs", 50), 0.85),
            scored(chunk("C", "c.rs", 40), 0.4),
        ];
        let result = select(candidates, 100, &options(10, 0.0, false));
        assert_eq!(result.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["B", "C"]);
    }

    #[test]
    fn empty_when_no_candidates() {
        let result = select(Vec::new(), 100, &options(10, 0.0, false));
        assert!(result.is_empty());
    }

    #[test]
    fn empty_when_budget_is_zero() {
        let candidates = vec![scored(chunk("A", "a.rs", 10), 0.9)];
        let result = select(candidates, 0, &options(10, 0.0, false));
        assert!(result.is_empty());
    }

    #[test]
    fn empty_when_all_filtered_by_min_relevance() {
        let candidates = vec![scored(chunk("A", "a.rs", 10), 0.1)];
        let result = select(candidates, 100, &options(10, 0.5, false));
        assert!(result.is_empty());
    }

    #[test]
    fn high_value_overage_admits_best_chunk_within_ten_percent() {
        // Budget 10; only candidate costs 11 tokens but relevance 0.95 >=
        // 0.8, so it should be admitted (11 <= 10 * 1.1 = 11).
        let candidates = vec![scored(chunk("A", "a.rs", 11), 0.95)];
        let result = select(candidates, 10, &options(10, 0.0, false));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "A");
    }

    #[test]
    fn total_tokens_never_exceed_1point1_times_budget() {
        let candidates = vec![
            scored(chunk("A", "a.rs", 50), 0.95),
            scored(chunk("B", "b.rs", 50), 0.1),
        ];
        let result = select(candidates, 40, &options(10, 0.0, false));
        let total: u32 = result.iter().map(|c| c.estimated_tokens).sum();
        assert!(total as f32 <= 40.0 * 1.1);
    }

    #[test]
    fn cap_truncates_to_max_chunks_by_relevance() {
        let candidates = vec![
            scored(chunk("A", "a.rs", 10), 0.9),
            scored(chunk("B", "b.rs", 10), 0.8),
            scored(chunk("C", "c.rs", 10), 0.95),
        ];
        let result = select(candidates, 1000, &options(2, 0.0, false));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "C");
        assert_eq!(result[1].id, "A");
    }

    #[test]
    fn diversity_pass_redistributes_across_files() {
        // Four chunks from the same file all beat the budget; a fifth
        // chunk from a different file is also relevant. With diversity
        // preferred, no single file should keep all selected slots if an
        // alternative file is available.
        let mut candidates = vec![
            scored(chunk("a1", "a.rs", 10), 0.9),
            scored(chunk("a2", "a.rs", 10), 0.85),
            scored(chunk("a3", "a.rs", 10), 0.8),
            scored(chunk("a4", "a.rs", 10), 0.75),
        ];
        candidates.push(scored(chunk("b1", "b.rs", 10), 0.5));
        let result = select(candidates, 1000, &options(10, 0.0, true));
        let files: std::collections::HashSet<_> =
            result.iter().map(|c| c.file_path.clone()).collect();
        assert!(files.len() > 1, "expected diversity pass to pull in b.rs");
    }

    #[test]
    fn results_sorted_by_relevance_descending() {
        let candidates = vec![
            scored(chunk("A", "a.rs", 10), 0.5),
            scored(chunk("B", "b.rs", 10), 0.9),
        ];
        let result = select(candidates, 1000, &options(10, 0.0, false));
        assert_eq!(result[0].id, "B");
        assert_eq!(result[1].id, "A");
    }
}
