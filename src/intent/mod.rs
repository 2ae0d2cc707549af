//! C5 — Intent Detector.
//!
//! Classifies a raw query into an [`Intent`]: type, scope, entities,
//! complexity, history requirement, and the derived budget/options the
//! downstream Selector and Compressor consume. Lexicons are static tables
//! in the style of the teacher's `LANGUAGE_CONFIGS` registry
//! (`domain/chunking/mod.rs`), swapped here for keyword/regex cues instead
//! of per-language processors.

mod lexicon;

use crate::types::{
    CompressionLevel, Entity, EntityKind, Intent, IntentOptions, IntentType, QueryContext, Scope,
};
use lexicon::{
    ANAPHORA, BUG_FIX_CUES, EXPLAIN_CUES, FEATURE_ADD_CUES, FILE_TOKEN, KEYWORD_LIST,
    REFACTOR_CUES, SCOPE_CURRENT_DIR, SCOPE_CURRENT_FILE, SCOPE_PROJECT, SEARCH_CUES, TEST_CUES,
};

pub struct IntentDetector;

impl IntentDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, query_text: &str, context: Option<&QueryContext>) -> Intent {
        let lower = query_text.to_lowercase();

        let intent_type = classify(&lower);
        let scope = detect_scope(&lower);
        let entities = extract_entities(query_text, &lower);
        let requires_history = ANAPHORA
            .iter()
            .any(|a| if a.contains(' ') { lower.contains(a) } else { contains_word(&lower, a) });
        let complexity = estimate_complexity(&lower, &entities);
        let estimated_budget = estimate_budget(intent_type, scope, complexity);
        let options = derive_options(scope, complexity, estimated_budget);

        let _ = context;
        Intent {
            intent_type,
            scope,
            entities,
            complexity,
            requires_history,
            estimated_budget,
            options,
        }
    }
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// First-match-wins keyword classification (spec §4.3 priority order).
fn classify(lower: &str) -> IntentType {
    if BUG_FIX_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::BugFix
    } else if TEST_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::Test
    } else if REFACTOR_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::Refactor
    } else if FEATURE_ADD_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::FeatureAdd
    } else if EXPLAIN_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::Explain
    } else if SEARCH_CUES.iter().any(|c| lower.contains(c)) {
        IntentType::Search
    } else {
        IntentType::General
    }
}

fn detect_scope(lower: &str) -> Scope {
    if SCOPE_CURRENT_FILE.iter().any(|c| lower.contains(c)) {
        Scope::CurrentFile
    } else if SCOPE_CURRENT_DIR.iter().any(|c| lower.contains(c)) {
        Scope::CurrentDir
    } else if SCOPE_PROJECT.iter().any(|c| lower.contains(c)) {
        Scope::Project
    } else {
        Scope::Project
    }
}

fn contains_word(lower: &str, word: &str) -> bool {
    lower.split(|c: char| !c.is_alphanumeric()).any(|tok| tok == word)
}

/// Entity extraction: backtick/quote spans → symbol, `[\w/]+\.[a-z]{1,4}`
/// tokens → file, closed keyword list → keyword (spec §4.3).
fn extract_entities(original: &str, lower: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for span in backtick_and_quote_spans(original) {
        if !span.trim().is_empty() {
            entities.push(Entity {
                kind: EntityKind::Symbol,
                value: span,
                confidence: 0.8,
            });
        }
    }

    for mat in FILE_TOKEN.find_iter(original) {
        entities.push(Entity {
            kind: EntityKind::File,
            value: mat.as_str().to_string(),
            confidence: 0.7,
        });
    }

    for keyword in KEYWORD_LIST {
        if contains_word(lower, keyword) {
            entities.push(Entity {
                kind: EntityKind::Keyword,
                value: keyword.to_string(),
                confidence: 0.6,
            });
        }
    }

    entities
}

/// Spans delimited by matching backticks or double quotes, in order of
/// appearance.
fn backtick_and_quote_spans(text: &str) -> Vec<String> {
    let mut spans = Vec::new();
    for delim in ['`', '"'] {
        let mut chars = text.char_indices().peekable();
        let mut open: Option<usize> = None;
        while let Some((idx, ch)) = chars.next() {
            if ch == delim {
                match open {
                    None => open = Some(idx + ch.len_utf8()),
                    Some(start) => {
                        spans.push(text[start..idx].to_string());
                        open = None;
                    }
                }
            }
        }
    }
    spans
}

/// A lightweight complexity proxy feeding the budget/options derivation;
/// the authoritative score is the Complexity Analyzer (C9), this is only
/// used internally to pick a compression band consistently with it.
fn estimate_complexity(lower: &str, entities: &[Entity]) -> f32 {
    let length_factor = ((lower.chars().count() as f32 - 100.0) / 400.0).clamp(0.0, 1.0);
    let entity_factor = (entities.len() as f32 / 5.0).clamp(0.0, 1.0);
    (0.6 * length_factor + 0.4 * entity_factor).clamp(0.0, 1.0)
}

/// Budget: per-type base, scaled by scope weight (spec §4.3).
fn estimate_budget(intent_type: IntentType, scope: Scope, complexity: f32) -> u32 {
    let base: f32 = match intent_type {
        IntentType::BugFix => 6_000.0,
        IntentType::FeatureAdd => 5_000.0,
        IntentType::Refactor => 4_500.0,
        IntentType::Explain => 3_000.0,
        IntentType::Test => 3_500.0,
        IntentType::Search => 2_000.0,
        IntentType::General => 2_500.0,
    };
    let scope_weight = match scope {
        Scope::CurrentFile => 0.6,
        Scope::CurrentDir => 0.8,
        Scope::Project => 1.0,
    };
    let complexity_weight = 1.0 + 0.5 * complexity;
    (base * scope_weight * complexity_weight).round() as u32
}

fn derive_options(scope: Scope, complexity: f32, estimated_budget: u32) -> IntentOptions {
    let min_relevance = match scope {
        Scope::CurrentFile => 0.2,
        Scope::CurrentDir => 0.3,
        Scope::Project => 0.4,
    };
    let max_chunks = ((estimated_budget / 500).max(3)) as usize;
    let compression_level = if complexity < 0.33 {
        CompressionLevel::Light
    } else if complexity < 0.66 {
        CompressionLevel::Medium
    } else {
        CompressionLevel::Aggressive
    };
    IntentOptions {
        max_chunks,
        min_relevance,
        compression_level,
        prefer_diversity: scope == Scope::Project,
    }
}
