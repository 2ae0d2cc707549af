//! C8 — Compressor.
//!
//! Three compression levels over a chunk's `content` (spec §4.6). Every
//! level preserves `id`, `start_line`, `end_line`, and `symbols` untouched;
//! only `content` and the recomputed `estimated_tokens` change. String
//! literals are tracked so comment delimiters inside them are never
//! mistaken for real comments; when a string or docstring never closes
//! (heredocs, nested-language confusion) the Compressor leaves `content`
//! unchanged rather than guess, per spec §4.6.

mod lang;

use crate::token_counter;
use crate::types::{CodeChunk, CompressionLevel};
use lang::{syntax_for, LanguageSyntax};

/// `compress(chunk, level) → CodeChunk'` (spec §4.6).
pub fn compress(chunk: &CodeChunk, level: CompressionLevel) -> CodeChunk {
    let syntax = syntax_for(chunk.language);
    let new_content = match level {
        CompressionLevel::Light => strip_line_comments(&chunk.content, &syntax)
            .unwrap_or_else(|| chunk.content.clone()),
        CompressionLevel::Medium => strip_all_comments(&chunk.content, &syntax)
            .unwrap_or_else(|| chunk.content.clone()),
        CompressionLevel::Aggressive => {
            let medium = strip_all_comments(&chunk.content, &syntax)
                .unwrap_or_else(|| chunk.content.clone());
            if syntax.brace_delimited {
                collapse_nested_blocks(&medium, 2).unwrap_or(medium)
            } else {
                medium
            }
        }
    };

    let mut out = chunk.clone();
    out.estimated_tokens = token_counter::estimate(&new_content);
    out.content = new_content;
    out
}

/// Scanner state while walking source text character by character,
/// tracking whether we are inside a string/char literal, a docstring, or
/// a block comment so that delimiters found there are never treated as
/// real comment markers.
#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InString(char),
    InDocstring,
    InBlockComment,
}

/// Remove single-line comments outside string/docstring literals and
/// collapse runs of blank lines to one. Docstrings are preserved verbatim
/// (spec §4.6 `light`). Returns `None` if a string or docstring never
/// closes (detection is ambiguous).
fn strip_line_comments(content: &str, syntax: &LanguageSyntax) -> Option<String> {
    let stripped = strip_comments(content, syntax, false)?;
    Some(collapse_blank_runs(&stripped))
}

/// Remove single-line comments, block comments, and docstrings entirely
/// (spec §4.6 `medium`), then trim trailing whitespace per line and
/// collapse blank-line runs.
fn strip_all_comments(content: &str, syntax: &LanguageSyntax) -> Option<String> {
    let stripped = strip_comments(content, syntax, true)?;
    let trimmed: String = stripped
        .lines()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    Some(collapse_blank_runs(&trimmed))
}

/// Core comment/docstring stripping pass shared by `light` and `medium`.
/// `strip_docstrings` controls whether docstring bodies are deleted
/// (`medium`) or preserved verbatim (`light`).
fn strip_comments(content: &str, syntax: &LanguageSyntax, strip_docstrings: bool) -> Option<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut state = State::Normal;
    let mut i = 0;

    while i < chars.len() {
        match state {
            State::Normal => {
                if let Some((open, _)) = syntax.docstring {
                    if starts_with_at(&chars, i, open) {
                        if strip_docstrings {
                            let Some(end) = find_delim(&chars, i + open.chars().count(), syntax.docstring.unwrap().1) else {
                                return None;
                            };
                            i = end + syntax.docstring.unwrap().1.chars().count();
                        } else {
                            state = State::InDocstring;
                            push_n(&mut out, &chars, i, open.chars().count());
                            i += open.chars().count();
                        }
                        continue;
                    }
                }
                if let Some((open, _)) = syntax.block_comment {
                    if starts_with_at(&chars, i, open) {
                        let close = syntax.block_comment.unwrap().1;
                        let Some(end) = find_delim(&chars, i + open.chars().count(), close) else {
                            return None;
                        };
                        if strip_docstrings {
                            i = end + close.chars().count();
                        } else {
                            state = State::InBlockComment;
                            push_n(&mut out, &chars, i, open.chars().count());
                            i += open.chars().count();
                        }
                        continue;
                    }
                }
                if let Some(prefix) = syntax.line_comment {
                    if starts_with_at(&chars, i, prefix) {
                        while i < chars.len() && chars[i] != '\n' {
                            i += 1;
                        }
                        continue;
                    }
                }
                if chars[i] == '"' || chars[i] == '\'' {
                    state = State::InString(chars[i]);
                    out.push(chars[i]);
                    i += 1;
                    continue;
                }
                out.push(chars[i]);
                i += 1;
            }
            State::InString(quote) => {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    out.push(chars[i]);
                    out.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                out.push(chars[i]);
                if chars[i] == quote {
                    state = State::Normal;
                }
                if chars[i] == '\n' {
                    // Unterminated string literal spanning a newline:
                    // ambiguous, leave the whole chunk untouched.
                    return None;
                }
                i += 1;
            }
            State::InDocstring => {
                let close = syntax.docstring.unwrap().1;
                if starts_with_at(&chars, i, close) {
                    push_n(&mut out, &chars, i, close.chars().count());
                    i += close.chars().count();
                    state = State::Normal;
                    continue;
                }
                out.push(chars[i]);
                i += 1;
            }
            State::InBlockComment => {
                let close = syntax.block_comment.unwrap().1;
                if starts_with_at(&chars, i, close) {
                    push_n(&mut out, &chars, i, close.chars().count());
                    i += close.chars().count();
                    state = State::Normal;
                    continue;
                }
                out.push(chars[i]);
                i += 1;
            }
        }
    }

    if state != State::Normal {
        return None;
    }
    Some(out)
}

fn starts_with_at(chars: &[char], i: usize, pat: &str) -> bool {
    let pat_chars: Vec<char> = pat.chars().collect();
    if i + pat_chars.len() > chars.len() {
        return false;
    }
    chars[i..i + pat_chars.len()] == pat_chars[..]
}

fn find_delim(chars: &[char], from: usize, delim: &str) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if starts_with_at(chars, i, delim) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn push_n(out: &mut String, chars: &[char], from: usize, n: usize) {
    for c in &chars[from..from + n] {
        out.push(*c);
    }
}

/// Collapse runs of two or more consecutive blank (whitespace-only) lines
/// down to a single blank line.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = Vec::new();
    let mut prev_blank = false;
    for line in text.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank && prev_blank {
            continue;
        }
        out.push(line);
        prev_blank = is_blank;
    }
    out.join("\n")
}

/// Replace the bodies of blocks nested deeper than `threshold` levels with
/// a single-line `…` marker, tracking string literals so braces inside
/// them are never mistaken for block delimiters (spec §4.6 `aggressive`).
/// The signature at depth 0 (before the first `{`) is left untouched.
fn collapse_nested_blocks(content: &str, threshold: usize) -> Option<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut depth = 0usize;
    let mut state = State::Normal;
    let mut i = 0;

    while i < chars.len() {
        match state {
            State::InString(quote) => {
                out.push(chars[i]);
                if chars[i] == '\\' && i + 1 < chars.len() {
                    out.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    state = State::Normal;
                }
                i += 1;
            }
            State::Normal => {
                if chars[i] == '"' || chars[i] == '\'' {
                    state = State::InString(chars[i]);
                    out.push(chars[i]);
                    i += 1;
                    continue;
                }
                if chars[i] == '{' {
                    if depth == threshold {
                        // Entering a block deeper than `threshold`: collapse
                        // its entire body, including further nesting.
                        let Some(close) = find_matching_brace(&chars, i) else {
                            return None;
                        };
                        out.push('{');
                        out.push_str(" … ");
                        out.push('}');
                        i = close + 1;
                        continue;
                    }
                    depth += 1;
                    out.push('{');
                    i += 1;
                    continue;
                }
                if chars[i] == '}' {
                    depth = depth.saturating_sub(1);
                    out.push('}');
                    i += 1;
                    continue;
                }
                out.push(chars[i]);
                i += 1;
            }
            _ => unreachable!("comments already stripped before this pass"),
        }
    }

    Some(out)
}

/// Find the index of the `{` matching the one at `open`, honoring string
/// literals so braces inside them don't perturb the depth count.
fn find_matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut state = State::Normal;
    let mut i = open;
    while i < chars.len() {
        match state {
            State::InString(quote) => {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    state = State::Normal;
                }
                i += 1;
            }
            _ => {
                if chars[i] == '"' || chars[i] == '\'' {
                    state = State::InString(chars[i]);
                } else if chars[i] == '{' {
                    depth += 1;
                } else if chars[i] == '}' {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkKind, Language};
    use std::collections::BTreeSet;

    fn chunk(content: &str, language: Language) -> CodeChunk {
        CodeChunk {
            id: "fixed-id".into(),
            file_path: "a.rs".into(),
            language,
            kind: ChunkKind::Function,
            name: "f".into(),
            content: content.to_string(),
            start_line: 1,
            end_line: content.lines().count() as u32,
            symbols: BTreeSet::from(["f".to_string()]),
            imports: BTreeSet::new(),
            last_modified: 0,
            embedding: None,
            estimated_tokens: 0,
        }
    }

    #[test]
    fn id_start_end_symbols_preserved_at_every_level() {
        let c = chunk("fn f() {\n    // hi\n    1\n}\n", Language::Rust);
        for level in [
            CompressionLevel::Light,
            CompressionLevel::Medium,
            CompressionLevel::Aggressive,
        ] {
            let out = compress(&c, level);
            assert_eq!(out.id, c.id);
            assert_eq!(out.start_line, c.start_line);
            assert_eq!(out.end_line, c.end_line);
            assert_eq!(out.symbols, c.symbols);
        }
    }

    #[test]
    fn light_removes_line_comments_outside_strings() {
        let src = "fn f() {\n    let s = \"// not a comment\"; // real comment\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Light);
        assert!(out.content.contains("// not a comment"));
        assert!(!out.content.contains("real comment"));
    }

    #[test]
    fn light_collapses_blank_line_runs() {
        let src = "fn f() {\n\n\n\n    1\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Light);
        assert!(!out.content.contains("\n\n\n"));
    }

    #[test]
    fn light_preserves_python_docstrings() {
        let src = "def f():\n    \"\"\"A docstring.\"\"\"\n    return 1\n";
        let out = compress(&chunk(src, Language::Python), CompressionLevel::Light);
        assert!(out.content.contains("A docstring."));
    }

    #[test]
    fn medium_removes_docstrings_and_block_comments() {
        let src = "fn f() {\n    /* block */\n    1\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Medium);
        assert!(!out.content.contains("block"));

        let py = "def f():\n    \"\"\"Doc.\"\"\"\n    return 1\n";
        let out = compress(&chunk(py, Language::Python), CompressionLevel::Medium);
        assert!(!out.content.contains("Doc."));
    }

    #[test]
    fn aggressive_preserves_signature_and_collapses_deep_nesting() {
        let src = "fn f(a: i32) -> i32 {\n    if a > 0 {\n        if a > 1 {\n            return a * 2;\n        }\n    }\n    a\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Aggressive);
        assert!(out.content.starts_with("fn f(a: i32) -> i32 {"));
        assert!(!out.content.contains("return a * 2"));
        assert!(out.content.contains('…'));
    }

    #[test]
    fn unterminated_string_leaves_content_unchanged() {
        let src = "fn f() {\n    let s = \"unterminated\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Light);
        assert_eq!(out.content, src);
    }

    #[test]
    fn every_preserved_line_exists_in_original_at_relative_order() {
        let src = "fn f() {\n    // drop me\n    let x = 1;\n    let y = 2;\n}\n";
        let out = compress(&chunk(src, Language::Rust), CompressionLevel::Light);
        let original_lines: Vec<&str> = src.lines().collect();
        let mut cursor = 0;
        for line in out.content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let pos = original_lines[cursor..]
                .iter()
                .position(|orig| *orig == line);
            assert!(pos.is_some(), "line {line:?} not found in original order");
            cursor += pos.unwrap() + 1;
        }
    }
}
