//! C3 — Indexer.
//!
//! Walks a source tree, turns each eligible file into [`CodeChunk`]s, and
//! exposes an incremental re-index entry point. Declaration extraction
//! delegates to `prism_tree_sitter::processor_for`; anything the grammar
//! registry doesn't cover (or a grammar that returns `has_errors`) falls
//! back to the brace-counting gap splitter below, in the spirit of the
//! teacher's `GenericFallbackChunker`.

use crate::config::IndexerConfig;
use crate::error::{Error, Result};
use crate::token_counter;
use crate::types::{ChunkKind, CodeChunk, Language, ParseResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

/// Content-addressed chunk id (I1): hex SHA-256 of
/// `file_path ∥ start_byte ∥ end_byte ∥ content`.
pub fn chunk_id(file_path: &str, start_byte: usize, end_byte: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(start_byte.to_le_bytes());
    hasher.update(end_byte.to_le_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Result of indexing a whole directory tree: per-file results keyed by
/// path, plus paths skipped or failed outright (binary, too large, unreadable).
#[derive(Debug, Clone, Default)]
pub struct IndexBatchResult {
    pub chunks: Vec<CodeChunk>,
    pub indexed_paths: Vec<String>,
    pub failed_paths: Vec<(String, String)>,
}

pub struct Indexer {
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// True if `path` should never be indexed, independent of its content
    /// (spec §4.1: exclude_patterns match any path component).
    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        normalized
            .split('/')
            .any(|component| self.config.exclude_patterns.iter().any(|p| p == component))
    }

    /// Binary detection (spec §4.1): a NUL byte in the first 8000 bytes.
    pub fn looks_binary(bytes: &[u8]) -> bool {
        bytes.iter().take(8000).any(|&b| b == 0)
    }

    /// Parse one file's content into chunks. `file_path` should already be
    /// repository-relative and forward-slash normalized.
    pub fn parse(
        &self,
        file_path: &str,
        content: &str,
        last_modified: i64,
    ) -> Result<ParseResult> {
        let ext = Path::new(file_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let language = Language::from_extension(ext);

        if !language.has_declaration_grammar() {
            return Ok(self.fallback_chunk(file_path, content, language, last_modified));
        }

        let Some(processor) = prism_tree_sitter::processor_for(language.as_str()) else {
            return Ok(self.fallback_chunk(file_path, content, language, last_modified));
        };

        let outcome = processor.parse(content);
        if outcome.has_errors && outcome.declarations.is_empty() {
            return Ok(self.fallback_chunk(file_path, content, language, last_modified));
        }

        let bytes = content.as_bytes();
        let mut chunks = Vec::new();
        let mut functions = Vec::new();
        let mut classes = Vec::new();

        // A declaration that fully contains another (a class wrapping its
        // methods, a namespace wrapping its classes, ...) would otherwise
        // be emitted as a chunk whose range strictly contains the nested
        // one, violating I1's non-overlap guarantee (spec.md:72, P2). Only
        // leaf declarations — those that don't themselves contain another
        // declaration — become chunks; a container's own span (its header,
        // fields, and the gaps between its members) is still captured by
        // the gap-filling pass below, since it's excluded from `covered`.
        let is_leaf: Vec<bool> = outcome
            .declarations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                !outcome.declarations.iter().enumerate().any(|(j, other)| {
                    i != j
                        && other.start_byte >= d.start_byte
                        && other.end_byte <= d.end_byte
                        && (other.start_byte, other.end_byte) != (d.start_byte, d.end_byte)
                })
            })
            .collect();

        let mut covered: Vec<(usize, usize)> = Vec::with_capacity(outcome.declarations.len());
        for (i, decl) in outcome.declarations.iter().enumerate() {
            let kind = match decl.kind {
                prism_tree_sitter::DeclKind::Function => ChunkKind::Function,
                prism_tree_sitter::DeclKind::Class => ChunkKind::Class,
                prism_tree_sitter::DeclKind::Method => ChunkKind::Method,
                prism_tree_sitter::DeclKind::Interface => ChunkKind::Interface,
            };
            match kind {
                ChunkKind::Function | ChunkKind::Method => functions.push(decl.name.clone()),
                ChunkKind::Class | ChunkKind::Interface => classes.push(decl.name.clone()),
                _ => {}
            }

            if !is_leaf[i] {
                continue;
            }

            let decl_content = &content[decl.start_byte..decl.end_byte];
            let symbols: BTreeSet<String> = decl.symbols.iter().cloned().collect();
            let imports: BTreeSet<String> = outcome.imports.iter().cloned().collect();
            chunks.push(CodeChunk {
                id: chunk_id(file_path, decl.start_byte, decl.end_byte, decl_content),
                file_path: file_path.to_string(),
                language,
                kind,
                name: decl.name.clone(),
                content: decl_content.to_string(),
                start_line: decl.start_line,
                end_line: decl.end_line,
                symbols,
                imports,
                last_modified,
                embedding: None,
                estimated_tokens: token_counter::estimate(decl_content),
            });
            covered.push((decl.start_byte, decl.end_byte));
        }

        covered.sort_unstable();
        for (start, end) in gaps(bytes.len(), &covered) {
            self.split_gap(
                file_path,
                content,
                language,
                last_modified,
                start,
                end,
                &mut chunks,
            );
        }

        chunks.sort_by_key(|c| c.start_line);

        Ok(ParseResult {
            chunks,
            functions,
            classes,
            has_errors: outcome.has_errors,
        })
    }

    /// Whole-file regex/brace-counting fallback for languages without a
    /// declaration grammar, or when tree-sitter parsing failed outright.
    fn fallback_chunk(
        &self,
        file_path: &str,
        content: &str,
        language: Language,
        last_modified: i64,
    ) -> ParseResult {
        let mut chunks = Vec::new();
        self.split_gap(
            file_path,
            content,
            language,
            last_modified,
            0,
            content.len(),
            &mut chunks,
        );
        ParseResult {
            chunks,
            functions: Vec::new(),
            classes: Vec::new(),
            has_errors: false,
        }
    }

    /// Split a byte range of `content` with no declaration coverage into
    /// `max_lines`-bounded `Block` chunks.
    fn split_gap(
        &self,
        file_path: &str,
        content: &str,
        language: Language,
        last_modified: i64,
        start_byte: usize,
        end_byte: usize,
        chunks: &mut Vec<CodeChunk>,
    ) {
        if start_byte >= end_byte {
            return;
        }
        let region = &content[start_byte..end_byte];
        let region_start_line = content[..start_byte].matches('\n').count() as u32 + 1;

        let lines: Vec<&str> = region.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let block_lines = &lines[i..(i + self.config.max_lines).min(lines.len())];
            let block_content = block_lines.join("\n");
            let trimmed = block_content.trim();
            if !trimmed.is_empty() {
                let block_start_line = region_start_line + i as u32;
                let block_end_line = block_start_line + block_lines.len() as u32 - 1;
                let offset_start = line_byte_offset(region, i);
                let offset_end = offset_start + block_content.len();
                chunks.push(CodeChunk {
                    id: chunk_id(
                        file_path,
                        start_byte + offset_start,
                        start_byte + offset_end,
                        &block_content,
                    ),
                    file_path: file_path.to_string(),
                    language,
                    kind: ChunkKind::Block,
                    name: String::new(),
                    content: block_content.clone(),
                    start_line: block_start_line,
                    end_line: block_end_line,
                    symbols: BTreeSet::new(),
                    imports: BTreeSet::new(),
                    last_modified,
                    embedding: None,
                    estimated_tokens: token_counter::estimate(&block_content),
                });
            }
            i += self.config.max_lines;
        }
    }

    /// Index a whole directory tree. `read_file` abstracts filesystem
    /// access so callers can test against an in-memory tree.
    pub fn index_tree<'a>(
        &self,
        files: impl IntoIterator<Item = (&'a str, &'a [u8], i64)>,
    ) -> IndexBatchResult {
        let mut result = IndexBatchResult::default();
        for (path, bytes, last_modified) in files {
            if self.is_excluded(path) {
                continue;
            }
            if bytes.len() as u64 > self.config.max_file_size {
                result
                    .failed_paths
                    .push((path.to_string(), "exceeds max_file_size".to_string()));
                continue;
            }
            if Self::looks_binary(bytes) {
                continue;
            }
            let content = match std::str::from_utf8(bytes) {
                Ok(s) => s,
                Err(_) => {
                    result
                        .failed_paths
                        .push((path.to_string(), "not valid UTF-8".to_string()));
                    continue;
                }
            };
            match self.parse(path, content, last_modified) {
                Ok(parsed) => {
                    result.indexed_paths.push(path.to_string());
                    result.chunks.extend(parsed.chunks);
                }
                Err(e) => result.failed_paths.push((path.to_string(), e.to_string())),
            }
        }
        result
    }
}

/// Find gaps in `[0, total_len)` not covered by the sorted, non-overlapping
/// `covered` ranges.
fn gaps(total_len: usize, covered: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for &(start, end) in covered {
        if start > cursor {
            out.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < total_len {
        out.push((cursor, total_len));
    }
    out
}

/// Byte offset of the start of the `n`th line (0-indexed) within `text`.
fn line_byte_offset(text: &str, n: usize) -> usize {
    text.split('\n')
        .take(n)
        .map(|l| l.len() + 1)
        .sum::<usize>()
        .min(text.len())
}

/// Map an [`Error`] raised while reading a path on disk into the batch
/// failure shape rather than aborting an entire tree walk.
pub fn io_error(path: &str, err: std::io::Error) -> (String, String) {
    (path.to_string(), Error::from(err).to_string())
}
