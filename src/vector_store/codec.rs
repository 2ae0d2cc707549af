//! Hand-rolled binary wire codec for persisted chunks (spec §6).
//!
//! The spec fixes the layout itself — version byte, explicit field order,
//! little-endian fixed-width integers and floats — rather than delegating
//! framing to a serde-binary backend, so this is a small manual
//! length-prefixed format instead of `bincode`.
//!
//! Layout per record, all integers little-endian:
//! `version: u8 | deleted: u8 | id | file_path | language: u8 | start_line: u32
//!  | end_line: u32 | symbols: u32-len-prefixed list of strings
//!  | imports: u32-len-prefixed list of strings | last_modified: i64
//!  | estimated_tokens: u32 | content | name | dims: u32 | embedding: dims * f32
//!  | trailing: u32-len-prefixed raw bytes (unknown fields, preserved verbatim)`
//! Strings are `u32` byte-length prefixed UTF-8.

use crate::error::{Error, Result};
use crate::types::{ChunkKind, CodeChunk, Language};
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};

pub const VERSION: u8 = 1;

/// A decoded record, including a soft-delete flag and any trailing bytes
/// this version of the codec doesn't interpret but must round-trip.
#[derive(Debug, Clone)]
pub struct Record {
    pub deleted: bool,
    pub chunk: CodeChunk,
    pub kind: ChunkKind,
    pub trailing: Vec<u8>,
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn write_string_list(buf: &mut Vec<u8>, items: impl Iterator<Item = impl AsRef<str>>) {
    let items: Vec<String> = items.map(|i| i.as_ref().to_string()).collect();
    buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
    for item in &items {
        write_string(buf, item);
    }
}

fn language_tag(language: Language) -> u8 {
    match language {
        Language::Typescript => 0,
        Language::Javascript => 1,
        Language::Python => 2,
        Language::Rust => 3,
        Language::Go => 4,
        Language::Java => 5,
        Language::C => 6,
        Language::Cpp => 7,
        Language::Csharp => 8,
        Language::Php => 9,
        Language::Ruby => 10,
        Language::Kotlin => 11,
        Language::Swift => 12,
        Language::Shell => 13,
        Language::Yaml => 14,
        Language::Json => 15,
        Language::Markdown => 16,
        Language::Text => 17,
    }
}

fn language_from_tag(tag: u8) -> Result<Language> {
    Ok(match tag {
        0 => Language::Typescript,
        1 => Language::Javascript,
        2 => Language::Python,
        3 => Language::Rust,
        4 => Language::Go,
        5 => Language::Java,
        6 => Language::C,
        7 => Language::Cpp,
        8 => Language::Csharp,
        9 => Language::Php,
        10 => Language::Ruby,
        11 => Language::Kotlin,
        12 => Language::Swift,
        13 => Language::Shell,
        14 => Language::Yaml,
        15 => Language::Json,
        16 => Language::Markdown,
        17 => Language::Text,
        other => return Err(Error::storage(format!("unknown language tag {other}"))),
    })
}

fn kind_tag(kind: ChunkKind) -> u8 {
    match kind {
        ChunkKind::Function => 0,
        ChunkKind::Class => 1,
        ChunkKind::Method => 2,
        ChunkKind::Interface => 3,
        ChunkKind::Variable => 4,
        ChunkKind::Block => 5,
    }
}

fn kind_from_tag(tag: u8) -> Result<ChunkKind> {
    Ok(match tag {
        0 => ChunkKind::Function,
        1 => ChunkKind::Class,
        2 => ChunkKind::Method,
        3 => ChunkKind::Interface,
        4 => ChunkKind::Variable,
        5 => ChunkKind::Block,
        other => return Err(Error::storage(format!("unknown chunk kind tag {other}"))),
    })
}

/// Encode one chunk as a `Record` with `deleted = false` and no trailing bytes.
pub fn encode(chunk: &CodeChunk) -> Vec<u8> {
    encode_record(&Record {
        deleted: false,
        kind: chunk.kind,
        chunk: chunk.clone(),
        trailing: Vec::new(),
    })
}

/// Encode a tombstone record for `id`, preserving `trailing` from the
/// record being deleted so a rewrite never drops unknown fields.
pub fn encode_tombstone(chunk: &CodeChunk, trailing: Vec<u8>) -> Vec<u8> {
    encode_record(&Record {
        deleted: true,
        kind: chunk.kind,
        chunk: chunk.clone(),
        trailing,
    })
}

pub fn encode_record(record: &Record) -> Vec<u8> {
    let chunk = &record.chunk;
    let mut buf = Vec::new();
    buf.push(VERSION);
    buf.push(record.deleted as u8);
    write_string(&mut buf, &chunk.id);
    write_string(&mut buf, &chunk.file_path);
    buf.push(language_tag(chunk.language));
    buf.push(kind_tag(record.kind));
    buf.extend_from_slice(&chunk.start_line.to_le_bytes());
    buf.extend_from_slice(&chunk.end_line.to_le_bytes());
    write_string_list(&mut buf, chunk.symbols.iter());
    write_string_list(&mut buf, chunk.imports.iter());
    buf.extend_from_slice(&chunk.last_modified.to_le_bytes());
    buf.extend_from_slice(&chunk.estimated_tokens.to_le_bytes());
    write_string(&mut buf, &chunk.content);
    write_string(&mut buf, &chunk.name);
    let embedding = chunk.embedding.as_deref().unwrap_or(&[]);
    buf.extend_from_slice(&(embedding.len() as u32).to_le_bytes());
    for value in embedding {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf.extend_from_slice(&(record.trailing.len() as u32).to_le_bytes());
    buf.extend_from_slice(&record.trailing);
    buf
}

pub fn decode(bytes: &[u8]) -> Result<Record> {
    let mut cursor = Cursor::new(bytes);

    let mut one = [0u8; 1];
    cursor
        .read_exact(&mut one)
        .map_err(|e| Error::storage(format!("truncated record: {e}")))?;
    if one[0] != VERSION {
        return Err(Error::storage(format!("unsupported record version {}", one[0])));
    }

    cursor
        .read_exact(&mut one)
        .map_err(|e| Error::storage(format!("truncated record: {e}")))?;
    let deleted = one[0] != 0;

    let id = read_string(&mut cursor)?;
    let file_path = read_string(&mut cursor)?;

    cursor
        .read_exact(&mut one)
        .map_err(|e| Error::storage(format!("truncated record: {e}")))?;
    let language = language_from_tag(one[0])?;

    cursor
        .read_exact(&mut one)
        .map_err(|e| Error::storage(format!("truncated record: {e}")))?;
    let kind = kind_from_tag(one[0])?;

    let start_line = read_u32(&mut cursor)?;
    let end_line = read_u32(&mut cursor)?;
    let symbols: BTreeSet<String> = read_string_list(&mut cursor)?.into_iter().collect();
    let imports: BTreeSet<String> = read_string_list(&mut cursor)?.into_iter().collect();
    let last_modified = read_i64(&mut cursor)?;
    let estimated_tokens = read_u32(&mut cursor)?;
    let content = read_string(&mut cursor)?;
    let name = read_string(&mut cursor)?;

    let dims = read_u32(&mut cursor)? as usize;
    let mut embedding = Vec::with_capacity(dims);
    let mut four = [0u8; 4];
    for _ in 0..dims {
        cursor
            .read_exact(&mut four)
            .map_err(|e| Error::storage(format!("truncated embedding: {e}")))?;
        embedding.push(f32::from_le_bytes(four));
    }
    let embedding = if embedding.is_empty() { None } else { Some(embedding) };

    let trailing_len = read_u32(&mut cursor)? as usize;
    let mut trailing = vec![0u8; trailing_len];
    cursor
        .read_exact(&mut trailing)
        .map_err(|e| Error::storage(format!("truncated trailing bytes: {e}")))?;

    Ok(Record {
        deleted,
        kind,
        chunk: CodeChunk {
            id,
            file_path,
            language,
            kind,
            name,
            content,
            start_line,
            end_line,
            symbols,
            imports,
            last_modified,
            embedding,
            estimated_tokens,
        },
        trailing,
    })
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| Error::storage(format!("truncated u32: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> Result<i64> {
    let mut buf = [0u8; 8];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| Error::storage(format!("truncated i64: {e}")))?;
    Ok(i64::from_le_bytes(buf))
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = read_u32(cursor)? as usize;
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| Error::storage(format!("truncated string: {e}")))?;
    String::from_utf8(buf).map_err(|e| Error::storage(format!("invalid utf-8 string: {e}")))
}

fn read_string_list(cursor: &mut Cursor<&[u8]>) -> Result<Vec<String>> {
    let count = read_u32(cursor)? as usize;
    (0..count).map(|_| read_string(cursor)).collect()
}

/// Write one length-prefixed record to `writer` so records can be appended
/// to a log file and re-read without scanning for boundaries.
pub fn write_framed(writer: &mut impl Write, record_bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(&(record_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(record_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample_chunk() -> CodeChunk {
        CodeChunk {
            id: "abc123".into(),
            file_path: "src/lib.rs".into(),
            language: Language::Rust,
            kind: ChunkKind::Function,
            name: "run".into(),
            content: "fn run() {}".into(),
            start_line: 1,
            end_line: 1,
            symbols: BTreeSet::from(["run".to_string()]),
            imports: BTreeSet::new(),
            last_modified: 1_700_000_000_000,
            embedding: Some(vec![0.6, 0.8]),
            estimated_tokens: 5,
        }
    }

    #[test]
    fn round_trips_all_fields_bit_exactly() {
        let chunk = sample_chunk();
        let encoded = encode(&chunk);
        let decoded = decode(&encoded).unwrap();
        assert!(!decoded.deleted);
        assert_eq!(decoded.chunk.id, chunk.id);
        assert_eq!(decoded.chunk.file_path, chunk.file_path);
        assert_eq!(decoded.chunk.language, chunk.language);
        assert_eq!(decoded.kind, chunk.kind);
        assert_eq!(decoded.chunk.start_line, chunk.start_line);
        assert_eq!(decoded.chunk.end_line, chunk.end_line);
        assert_eq!(decoded.chunk.symbols, chunk.symbols);
        assert_eq!(decoded.chunk.imports, chunk.imports);
        assert_eq!(decoded.chunk.last_modified, chunk.last_modified);
        assert_eq!(decoded.chunk.estimated_tokens, chunk.estimated_tokens);
        assert_eq!(decoded.chunk.content, chunk.content);
        assert_eq!(decoded.chunk.embedding, chunk.embedding);
    }

    #[test]
    fn tombstone_preserves_trailing_bytes() {
        let chunk = sample_chunk();
        let encoded = encode_tombstone(&chunk, vec![1, 2, 3]);
        let decoded = decode(&encoded).unwrap();
        assert!(decoded.deleted);
        assert_eq!(decoded.trailing, vec![1, 2, 3]);
    }

    #[test]
    fn rejects_unknown_version_byte() {
        let mut bytes = encode(&sample_chunk());
        bytes[0] = 2;
        assert!(decode(&bytes).is_err());
    }
}
