//! Per-language comment/string-delimiter tables, in the same static
//! factory-table idiom as `libs/prism-tree-sitter`'s `GrammarSpec` /
//! `LANGUAGE_CONFIGS` registry, generalized from chunking rules to
//! comment-stripping rules (spec §4.6).

use crate::types::Language;

/// Comment and docstring conventions for one language.
pub struct LanguageSyntax {
    /// Single-line comment prefix (e.g. `//`, `#`, `--`).
    pub line_comment: Option<&'static str>,
    /// Block comment delimiters (e.g. `/*`, `*/`).
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Docstring/triple-quoted-string delimiters, preserved at `light` and
    /// stripped at `medium`/`aggressive`.
    pub docstring: Option<(&'static str, &'static str)>,
    /// Whether brace-depth-based block detection applies (aggressive level).
    pub brace_delimited: bool,
}

pub fn syntax_for(language: Language) -> LanguageSyntax {
    match language {
        Language::Python => LanguageSyntax {
            line_comment: Some("#"),
            block_comment: None,
            docstring: Some(("\"\"\"", "\"\"\"")),
            brace_delimited: false,
        },
        Language::Ruby | Language::Shell => LanguageSyntax {
            line_comment: Some("#"),
            block_comment: None,
            docstring: None,
            brace_delimited: matches!(language, Language::Ruby),
        },
        Language::Yaml => LanguageSyntax {
            line_comment: Some("#"),
            block_comment: None,
            docstring: None,
            brace_delimited: false,
        },
        Language::Typescript
        | Language::Javascript
        | Language::Rust
        | Language::Go
        | Language::Java
        | Language::C
        | Language::Cpp
        | Language::Csharp
        | Language::Php
        | Language::Kotlin
        | Language::Swift => LanguageSyntax {
            line_comment: Some("//"),
            block_comment: Some(("/*", "*/")),
            docstring: None,
            brace_delimited: true,
        },
        Language::Json => LanguageSyntax {
            line_comment: None,
            block_comment: None,
            docstring: None,
            brace_delimited: true,
        },
        Language::Markdown | Language::Text => LanguageSyntax {
            line_comment: None,
            block_comment: None,
            docstring: None,
            brace_delimited: false,
        },
    }
}
