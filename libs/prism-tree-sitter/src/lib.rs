//! Low-level AST declaration extraction, split out of the main crate the
//! way the teacher's own in-progress workspace split intended: this crate
//! owns grammar registration and tree-walking, the main crate's indexer
//! owns chunk identity and gap-splitting.

pub mod grammars;
pub mod processor;

pub use processor::{
    processor_for, supported_languages, DeclKind, Declaration, LanguageProcessor, ParseOutcome,
};
