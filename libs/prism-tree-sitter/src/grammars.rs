//! Static per-language grammar tables: which node kinds are declarations,
//! which are containers (so a nested function becomes a `Method` instead of
//! a `Function`), and which are import/use/require nodes.
//!
//! This is the plain static factory table the spec's Open Question (b)
//! asks for, in place of the source's recursive import-then-instantiate
//! barrel pattern.

use crate::processor::DeclKind;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One declaration-shaped node kind for a grammar.
pub struct DeclRule {
    pub node_kind: &'static str,
    /// Field name holding the identifier node, tried first.
    pub name_field: &'static str,
    pub kind: DeclKind,
}

/// Everything the indexer needs to know about one tree-sitter grammar.
pub struct GrammarSpec {
    pub language_fn: fn() -> tree_sitter::Language,
    pub decl_rules: &'static [DeclRule],
    /// Node kinds whose descendant function/method declarations should be
    /// classified as `Method` rather than `Function`.
    pub container_kinds: &'static [&'static str],
    /// Node kinds representing import/use/require statements.
    pub import_kinds: &'static [&'static str],
    /// Node kinds treated as identifier leaves when collecting `symbols`.
    pub identifier_kinds: &'static [&'static str],
}

const RUST_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_item", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "struct_item", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "enum_item", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "trait_item", name_field: "name", kind: DeclKind::Interface },
];
const RUST_CONTAINERS: &[&str] = &["impl_item", "trait_item"];
const RUST_IMPORTS: &[&str] = &["use_declaration"];

const PYTHON_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_definition", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class_definition", name_field: "name", kind: DeclKind::Class },
];
const PYTHON_CONTAINERS: &[&str] = &["class_definition"];
const PYTHON_IMPORTS: &[&str] = &["import_statement", "import_from_statement"];

const JS_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_declaration", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "method_definition", name_field: "name", kind: DeclKind::Method },
];
const JS_CONTAINERS: &[&str] = &["class_declaration", "class_body"];
const JS_IMPORTS: &[&str] = &["import_statement"];

const TS_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_declaration", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "method_definition", name_field: "name", kind: DeclKind::Method },
    DeclRule { node_kind: "interface_declaration", name_field: "name", kind: DeclKind::Interface },
];

const GO_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_declaration", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "method_declaration", name_field: "name", kind: DeclKind::Method },
];
const GO_IMPORTS: &[&str] = &["import_declaration", "import_spec"];

const JAVA_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "method_declaration", name_field: "name", kind: DeclKind::Method },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "interface_declaration", name_field: "name", kind: DeclKind::Interface },
];
const JAVA_CONTAINERS: &[&str] = &["class_body", "interface_body"];
const JAVA_IMPORTS: &[&str] = &["import_declaration"];

const C_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_definition", name_field: "declarator", kind: DeclKind::Function },
];
const C_IMPORTS: &[&str] = &["preproc_include"];

const CPP_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_definition", name_field: "declarator", kind: DeclKind::Function },
    DeclRule { node_kind: "class_specifier", name_field: "name", kind: DeclKind::Class },
];
const CPP_CONTAINERS: &[&str] = &["class_specifier", "field_declaration_list"];
const CPP_IMPORTS: &[&str] = &["preproc_include"];

const CSHARP_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "method_declaration", name_field: "name", kind: DeclKind::Method },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "interface_declaration", name_field: "name", kind: DeclKind::Interface },
];
const CSHARP_CONTAINERS: &[&str] = &["class_declaration", "interface_declaration"];
const CSHARP_IMPORTS: &[&str] = &["using_directive"];

const RUBY_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "method", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "module", name_field: "name", kind: DeclKind::Class },
];
const RUBY_CONTAINERS: &[&str] = &["class", "module"];
const RUBY_IMPORTS: &[&str] = &["call"]; // `require`/`require_relative` calls

const PHP_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_definition", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "method_declaration", name_field: "name", kind: DeclKind::Method },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "interface_declaration", name_field: "name", kind: DeclKind::Interface },
];
const PHP_CONTAINERS: &[&str] = &["class_declaration", "interface_declaration"];
const PHP_IMPORTS: &[&str] = &["namespace_use_declaration"];

const SWIFT_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_declaration", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
    DeclRule { node_kind: "protocol_declaration", name_field: "name", kind: DeclKind::Interface },
];
const SWIFT_CONTAINERS: &[&str] = &["class_declaration"];
const SWIFT_IMPORTS: &[&str] = &["import_declaration"];

const KOTLIN_DECLS: &[DeclRule] = &[
    DeclRule { node_kind: "function_declaration", name_field: "name", kind: DeclKind::Function },
    DeclRule { node_kind: "class_declaration", name_field: "name", kind: DeclKind::Class },
];
const KOTLIN_CONTAINERS: &[&str] = &["class_body"];
const KOTLIN_IMPORTS: &[&str] = &["import"];

const COMMON_IDENTIFIER_KINDS: &[&str] = &["identifier", "type_identifier", "field_identifier"];

/// Registry keyed by the spec's lowercase language tag.
pub static GRAMMARS: LazyLock<HashMap<&'static str, GrammarSpec>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "rust",
        GrammarSpec {
            language_fn: || tree_sitter_rust::LANGUAGE.into(),
            decl_rules: RUST_DECLS,
            container_kinds: RUST_CONTAINERS,
            import_kinds: RUST_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "python",
        GrammarSpec {
            language_fn: || tree_sitter_python::LANGUAGE.into(),
            decl_rules: PYTHON_DECLS,
            container_kinds: PYTHON_CONTAINERS,
            import_kinds: PYTHON_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "javascript",
        GrammarSpec {
            language_fn: || tree_sitter_javascript::LANGUAGE.into(),
            decl_rules: JS_DECLS,
            container_kinds: JS_CONTAINERS,
            import_kinds: JS_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "typescript",
        GrammarSpec {
            language_fn: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            decl_rules: TS_DECLS,
            container_kinds: JS_CONTAINERS,
            import_kinds: JS_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "go",
        GrammarSpec {
            language_fn: || tree_sitter_go::LANGUAGE.into(),
            decl_rules: GO_DECLS,
            container_kinds: &[],
            import_kinds: GO_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "java",
        GrammarSpec {
            language_fn: || tree_sitter_java::LANGUAGE.into(),
            decl_rules: JAVA_DECLS,
            container_kinds: JAVA_CONTAINERS,
            import_kinds: JAVA_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "c",
        GrammarSpec {
            language_fn: || tree_sitter_c::LANGUAGE.into(),
            decl_rules: C_DECLS,
            container_kinds: &[],
            import_kinds: C_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "cpp",
        GrammarSpec {
            language_fn: || tree_sitter_cpp::LANGUAGE.into(),
            decl_rules: CPP_DECLS,
            container_kinds: CPP_CONTAINERS,
            import_kinds: CPP_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "csharp",
        GrammarSpec {
            language_fn: || tree_sitter_c_sharp::LANGUAGE.into(),
            decl_rules: CSHARP_DECLS,
            container_kinds: CSHARP_CONTAINERS,
            import_kinds: CSHARP_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "ruby",
        GrammarSpec {
            language_fn: || tree_sitter_ruby::LANGUAGE.into(),
            decl_rules: RUBY_DECLS,
            container_kinds: RUBY_CONTAINERS,
            import_kinds: RUBY_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "php",
        GrammarSpec {
            language_fn: || tree_sitter_php::LANGUAGE_PHP.into(),
            decl_rules: PHP_DECLS,
            container_kinds: PHP_CONTAINERS,
            import_kinds: PHP_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "swift",
        GrammarSpec {
            language_fn: || tree_sitter_swift::LANGUAGE.into(),
            decl_rules: SWIFT_DECLS,
            container_kinds: SWIFT_CONTAINERS,
            import_kinds: SWIFT_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m.insert(
        "kotlin",
        GrammarSpec {
            language_fn: || tree_sitter_kotlin_ng::LANGUAGE.into(),
            decl_rules: KOTLIN_DECLS,
            container_kinds: KOTLIN_CONTAINERS,
            import_kinds: KOTLIN_IMPORTS,
            identifier_kinds: COMMON_IDENTIFIER_KINDS,
        },
    );
    m
});
