//! Static keyword/regex tables backing intent classification, entity
//! extraction, and scope detection (spec §4.3).

use regex::Regex;
use std::sync::LazyLock;

pub const BUG_FIX_CUES: &[&str] = &["bug", "fix", "broken", "crash", "error", "fails", "failing"];
pub const TEST_CUES: &[&str] = &["test", "unit test", "spec", "coverage", "assert"];
pub const REFACTOR_CUES: &[&str] = &["refactor", "clean up", "simplify", "restructure", "rename"];
pub const FEATURE_ADD_CUES: &[&str] =
    &["add", "implement", "new feature", "support for", "introduce"];
pub const EXPLAIN_CUES: &[&str] = &["explain", "how does", "what does", "understand", "walk me through"];
pub const SEARCH_CUES: &[&str] = &["find", "search", "locate", "where is", "look for"];

pub const SCOPE_CURRENT_FILE: &[&str] = &["this file", "current file"];
pub const SCOPE_CURRENT_DIR: &[&str] = &["directory", "folder", "module"];
pub const SCOPE_PROJECT: &[&str] = &["project", "codebase", "everywhere", "whole repo", "entire repo"];

pub const ANAPHORA: &[&str] = &["it", "that", "also", "as well"];

pub const KEYWORD_LIST: &[&str] = &[
    "function", "class", "method", "variable", "interface", "module", "api", "endpoint",
    "database", "schema", "config", "dependency", "import", "async", "error",
];

pub static FILE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w/]+\.[a-zA-Z]{1,4}\b").expect("valid file token regex"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_token_matches_relative_paths() {
        assert!(FILE_TOKEN.is_match("see src/lib.rs for details"));
        assert!(FILE_TOKEN.is_match("check config.yaml"));
    }
}
