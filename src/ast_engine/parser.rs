//! Tree-sitter grammar lookup and parsing.
//!
//! Parsing is the only step that can fail a whole file: a missing grammar or
//! a parser that returns no tree. Trees containing ERROR or MISSING nodes are
//! still usable; their locations are reported separately.

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::ast_engine::languages::LanguageId;
use crate::error::{ExtractError, Result};

/// Get the tree-sitter grammar for a language.
pub fn grammar(language: LanguageId) -> Language {
    match language {
        LanguageId::Java => tree_sitter_java::language(),
        LanguageId::Python => tree_sitter_python::language(),
        LanguageId::Rust => tree_sitter_rust::language(),
        LanguageId::JavaScript => tree_sitter_javascript::language(),
        LanguageId::TypeScript => tree_sitter_typescript::language_typescript(),
        LanguageId::Go => tree_sitter_go::language(),
        LanguageId::Ruby => tree_sitter_ruby::language(),
    }
}

/// Parse raw source bytes into a syntax tree.
///
/// A fresh [`Parser`] is created per call since parsers are not shareable
/// between threads.
pub fn parse(source: &[u8], language: LanguageId) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar(language))
        .map_err(|e| ExtractError::ParseFailure {
            language: language.to_string(),
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractError::ParseFailure {
            language: language.to_string(),
            message: "parser produced no tree".to_string(),
        })?;

    debug!(
        %language,
        bytes = source.len(),
        has_errors = tree.root_node().has_error(),
        "Parsed source"
    );

    Ok(tree)
}

/// Collect the positions of ERROR and MISSING nodes in the tree.
pub fn parse_errors(tree: &Tree) -> Vec<String> {
    let mut errors = Vec::new();

    fn visit_for_errors(node: Node, errors: &mut Vec<String>) {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            errors.push(format!(
                "Parse error at line {}, column {}",
                pos.row + 1,
                pos.column
            ));
            return;
        }

        if !node.has_error() {
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            visit_for_errors(child, errors);
        }
    }

    visit_for_errors(tree.root_node(), &mut errors);
    errors
}
