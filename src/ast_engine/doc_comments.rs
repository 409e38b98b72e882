//! Doc-comment resolution by backward sibling walk.
//!
//! Documentation is the contiguous run of comment nodes (or docstring
//! statements) right before a declaration. The walk starts at the
//! declaration's previous sibling and keeps going while each sibling either
//! matches the comment pattern or is a transparent kind for the language.
//! Anything else ends the run.
//!
//! Docstring languages additionally check the first statement of the
//! declaration body before walking backwards.

use tree_sitter::{Node, QueryCursor};

use crate::ast_engine::languages::{LanguageProfile, COMMENT_LABEL};
use crate::ast_engine::query_runner::{sort_by_position, QueryRunner};
use crate::error::{Diagnostic, ExtractError};
use crate::types::DocumentationBlock;

const BODY_FIELD: &str = "body";

/// Resolves documentation for declarations of one file.
pub struct DocCommentResolver<'a> {
    profile: &'a LanguageProfile,
    comments: Option<&'a QueryRunner>,
    source: &'a [u8],
}

impl<'a> DocCommentResolver<'a> {
    /// `comments` is `None` when the comment pattern failed to compile; every
    /// declaration then resolves to an empty block.
    pub fn new(
        profile: &'a LanguageProfile,
        comments: Option<&'a QueryRunner>,
        source: &'a [u8],
    ) -> Self {
        Self {
            profile,
            comments,
            source,
        }
    }

    pub fn resolve(&self, node: Node, diagnostics: &mut Vec<Diagnostic>) -> DocumentationBlock {
        let Some(comments) = self.comments else {
            return DocumentationBlock::default();
        };
        let mut cursor = QueryCursor::new();

        if let Some(docstring) = self.leading_docstring(comments, &mut cursor, node, diagnostics) {
            return docstring;
        }

        let start = match node.parent() {
            Some(parent) if self.profile.is_wrapper(parent.kind()) => parent,
            _ => node,
        };

        let mut reversed = Vec::new();
        let mut current = start.prev_sibling();
        let mut earliest = start;
        let mut exhausted = true;
        while let Some(sibling) = current {
            let fragments = self.comment_fragments(comments, &mut cursor, sibling, diagnostics);
            if let Some(fragments) = fragments {
                reversed.extend(fragments.into_iter().rev());
            } else if !self.profile.is_transparent(sibling) {
                exhausted = false;
                break;
            }
            earliest = sibling;
            current = sibling.prev_sibling();
        }

        // Comments above the first member of a body can sit before the body
        // node itself (Python blocks, Ruby body statements).
        if exhausted {
            if let Some(body) = enclosing_body(earliest) {
                let mut current = body.prev_sibling();
                while let Some(sibling) = current {
                    match self.comment_fragments(comments, &mut cursor, sibling, diagnostics) {
                        Some(fragments) => reversed.extend(fragments.into_iter().rev()),
                        None => break,
                    }
                    current = sibling.prev_sibling();
                }
            }
        }

        DocumentationBlock::from_reversed(reversed)
    }

    /// Docstring held by the first statement of the declaration body.
    fn leading_docstring(
        &self,
        comments: &QueryRunner,
        cursor: &mut QueryCursor,
        node: Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<DocumentationBlock> {
        let field = self.profile.docstring_field?;
        let first = node.child_by_field_name(field)?.named_child(0)?;
        if !self.profile.is_transparent(first) {
            return None;
        }

        self.comment_fragments(comments, cursor, first, diagnostics)
            .map(DocumentationBlock::new)
    }

    /// Comment text captured with `scope` as the match root, in source order.
    ///
    /// Returns `None` when nothing matched. A match whose text fails to decode
    /// still counts as a comment so the walk does not stop on it.
    fn comment_fragments(
        &self,
        comments: &QueryRunner,
        cursor: &mut QueryCursor,
        scope: Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Vec<String>> {
        let mut captures: Vec<_> = comments
            .run_anchored(cursor, scope, self.source)
            .filter(|c| c.label == COMMENT_LABEL)
            .collect();
        if captures.is_empty() {
            return None;
        }
        sort_by_position(&mut captures);

        // Captures nested in one statement (the pieces of an interpolated
        // docstring) form a single fragment spanning all of them.
        let spans: Vec<(usize, usize)> = if captures.iter().all(|c| c.node != scope) {
            let start = captures[0].node.start_byte();
            let end = captures.iter().map(|c| c.node.end_byte()).max().unwrap_or(start);
            vec![(start, end)]
        } else {
            captures
                .iter()
                .map(|c| (c.node.start_byte(), c.node.end_byte()))
                .collect()
        };

        let mut fragments = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match std::str::from_utf8(&self.source[start..end]) {
                Ok(text) => fragments.push(text.trim_end().to_string()),
                Err(_) => diagnostics.push(Diagnostic::from(ExtractError::DecodeFailure { start, end })),
            }
        }
        Some(fragments)
    }
}

/// The body node `node` opens, when `node` is the body's first child.
fn enclosing_body(node: Node) -> Option<Node> {
    if node.prev_sibling().is_some() {
        return None;
    }
    let body = node.parent()?;
    let owner = body.parent()?;
    (owner.child_by_field_name(BODY_FIELD) == Some(body)).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_engine::languages::{lookup, LanguageId};
    use crate::ast_engine::parser::{grammar, parse};
    use crate::error::{DiagnosticKind, PatternKind};
    use tree_sitter::Tree;

    fn find<'t>(tree: &'t Tree, kind: &str, nth: usize) -> Node<'t> {
        fn walk<'t>(node: Node<'t>, kind: &str, found: &mut Vec<Node<'t>>) {
            if node.kind() == kind {
                found.push(node);
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, kind, found);
            }
        }
        let mut found = Vec::new();
        walk(tree.root_node(), kind, &mut found);
        found[nth]
    }

    fn doc_for(language: LanguageId, source: &str, kind: &str, nth: usize) -> String {
        let profile = lookup(language).unwrap();
        let runner =
            QueryRunner::compile(&grammar(language), PatternKind::Comment, profile.comment_pattern)
                .unwrap();
        let tree = parse(source.as_bytes(), language).unwrap();
        let resolver = DocCommentResolver::new(profile, Some(&runner), source.as_bytes());
        let mut diagnostics = Vec::new();
        let text = resolver.resolve(find(&tree, kind, nth), &mut diagnostics).text();
        assert!(diagnostics.is_empty());
        text
    }

    #[test]
    fn test_contiguous_comments_in_order() {
        let source = "// first line\n// second line\nfn documented() {}\n";
        assert_eq!(
            doc_for(LanguageId::Rust, source, "function_item", 0),
            "// first line\n// second line"
        );
    }

    #[test]
    fn test_no_comment_is_empty() {
        let source = "fn a() {}\nfn b() {}\n";
        assert_eq!(doc_for(LanguageId::Rust, source, "function_item", 1), "");
    }

    #[test]
    fn test_unrelated_sibling_breaks_chain() {
        let source = "// about a\nfn a() {}\nfn b() {}\n";
        assert_eq!(doc_for(LanguageId::Rust, source, "function_item", 1), "");
    }

    #[test]
    fn test_comments_inside_previous_function_are_ignored() {
        let source = "fn a() {\n    // inside a\n}\nfn b() {}\n";
        assert_eq!(doc_for(LanguageId::Rust, source, "function_item", 1), "");
    }

    #[test]
    fn test_attributes_are_transparent() {
        let source = "/// Adds one.\n#[inline]\nfn inc(x: u32) -> u32 { x + 1 }\n";
        assert_eq!(
            doc_for(LanguageId::Rust, source, "function_item", 0),
            "/// Adds one."
        );
    }

    #[test]
    fn test_java_block_comment() {
        let source = "class A {\n    /** Returns one. */\n    int one() { return 1; }\n}\n";
        assert_eq!(
            doc_for(LanguageId::Java, source, "method_declaration", 0),
            "/** Returns one. */"
        );
    }

    #[test]
    fn test_python_body_docstring_inner_text() {
        let source = "def f():\n    \"\"\"Does things.\"\"\"\n    return 1\n";
        assert_eq!(
            doc_for(LanguageId::Python, source, "function_definition", 0),
            "Does things."
        );
    }

    #[test]
    fn test_python_preceding_comment_and_decorator() {
        let source = "# Cached lookup.\n@cache\ndef f():\n    return 1\n";
        assert_eq!(
            doc_for(LanguageId::Python, source, "function_definition", 0),
            "# Cached lookup."
        );
    }

    #[test]
    fn test_python_comment_above_first_method() {
        let source = "class A:\n    # Doc first.\n    # More.\n    def first(self):\n        pass\n";
        assert_eq!(
            doc_for(LanguageId::Python, source, "function_definition", 0),
            "# Doc first.\n# More."
        );
    }

    #[test]
    fn test_ruby_comment_above_first_method() {
        let source = "class A\n  # Doc first.\n  def first\n  end\n\n  # Doc second.\n  def second\n  end\nend\n";
        assert_eq!(doc_for(LanguageId::Ruby, source, "method", 0), "# Doc first.");
        assert_eq!(doc_for(LanguageId::Ruby, source, "method", 1), "# Doc second.");
    }

    #[test]
    fn test_first_method_without_comment_is_empty() {
        let source = "class A:\n    def first(self):\n        pass\n";
        assert_eq!(doc_for(LanguageId::Python, source, "function_definition", 0), "");
    }

    #[test]
    fn test_python_assignment_breaks_chain() {
        let source = "# About CONFIG\nCONFIG = {}\ndef f():\n    pass\n";
        assert_eq!(doc_for(LanguageId::Python, source, "function_definition", 0), "");
    }

    #[test]
    fn test_python_interpolated_docstring_is_one_fragment() {
        let source = "def f(x):\n    f\"\"\"Hi {x} there.\"\"\"\n    return x\n";
        assert_eq!(
            doc_for(LanguageId::Python, source, "function_definition", 0),
            "Hi {x} there."
        );
    }

    #[test]
    fn test_javascript_export_wrapper() {
        let source = "/** Sums values. */\nexport function sum(a, b) { return a + b; }\n";
        assert_eq!(
            doc_for(LanguageId::JavaScript, source, "function_declaration", 0),
            "/** Sums values. */"
        );
    }

    #[test]
    fn test_missing_comment_query_yields_empty() {
        let profile = lookup(LanguageId::Rust).unwrap();
        let source = "// doc\nfn a() {}\n";
        let tree = parse(source.as_bytes(), LanguageId::Rust).unwrap();
        let resolver = DocCommentResolver::new(profile, None, source.as_bytes());
        let mut diagnostics = Vec::new();
        let block = resolver.resolve(find(&tree, "function_item", 0), &mut diagnostics);
        assert!(block.is_empty());
    }

    #[test]
    fn test_undecodable_comment_is_skipped() {
        let profile = lookup(LanguageId::Python).unwrap();
        let runner = QueryRunner::compile(
            &grammar(LanguageId::Python),
            PatternKind::Comment,
            profile.comment_pattern,
        )
        .unwrap();
        let source: &[u8] = b"# ok\n# bad \xff\xfe\ndef a():\n    return 1\n";
        let tree = parse(source, LanguageId::Python).unwrap();
        let resolver = DocCommentResolver::new(profile, Some(&runner), source);
        let mut diagnostics = Vec::new();

        let block = resolver.resolve(find(&tree, "function_definition", 0), &mut diagnostics);
        assert_eq!(block.text(), "# ok");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DecodeFailure);
    }
}
