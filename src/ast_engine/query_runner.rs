//! Thin adapter over tree-sitter queries.
//!
//! A [`QueryRunner`] owns one compiled pattern and yields `(label, node)`
//! captures for a scope node. The sequence is lazy and borrows the caller's
//! [`QueryCursor`]; run the query again for a fresh pass. Captures from
//! different alternatives are not guaranteed to come back in source order.

use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::error::{ExtractError, PatternKind, Result};

/// One node matched by a pattern, tagged with its capture label.
#[derive(Debug, Clone, Copy)]
pub struct Capture<'q, 'tree> {
    pub label: &'q str,
    pub node: Node<'tree>,
}

/// A compiled structural pattern.
#[derive(Debug)]
pub struct QueryRunner {
    kind: PatternKind,
    query: Query,
}

impl QueryRunner {
    /// Compile `pattern` against `grammar`.
    pub fn compile(grammar: &Language, kind: PatternKind, pattern: &str) -> Result<Self> {
        let query = Query::new(grammar, pattern).map_err(|e| ExtractError::QueryFailure {
            pattern: kind,
            message: format!("row {}, column {}: {}", e.row + 1, e.column, e.message),
        })?;

        Ok(Self { kind, query })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Every capture of the pattern anywhere under `scope`.
    pub fn run<'q, 'tree: 'q>(
        &'q self,
        cursor: &'q mut QueryCursor,
        scope: Node<'tree>,
        source: &'q [u8],
    ) -> impl Iterator<Item = Capture<'q, 'tree>> + 'q {
        cursor.set_max_start_depth(None);
        self.captures(cursor, scope, source)
    }

    /// Captures of matches whose root is `scope` itself.
    ///
    /// Comments nested deeper inside `scope` (say, in a function body) are
    /// not reported.
    pub fn run_anchored<'q, 'tree: 'q>(
        &'q self,
        cursor: &'q mut QueryCursor,
        scope: Node<'tree>,
        source: &'q [u8],
    ) -> impl Iterator<Item = Capture<'q, 'tree>> + 'q {
        cursor.set_max_start_depth(Some(0));
        self.captures(cursor, scope, source)
    }

    /// Captures grouped per match, for patterns that pair several labels.
    pub fn run_matches<'q, 'tree: 'q>(
        &'q self,
        cursor: &'q mut QueryCursor,
        scope: Node<'tree>,
        source: &'q [u8],
    ) -> impl Iterator<Item = Vec<Capture<'q, 'tree>>> + 'q {
        cursor.set_max_start_depth(None);
        let names = self.query.capture_names();
        cursor.matches(&self.query, scope, source).map(move |m| {
            m.captures
                .iter()
                .map(|c| Capture {
                    label: &names[c.index as usize],
                    node: c.node,
                })
                .collect()
        })
    }

    fn captures<'q, 'tree: 'q>(
        &'q self,
        cursor: &'q mut QueryCursor,
        scope: Node<'tree>,
        source: &'q [u8],
    ) -> impl Iterator<Item = Capture<'q, 'tree>> + 'q {
        let names = self.query.capture_names();
        cursor
            .matches(&self.query, scope, source)
            .flat_map(move |m| {
                let captures = m.captures;
                captures.iter().map(move |c| Capture {
                    label: &names[c.index as usize],
                    node: c.node,
                })
            })
    }
}

/// Sort captures into source order.
pub fn sort_by_position(captures: &mut [Capture<'_, '_>]) {
    captures.sort_by_key(|c| (c.node.start_byte(), c.node.end_byte()));
}
