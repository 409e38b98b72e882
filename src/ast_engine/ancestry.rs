//! Ancestry resolution: which known type, if any, encloses a declaration.

use std::cmp::Reverse;

use tree_sitter::Node;

use crate::ast_engine::node_arena::NodeHandle;

/// A discovered type declaration that may enclose other declarations.
#[derive(Debug, Clone)]
pub struct TypeScope<'tree> {
    pub handle: NodeHandle,
    pub name: String,
    pub node: Node<'tree>,
}

/// True iff `candidate` is a proper ancestor of `node`.
pub fn is_descendant(node: Node, candidate: Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent == candidate {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// First candidate, in the given order, that encloses `node`.
pub fn resolve_enclosing_type<'a, 'tree>(
    node: Node<'tree>,
    candidates: &'a [TypeScope<'tree>],
) -> Option<&'a TypeScope<'tree>> {
    candidates
        .iter()
        .find(|scope| is_descendant(node, scope.node))
}

/// Resolves declarations to their nearest enclosing type.
///
/// Candidates are kept innermost-first (latest start byte first, shortest
/// span on ties), so the first match in [`resolve_enclosing_type`] is always
/// the nearest ancestor regardless of the order the query reported types in.
#[derive(Debug, Clone, Default)]
pub struct AncestryResolver<'tree> {
    candidates: Vec<TypeScope<'tree>>,
}

impl<'tree> AncestryResolver<'tree> {
    pub fn new(scopes: &[TypeScope<'tree>]) -> Self {
        let mut candidates = scopes.to_vec();
        candidates.sort_by_key(|scope| (Reverse(scope.node.start_byte()), scope.node.end_byte()));
        Self { candidates }
    }

    pub fn resolve(&self, node: Node<'tree>) -> Option<&TypeScope<'tree>> {
        resolve_enclosing_type(node, &self.candidates)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
