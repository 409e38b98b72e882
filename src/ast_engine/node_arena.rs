//! Stable integer handles for syntax nodes.
//!
//! Tree-sitter nodes are borrowed views into a tree; their internal ids are an
//! implementation detail of the engine. The arena hands out a dense
//! [`NodeHandle`] the first time a node is seen, keyed by its byte span and
//! kind, so the rest of the extractor can use handles as map keys.

use std::collections::HashMap;

use serde::Serialize;
use tree_sitter::Node;

/// Dense identifier for a node within one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    start_byte: usize,
    end_byte: usize,
    kind_id: u16,
}

impl NodeKey {
    fn of(node: &Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            kind_id: node.kind_id(),
        }
    }
}

/// Arena of visited nodes. One arena per extraction; never shared.
#[derive(Debug, Default)]
pub struct NodeArena {
    handles: HashMap<NodeKey, NodeHandle>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node's handle, assigning the next one on first visit.
    pub fn intern(&mut self, node: &Node) -> NodeHandle {
        let next = NodeHandle(self.handles.len() as u32);
        *self.handles.entry(NodeKey::of(node)).or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
