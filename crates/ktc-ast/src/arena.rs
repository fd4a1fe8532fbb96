//! Node arena for AST storage.

use crate::node::{Node, NodeIndex, NodeKind};
use ktc_common::Span;
use serde::{Deserialize, Serialize};

/// Arena-based storage for AST nodes.
/// Nodes are stored contiguously and referenced by index.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its index.
    ///
    /// Children must already be in the arena; their parent links are set to
    /// the new node.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        for child in kind.children() {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = index;
            }
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: NodeIndex::NONE,
        });
        index
    }

    /// Recompute every parent link from the child lists.
    ///
    /// Needed after deserialization, where parent links are not stored.
    pub fn link_parents(&mut self) {
        for node in &mut self.nodes {
            node.parent = NodeIndex::NONE;
        }
        for index in 0..self.nodes.len() {
            let children = self.nodes[index].kind.children();
            for child in children {
                if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                    node.parent = NodeIndex(index as u32);
                }
            }
        }
    }

    /// Get a node by index
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    pub fn kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.get(index).map(|n| &n.kind)
    }

    /// Span of a node, or an empty span for invalid indices.
    pub fn span(&self, index: NodeIndex) -> Span {
        self.get(index).map(|n| n.span).unwrap_or_default()
    }

    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |n| n.parent)
    }

    /// Strict ancestors of `index`, nearest first.
    pub fn ancestors(&self, index: NodeIndex) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            current: self.parent(index),
        }
    }

    /// Nearest ancestor (or the node itself) that is a declaration.
    pub fn containing_declaration(&self, index: NodeIndex) -> NodeIndex {
        let mut current = index;
        while let Some(node) = self.get(current) {
            if node.kind.is_declaration() {
                return current;
            }
            current = node.parent;
        }
        NodeIndex::NONE
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct Ancestors<'a> {
    arena: &'a NodeArena,
    current: NodeIndex,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if self.current.is_none() {
            return None;
        }
        let result = self.current;
        self.current = self.arena.parent(result);
        Some(result)
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod tests;
