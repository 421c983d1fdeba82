//! Read-only structural view of a [`BPlusTree`].
//!
//! Diagram renderers need node identity, keys, children and leaf links, but
//! must never reshape the tree. A [`TreeView`] borrows the tree immutably, so
//! every [`NodeId`] it hands out stays valid for as long as the view lives.

use crate::common::NodeId;
use crate::index::btree::node::{Node, NodeBody};
use crate::index::btree::BPlusTree;

/// Borrowed, read-only window onto a tree's structure.
pub struct TreeView<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
}

/// What kind of node a [`NodeView`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeViewKind<'a> {
    /// Leaf with its forward link to the next leaf (if any).
    Leaf { next: Option<NodeId> },
    /// Internal node with its ordered child ids.
    Internal { children: &'a [NodeId] },
}

/// One node as seen through a [`TreeView`].
pub struct NodeView<'a, K, V> {
    id: NodeId,
    node: &'a Node<K, V>,
}

impl<'a, K: Ord + Clone, V> TreeView<'a, K, V> {
    pub(crate) fn new(tree: &'a BPlusTree<K, V>) -> Self {
        Self { tree }
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<NodeView<'a, K, V>> {
        if !self.tree.contains_node(id) {
            return None;
        }
        Some(NodeView {
            id,
            node: self.tree.node(id),
        })
    }

    /// Every node reachable from the root, level by level, left to right.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.levels().into_iter().flatten().collect()
    }

    /// Node ids grouped by depth; `levels()[0]` is `[root]`.
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let mut levels = vec![vec![self.root()]];
        loop {
            let next: Vec<NodeId> = levels[levels.len() - 1]
                .iter()
                .flat_map(|&id| self.tree.node(id).children().iter().copied())
                .collect();
            if next.is_empty() {
                return levels;
            }
            levels.push(next);
        }
    }

    /// Leaf ids in chain order, starting from the leftmost leaf.
    pub fn leaf_chain(&self) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.levels().last().and_then(|leaves| leaves.first().copied());
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self.tree.node(id).next();
        }
        chain
    }
}

impl<'a, K, V> NodeView<'a, K, V> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn keys(&self) -> &'a [K] {
        &self.node.keys
    }

    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    pub fn kind(&self) -> NodeViewKind<'a> {
        match &self.node.body {
            NodeBody::Leaf { next, .. } => NodeViewKind::Leaf { next: *next },
            NodeBody::Internal { children } => NodeViewKind::Internal { children },
        }
    }

    /// Child ids; empty for a leaf.
    pub fn children(&self) -> &'a [NodeId] {
        self.node.children()
    }

    /// Forward link; `None` for internal nodes and the last leaf.
    pub fn next(&self) -> Option<NodeId> {
        self.node.next()
    }
}
