//! B+Tree node layout.
//!
//! A [`Node`] is plain data: a sorted key vector plus a [`NodeBody`] that is
//! either a leaf (values + forward link) or an internal node (child ids).
//! All structural behaviour lives in [`BPlusTree`](super::BPlusTree).
//!
//! # Layout
//! ```text
//! Internal:  keys:      [ k0 | k1 | k2 ]
//!            children: [c0 | c1 | c2 | c3]      c_i < k_i <= c_{i+1}
//!
//! Leaf:      keys:   [ k0 | k1 | k2 ]
//!            values: [ v0 | v1 | v2 ]  ──next──▶ next leaf
//! ```

use crate::common::NodeId;

/// Payload of a node, tagged by kind.
#[derive(Debug, Clone)]
pub(crate) enum NodeBody<V> {
    /// Leaf: one value per key, plus a non-owning link to the next leaf.
    Leaf {
        values: Vec<V>,
        next: Option<NodeId>,
    },
    /// Internal: `keys.len() + 1` owned children.
    Internal { children: Vec<NodeId> },
}

/// A node in the tree arena.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) keys: Vec<K>,
    pub(crate) body: NodeBody<V>,
}

impl<K, V> Node<K, V> {
    /// An empty leaf with no successor.
    pub(crate) fn empty_leaf() -> Self {
        Self {
            keys: Vec::new(),
            body: NodeBody::Leaf {
                values: Vec::new(),
                next: None,
            },
        }
    }

    /// An internal node with no separators and a single child.
    ///
    /// Only valid transiently, while the root is being split.
    pub(crate) fn internal_over(child: NodeId) -> Self {
        Self {
            keys: Vec::new(),
            body: NodeBody::Internal {
                children: vec![child],
            },
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    /// Child ids; empty for a leaf.
    #[inline]
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.body {
            NodeBody::Internal { children } => children,
            NodeBody::Leaf { .. } => &[],
        }
    }

    /// Values; empty for an internal node.
    #[inline]
    pub(crate) fn values(&self) -> &[V] {
        match &self.body {
            NodeBody::Leaf { values, .. } => values,
            NodeBody::Internal { .. } => &[],
        }
    }

    /// Forward leaf link; always `None` for an internal node.
    #[inline]
    pub(crate) fn next(&self) -> Option<NodeId> {
        match &self.body {
            NodeBody::Leaf { next, .. } => *next,
            NodeBody::Internal { .. } => None,
        }
    }

    /// # Panics
    /// Panics if called on an internal node.
    pub(crate) fn set_next(&mut self, link: Option<NodeId>) {
        match &mut self.body {
            NodeBody::Leaf { next, .. } => *next = link,
            NodeBody::Internal { .. } => panic!("internal node has no leaf link"),
        }
    }

    /// # Panics
    /// Panics if called on a leaf.
    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.body {
            NodeBody::Internal { children } => children,
            NodeBody::Leaf { .. } => panic!("leaf node has no children"),
        }
    }

    /// # Panics
    /// Panics if called on an internal node.
    pub(crate) fn values_mut(&mut self) -> &mut Vec<V> {
        match &mut self.body {
            NodeBody::Leaf { values, .. } => values,
            NodeBody::Internal { .. } => panic!("internal node has no values"),
        }
    }
}

impl<K: Clone, V> Node<K, V> {
    /// Split this node around its median and return `(separator, right)`.
    ///
    /// With `m = keys.len() / 2`:
    /// - leaf: `right` takes keys/values `[m..]`; the separator is a copy of
    ///   `keys[m]`, which stays in `right` as its first key. `right` inherits
    ///   the old forward link; the caller must point `self` at `right`.
    /// - internal: `right` takes keys/children `[m+1..]`; `keys[m]` moves up
    ///   and is removed from both halves.
    pub(crate) fn split(&mut self) -> (K, Node<K, V>) {
        let m = self.keys.len() / 2;
        match &mut self.body {
            NodeBody::Leaf { values, next } => {
                let right_keys = self.keys.split_off(m);
                let separator = right_keys[0].clone();
                let right = Node {
                    keys: right_keys,
                    body: NodeBody::Leaf {
                        values: values.split_off(m),
                        next: next.take(),
                    },
                };
                (separator, right)
            }
            NodeBody::Internal { children } => {
                let right_keys = self.keys.split_off(m + 1);
                let separator = self
                    .keys
                    .pop()
                    .unwrap_or_else(|| unreachable!("split of an internal node with no keys"));
                let right = Node {
                    keys: right_keys,
                    body: NodeBody::Internal {
                        children: children.split_off(m + 1),
                    },
                };
                (separator, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[i32]) -> Node<i32, String> {
        Node {
            keys: keys.to_vec(),
            body: NodeBody::Leaf {
                values: keys.iter().map(|k| format!("v{}", k)).collect(),
                next: Some(NodeId::new(99)),
            },
        }
    }

    #[test]
    fn test_empty_leaf() {
        let node: Node<i32, ()> = Node::empty_leaf();
        assert!(node.is_leaf());
        assert!(node.keys.is_empty());
        assert!(node.children().is_empty());
        assert_eq!(node.next(), None);
    }

    #[test]
    fn test_leaf_split_keeps_median_on_right() {
        let mut left = leaf(&[1, 2, 3, 4, 5]);
        let (sep, right) = left.split();

        assert_eq!(sep, 3);
        assert_eq!(left.keys, vec![1, 2]);
        assert_eq!(right.keys, vec![3, 4, 5]);
        assert_eq!(right.values(), &["v3", "v4", "v5"]);
        // right inherits the old link, left is unlinked until the caller relinks it
        assert_eq!(right.next(), Some(NodeId::new(99)));
        assert_eq!(left.next(), None);
    }

    #[test]
    fn test_internal_split_promotes_median() {
        let mut node: Node<i32, ()> = Node {
            keys: vec![10, 20, 30, 40, 50],
            body: NodeBody::Internal {
                children: (0..6).map(NodeId::new).collect(),
            },
        };
        let (sep, right) = node.split();

        assert_eq!(sep, 30);
        assert_eq!(node.keys, vec![10, 20]);
        assert_eq!(node.children(), &[NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(right.keys, vec![40, 50]);
        assert_eq!(right.children(), &[NodeId(3), NodeId(4), NodeId(5)]);
    }

    #[test]
    #[should_panic(expected = "leaf node has no children")]
    fn test_children_mut_on_leaf_panics() {
        let mut node = leaf(&[1]);
        node.children_mut();
    }
}
