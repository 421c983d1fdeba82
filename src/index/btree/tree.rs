//! In-memory B+Tree over an arena of nodes.
//!
//! The tree owns every node in a single `Vec`, addressed by [`NodeId`].
//! Internal nodes own their children by id; leaves hold a non-owning `next`
//! id forming the ascending scan chain. Nothing points from a child back to
//! its parent: mutations walk down from the root and remember the path.
//!
//! # Routing
//! At an internal node with separators `k_0 < k_1 < ...`, a key descends
//! into child `i` where `i` is the number of separators `<= key`. Every key
//! in child `i` is `< k_i` and every key in child `i + 1` is `>= k_i`.
//! Insert, lookup, delete and range scans all route the same way.
//!
//! # Capacity
//! For degree `d`, every non-root node holds `d - 1 ..= 2d - 1` keys.
//! Inserts split full nodes eagerly on the way down; deletes repair
//! underflow on the way back up by borrowing from a sibling or merging.

use std::cmp::Ordering;
use std::mem;

use tracing::debug;

use crate::common::config::{DEFAULT_DEGREE, MIN_DEGREE};
use crate::common::NodeId;
use crate::index::btree::node::{Node, NodeBody};
use crate::index::btree::view::TreeView;

/// Result of [`BPlusTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new; the tree grew by one entry.
    Inserted,
    /// The key already existed; its value was overwritten in place.
    Updated,
}

/// An ordered map backed by a B+Tree.
///
/// # Example
/// ```
/// use arbordb::{BPlusTree, InsertOutcome};
///
/// let mut tree = BPlusTree::new(3);
/// assert_eq!(tree.insert(10, "ten"), InsertOutcome::Inserted);
/// assert_eq!(tree.insert(10, "TEN"), InsertOutcome::Updated);
/// assert_eq!(tree.get(&10), Some(&"TEN"));
/// assert!(tree.delete(&10));
/// assert!(!tree.search(&10));
/// ```
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    /// Node arena. Released slots hold an empty leaf and sit on `free`.
    nodes: Vec<Node<K, V>>,

    /// Released arena slots available for reuse.
    free: Vec<NodeId>,

    root: NodeId,

    degree: usize,

    /// Number of key/value pairs stored.
    len: usize,
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Create an empty tree of the given degree.
    ///
    /// # Panics
    /// Panics if `degree < 2`.
    pub fn new(degree: usize) -> Self {
        assert!(degree >= MIN_DEGREE, "degree must be >= {}", MIN_DEGREE);

        Self {
            nodes: vec![Node::empty_leaf()],
            free: Vec::new(),
            root: NodeId::new(0),
            degree,
            len: 0,
        }
    }

    /// Create an empty tree with [`DEFAULT_DEGREE`].
    pub fn with_default_degree() -> Self {
        Self::new(DEFAULT_DEGREE)
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Minimum keys in a non-root node (`d - 1`).
    #[inline]
    pub fn min_keys(&self) -> usize {
        self.degree - 1
    }

    /// Maximum keys in any node (`2d - 1`).
    #[inline]
    pub fn max_keys(&self) -> usize {
        2 * self.degree - 1
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, counting the root. An empty tree has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Some(&first) = self.node(current).children().first() {
            current = first;
            height += 1;
        }
        height
    }

    /// Remove every entry, keeping the degree.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.nodes.push(Node::empty_leaf());
        self.root = NodeId::new(0);
        self.len = 0;
    }

    /// Read-only structural access for renderers and diagnostics.
    pub fn view(&self) -> TreeView<'_, K, V> {
        TreeView::new(self)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Return `true` if `key` is present.
    pub fn search(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf = self.find_leaf(key)?;
        let node = self.node(leaf);
        let pos = node.keys.binary_search(key).ok()?;
        node.values().get(pos)
    }

    /// Overwrite the value stored under `key`.
    ///
    /// Returns `false` (and drops `value`) if the key is absent. Never
    /// changes the tree's shape.
    pub fn update(&mut self, key: &K, value: V) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Mutable access to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let leaf = self.find_leaf(key)?;
        let node = self.node_mut(leaf);
        let pos = node.keys.binary_search(key).ok()?;
        node.values_mut().get_mut(pos)
    }

    /// Ascending iterator over every entry, following the leaf chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            leaf: Some(self.leftmost_leaf()),
            pos: 0,
        }
    }

    /// Ascending iterator over entries with `start <= key <= end`.
    ///
    /// Yields nothing if `start > end`.
    pub fn range(&self, start: &K, end: &K) -> Range<'_, K, V> {
        let (leaf, pos) = if start > end {
            (None, 0)
        } else {
            match self.find_leaf(start) {
                Some(id) => {
                    let pos = self.node(id).keys.partition_point(|k| k < start);
                    (Some(id), pos)
                }
                None => (None, 0),
            }
        };

        Range {
            inner: Iter {
                tree: self,
                leaf,
                pos,
            },
            end: end.clone(),
        }
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert `value` under `key`, overwriting any existing value.
    ///
    /// A new key may split nodes along its path; an existing key is updated
    /// in place without structural change.
    pub fn insert(&mut self, key: K, value: V) -> InsertOutcome {
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
            return InsertOutcome::Updated;
        }

        if self.node(self.root).keys.len() == self.max_keys() {
            let old_root = self.root;
            self.root = self.alloc(Node::internal_over(old_root));
            self.split_child(self.root, 0);
            debug!(height = self.height(), "split root");
        }

        self.insert_non_full(key, value);
        self.len += 1;
        InsertOutcome::Inserted
    }

    /// Descend from the (non-full) root, splitting every full child before
    /// stepping into it, and place the entry in the leaf.
    fn insert_non_full(&mut self, key: K, value: V) {
        let mut current = self.root;
        loop {
            let node = self.node(current);
            if node.is_leaf() {
                let pos = node.keys.partition_point(|k| *k < key);
                let node = self.node_mut(current);
                node.keys.insert(pos, key);
                node.values_mut().insert(pos, value);
                return;
            }

            let mut idx = route(&node.keys, &key);
            let child = node.children()[idx];
            if self.node(child).keys.len() == self.max_keys() {
                self.split_child(current, idx);
                if key >= self.node(current).keys[idx] {
                    idx += 1;
                }
            }
            current = self.node(current).children()[idx];
        }
    }

    /// Split the full child at `idx` of `parent`, promoting its median.
    fn split_child(&mut self, parent: NodeId, idx: usize) {
        let child = self.node(parent).children()[idx];
        let (separator, right) = self.node_mut(child).split();
        let is_leaf = right.is_leaf();
        let right_id = self.alloc(right);

        if is_leaf {
            self.node_mut(child).set_next(Some(right_id));
        }

        let parent = self.node_mut(parent);
        parent.keys.insert(idx, separator);
        parent.children_mut().insert(idx + 1, right_id);
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove `key` and its value.
    ///
    /// Returns `false` and leaves the tree untouched if the key is absent.
    pub fn delete(&mut self, key: &K) -> bool {
        if !self.search(key) {
            return false;
        }

        // Walk down, remembering (internal node, child index) pairs.
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut current = self.root;
        while !self.node(current).is_leaf() {
            let node = self.node(current);
            let idx = route(&node.keys, key);
            path.push((current, idx));
            current = node.children()[idx];
        }

        let leaf = self.node_mut(current);
        if let Ok(pos) = leaf.keys.binary_search(key) {
            leaf.keys.remove(pos);
            leaf.values_mut().remove(pos);
        }
        self.len -= 1;

        // Repair underflow bottom-up.
        let min_keys = self.min_keys();
        for &(parent, idx) in path.iter().rev() {
            let child = self.node(parent).children()[idx];
            if self.node(child).keys.len() < min_keys {
                self.rebalance(parent, idx);
            }
        }

        let root = self.node(self.root);
        if root.keys.is_empty() && !root.is_leaf() {
            let only_child = root.children()[0];
            let old_root = mem::replace(&mut self.root, only_child);
            self.release(old_root);
            debug!(height = self.height(), "collapsed root");
        }

        self.refresh_separators(key);
        true
    }

    /// Replace any separator still equal to the deleted `key` with the
    /// smallest key of the subtree to its right, so separators stay copies
    /// of live leaf keys.
    fn refresh_separators(&mut self, key: &K) {
        let mut current = self.root;
        loop {
            let node = self.node(current);
            if node.is_leaf() {
                return;
            }

            let idx = route(&node.keys, key);
            let child = node.children()[idx];
            let stale = idx > 0 && node.keys[idx - 1] == *key;

            if stale {
                if let Some(successor) = self.first_key(child).cloned() {
                    self.node_mut(current).keys[idx - 1] = successor;
                }
            }
            current = child;
        }
    }

    /// Fix the underflowing child at `idx` of `parent`.
    ///
    /// Borrows from the left sibling, else the right sibling, else merges
    /// (a rightmost child merges into its left sibling; any other child
    /// absorbs its right sibling).
    fn rebalance(&mut self, parent: NodeId, idx: usize) {
        let min_keys = self.min_keys();
        let children = self.node(parent).children();
        let count = children.len();

        let left_rich = idx > 0 && self.node(children[idx - 1]).keys.len() > min_keys;
        let right_rich = idx + 1 < count && self.node(children[idx + 1]).keys.len() > min_keys;

        if left_rich {
            self.borrow_from_left(parent, idx);
        } else if right_rich {
            self.borrow_from_right(parent, idx);
        } else if idx + 1 == count {
            self.merge(parent, idx - 1);
        } else {
            self.merge(parent, idx);
        }
    }

    fn borrow_from_left(&mut self, parent: NodeId, idx: usize) {
        let left = self.node(parent).children()[idx - 1];
        let child = self.node(parent).children()[idx];

        if self.node(child).is_leaf() {
            let (key, value) = {
                let left = self.node_mut(left);
                let value = left.values_mut().pop();
                (left.keys.pop(), value)
            };
            if let (Some(key), Some(value)) = (key, value) {
                // The moved key is now the smallest key right of the separator.
                self.node_mut(parent).keys[idx - 1] = key.clone();
                let child = self.node_mut(child);
                child.keys.insert(0, key);
                child.values_mut().insert(0, value);
            }
        } else {
            let (key, grandchild) = {
                let left = self.node_mut(left);
                (left.keys.pop(), left.children_mut().pop())
            };
            if let (Some(key), Some(grandchild)) = (key, grandchild) {
                let separator = mem::replace(&mut self.node_mut(parent).keys[idx - 1], key);
                let child = self.node_mut(child);
                child.keys.insert(0, separator);
                child.children_mut().insert(0, grandchild);
            }
        }
    }

    fn borrow_from_right(&mut self, parent: NodeId, idx: usize) {
        let child = self.node(parent).children()[idx];
        let right = self.node(parent).children()[idx + 1];

        if self.node(child).is_leaf() {
            let (key, value, new_first) = {
                let right = self.node_mut(right);
                let key = right.keys.remove(0);
                let value = right.values_mut().remove(0);
                (key, value, right.keys[0].clone())
            };
            self.node_mut(parent).keys[idx] = new_first;
            let child = self.node_mut(child);
            child.keys.push(key);
            child.values_mut().push(value);
        } else {
            let (key, grandchild) = {
                let right = self.node_mut(right);
                (right.keys.remove(0), right.children_mut().remove(0))
            };
            let separator = mem::replace(&mut self.node_mut(parent).keys[idx], key);
            let child = self.node_mut(child);
            child.keys.push(separator);
            child.children_mut().push(grandchild);
        }
    }

    /// Merge child `idx + 1` of `parent` into child `idx`.
    fn merge(&mut self, parent: NodeId, idx: usize) {
        let (separator, left, right) = {
            let parent = self.node_mut(parent);
            let separator = parent.keys.remove(idx);
            let right = parent.children_mut().remove(idx + 1);
            (separator, parent.children()[idx], right)
        };

        let right = self.release(right);
        let left = self.node_mut(left);
        match right.body {
            NodeBody::Leaf { values, next } => {
                left.keys.extend(right.keys);
                left.values_mut().extend(values);
                left.set_next(next);
            }
            NodeBody::Internal { children } => {
                left.keys.push(separator);
                left.keys.extend(right.keys);
                left.children_mut().extend(children);
            }
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check every structural invariant.
    ///
    /// - key counts within `[d-1, 2d-1]` (root exempt from the minimum)
    /// - internal nodes have `keys + 1` children
    /// - keys strictly ascending and within the bounds set by ancestors
    /// - all leaves at the same depth
    /// - the leaf chain visits the leaves in tree order and nothing else
    /// - the entry count matches `len()`
    ///
    /// Diagnostics only; never called by mutating operations.
    pub fn validate(&self) -> bool {
        let mut leaves = Vec::new();
        let mut leaf_depth = None;
        if !self.validate_node(self.root, None, None, 0, &mut leaf_depth, &mut leaves) {
            return false;
        }

        // Leaf chain must match left-to-right tree order exactly.
        let mut chain = Vec::with_capacity(leaves.len());
        let mut cursor = leaves.first().copied();
        while let Some(id) = cursor {
            if chain.len() > leaves.len() {
                return false; // cycle
            }
            chain.push(id);
            cursor = self.node(id).next();
        }
        if chain != leaves {
            return false;
        }

        let total: usize = leaves.iter().map(|&id| self.node(id).keys.len()).sum();
        total == self.len
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<NodeId>,
    ) -> bool {
        let Some(node) = self.nodes.get(id.0) else {
            return false;
        };
        let count = node.keys.len();

        if count > self.max_keys() || (id != self.root && count < self.min_keys()) {
            return false;
        }
        if node.keys.windows(2).any(|w| w[0] >= w[1]) {
            return false;
        }
        if let (Some(lo), Some(first)) = (lower, node.keys.first()) {
            if first < lo {
                return false;
            }
        }
        if let (Some(hi), Some(last)) = (upper, node.keys.last()) {
            if last >= hi {
                return false;
            }
        }

        match &node.body {
            NodeBody::Leaf { values, .. } => {
                if values.len() != count {
                    return false;
                }
                match *leaf_depth {
                    Some(expected) if expected != depth => return false,
                    Some(_) => {}
                    None => *leaf_depth = Some(depth),
                }
                leaves.push(id);
                true
            }
            NodeBody::Internal { children } => {
                if children.len() != count + 1 {
                    return false;
                }
                children.iter().enumerate().all(|(i, &child)| {
                    let lo = if i == 0 { lower } else { Some(&node.keys[i - 1]) };
                    let hi = if i == count { upper } else { Some(&node.keys[i]) };
                    self.validate_node(child, lo, hi, depth + 1, leaf_depth, leaves)
                })
            }
        }
    }

    // ========================================================================
    // Arena helpers
    // ========================================================================

    #[inline]
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.0]
    }

    /// Whether `id` names a live (reachable or reachable-once) arena slot.
    pub(crate) fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len() && !self.free.contains(&id)
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId::new(self.nodes.len() - 1)
            }
        }
    }

    /// Take a node out of the arena and recycle its slot.
    fn release(&mut self, id: NodeId) -> Node<K, V> {
        self.free.push(id);
        mem::replace(&mut self.nodes[id.0], Node::empty_leaf())
    }

    /// Leaf whose key range covers `key`.
    ///
    /// Returns `None` instead of panicking if a child index falls outside
    /// the child list.
    fn find_leaf(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        loop {
            let node = self.node(current);
            if node.is_leaf() {
                return Some(current);
            }
            let idx = route(&node.keys, key);
            current = *node.children().get(idx)?;
        }
    }

    fn leftmost_leaf(&self) -> NodeId {
        let mut current = self.root;
        while let Some(&first) = self.node(current).children().first() {
            current = first;
        }
        current
    }

    /// Smallest key stored under `id`.
    fn first_key(&self, id: NodeId) -> Option<&K> {
        let mut current = id;
        while let Some(&first) = self.node(current).children().first() {
            current = first;
        }
        self.node(current).keys.first()
    }
}

impl<K: Ord + Clone, V: Clone> BPlusTree<K, V> {
    /// Every entry whose key lies in `start ..= end`, ascending.
    ///
    /// Descends once to the leaf covering `start`, then walks the leaf chain
    /// and stops at the first key past `end`.
    pub fn range_query(&self, start: &K, end: &K) -> Vec<(K, V)> {
        self.range(start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Every entry, ascending.
    pub fn get_all(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: Ord + Clone, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::with_default_degree()
    }
}

/// Child index for `key`: the number of separators `<= key`.
#[inline]
fn route<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.partition_point(|k| k.cmp(key) != Ordering::Greater)
}

// ============================================================================
// Iterators
// ============================================================================

/// Ascending iterator over a [`BPlusTree`], created by [`BPlusTree::iter`].
pub struct Iter<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
    leaf: Option<NodeId>,
    pos: usize,
}

impl<'a, K: Ord + Clone, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let node = tree.node(self.leaf?);
            if self.pos < node.keys.len() {
                let item = (&node.keys[self.pos], &node.values()[self.pos]);
                self.pos += 1;
                return Some(item);
            }
            self.leaf = node.next();
            self.pos = 0;
        }
    }
}

/// Bounded ascending iterator, created by [`BPlusTree::range`].
pub struct Range<'a, K, V> {
    inner: Iter<'a, K, V>,
    end: K,
}

impl<'a, K: Ord + Clone, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.next()?;
        if *key > self.end {
            self.inner.leaf = None;
            return None;
        }
        Some((key, value))
    }
}
