//! Node identifier type.

use std::fmt;

/// Identifies a node in a B+Tree's node arena.
///
/// Using `usize` because:
/// 1. Nodes are stored in `Vec<Node>`
/// 2. Direct indexing without casting: `nodes[node_id.0]`
/// 3. Leaf links can be copied freely without borrowing the target node
///
/// An id is only meaningful for the tree that handed it out, and only until
/// that tree is next mutated (merged nodes are recycled).
///
/// # Example
/// ```
/// use arbordb::NodeId;
///
/// let node_id = NodeId::new(5);
/// assert!(node_id.is_valid());
/// assert!(!NodeId::INVALID.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Invalid/sentinel node ID.
    ///
    /// Used to represent "no node" or uninitialized state.
    pub const INVALID: NodeId = NodeId(usize::MAX);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }

    /// Check if this node ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Node(INVALID)")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}
