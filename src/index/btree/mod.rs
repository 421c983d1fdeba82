//! B+Tree index implementation.
//!
//! - [`BPlusTree`] - ordered map with eager splits and borrow/merge deletes
//! - [`TreeView`] / [`NodeView`] - read-only structure for renderers
//!
//! Nodes live in an arena owned by the tree; leaves are chained left to
//! right so full scans and range scans never revisit internal nodes.

mod node;
mod tree;
mod view;

pub use tree::{BPlusTree, InsertOutcome, Iter, Range};
pub use view::{NodeView, NodeViewKind, TreeView};
