//! Index structures.
//!
//! - [`btree`] - in-memory B+Tree keyed by any totally ordered type

pub mod btree;

pub use btree::{BPlusTree, InsertOutcome};
