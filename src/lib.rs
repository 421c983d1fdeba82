//! ArborDB - an embedded table store indexed by an in-memory B+Tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            ArborDB                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │          Session (session.rs)  [optional]               │   │
//! │  │     SharedDatabase = Arc<RwLock<Database>> handle        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Database (database.rs)                      │   │
//! │  │       create/drop tables, persist/load directory         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Table Layer (table/)                     │   │
//! │  │     Schema checks, primary-key uniqueness, snapshots     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Index Layer (index/)                      │   │
//! │  │   BPlusTree: arena nodes, linked leaves, borrow/merge    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             Storage Layer (storage/)                     │   │
//! │  │   DatabaseDir + table artifacts (CRC32 header + JSON)    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`index`] - The B+Tree index
//! - [`table`] - Values, schemas and tables
//! - [`storage`] - Artifact format and database directories
//! - [`database`] - The table catalog
//! - [`session`] - Shared handle for multi-caller front ends
//!
//! # Quick Start
//! ```no_run
//! use arbordb::{record, Database, Schema, Value};
//!
//! let mut db = Database::new("my_database")?;
//! db.load();
//!
//! let schema = Schema::parse("id:int,name:str", "id")?;
//! db.create_table("people", schema.columns().clone(), schema.primary_key())?;
//!
//! let people = db.get_table_mut("people").unwrap();
//! people.insert(record([("id", Value::from(1)), ("name", Value::from("ada"))]))?;
//! assert!(people.select(&Value::from(1)).is_some());
//!
//! db.persist()?;
//! # Ok::<(), arbordb::Error>(())
//! ```

pub mod common;
pub mod database;
pub mod index;
pub mod session;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::config::DEFAULT_DEGREE;
pub use common::{DatabaseConfig, Error, NodeId, Result};

pub use database::Database;
pub use index::btree::{NodeView, NodeViewKind, TreeView};
pub use index::{BPlusTree, InsertOutcome};
pub use session::SharedDatabase;
pub use table::{record, ColumnType, Record, Schema, Table, Value};
