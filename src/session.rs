//! Shared database handle for request handlers and shells.
//!
//! The core types are single-threaded and lock-free. Front ends that serve
//! several callers thread a [`SharedDatabase`] through every call instead of
//! keeping a global "current database": whoever holds the handle has a
//! database selected, so there is no "nothing selected" state to check for.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::database::Database;
use crate::table::Table;

/// Cheaply clonable handle to one [`Database`].
///
/// # Thread Safety
/// - `read()`: shared access, any number of concurrent readers
/// - `write()`: exclusive access, serializes all mutations
///
/// Every clone refers to the same database. Keep guards short-lived; the
/// lock is held for as long as a guard is alive.
///
/// # Usage
/// ```no_run
/// use arbordb::{ColumnType, Database, SharedDatabase};
///
/// let db = SharedDatabase::new(Database::new("shop")?);
/// db.write().create_table("items", [("sku", ColumnType::Text)], "sku")?;
///
/// let rows = db.with_table("items", |t| t.len());
/// assert_eq!(rows, Some(0));
/// # Ok::<(), arbordb::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SharedDatabase {
    inner: Arc<RwLock<Database>>,
}

impl SharedDatabase {
    pub fn new(database: Database) -> Self {
        Self {
            inner: Arc::new(RwLock::new(database)),
        }
    }

    /// Shared access to the database.
    pub fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.inner.read()
    }

    /// Exclusive access to the database.
    pub fn write(&self) -> RwLockWriteGuard<'_, Database> {
        self.inner.write()
    }

    /// Run `f` against table `name` under a read lock.
    ///
    /// Returns `None` if the table does not exist.
    pub fn with_table<R>(&self, name: &str, f: impl FnOnce(&Table) -> R) -> Option<R> {
        let db = self.inner.read();
        db.get_table(name).map(f)
    }

    /// Run `f` against table `name` under a write lock.
    ///
    /// Returns `None` if the table does not exist.
    pub fn with_table_mut<R>(&self, name: &str, f: impl FnOnce(&mut Table) -> R) -> Option<R> {
        let mut db = self.inner.write();
        db.get_table_mut(name).map(f)
    }

    /// Name of the database behind this handle.
    pub fn name(&self) -> String {
        self.inner.read().name().to_string()
    }

    /// Whether two handles refer to the same database.
    pub fn same_database(&self, other: &SharedDatabase) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Database> for SharedDatabase {
    fn from(database: Database) -> Self {
        Self::new(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DatabaseConfig;
    use crate::table::{record, ColumnType, Value};
    use std::thread;
    use tempfile::tempdir;

    fn shared(root: &std::path::Path) -> SharedDatabase {
        let db = Database::open("app", DatabaseConfig::new(root)).unwrap();
        SharedDatabase::new(db)
    }

    #[test]
    fn test_missing_table_is_none() {
        let root = tempdir().unwrap();
        let db = shared(root.path());
        assert_eq!(db.with_table("nope", |t| t.len()), None);
        assert_eq!(db.with_table_mut("nope", |t| t.len()), None);
    }

    #[test]
    fn test_clones_share_state() {
        let root = tempdir().unwrap();
        let db = shared(root.path());
        let other = db.clone();
        assert!(db.same_database(&other));
        assert_eq!(other.name(), "app");

        db.write()
            .create_table("t", [("k", ColumnType::Integer)], "k")
            .unwrap();
        assert!(other.read().has_table("t"));
    }

    #[test]
    fn test_concurrent_inserts_are_serialized() {
        let root = tempdir().unwrap();
        let db = shared(root.path());
        db.write()
            .create_table("t", [("k", ColumnType::Integer)], "k")
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let db = db.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = worker * 1000 + i;
                        db.with_table_mut("t", |t| {
                            t.insert(record([("k", Value::from(key))])).unwrap()
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (len, valid) = db
            .with_table("t", |t| (t.len(), t.index().validate()))
            .unwrap();
        assert_eq!(len, 200);
        assert!(valid);
    }
}
