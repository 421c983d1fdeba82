//! Schema-bound table over a B+Tree index.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::common::config::{artifact_path, DEFAULT_DEGREE};
use crate::common::{Error, Result};
use crate::index::{BPlusTree, InsertOutcome};
use crate::storage::{read_artifact, write_artifact, TableArtifact};
use crate::table::schema::{ColumnType, Schema};
use crate::table::value::{Record, Value};

/// A named table: a [`Schema`] plus a B+Tree keyed by primary-key value.
///
/// # Control flow
/// ```text
/// insert(record) ─▶ Schema::validate_record ─▶ search(pk)? ─▶ BPlusTree::insert
/// update(pk, f)  ─▶ Schema::validate_update ─▶ BPlusTree::get_mut ─▶ merge fields
/// ```
///
/// Primary keys are unique and immutable: a duplicate insert is refused
/// rather than overwriting, and updates may not name the key column.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    index: BPlusTree<Value, Record>,
    /// Where [`persist`](Table::persist) and [`load`](Table::load) go.
    target: PathBuf,
}

impl Table {
    /// Create an empty table persisting to `<name>.tbl` in the working
    /// directory.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_degree(name, schema, DEFAULT_DEGREE)
    }

    /// Create an empty table whose index uses the given degree.
    ///
    /// # Panics
    /// Panics if `degree < 2`.
    pub fn with_degree(name: impl Into<String>, schema: Schema, degree: usize) -> Self {
        let name = name.into();
        let target = artifact_path(Path::new("."), &name);
        Self {
            name,
            schema,
            index: BPlusTree::new(degree),
            target,
        }
    }

    /// Rebuild a table from a decoded artifact, replaying its rows in order.
    ///
    /// Every row is checked against the stored schema and must be filed
    /// under its own primary-key value, exactly once.
    ///
    /// # Errors
    /// Returns `Error::PersistenceUnavailable` naming `target` if the stored
    /// schema is unusable or any row does not fit it.
    pub fn from_artifact(artifact: TableArtifact, target: PathBuf, degree: usize) -> Result<Self> {
        let schema = Schema::new(artifact.columns, artifact.primary_key)
            .map_err(|e| Error::unavailable(&target, format!("stored schema: {}", e)))?;

        let mut index = BPlusTree::new(degree);
        for (row, (key, record)) in artifact.data.into_iter().enumerate() {
            let record = schema
                .validate_record(record)
                .map_err(|e| Error::unavailable(&target, format!("row {}: {}", row, e)))?;
            let key = schema.normalize_key(&key);
            if record.get(schema.primary_key()) != Some(&key) {
                return Err(Error::unavailable(
                    &target,
                    format!("row {}: filed under '{}' but holds another key", row, key),
                ));
            }
            if index.insert(key, record) == InsertOutcome::Updated {
                return Err(Error::unavailable(
                    &target,
                    format!("row {}: duplicate primary key", row),
                ));
            }
        }

        Ok(Self {
            name: artifact.name,
            schema,
            index,
            target,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &std::collections::BTreeMap<String, ColumnType> {
        self.schema.columns()
    }

    pub fn primary_key(&self) -> &str {
        self.schema.primary_key()
    }

    /// Read-only access to the underlying index (for diagram renderers).
    pub fn index(&self) -> &BPlusTree<Value, Record> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<PathBuf>) {
        self.target = target.into();
    }

    // ========================================================================
    // Record operations
    // ========================================================================

    /// Insert a full record.
    ///
    /// Returns `Ok(false)` without touching the table if a row with the same
    /// primary key exists.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if the record does not match the
    /// schema (missing or unknown column, wrong value type).
    pub fn insert(&mut self, record: Record) -> Result<bool> {
        let record = self.schema.validate_record(record)?;
        let key = record
            .get(self.schema.primary_key())
            .cloned()
            .ok_or_else(|| Error::schema("record has no primary key"))?;

        if self.index.search(&key) {
            return Ok(false);
        }
        self.index.insert(key, record);
        Ok(true)
    }

    /// Row with primary key `key`.
    pub fn select(&self, key: &Value) -> Option<&Record> {
        self.index.get(&self.schema.normalize_key(key))
    }

    /// Merge `fields` into the row with primary key `key`.
    ///
    /// Columns not named in `fields` keep their values. Returns `Ok(false)`
    /// if no such row exists.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if `fields` names the primary-key
    /// column or an unknown column, or carries a wrongly typed value. The
    /// check happens before the lookup, so a bad update is refused even for
    /// a missing row.
    pub fn update(&mut self, key: &Value, fields: Record) -> Result<bool> {
        let fields = self.schema.validate_update(fields)?;
        let key = self.schema.normalize_key(key);

        match self.index.get_mut(&key) {
            Some(row) => {
                row.extend(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the row with primary key `key`.
    pub fn delete(&mut self, key: &Value) -> bool {
        let key = self.schema.normalize_key(key);
        self.index.delete(&key)
    }

    /// Rows with `start <= primary key <= end`, ascending.
    pub fn select_range(&self, start: &Value, end: &Value) -> Vec<&Record> {
        let start = self.schema.normalize_key(start);
        let end = self.schema.normalize_key(end);
        self.index.range(&start, &end).map(|(_, row)| row).collect()
    }

    /// Every row, ascending by primary key.
    pub fn select_all(&self) -> Vec<&Record> {
        self.index.iter().map(|(_, row)| row).collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Snapshot of this table as it would be written to disk.
    pub fn to_artifact(&self) -> TableArtifact {
        TableArtifact {
            name: self.name.clone(),
            columns: self.schema.columns().clone(),
            primary_key: self.schema.primary_key().to_string(),
            data: self.index.get_all(),
        }
    }

    /// Write the schema and every row to [`target`](Table::target).
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn persist(&self) -> Result<()> {
        write_artifact(&self.target, &self.to_artifact())?;
        info!(table = %self.name, rows = self.len(), path = %self.target.display(), "persisted table");
        Ok(())
    }

    /// Replace this table's schema and rows with the snapshot at
    /// [`target`](Table::target).
    ///
    /// Returns `false` (leaving the table unchanged) if there is no snapshot
    /// or it cannot be used; a damaged snapshot is logged at `warn`.
    pub fn load(&mut self) -> bool {
        let artifact = match read_artifact(&self.target) {
            Ok(Some(artifact)) => artifact,
            Ok(None) => return false,
            Err(e) => {
                warn!(table = %self.name, error = %e, "ignoring unusable table snapshot");
                return false;
            }
        };

        match Table::from_artifact(artifact, self.target.clone(), self.index.degree()) {
            Ok(loaded) => {
                *self = loaded;
                true
            }
            Err(e) => {
                warn!(table = %self.name, error = %e, "ignoring table snapshot that does not fit its schema");
                false
            }
        }
    }
}
