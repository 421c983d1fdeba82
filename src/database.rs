//! Database - a named set of tables backed by one directory.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::common::{DatabaseConfig, Error, Result};
use crate::storage::{read_artifact, write_artifact, DatabaseDir};
use crate::table::{ColumnType, Schema, Table};

/// A collection of [`Table`]s persisted under `<data_dir>/<name>_db/`.
///
/// # Persistence
/// [`persist`](Database::persist) writes one artifact per table and
/// [`load`](Database::load) rebuilds every table from whatever artifacts the
/// directory holds. Tables are written independently: a crash part-way
/// through `persist` can leave some artifacts newer than others.
///
/// # Usage
/// ```no_run
/// use arbordb::{record, ColumnType, Database, Value};
///
/// let mut db = Database::new("shop")?;
/// db.load();
/// db.create_table("items", [("sku", ColumnType::Text), ("price", ColumnType::Float)], "sku")?;
///
/// let items = db.get_table_mut("items").unwrap();
/// items.insert(record([("sku", Value::from("a-1")), ("price", Value::from(9.5))]))?;
///
/// db.persist()?;
/// # Ok::<(), arbordb::Error>(())
/// ```
#[derive(Debug)]
pub struct Database {
    name: String,
    dir: DatabaseDir,
    config: DatabaseConfig,
    tables: BTreeMap<String, Table>,
}

impl Database {
    /// Open database `name` under the default configuration (`./<name>_db`).
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(name: &str) -> Result<Self> {
        Self::open(name, DatabaseConfig::default())
    }

    /// Open database `name` under `config`, creating its directory.
    ///
    /// The database starts empty; call [`load`](Database::load) to pick up
    /// previously persisted tables.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(name: &str, config: DatabaseConfig) -> Result<Self> {
        let dir = DatabaseDir::create(config.database_dir(name))?;
        Ok(Self {
            name: name.to_string(),
            dir,
            config,
            tables: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Create an empty table.
    ///
    /// Returns `Ok(false)` if a table called `name` already exists.
    ///
    /// # Errors
    /// Returns `Error::SchemaViolation` if `name` cannot be used as a file
    /// name or the columns/primary key do not form a valid [`Schema`].
    pub fn create_table<I, S>(&mut self, name: &str, columns: I, primary_key: &str) -> Result<bool>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        if self.tables.contains_key(name) {
            return Ok(false);
        }
        check_table_name(name)?;
        let schema = Schema::new(columns, primary_key)?;

        let mut table = Table::with_degree(name, schema, self.config.degree);
        table.set_target(self.dir.artifact_path(name));
        self.tables.insert(name.to_string(), table);

        info!(database = %self.name, table = name, "created table");
        Ok(true)
    }

    /// Drop a table and its artifact, if one was persisted.
    ///
    /// Returns `Ok(false)` if no such table exists.
    ///
    /// # Errors
    /// Returns an error if the artifact exists but cannot be removed; the
    /// table is dropped from memory regardless.
    pub fn delete_table(&mut self, name: &str) -> Result<bool> {
        if self.tables.remove(name).is_none() {
            return Ok(false);
        }
        self.dir.remove_artifact(name)?;
        info!(database = %self.name, table = name, "dropped table");
        Ok(true)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names, ascending.
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write every table's artifact.
    ///
    /// # Errors
    /// Stops at and returns the first failure; tables written before it keep
    /// their new artifacts.
    pub fn persist(&self) -> Result<()> {
        self.dir.ensure()?;
        for (name, table) in &self.tables {
            let target = self.dir.artifact_path(name);
            if table.target() == target {
                table.persist()?;
            } else {
                // Retargeted by a caller; the database copy still lives here.
                write_artifact(&target, &table.to_artifact())?;
            }
        }
        info!(database = %self.name, tables = self.tables.len(), "persisted database");
        Ok(())
    }

    /// Replace the in-memory tables with those persisted in the directory.
    ///
    /// A missing directory is an empty database. Artifacts that cannot be
    /// read are skipped with a warning. Returns `false` only if the directory
    /// exists but cannot be listed.
    pub fn load(&mut self) -> bool {
        self.tables.clear();

        let entries = match self.dir.scan() {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                info!(database = %self.name, "no directory, starting empty");
                return true;
            }
            Err(e) => {
                warn!(database = %self.name, error = %e, "cannot list database directory");
                return false;
            }
        };

        for (name, path) in entries {
            let artifact = match read_artifact(&path) {
                Ok(Some(artifact)) => artifact,
                Ok(None) => continue, // removed since the scan
                Err(e) => {
                    warn!(database = %self.name, table = %name, error = %e, "skipping table");
                    continue;
                }
            };

            match Table::from_artifact(artifact, path, self.config.degree) {
                Ok(mut table) => {
                    if table.name() != name {
                        warn!(
                            database = %self.name,
                            file = %name,
                            stored = table.name(),
                            "artifact name differs from file name, using file name"
                        );
                        table.rename(name.clone());
                    }
                    self.tables.insert(name, table);
                }
                Err(e) => {
                    warn!(database = %self.name, table = %name, error = %e, "skipping table");
                }
            }
        }

        info!(database = %self.name, tables = self.tables.len(), "loaded database");
        true
    }
}

/// Table names become file names, so keep them to a safe alphabet.
fn check_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::schema(format!(
            "invalid table name '{}': use letters, digits, '_' or '-'",
            name
        )))
    }
}
