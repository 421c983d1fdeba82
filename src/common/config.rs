//! Configuration for ArborDB.
//!
//! Compile-time constants live here together with [`DatabaseConfig`], the
//! runtime settings a [`Database`](crate::Database) is opened with.
//!
//! # Environment Variables
//! - `ARBORDB_DATA_DIR`: directory holding `<name>_db/` folders (default: `.`)
//! - `ARBORDB_TREE_DEGREE`: B+Tree degree for every table index (default: `3`)

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Default B+Tree degree.
///
/// With degree `d` every non-root node holds between `d - 1` and `2d - 1`
/// keys, so the default gives nodes of 2..=5 keys.
pub const DEFAULT_DEGREE: usize = 3;

/// Smallest degree that still yields a valid B+Tree.
pub const MIN_DEGREE: usize = 2;

/// File extension of a persisted table artifact.
pub const ARTIFACT_EXTENSION: &str = "tbl";

/// Suffix appended to a database name to form its directory.
pub const DATABASE_DIR_SUFFIX: &str = "_db";

/// Magic bytes at the start of every table artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"ARBT";

/// Current artifact format version.
pub const ARTIFACT_VERSION: u8 = 1;

/// Runtime settings for a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Parent directory of every `<name>_db/` folder.
    pub data_dir: PathBuf,
    /// Degree used for every table index.
    pub degree: usize,
}

impl DatabaseConfig {
    /// Environment variable naming the data directory.
    pub const ENV_DATA_DIR: &'static str = "ARBORDB_DATA_DIR";
    /// Environment variable naming the tree degree.
    pub const ENV_DEGREE: &'static str = "ARBORDB_TREE_DEGREE";

    /// Create a config rooted at `data_dir` with the default degree.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            degree: DEFAULT_DEGREE,
        }
    }

    /// Override the tree degree.
    ///
    /// # Panics
    /// Panics if `degree < MIN_DEGREE`.
    pub fn with_degree(mut self, degree: usize) -> Self {
        assert!(degree >= MIN_DEGREE, "degree must be >= {}", MIN_DEGREE);
        self.degree = degree;
        self
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for unset ones.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `ARBORDB_TREE_DEGREE` is set but is
    /// not an integer `>= 2`.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var_os(Self::ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let degree = match std::env::var(Self::ENV_DEGREE) {
            Ok(raw) => Self::parse_degree(&raw)?,
            Err(_) => DEFAULT_DEGREE,
        };

        Ok(Self { data_dir, degree })
    }

    /// Parse a degree value as read from the environment.
    pub fn parse_degree(raw: &str) -> Result<usize> {
        let invalid = |message: String| Error::InvalidConfig {
            name: Self::ENV_DEGREE.to_string(),
            message,
        };

        let degree: usize = raw
            .trim()
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a positive integer", raw)))?;

        if degree < MIN_DEGREE {
            return Err(invalid(format!("degree must be >= {}, got {}", MIN_DEGREE, degree)));
        }
        Ok(degree)
    }

    /// Directory backing the database called `name`.
    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", name, DATABASE_DIR_SUFFIX))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Path of the artifact for table `table` inside `dir`.
pub fn artifact_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.{}", table, ARTIFACT_EXTENSION))
}
