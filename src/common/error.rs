//! Error types for ArborDB.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every fallible ArborDB operation.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in ArborDB.
///
/// Lookups that miss (absent key, absent table) and duplicate primary keys
/// are *not* errors: they are reported through `bool` / `Option` results.
/// This enum only carries conditions the caller has to react to.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a filesystem operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record, update, or schema declaration does not fit the table schema.
    ///
    /// Covers missing/unknown columns, ill-typed values, writes to the
    /// primary-key column and unrecognized type tags.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A table artifact is missing, truncated, or fails integrity checks.
    #[error("persistence unavailable for {}: {reason}", path.display())]
    PersistenceUnavailable { path: PathBuf, reason: String },

    /// Encoding a table snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value could not be used.
    #[error("invalid value for {name}: {message}")]
    InvalidConfig { name: String, message: String },
}

impl Error {
    /// Shorthand for building a [`Error::SchemaViolation`].
    pub fn schema(message: impl Into<String>) -> Self {
        Error::SchemaViolation(message.into())
    }

    /// Shorthand for building a [`Error::PersistenceUnavailable`].
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::PersistenceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
