//! Storage layer - table artifacts and database directories.
//!
//! This module handles persistent storage:
//! - [`artifact`] - Snapshot file format (header + JSON payload)
//! - [`DatabaseDir`] - Directory layout and artifact discovery

pub mod artifact;
mod directory;

pub use artifact::{read_artifact, write_artifact, ArtifactHeader, TableArtifact};
pub use directory::DatabaseDir;
