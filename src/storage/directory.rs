//! Database directory - where a database keeps its table artifacts.
//!
//! The [`DatabaseDir`] handles every direct filesystem operation a database
//! needs beyond reading and writing single artifacts:
//! - Creating the directory
//! - Mapping table names to artifact paths
//! - Scanning for existing artifacts
//! - Removing an artifact when its table is dropped

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::config::{artifact_path, ARTIFACT_EXTENSION};
use crate::common::Result;

/// A database's backing directory.
///
/// # Layout
/// ```text
/// <data_dir>/<database>_db/
///     ├── orders.tbl
///     ├── people.tbl
///     └── ...
/// ```
///
/// Each table is stored independently; there is no manifest. The set of
/// tables is whatever `*.tbl` files the directory holds.
#[derive(Debug, Clone)]
pub struct DatabaseDir {
    path: PathBuf,
}

impl DatabaseDir {
    /// Use `path` as a database directory, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dir = Self::at(path);
        dir.ensure()?;
        Ok(dir)
    }

    /// Refer to `path` without touching the filesystem.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the directory (and parents) if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Artifact path for table `table`.
    pub fn artifact_path(&self, table: &str) -> PathBuf {
        artifact_path(&self.path, table)
    }

    /// Every `(table name, artifact path)` in the directory, sorted by name.
    ///
    /// Returns `Ok(None)` if the directory does not exist.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be listed.
    pub fn scan(&self) -> Result<Option<Vec<(String, PathBuf)>>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.push((stem.to_string(), path.clone()));
            }
        }
        found.sort();
        Ok(Some(found))
    }

    /// Remove the artifact for `table`.
    ///
    /// Returns `Ok(false)` if there was nothing to remove.
    pub fn remove_artifact(&self, table: &str) -> Result<bool> {
        match fs::remove_file(self.artifact_path(table)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_makes_directory() {
        let root = tempdir().unwrap();
        let path = root.path().join("nested").join("shop_db");

        let dir = DatabaseDir::create(&path).unwrap();
        assert!(dir.exists());
        assert_eq!(dir.path(), path.as_path());
    }

    #[test]
    fn test_create_existing_is_ok() {
        let root = tempdir().unwrap();
        DatabaseDir::create(root.path()).unwrap();
        assert!(DatabaseDir::create(root.path()).is_ok());
    }

    #[test]
    fn test_scan_missing_directory() {
        let root = tempdir().unwrap();
        let dir = DatabaseDir::at(root.path().join("nope_db"));
        assert!(dir.scan().unwrap().is_none());
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let root = tempdir().unwrap();
        let dir = DatabaseDir::create(root.path()).unwrap();

        fs::write(dir.artifact_path("zebra"), b"").unwrap();
        fs::write(dir.artifact_path("apple"), b"").unwrap();
        fs::write(root.path().join("notes.txt"), b"").unwrap();
        fs::write(root.path().join("apple.tbl.tmp"), b"").unwrap();
        fs::create_dir(root.path().join("dir.tbl")).unwrap();

        let names: Vec<String> = dir
            .scan()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["apple", "zebra"]);
    }

    #[test]
    fn test_remove_artifact() {
        let root = tempdir().unwrap();
        let dir = DatabaseDir::create(root.path()).unwrap();
        fs::write(dir.artifact_path("t"), b"x").unwrap();

        assert!(dir.remove_artifact("t").unwrap());
        assert!(!dir.remove_artifact("t").unwrap());
        assert!(!dir.artifact_path("t").exists());
    }
}
