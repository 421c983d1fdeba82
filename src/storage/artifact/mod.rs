//! Table artifacts - one snapshot file per table.
//!
//! # File Layout
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────┐
//! │ ArtifactHeader   │ JSON payload                                 │
//! │ (17 bytes)       │ {name, columns, primary_key, data: [[k, r]]} │
//! └──────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Writes land in a sibling `.tmp` file that is renamed over the target,
//! so a reader sees either the old snapshot or the new one.

mod header;

pub use header::ArtifactHeader;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::config::ARTIFACT_VERSION;
use crate::common::{Error, Result};
use crate::table::{ColumnType, Record, Value};

/// Decoded contents of a table artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableArtifact {
    pub name: String,
    pub columns: BTreeMap<String, ColumnType>,
    pub primary_key: String,
    /// Every `(primary key, record)` pair, ascending by key.
    pub data: Vec<(Value, Record)>,
}

/// Write `artifact` to `path`, replacing any previous snapshot.
///
/// # Errors
/// Returns `Error::Serialization` if encoding fails and `Error::Io` on any
/// filesystem failure.
pub fn write_artifact(path: &Path, artifact: &TableArtifact) -> Result<()> {
    let payload = serde_json::to_vec(artifact)?;
    let header = ArtifactHeader::for_payload(&payload);

    let tmp = tmp_path(path);
    let written = write_file(&tmp, &header, &payload).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        // Best effort: report the original failure.
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn write_file(path: &Path, header: &ArtifactHeader, payload: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(&header.to_bytes())?;
    file.write_all(payload)?;
    file.sync_all()
}

/// Read the artifact at `path`.
///
/// Returns `Ok(None)` if no file exists there.
///
/// # Errors
/// - `Error::PersistenceUnavailable` if the file is truncated, has a bad
///   header or version, fails its checksum, or does not decode
/// - `Error::Io` for other filesystem failures
pub fn read_artifact(path: &Path) -> Result<Option<TableArtifact>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let header = ArtifactHeader::from_bytes(&bytes)
        .ok_or_else(|| Error::unavailable(path, "missing or malformed header"))?;

    if header.version != ARTIFACT_VERSION {
        return Err(Error::unavailable(
            path,
            format!("unsupported format version {}", header.version),
        ));
    }

    let payload = &bytes[ArtifactHeader::SIZE..];
    if payload.len() as u64 != header.payload_len {
        return Err(Error::unavailable(
            path,
            format!(
                "expected {} payload bytes, found {}",
                header.payload_len,
                payload.len()
            ),
        ));
    }
    if !header.verify_checksum(payload) {
        return Err(Error::unavailable(path, "checksum mismatch"));
    }

    serde_json::from_slice(payload)
        .map(Some)
        .map_err(|e| Error::unavailable(path, format!("undecodable payload: {}", e)))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
