//! On-disk cache of the raw program list
//!
//! The file holds the JSON array exactly as SR returned it (news records
//! first, then every page of `programs/index`, duplicates included), so a
//! catalog built from the cache is identical to one built from the API.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw program list stored as a JSON file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCache {
    path: PathBuf,
}

impl ProgramCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached records, or `None` when the file does not exist
    pub fn load(&self) -> Result<Option<Vec<Value>>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No program cache");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<Value> = serde_json::from_slice(&data)?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "Loaded programs from cache"
        );
        Ok(Some(records))
    }

    /// Write `records` as a pretty-printed JSON array
    pub fn store(&self, records: &[Value]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records.serialize(&mut serializer)?;

        fs::write(&self.path, buf)?;
        info!(
            path = %self.path.display(),
            records = records.len(),
            "Stored programs in cache"
        );
        Ok(())
    }

    /// Remove the cache file; a missing file is not an error
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
