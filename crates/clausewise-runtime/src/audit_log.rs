//! Audit log storage.
//!
//! One pretty-printed JSON file per analyzed document, named by its
//! fingerprint. Re-analyzing the same text overwrites the earlier record.

use clausewise_core::AuditRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to create audit directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write audit record {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Directory-backed audit log.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    /// Open an audit log, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AuditError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a record with this fingerprint is written to.
    pub fn path_for(&self, file_hash: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_hash))
    }

    /// Persist a record and return where it was written.
    pub async fn write(&self, record: &AuditRecord) -> Result<PathBuf, AuditError> {
        let path = self.path_for(&record.file_hash);
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| AuditError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), file_name = %record.file_name, "Audit record written");
        Ok(path)
    }
}
