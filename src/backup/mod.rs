//! File backup store.
//!
//! Copies of files are kept as blobs in the backup directory next to a CSV
//! index (`index.csv`, one row per backup, oldest first). Every mutation reads
//! the whole index, changes it, and rewrites it atomically. The store holds at
//! most `max_backups` entries; the oldest are evicted first.
//!
//! ```text
//! .tagsmith/backups/
//! ├── index.csv
//! ├── 000001_app.py
//! └── 000002_app.py
//! ```


use crate::context::Session;
use crate::error::{Result, TagsmithError};
use crate::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Index file name inside the backup directory.
pub const INDEX_FILE_NAME: &str = "index.csv";

/// One row of the backup index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Source path relative to the project root.
    pub source: String,
    /// Blob file name inside the backup directory.
    pub blob: String,
    pub comment: String,
}

/// Result of [`BackupStore::cleanup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Index rows dropped because their blob was missing.
    pub dropped_records: Vec<String>,
    /// Blob files removed because no row referenced them.
    pub removed_blobs: Vec<String>,
}

/// Backup store rooted at the session's backup directory.
pub struct BackupStore<'s> {
    session: &'s Session,
    dir: PathBuf,
}

impl<'s> BackupStore<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            dir: session.backup_dir(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    /// Copy `path` into the store.
    pub fn store(&self, path: &Path, comment: &str) -> Result<BackupRecord> {
        let content = fs::read(path).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to read '{}' for backup: {}",
                path.display(),
                e
            ))
        })?;

        let mut records = self.load()?;
        let id = next_id(&records);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                TagsmithError::UserError(format!("cannot back up '{}'", path.display()))
            })?;

        let record = BackupRecord {
            blob: format!("{}_{}", id, file_name),
            id,
            timestamp: Utc::now(),
            source: self.source_key(path),
            comment: comment.to_string(),
        };

        atomic_write(self.dir.join(&record.blob), &content)?;
        records.push(record.clone());

        let max = self.session.config.max_backups;
        if records.len() > max {
            let evicted: Vec<BackupRecord> = records.drain(..records.len() - max).collect();
            for old in &evicted {
                debug!(id = %old.id, source = %old.source, "evicting oldest backup");
                let _ = fs::remove_file(self.dir.join(&old.blob));
            }
        }

        self.save(&records)?;
        info!(id = %record.id, source = %record.source, "stored backup");
        Ok(record)
    }

    /// Restore the newest backup of `path` and drop it from the store.
    pub fn recover(&self, path: &Path) -> Result<BackupRecord> {
        let mut records = self.load()?;
        let key = self.source_key(path);

        let position = records.iter().rposition(|r| r.source == key).ok_or_else(|| {
            TagsmithError::NotFound(format!("backup of '{}'", key))
        })?;

        let record = records.remove(position);
        let blob_path = self.dir.join(&record.blob);
        let content = fs::read(&blob_path).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to read backup blob '{}': {}",
                blob_path.display(),
                e
            ))
        })?;

        atomic_write(path, &content)?;
        self.save(&records)?;
        let _ = fs::remove_file(&blob_path);

        info!(id = %record.id, source = %record.source, "recovered backup");
        Ok(record)
    }

    /// All records, oldest first, optionally only those of `path`.
    pub fn list(&self, path: Option<&Path>) -> Result<Vec<BackupRecord>> {
        let records = self.load()?;
        Ok(match path {
            Some(path) => {
                let key = self.source_key(path);
                records.into_iter().filter(|r| r.source == key).collect()
            }
            None => records,
        })
    }

    /// Reconcile the index with the blobs on disk.
    pub fn cleanup(&self) -> Result<CleanupReport> {
        let records = self.load()?;
        let mut report = CleanupReport::default();

        let (kept, dropped): (Vec<BackupRecord>, Vec<BackupRecord>) = records
            .into_iter()
            .partition(|r| self.dir.join(&r.blob).is_file());
        report.dropped_records = dropped.into_iter().map(|r| r.id).collect();

        let referenced: HashSet<&str> = kept.iter().map(|r| r.blob.as_str()).collect();
        if self.dir.is_dir() {
            let entries = fs::read_dir(&self.dir).map_err(|e| {
                TagsmithError::UserError(format!(
                    "failed to read backup directory '{}': {}",
                    self.dir.display(),
                    e
                ))
            })?;
            let mut orphans: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|name| name != INDEX_FILE_NAME && !name.starts_with('.'))
                .filter(|name| !referenced.contains(name.as_str()))
                .collect();
            orphans.sort();
            for orphan in &orphans {
                let _ = fs::remove_file(self.dir.join(orphan));
            }
            report.removed_blobs = orphans;
        }

        self.save(&kept)?;
        Ok(report)
    }

    fn source_key(&self, path: &Path) -> String {
        self.session.display_path(path)
    }

    fn load(&self) -> Result<Vec<BackupRecord>> {
        let index = self.index_path();
        if !index.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&index).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to open backup index '{}': {}",
                index.display(),
                e
            ))
        })?;

        reader
            .deserialize()
            .collect::<std::result::Result<Vec<BackupRecord>, csv::Error>>()
            .map_err(|e| {
                TagsmithError::UserError(format!(
                    "corrupt backup index '{}': {}",
                    index.display(),
                    e
                ))
            })
    }

    fn save(&self, records: &[BackupRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record).map_err(|e| {
                TagsmithError::UserError(format!("failed to serialize backup index: {}", e))
            })?;
        }
        let bytes = writer.into_inner().map_err(|e| {
            TagsmithError::UserError(format!("failed to serialize backup index: {}", e))
        })?;
        atomic_write(self.index_path(), &bytes)
    }
}

fn next_id(records: &[BackupRecord]) -> String {
    let last = records
        .iter()
        .filter_map(|r| r.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{:06}", last + 1)
}
