//! Directory batch runner.
//!
//! Runs the prompt task over every matching file under a directory, one file
//! at a time. Progress is tracked in `.tagsmith/batch_status.csv`:
//!
//! ```text
//! file,status,updated_at,message
//! src/a.py,done,2026-01-01T10:00:00Z,wrote .tagsmith/chat/a_prompt.md
//! src/b.py,failed,2026-01-01T10:00:01Z,Not found: util.py
//! ```
//!
//! A failure is recorded and the loop moves on. Re-running skips `done`
//! rows, and skips `failed` rows unless a retry is requested. A `running`
//! row left behind by an interrupted run is picked up again.


use crate::compose::{PromptOptions, run_prompt};
use crate::context::Session;
use crate::dispatch::RemoteDispatch;
use crate::error::{Result, TagsmithError};
use crate::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// State of one file in the batch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::Running => write!(f, "running"),
            BatchStatus::Done => write!(f, "done"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRow {
    /// Path relative to the project root.
    pub file: String,
    pub status: BatchStatus,
    pub updated_at: DateTime<Utc>,
    pub message: String,
}

/// The on-disk status table.
#[derive(Debug)]
pub struct StatusTable {
    path: PathBuf,
    rows: Vec<BatchRow>,
}

impl StatusTable {
    /// Load the table at `path`; a missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        let mut table = Self {
            path: path.to_path_buf(),
            rows: Vec::new(),
        };
        if !path.exists() {
            return Ok(table);
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to open batch status table '{}': {}",
                path.display(),
                e
            ))
        })?;
        table.rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<BatchRow>, csv::Error>>()
            .map_err(|e| {
                TagsmithError::UserError(format!(
                    "corrupt batch status table '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(table)
    }

    /// Rewrite the whole table atomically.
    pub fn save(&self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer.serialize(row).map_err(|e| {
                TagsmithError::UserError(format!("failed to serialize batch status: {}", e))
            })?;
        }
        let bytes = writer.into_inner().map_err(|e| {
            TagsmithError::UserError(format!("failed to serialize batch status: {}", e))
        })?;
        atomic_write(&self.path, &bytes)
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn status_of(&self, file: &str) -> Option<BatchStatus> {
        self.rows.iter().find(|r| r.file == file).map(|r| r.status)
    }

    /// Set the status of `file`, appending a row if it is new.
    pub fn set(&mut self, file: &str, status: BatchStatus, message: impl Into<String>) {
        let message = message.into();
        let now = Utc::now();
        match self.rows.iter_mut().find(|r| r.file == file) {
            Some(row) => {
                row.status = status;
                row.updated_at = now;
                row.message = message;
            }
            None => self.rows.push(BatchRow {
                file: file.to_string(),
                status,
                updated_at: now,
                message,
            }),
        }
    }
}

/// Options for [`run_batch`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// File extensions to pick up, without the dot.
    pub extensions: Vec<String>,
    pub prompt: PromptOptions,
    /// Run `failed` rows again instead of skipping them.
    pub retry_failed: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            prompt: PromptOptions::default(),
            retry_failed: false,
        }
    }
}

/// Per-file result of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub file: String,
    pub status: BatchStatus,
    pub message: String,
}

/// What a batch run did.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Files processed in this run, in order.
    pub entries: Vec<BatchEntry>,
    /// Files skipped because an earlier run finished (or failed) them.
    pub skipped: Vec<String>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == BatchStatus::Failed)
            .count()
    }

    pub fn done(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == BatchStatus::Done)
            .count()
    }
}

/// Files under `dir` with one of `extensions`, sorted.
///
/// Hidden directories and the configured `search_ignore` globs are skipped.
pub fn collect_files(session: &Session, dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TagsmithError::NotFound(format!(
            "directory '{}'",
            session.display_path(dir)
        )));
    }

    let ignore = session.config.search_ignore_set()?;
    let extensions: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let root = &session.root;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let relative = e.path().strip_prefix(root).unwrap_or(e.path());
            let hidden_dir =
                e.file_type().is_dir() && e.file_name().to_string_lossy().starts_with('.');
            e.depth() == 0 || !(hidden_dir || ignore.is_match(relative))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            TagsmithError::UserError(format!("failed to walk '{}': {}", dir.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extensions.contains(&ext) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Run the prompt task over every matching file under `dir`.
///
/// Only table I/O errors abort the loop; per-file failures are recorded.
pub fn run_batch(
    session: &Session,
    dir: &Path,
    options: &BatchOptions,
    dispatcher: &dyn RemoteDispatch,
) -> Result<BatchSummary> {
    let files = collect_files(session, dir, &options.extensions)?;
    let mut table = StatusTable::load(&session.batch_status_path())?;
    let mut summary = BatchSummary::default();

    for path in &files {
        let file = session.display_path(path);
        if table.status_of(&file).is_none() {
            table.set(&file, BatchStatus::Pending, "");
        }
    }
    table.save()?;

    for path in &files {
        let file = session.display_path(path);
        match table.status_of(&file) {
            Some(BatchStatus::Done) => {
                summary.skipped.push(file);
                continue;
            }
            Some(BatchStatus::Failed) if !options.retry_failed => {
                summary.skipped.push(file);
                continue;
            }
            _ => {}
        }

        table.set(&file, BatchStatus::Running, "");
        table.save()?;

        let (status, message) = match run_prompt(session, path, &options.prompt, dispatcher) {
            Ok(outcome) => {
                let message = outcome
                    .composed_path
                    .map(|p| format!("wrote {}", session.display_path(&p)))
                    .unwrap_or_else(|| "composed".to_string());
                info!(file = %file, "batch file done");
                (BatchStatus::Done, message)
            }
            Err(e) => {
                warn!(file = %file, error = %e, "batch file failed");
                (BatchStatus::Failed, e.to_string())
            }
        };

        table.set(&file, status, message.clone());
        table.save()?;
        summary.entries.push(BatchEntry {
            file,
            status,
            message,
        });
    }

    Ok(summary)
}
