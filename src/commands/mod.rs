//! Command implementations for tagsmith.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each handler resolves the project session from its path
//! argument, runs the library operation, prints a short summary, and appends
//! a run-log event.

mod backup;
mod batch;
mod cleanup;
mod init;
mod prompt;
mod tags;

use crate::cli::{BackupAction, BackupCommand, Command};
use crate::error::{Result, TagsmithError};
use std::env;
use std::path::{Path, PathBuf};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(),
        Command::Prompt(args) => prompt::cmd_prompt(args),
        Command::Cleanup(args) => cleanup::cmd_cleanup(args),
        Command::Backup(backup_cmd) => dispatch_backup(backup_cmd),
        Command::Batch(args) => batch::cmd_batch(args),
        Command::Tags => tags::cmd_tags(),
    }
}

/// Dispatch backup subcommands.
fn dispatch_backup(backup_cmd: BackupCommand) -> Result<()> {
    match backup_cmd.action {
        BackupAction::Store(args) => backup::cmd_backup_store(args),
        BackupAction::Recover(args) => backup::cmd_backup_recover(args),
        BackupAction::List(args) => backup::cmd_backup_list(args),
        BackupAction::Cleanup => backup::cmd_backup_cleanup(),
    }
}

/// Absolute form of a path argument, relative to the working directory.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| {
        TagsmithError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    Ok(cwd.join(path))
}

/// Absolute path of an existing file argument.
fn existing_file(path: &Path) -> Result<PathBuf> {
    let path = absolute(path)?;
    if !path.is_file() {
        return Err(TagsmithError::UserError(format!(
            "file '{}' does not exist",
            path.display()
        )));
    }
    Ok(path)
}
