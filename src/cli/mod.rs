//! CLI argument parsing for tagsmith.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tagsmith: compose prompts and cleanup runs from macro tags in source files.
///
/// Lines such as `#T Title`, `#run tests.sh` or `#tree src` inside a file are
/// resolved against the project, stripped from the file, and assembled into
/// a prompt that can be sent to a model.
#[derive(Parser, Debug)]
#[command(name = "tagsmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v for debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for tagsmith.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a tagsmith project in the current directory.
    ///
    /// Creates `.tagsmith/` with a default config.yaml and the template,
    /// fill-text, output, backup and checkpoint directories.
    Init,

    /// Compose a prompt from the macro tags in a file.
    ///
    /// Strips the tags from the file, writes the composed prompt to the
    /// output directory, and sends it when the file asks for it with
    /// `#send` or `#makequery`.
    Prompt(PromptArgs),

    /// Run cleanup strategies selected by the cleanup tags in a file.
    Cleanup(CleanupArgs),

    /// File backup commands.
    Backup(BackupCommand),

    /// Run the prompt task over every matching file in a directory.
    ///
    /// Progress is kept in `.tagsmith/batch_status.csv`; finished files
    /// are skipped on the next run.
    Batch(BatchArgs),

    /// List the recognized tags of each family in match order.
    Tags,
}

/// Duplicate dispatch handling, as accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateDispatchArg {
    LastWins,
    Reject,
}

/// Arguments for the `prompt` command.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// File containing macro tags.
    pub file: PathBuf,

    /// Write a plain `<name>_query.txt` instead of a fenced `<name>_prompt.md`.
    #[arg(long)]
    pub query: bool,

    /// Compose and print without touching any file or sending anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Never send, even if the file contains `#send` or `#makequery`.
    #[arg(long)]
    pub no_send: bool,

    /// Override the configured handling of repeated dispatch tags.
    #[arg(long, value_enum)]
    pub duplicate_dispatch: Option<DuplicateDispatchArg>,

    /// Also print the composed text to stdout.
    #[arg(long)]
    pub print: bool,
}

/// Arguments for the `cleanup` command.
#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// File containing cleanup tags.
    pub file: PathBuf,

    /// Show which strategies would run without running them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Backup subcommands.
#[derive(Parser, Debug)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub action: BackupAction,
}

/// Available backup actions.
#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// Copy a file into the backup store.
    Store(BackupStoreArgs),

    /// Restore the newest backup of a file and drop it from the store.
    Recover(BackupFileArgs),

    /// List backups, optionally only those of one file.
    List(BackupListArgs),

    /// Drop index rows without blobs and blobs without index rows.
    Cleanup,
}

/// Arguments for the `backup store` command.
#[derive(Parser, Debug)]
pub struct BackupStoreArgs {
    /// File to back up.
    pub file: PathBuf,

    /// Note stored with the backup.
    #[arg(short, long, default_value = "")]
    pub comment: String,
}

/// Arguments for the `backup recover` command.
#[derive(Parser, Debug)]
pub struct BackupFileArgs {
    /// File to restore.
    pub file: PathBuf,
}

/// Arguments for the `backup list` command.
#[derive(Parser, Debug)]
pub struct BackupListArgs {
    /// Only list backups of this file.
    pub file: Option<PathBuf>,
}

/// Arguments for the `batch` command.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Directory to process recursively.
    pub dir: PathBuf,

    /// File extensions to process.
    #[arg(long = "ext", value_delimiter = ',', default_value = "py")]
    pub extensions: Vec<String>,

    /// Write query artifacts instead of prompts.
    #[arg(long)]
    pub query: bool,

    /// Never send, even if a file asks for it.
    #[arg(long)]
    pub no_send: bool,

    /// Process files that failed in an earlier run again.
    #[arg(long)]
    pub retry_failed: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
