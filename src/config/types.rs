//! Configuration types and defaults for tagsmith.
//!
//! This module defines enums, nested records, and default value functions
//! used by the Config struct.

use serde::{Deserialize, Serialize};

/// What to do when a file declares more than one dispatch directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDispatchPolicy {
    /// The last `#send`/`#makequery` in the file wins (default).
    #[default]
    LastWins,
    /// More than one dispatch directive is a conflict error.
    Reject,
}

impl DuplicateDispatchPolicy {
    /// Parse a policy from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "last_wins" => Some(Self::LastWins),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Settings for the remote model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Messages endpoint URL.
    pub endpoint: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Token budget when a dispatch directive does not give one.
    pub default_max_tokens: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            default_max_tokens: 4096,
            timeout_secs: 300,
        }
    }
}

/// One selectable cleanup strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupStrategy {
    /// Short code used by `#select_only`, `#select_not` and `#force_select`.
    pub code: String,

    /// Display name for reports.
    pub name: String,

    /// Command to run (shell-words parsed; `{file}` is the target path).
    pub command: String,

    /// Whether the strategy runs when no selection tag names it.
    pub enabled_by_default: bool,
}

impl CleanupStrategy {
    fn new(code: &str, name: &str, command: &str, enabled_by_default: bool) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            command: command.to_string(),
            enabled_by_default,
        }
    }
}

/// Default cleanup strategies, in execution order.
pub fn default_cleanup_strategies() -> Vec<CleanupStrategy> {
    vec![
        CleanupStrategy::new("RL", "ruff lint fixes", "ruff check --fix --quiet {file}", true),
        CleanupStrategy::new("IS", "isort imports", "isort --quiet {file}", true),
        CleanupStrategy::new("BF", "black format", "black --quiet {file}", true),
        CleanupStrategy::new("RU", "remove unused imports", "autoflake --in-place --remove-all-unused-imports {file}", false),
    ]
}

/// Default names skipped by `#tree` when no ignore list is given.
pub fn default_tree_ignore() -> Vec<String> {
    vec![
        "__pycache__".to_string(),
        ".git".to_string(),
        ".venv".to_string(),
        "node_modules".to_string(),
        ".tagsmith".to_string(),
    ]
}

/// Default globs pruned while searching for a file by name.
pub fn default_search_ignore() -> Vec<String> {
    vec![
        "**/.git".to_string(),
        "**/.tagsmith".to_string(),
        "**/__pycache__".to_string(),
        "**/.venv".to_string(),
        "**/node_modules".to_string(),
        "**/target".to_string(),
    ]
}

// Default value functions for serde
pub(crate) fn default_backup_dir() -> String {
    ".tagsmith/backups".to_string()
}
pub(crate) fn default_checkpoint_dir() -> String {
    ".tagsmith/checkpoints".to_string()
}
pub(crate) fn default_fill_text_dir() -> String {
    ".tagsmith/fill".to_string()
}
pub(crate) fn default_templates_dir() -> String {
    ".tagsmith/templates".to_string()
}
pub(crate) fn default_output_dir() -> String {
    ".tagsmith/chat".to_string()
}
pub(crate) fn default_temp_dir() -> String {
    ".tagsmith/tmp".to_string()
}
pub(crate) fn default_python() -> String {
    "python3".to_string()
}
pub(crate) fn default_subprocess_timeout_secs() -> u64 {
    120
}
pub(crate) fn default_max_backups() -> usize {
    20
}
pub(crate) fn default_max_template_depth() -> usize {
    8
}
