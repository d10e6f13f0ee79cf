//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project profile for tagsmith.
///
/// This struct represents the contents of `.tagsmith/config.yaml`. Directory
/// fields are relative to the project root. Unknown keys land in `unknown`
/// and are reported as warnings when the config is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Directories
    // =========================================================================
    /// Where `backup store` copies files before they are overwritten.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Where cleanup checkpoints are stored.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Lookup directory for `#*name` fill texts.
    #[serde(default = "default_fill_text_dir")]
    pub fill_text_dir: String,

    /// Lookup directory for `#name_macros` templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Where composed prompts, responses and extracted code are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Scratch directory for subprocess capture files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    // =========================================================================
    // Subprocess settings
    // =========================================================================
    /// Python interpreter used when no `python_env` is set.
    #[serde(default = "default_python")]
    pub python: String,

    /// Virtual environment directory; its `bin/python` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_env: Option<String>,

    /// Working directory for subprocesses (default: project root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// Seconds before a subprocess resolver is killed.
    #[serde(default = "default_subprocess_timeout_secs")]
    pub subprocess_timeout_secs: u64,

    // =========================================================================
    // Engine settings
    // =========================================================================
    /// Maximum number of backups kept per store; the oldest are evicted.
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Maximum nesting of template expansions.
    #[serde(default = "default_max_template_depth")]
    pub max_template_depth: usize,

    /// Handling of repeated `#send`/`#makequery` directives.
    #[serde(default)]
    pub duplicate_dispatch: DuplicateDispatchPolicy,

    /// Refuse to rewrite a file that carries no `#checksum` tag.
    #[serde(default)]
    pub require_checksum: bool,

    /// Names skipped by `#tree` when the tag gives no ignore list.
    #[serde(default = "default_tree_ignore")]
    pub tree_ignore: Vec<String>,

    /// Globs (relative to root) pruned while searching for files by name.
    #[serde(default = "default_search_ignore")]
    pub search_ignore: Vec<String>,

    // =========================================================================
    // Collaborators
    // =========================================================================
    /// Remote model call settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Cleanup strategies in execution order.
    #[serde(default = "default_cleanup_strategies")]
    pub cleanup_strategies: Vec<CleanupStrategy>,

    /// Keys not recognized by this version.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            checkpoint_dir: default_checkpoint_dir(),
            fill_text_dir: default_fill_text_dir(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            python: default_python(),
            python_env: None,
            cwd: None,
            subprocess_timeout_secs: default_subprocess_timeout_secs(),
            max_backups: default_max_backups(),
            max_template_depth: default_max_template_depth(),
            duplicate_dispatch: DuplicateDispatchPolicy::default(),
            require_checksum: false,
            tree_ignore: default_tree_ignore(),
            search_ignore: default_search_ignore(),
            remote: RemoteConfig::default(),
            cleanup_strategies: default_cleanup_strategies(),
            unknown: BTreeMap::new(),
        }
    }
}
