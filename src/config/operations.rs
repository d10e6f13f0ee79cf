//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{Result, TagsmithError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(TagsmithError::UserError)` - Read, parse, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown keys are kept aside and reported with a warning each.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                TagsmithError::UserError(format!("failed to parse config YAML: {}", e))
            })?
        };

        for key in config.unknown.keys() {
            warn!(key = %key, "ignoring unknown config key");
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            TagsmithError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `subprocess_timeout_secs`, `max_backups` and `max_template_depth` must be positive
    /// - cleanup strategy codes must be non-empty and unique, commands non-empty
    /// - `search_ignore` entries must be valid globs
    pub fn validate(&self) -> Result<()> {
        if self.subprocess_timeout_secs == 0 {
            return Err(TagsmithError::UserError(
                "config validation failed: subprocess_timeout_secs must be greater than 0"
                    .to_string(),
            ));
        }

        if self.max_backups == 0 {
            return Err(TagsmithError::UserError(
                "config validation failed: max_backups must be greater than 0".to_string(),
            ));
        }

        if self.max_template_depth == 0 {
            return Err(TagsmithError::UserError(
                "config validation failed: max_template_depth must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for strategy in &self.cleanup_strategies {
            if strategy.code.trim().is_empty() {
                return Err(TagsmithError::UserError(
                    "config validation failed: cleanup strategy codes must be non-empty"
                        .to_string(),
                ));
            }
            if !seen.insert(strategy.code.as_str()) {
                return Err(TagsmithError::UserError(format!(
                    "config validation failed: duplicate cleanup strategy code '{}'",
                    strategy.code
                )));
            }
            if strategy.command.trim().is_empty() {
                return Err(TagsmithError::UserError(format!(
                    "config validation failed: cleanup strategy '{}' has an empty command",
                    strategy.code
                )));
            }
        }

        self.search_ignore_set()?;

        Ok(())
    }

    /// Compile `search_ignore` into a glob set.
    pub fn search_ignore_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.search_ignore {
            let glob = Glob::new(pattern).map_err(|e| {
                TagsmithError::UserError(format!(
                    "config validation failed: invalid search_ignore glob '{}': {}",
                    pattern, e
                ))
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| {
            TagsmithError::UserError(format!("failed to build search_ignore globs: {}", e))
        })
    }

    /// Strategy codes in configured order.
    pub fn strategy_codes(&self) -> Vec<&str> {
        self.cleanup_strategies
            .iter()
            .map(|s| s.code.as_str())
            .collect()
    }
}
