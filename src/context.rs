//! Project session resolution for tagsmith.
//!
//! A project is any directory containing a `.tagsmith/` state directory. The
//! session finds that root from a file or working directory, loads the
//! profile in `.tagsmith/config.yaml`, and hands out the absolute directories
//! every resolver and the finalizer work with.
//!
//! Resolvers only read from the session. The one piece of mutable state is
//! the scratch-file counter used to name subprocess capture files.

use crate::config::Config;
use crate::error::{Result, TagsmithError};
use std::cell::Cell;
use std::env;
use std::path::{Path, PathBuf};

/// Name of the state directory marking a project root.
pub const STATE_DIR_NAME: &str = ".tagsmith";

/// Config file name inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolved project paths and profile.
#[derive(Debug)]
pub struct Session {
    /// Absolute project root (the directory containing `.tagsmith/`).
    pub root: PathBuf,

    /// Absolute path to `.tagsmith/`.
    pub state_dir: PathBuf,

    /// Loaded profile.
    pub config: Config,

    temp_counter: Cell<u64>,
}

impl Session {
    /// Resolve the session from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            TagsmithError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the session from a file or directory inside the project.
    ///
    /// Walks up from `start` to the nearest directory containing `.tagsmith/`.
    pub fn resolve_from<P: AsRef<Path>>(start: P) -> Result<Self> {
        let start = start.as_ref();
        let start = if start.is_absolute() {
            start.to_path_buf()
        } else {
            env::current_dir()
                .map_err(|e| {
                    TagsmithError::UserError(format!(
                        "failed to get current working directory: {}",
                        e
                    ))
                })?
                .join(start)
        };

        let root = find_project_root(&start).ok_or_else(|| {
            TagsmithError::UserError(format!(
                "no tagsmith project found above '{}'.\n\
                 Run `tagsmith init` in the project root first.",
                start.display()
            ))
        })?;

        let state_dir = root.join(STATE_DIR_NAME);
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self::with_config(root, config))
    }

    /// Build a session for a known root and config without touching disk.
    pub fn with_config(root: PathBuf, config: Config) -> Self {
        let state_dir = root.join(STATE_DIR_NAME);
        Self {
            root,
            state_dir,
            config,
            temp_counter: Cell::new(0),
        }
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE_NAME)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(&self.config.backup_dir)
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.root.join(&self.config.checkpoint_dir)
    }

    pub fn fill_text_dir(&self) -> PathBuf {
        self.root.join(&self.config.fill_text_dir)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.config.templates_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.output_dir)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(&self.config.temp_dir)
    }

    /// Working directory for subprocess resolvers.
    pub fn cwd(&self) -> PathBuf {
        match &self.config.cwd {
            Some(cwd) => self.root.join(cwd),
            None => self.root.clone(),
        }
    }

    /// Python interpreter: the configured env's `bin/python` if set, else `python`.
    pub fn python_interpreter(&self) -> PathBuf {
        match &self.config.python_env {
            Some(env_dir) => {
                let env_dir = self.root.join(env_dir);
                if cfg!(windows) {
                    env_dir.join("Scripts").join("python.exe")
                } else {
                    env_dir.join("bin").join("python")
                }
            }
            None => PathBuf::from(&self.config.python),
        }
    }

    /// Get the path to the run log.
    pub fn events_file(&self) -> PathBuf {
        self.state_dir.join("events.ndjson")
    }

    /// Get the path to the batch status table.
    pub fn batch_status_path(&self) -> PathBuf {
        self.state_dir.join("batch_status.csv")
    }

    /// Next scratch file path under the temp dir, e.g. `tmp/run_3.stdout`.
    ///
    /// The counter lives on the session so names are unique per run.
    pub fn next_temp_path(&self, prefix: &str, extension: &str) -> PathBuf {
        let n = self.temp_counter.get() + 1;
        self.temp_counter.set(n);
        self.temp_dir()
            .join(format!("{}_{}_{}.{}", prefix, std::process::id(), n, extension))
    }

    /// Output artifact path, e.g. `chat/app_prompt.md`.
    pub fn output_path(&self, source: &Path, suffix: &str) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        self.output_dir().join(format!("{}_{}", stem, suffix))
    }

    /// Path relative to the project root for display, falling back to the input.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Find the nearest ancestor of `start` (inclusive) that contains `.tagsmith/`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(STATE_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_project;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_from_root() {
        let project = create_test_project();
        let session = Session::resolve_from(project.path()).unwrap();
        assert_eq!(session.root, project.path());
        assert!(session.state_dir.ends_with(".tagsmith"));
    }

    #[test]
    fn test_resolve_from_nested_file() {
        let project = create_test_project();
        let nested = project.path().join("pkg").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("mod.py");
        std::fs::write(&file, "x = 1\n").unwrap();

        let session = Session::resolve_from(&file).unwrap();
        assert_eq!(session.root, project.path());
    }

    #[test]
    fn test_resolve_outside_project_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = Session::resolve_from(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("tagsmith init"));
    }

    #[test]
    fn test_resolve_loads_config() {
        let project = create_test_project();
        std::fs::write(
            project.path().join(".tagsmith").join("config.yaml"),
            "max_backups: 4\n",
        )
        .unwrap();
        let session = Session::resolve_from(project.path()).unwrap();
        assert_eq!(session.config.max_backups, 4);
    }

    #[test]
    fn test_directory_accessors() {
        let session = Session::with_config(PathBuf::from("/proj"), Config::default());
        assert_eq!(session.backup_dir(), PathBuf::from("/proj/.tagsmith/backups"));
        assert_eq!(session.output_dir(), PathBuf::from("/proj/.tagsmith/chat"));
        assert_eq!(session.templates_dir(), PathBuf::from("/proj/.tagsmith/templates"));
        assert_eq!(session.cwd(), PathBuf::from("/proj"));
        assert_eq!(session.config_path(), PathBuf::from("/proj/.tagsmith/config.yaml"));
    }

    #[test]
    fn test_python_interpreter_prefers_env() {
        let mut config = Config::default();
        let session = Session::with_config(PathBuf::from("/proj"), config.clone());
        assert_eq!(session.python_interpreter(), PathBuf::from("python3"));

        config.python_env = Some(".venv".to_string());
        let session = Session::with_config(PathBuf::from("/proj"), config);
        assert!(session.python_interpreter().starts_with("/proj/.venv"));
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let session = Session::with_config(PathBuf::from("/proj"), Config::default());
        let a = session.next_temp_path("run", "stdout");
        let b = session.next_temp_path("run", "stdout");
        assert_ne!(a, b);
        assert!(a.starts_with("/proj/.tagsmith/tmp"));
    }

    #[test]
    fn test_output_path_uses_stem() {
        let session = Session::with_config(PathBuf::from("/proj"), Config::default());
        let path = session.output_path(Path::new("/proj/src/app.py"), "prompt.md");
        assert_eq!(path, PathBuf::from("/proj/.tagsmith/chat/app_prompt.md"));
    }

    #[test]
    fn test_display_path_is_root_relative() {
        let session = Session::with_config(PathBuf::from("/proj"), Config::default());
        assert_eq!(session.display_path(Path::new("/proj/src/app.py")), "src/app.py");
        assert_eq!(session.display_path(Path::new("/elsewhere/x.py")), "/elsewhere/x.py");
    }
}
