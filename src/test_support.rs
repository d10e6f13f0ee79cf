use crate::config::Config;
use crate::context::{STATE_DIR_NAME, Session};
use crate::dispatch::RemoteDispatch;
use crate::error::{Result, TagsmithError};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // The working directory is process-global; lock it even under #[serial].
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Create an initialized project: `.tagsmith/` with template and fill dirs.
pub(crate) fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join(STATE_DIR_NAME);
    std::fs::create_dir_all(state.join("templates")).unwrap();
    std::fs::create_dir_all(state.join("fill")).unwrap();
    temp_dir
}

/// Session over a test project with a short subprocess timeout.
pub(crate) fn test_session(project: &TempDir) -> Session {
    let config = Config {
        subprocess_timeout_secs: 10,
        ..Default::default()
    };
    Session::with_config(project.path().to_path_buf(), config)
}

/// Write `content` to `relative` under the project, creating parent dirs.
pub(crate) fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Remote dispatch double that records prompts and returns a canned reply.
pub(crate) struct RecordingDispatch {
    response: Option<String>,
    pub(crate) calls: RefCell<Vec<(String, u32)>>,
}

impl RecordingDispatch {
    pub(crate) fn replying(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            response: None,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl RemoteDispatch for RecordingDispatch {
    fn send(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.calls.borrow_mut().push((prompt.to_string(), max_tokens));
        self.response
            .clone()
            .ok_or_else(|| TagsmithError::DispatchError("connection refused".to_string()))
    }
}
