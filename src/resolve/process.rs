//! Subprocess execution with timeout and output capture.
//!
//! Every subprocess resolver and cleanup strategy runs through [`run_command`]:
//! stdout and stderr are redirected to scratch files under the session temp
//! directory, the child is polled until it exits, and it is killed once the
//! configured timeout elapses.

use crate::context::Session;
use crate::error::{Result, TagsmithError};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code of the process (None if killed by a signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    /// The command line, for logs and reports.
    pub command: String,
}

impl ProcessOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text reported inline for a macro.
    ///
    /// On success this is stdout (stderr if stdout is empty); on failure it is
    /// stderr (stdout if stderr is empty).
    pub fn captured(&self) -> String {
        let (primary, fallback) = if self.is_success() {
            (&self.stdout, &self.stderr)
        } else {
            (&self.stderr, &self.stdout)
        };
        if primary.trim().is_empty() {
            fallback.clone()
        } else {
            primary.clone()
        }
    }
}

/// Run `program` with `args` in the session working directory.
///
/// A non-zero exit is not an error; the caller decides what to do with it.
/// Spawn failures and timeouts are [`TagsmithError::SubprocessError`].
pub fn run_command<S: AsRef<std::ffi::OsStr>>(
    session: &Session,
    program: S,
    args: &[OsString],
) -> Result<ProcessOutput> {
    let program = program.as_ref();
    let command_line = format_command(program, args);

    let temp_dir = session.temp_dir();
    fs::create_dir_all(&temp_dir).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to create temp directory '{}': {}",
            temp_dir.display(),
            e
        ))
    })?;

    let stdout_path = session.next_temp_path("proc", "stdout");
    let stderr_path = session.next_temp_path("proc", "stderr");
    let stdout_file = create_capture_file(&stdout_path)?;
    let stderr_file = create_capture_file(&stderr_path)?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(session.cwd())
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file));

    debug!(command = %command_line, "spawning subprocess");
    let start_time = Instant::now();
    let mut child = command.spawn().map_err(|e| {
        cleanup_capture_files(&stdout_path, &stderr_path);
        TagsmithError::SubprocessError(format!(
            "failed to execute '{}': {}\nFix: ensure the command is installed and in PATH.",
            command_line, e
        ))
    })?;

    let timeout = Duration::from_secs(session.config.subprocess_timeout_secs);
    let wait = wait_with_timeout(&mut child, timeout);
    let duration = start_time.elapsed();

    let stdout = read_capture(&stdout_path);
    let stderr = read_capture(&stderr_path);
    cleanup_capture_files(&stdout_path, &stderr_path);

    let (exit_code, timed_out) = wait?;
    if timed_out {
        return Err(TagsmithError::SubprocessError(format!(
            "'{}' timed out after {}s",
            command_line,
            timeout.as_secs()
        )));
    }

    if exit_code != Some(0) {
        warn!(command = %command_line, exit_code = ?exit_code, "subprocess exited with failure");
    }

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
        duration,
        command: command_line,
    })
}

/// Run a script, choosing the interpreter by extension.
///
/// `.py` runs under the session interpreter, `.sh` under `sh`; anything else
/// is executed directly.
pub fn run_script(session: &Session, script: &Path, args: &[String]) -> Result<ProcessOutput> {
    let mut argv: Vec<OsString> = Vec::with_capacity(args.len() + 1);
    let program: PathBuf = match script.extension().and_then(|e| e.to_str()) {
        Some("py") => {
            argv.push(script.as_os_str().to_os_string());
            session.python_interpreter()
        }
        Some("sh") => {
            argv.push(script.as_os_str().to_os_string());
            PathBuf::from("sh")
        }
        _ => script.to_path_buf(),
    };
    argv.extend(args.iter().map(OsString::from));
    run_command(session, program, &argv)
}

/// Run pylint on a file or package.
pub fn run_pylint(session: &Session, target: &Path) -> Result<ProcessOutput> {
    let argv = vec![
        OsString::from("-m"),
        OsString::from("pylint"),
        target.as_os_str().to_os_string(),
    ];
    run_command(session, session.python_interpreter(), &argv)
}

/// Run a unittest module with the given verbosity (0 quiet, 1 normal, 2+ verbose).
pub fn run_unittest(session: &Session, target: &Path, verbosity: i64) -> Result<ProcessOutput> {
    let mut argv = vec![OsString::from("-m"), OsString::from("unittest")];
    match verbosity {
        v if v <= 0 => argv.push(OsString::from("-q")),
        1 => {}
        _ => argv.push(OsString::from("-v")),
    }
    argv.push(target.as_os_str().to_os_string());
    run_command(session, session.python_interpreter(), &argv)
}

/// Wait for a child process with timeout.
///
/// Returns (exit_code, timed_out).
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(Option<i32>, bool)> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status.code(), false)),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    // SIGKILL on Unix, TerminateProcess on Windows.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok((None, true));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(TagsmithError::SubprocessError(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

fn create_capture_file(path: &Path) -> Result<fs::File> {
    fs::File::create(path).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to create capture file '{}': {}",
            path.display(),
            e
        ))
    })
}

fn read_capture(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_default()
}

fn cleanup_capture_files(stdout: &Path, stderr: &Path) {
    let _ = fs::remove_file(stdout);
    let _ = fs::remove_file(stderr);
}

fn format_command(program: &std::ffi::OsStr, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|part| shell_words::quote(&part.to_string_lossy()).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
