//! Cleanup strategy runner.
//!
//! Consumes the [`CleanupPlan`] extracted from a file's cleanup tags, picks
//! the configured strategies it selects, and runs each strategy command on
//! the file in configuration order. With `#checkpointing` set, the file is
//! copied into the checkpoint directory before every step.
//!
//! A strategy that exits non-zero, cannot be spawned, or times out is
//! recorded as failed and the remaining strategies still run. Extraction
//! errors and checksum mismatches abort before the file is touched.


use crate::compose::verify_checksum;
use crate::config::CleanupStrategy;
use crate::context::Session;
use crate::engine::MacroEngine;
use crate::error::{Result, TagsmithError};
use crate::fs::atomic_write_file;
use crate::grammar::TagFamily;
use crate::postprocess::{CleanupPlan, CleanupPostProcessor};
use crate::render::{render, vars};
use crate::resolve::run_command;
use chrono::Utc;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Maximum number of output lines kept per failed step in the report.
pub const REPORT_MAX_LINES: usize = 50;

/// Maximum characters kept per failed step in the report.
pub const REPORT_MAX_CHARS: usize = 4096;

/// Status of a cleanup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStepStatus {
    Pass,
    Fail,
}

/// Result of running one strategy.
#[derive(Debug, Clone)]
pub struct CleanupStepResult {
    pub code: String,
    pub name: String,
    pub status: CleanupStepStatus,
    pub message: Option<String>,
    /// Copy of the file taken before this step ran.
    pub checkpoint: Option<PathBuf>,
}

impl CleanupStepResult {
    fn pass(strategy: &CleanupStrategy) -> Self {
        Self {
            code: strategy.code.clone(),
            name: strategy.name.clone(),
            status: CleanupStepStatus::Pass,
            message: None,
            checkpoint: None,
        }
    }

    fn fail(strategy: &CleanupStrategy, message: impl Into<String>) -> Self {
        Self {
            code: strategy.code.clone(),
            name: strategy.name.clone(),
            status: CleanupStepStatus::Fail,
            message: Some(message.into()),
            checkpoint: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CleanupStepStatus::Pass
    }
}

/// Options for [`run_cleanup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    /// Report the selection only; write nothing and run nothing.
    pub dry_run: bool,
}

/// What a cleanup run did.
#[derive(Debug, Clone, Default)]
pub struct CleanupOutcome {
    pub plan: CleanupPlan,
    /// Codes of the selected strategies, in execution order.
    pub selected: Vec<String>,
    pub steps: Vec<CleanupStepResult>,
    pub report_path: Option<PathBuf>,
}

impl CleanupOutcome {
    pub fn all_passed(&self) -> bool {
        self.steps.iter().all(CleanupStepResult::is_success)
    }
}

/// Choose the strategies a plan selects, in configuration order.
///
/// `select_only` picks exactly those codes; otherwise every strategy enabled
/// by default runs except those in `select_not`. Codes in `force_select` are
/// always added. A code that names no configured strategy is a validation
/// error.
pub fn select_strategies<'c>(
    strategies: &'c [CleanupStrategy],
    plan: &CleanupPlan,
) -> Result<Vec<&'c CleanupStrategy>> {
    let known: BTreeSet<&str> = strategies.iter().map(|s| s.code.as_str()).collect();
    let unknown: Vec<&str> = plan
        .select_only
        .iter()
        .chain(&plan.select_not)
        .chain(&plan.force_select)
        .map(String::as_str)
        .filter(|code| !known.contains(code))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !unknown.is_empty() {
        return Err(TagsmithError::ValidationError(format!(
            "unknown cleanup strategy code(s): {}. Known codes: {}",
            unknown.join(", "),
            known.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }

    Ok(strategies
        .iter()
        .filter(|s| {
            let selected = if plan.select_only.is_empty() {
                s.enabled_by_default && !plan.select_not.contains(&s.code)
            } else {
                plan.select_only.contains(&s.code)
            };
            selected || plan.force_select.contains(&s.code)
        })
        .collect())
}

/// Run the cleanup task on `path`.
pub fn run_cleanup(session: &Session, path: &Path, options: &CleanupOptions) -> Result<CleanupOutcome> {
    let engine = MacroEngine::new(session, TagFamily::Cleanup)?;
    let extraction = engine.extract_from_file(path, &CleanupPostProcessor)?;
    let plan = extraction.result;

    verify_checksum(
        &extraction.original,
        &extraction.stripped,
        plan.checksum,
        session.config.require_checksum,
    )?;

    let strategies = select_strategies(&session.config.cleanup_strategies, &plan)?;
    let mut outcome = CleanupOutcome {
        selected: strategies.iter().map(|s| s.code.clone()).collect(),
        plan,
        ..Default::default()
    };
    debug!(selected = ?outcome.selected, "selected cleanup strategies");

    if options.dry_run {
        return Ok(outcome);
    }

    if extraction.stripped != extraction.original {
        atomic_write_file(path, &extraction.stripped)?;
        info!(
            file = %session.display_path(path),
            removed = extraction.macro_lines.len(),
            "consumed cleanup tags"
        );
    }

    let run_stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();
    for (index, strategy) in strategies.iter().enumerate() {
        let checkpoint = if outcome.plan.checkpointing {
            Some(checkpoint(session, path, &run_stamp, index + 1, &strategy.code)?)
        } else {
            None
        };

        let mut step = run_strategy(session, strategy, path);
        step.checkpoint = checkpoint;
        if !step.is_success() {
            warn!(code = %step.code, "cleanup strategy failed");
        }
        outcome.steps.push(step);
    }

    let report_path = session.output_path(path, "cleanup.txt");
    atomic_write_file(&report_path, &format_report(session, path, &outcome))?;
    info!(path = %session.display_path(&report_path), "wrote cleanup report");
    outcome.report_path = Some(report_path);

    Ok(outcome)
}

fn run_strategy(session: &Session, strategy: &CleanupStrategy, path: &Path) -> CleanupStepResult {
    let quoted = shell_words::quote(&path.to_string_lossy()).to_string();
    let command = match render(strategy.command.trim(), &vars([("file", quoted.as_str())])) {
        Ok(command) => command,
        Err(e) => return CleanupStepResult::fail(strategy, format!("invalid command template: {}", e)),
    };

    let args = match shell_words::split(&command) {
        Ok(args) => args,
        Err(e) => {
            return CleanupStepResult::fail(
                strategy,
                format!(
                    "failed to parse command: {}\nCommand: {}\nFix: check for unmatched quotes or invalid escape sequences.",
                    e, command
                ),
            );
        }
    };

    let Some((program, rest)) = args.split_first() else {
        return CleanupStepResult::fail(strategy, "command is empty");
    };
    let rest: Vec<OsString> = rest.iter().map(OsString::from).collect();

    let output = match run_command(session, program, &rest) {
        Ok(output) => output,
        Err(e) => return CleanupStepResult::fail(strategy, e.to_string()),
    };

    if output.is_success() {
        return CleanupStepResult::pass(strategy);
    }

    let exit_code = output
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let mut message = format!(
        "Command failed with exit code {}\nCommand: {}\n",
        exit_code, output.command
    );
    let truncated = truncate_output(&output.captured(), REPORT_MAX_LINES, REPORT_MAX_CHARS);
    if !truncated.is_empty() {
        message.push_str("\nOutput (truncated):\n");
        message.push_str(&truncated);
        message.push('\n');
    }
    CleanupStepResult::fail(strategy, message)
}

/// Copy `path` into the checkpoint directory as `<stem>_<stamp>_<nn>_<code>.<ext>`.
fn checkpoint(session: &Session, path: &Path, stamp: &str, step: usize, code: &str) -> Result<PathBuf> {
    let dir = session.checkpoint_dir();
    fs::create_dir_all(&dir).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to create checkpoint directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let mut name = format!("{}_{}_{:02}_{}", stem, stamp, step, code);
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }

    let target = dir.join(name);
    fs::copy(path, &target).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to checkpoint '{}' to '{}': {}",
            path.display(),
            target.display(),
            e
        ))
    })?;
    debug!(checkpoint = %target.display(), "checkpointed file");
    Ok(target)
}

fn format_report(session: &Session, path: &Path, outcome: &CleanupOutcome) -> String {
    let mut out = format!("Cleanup report for {}\n", session.display_path(path));
    if outcome.steps.is_empty() {
        out.push_str("\nNo strategies selected.\n");
        return out;
    }

    for step in &outcome.steps {
        let status = match step.status {
            CleanupStepStatus::Pass => "ok",
            CleanupStepStatus::Fail => "FAILED",
        };
        out.push_str(&format!("\n[{}] {}: {}\n", step.code, step.name, status));
        if let Some(checkpoint) = &step.checkpoint {
            out.push_str(&format!("  checkpoint: {}\n", session.display_path(checkpoint)));
        }
        if let Some(message) = &step.message {
            for line in message.lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

/// Keep the last `max_lines` lines, then the last `max_chars` characters.
fn truncate_output(output: &str, max_lines: usize, max_chars: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    let result = lines[start..].join("\n");

    let char_count = result.chars().count();
    if char_count <= max_chars {
        return result;
    }
    let tail: String = result.chars().skip(char_count - max_chars).collect();
    format!("...(truncated)...\n{}", tail)
}
