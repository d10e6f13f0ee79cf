//! Implementation of the `tagsmith cleanup` command.

use super::existing_file;
use crate::cleanup::{CleanupOptions, CleanupOutcome, CleanupStepStatus, run_cleanup};
use crate::cli::CleanupArgs;
use crate::context::Session;
use crate::error::{Result, TagsmithError};
use crate::events::{Event, EventAction, append_event};
use serde_json::json;
use std::path::Path;

/// Execute the `tagsmith cleanup` command.
///
/// Fails with a subprocess error when any strategy failed, after the report
/// and the run-log event have been written.
pub fn cmd_cleanup(args: CleanupArgs) -> Result<()> {
    let file = existing_file(&args.file)?;
    let session = Session::resolve_from(&file)?;
    cleanup_with(&session, &file, &args).map(|_| ())
}

pub(crate) fn cleanup_with(session: &Session, file: &Path, args: &CleanupArgs) -> Result<CleanupOutcome> {
    let options = CleanupOptions {
        dry_run: args.dry_run,
    };
    let outcome = run_cleanup(session, file, &options)?;
    let relative = session.display_path(file);

    if args.dry_run {
        if outcome.selected.is_empty() {
            println!("No cleanup strategies selected for {}", relative);
        } else {
            println!("Would run on {}: {}", relative, outcome.selected.join(", "));
        }
        return Ok(outcome);
    }

    println!("Cleanup of {}", relative);
    for step in &outcome.steps {
        let status = match step.status {
            CleanupStepStatus::Pass => "ok",
            CleanupStepStatus::Fail => "FAILED",
        };
        println!("  [{}] {}: {}", step.code, step.name, status);
    }
    if let Some(path) = &outcome.report_path {
        println!("  report: {}", session.display_path(path));
    }

    let failed: Vec<&str> = outcome
        .steps
        .iter()
        .filter(|s| !s.is_success())
        .map(|s| s.code.as_str())
        .collect();

    append_event(
        session,
        &Event::new(EventAction::Cleanup)
            .with_file(relative)
            .with_details(json!({
                "selected": outcome.selected,
                "failed": failed,
                "checkpointing": outcome.plan.checkpointing,
            })),
    )?;

    if !failed.is_empty() {
        return Err(TagsmithError::SubprocessError(format!(
            "cleanup strategies failed: {}",
            failed.join(", ")
        )));
    }

    Ok(outcome)
}
