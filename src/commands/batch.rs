//! Implementation of the `tagsmith batch` command.

use super::absolute;
use crate::batch::{BatchOptions, BatchStatus, BatchSummary, run_batch};
use crate::cli::BatchArgs;
use crate::compose::{OutputMode, PromptOptions};
use crate::context::Session;
use crate::dispatch::{AnthropicDispatch, RemoteDispatch};
use crate::error::{Result, TagsmithError};
use crate::events::{Event, EventAction, append_event};
use serde_json::json;
use std::path::Path;

/// Execute the `tagsmith batch` command.
///
/// Every file is attempted; the command fails at the end if any file failed.
pub fn cmd_batch(args: BatchArgs) -> Result<()> {
    let dir = absolute(&args.dir)?;
    let session = Session::resolve_from(&dir)?;
    let dispatcher = AnthropicDispatch::new(session.config.remote.clone());
    batch_with(&session, &dir, &args, &dispatcher).map(|_| ())
}

pub(crate) fn batch_with(
    session: &Session,
    dir: &Path,
    args: &BatchArgs,
    dispatcher: &dyn RemoteDispatch,
) -> Result<BatchSummary> {
    let options = BatchOptions {
        extensions: args.extensions.clone(),
        prompt: PromptOptions {
            mode: if args.query {
                OutputMode::Query
            } else {
                OutputMode::Prompt
            },
            no_send: args.no_send,
            ..Default::default()
        },
        retry_failed: args.retry_failed,
    };

    let summary = run_batch(session, dir, &options, dispatcher)?;

    for entry in &summary.entries {
        let marker = match entry.status {
            BatchStatus::Done => "done",
            _ => "FAILED",
        };
        println!("  {:<6} {}  {}", marker, entry.file, entry.message);
        append_event(
            session,
            &Event::new(EventAction::Batch)
                .with_file(entry.file.clone())
                .with_details(json!({
                    "status": entry.status.to_string(),
                    "message": entry.message,
                })),
        )?;
    }

    println!(
        "Batch finished: {} done, {} failed, {} skipped",
        summary.done(),
        summary.failed(),
        summary.skipped.len()
    );

    if summary.failed() > 0 {
        return Err(TagsmithError::UserError(format!(
            "{} file(s) failed; see {}",
            summary.failed(),
            session.display_path(&session.batch_status_path())
        )));
    }
    Ok(summary)
}
