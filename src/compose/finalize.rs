//! The prompt run: extract, verify, compose, write, dispatch.
//!
//! Order matters. Every resolver runs and the checksum is verified before
//! the first write, so a failing run leaves the source file untouched.

use super::{Composer, OutputMode};
use crate::backup::{BackupRecord, BackupStore};
use crate::config::DuplicateDispatchPolicy;
use crate::context::Session;
use crate::dispatch::{RemoteDispatch, extract_code_block};
use crate::engine::MacroEngine;
use crate::error::{Result, TagsmithError};
use crate::fs::atomic_write_file;
use crate::grammar::TagFamily;
use crate::postprocess::{DispatchDirective, PromptPostProcessor};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Check the declared checksum against the stripped line count.
///
/// The checksum is the number of lines removed from `original` to produce
/// `stripped`. With `required` set, a file without a checksum is rejected.
pub fn verify_checksum(
    original: &str,
    stripped: &str,
    declared: Option<i64>,
    required: bool,
) -> Result<()> {
    let removed = original.lines().count() as i64 - stripped.lines().count() as i64;

    match declared {
        Some(expected) if expected != removed => Err(TagsmithError::IntegrityError {
            expected,
            actual: removed,
        }),
        Some(_) => Ok(()),
        None if required => Err(TagsmithError::ValidationError(format!(
            "file has no #checksum tag but require_checksum is set; add '#checksum {}'",
            removed
        ))),
        None => Ok(()),
    }
}

/// Options for [`run_prompt`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptOptions {
    pub mode: OutputMode,
    /// Compose only; write nothing and skip dispatch.
    pub dry_run: bool,
    /// Ignore `#send`/`#makequery` directives.
    pub no_send: bool,
    /// Override of the configured duplicate-dispatch policy.
    pub duplicate_dispatch: Option<DuplicateDispatchPolicy>,
}

/// What a prompt run produced.
#[derive(Debug, Clone, Default)]
pub struct PromptOutcome {
    pub composed: String,
    /// Number of macro lines removed from the source.
    pub macro_lines: usize,
    pub composed_path: Option<PathBuf>,
    pub dispatch: Option<DispatchDirective>,
    pub response_path: Option<PathBuf>,
    pub code_path: Option<PathBuf>,
    /// Backup taken before the source was replaced in place.
    pub backup: Option<BackupRecord>,
}

/// Run the prompt task on `path`.
pub fn run_prompt(
    session: &Session,
    path: &Path,
    options: &PromptOptions,
    dispatcher: &dyn RemoteDispatch,
) -> Result<PromptOutcome> {
    let policy = options
        .duplicate_dispatch
        .unwrap_or(session.config.duplicate_dispatch);
    let engine = MacroEngine::new(session, TagFamily::Prompt)?;
    let extraction = engine.extract_from_file(path, &PromptPostProcessor::new(policy))?;
    let document = &extraction.result;

    verify_checksum(
        &extraction.original,
        &extraction.stripped,
        document.directives.checksum,
        session.config.require_checksum,
    )?;

    let composed = Composer::new(options.mode).compose(document, &extraction.stripped);
    let mut outcome = PromptOutcome {
        composed,
        macro_lines: extraction.macro_lines.len(),
        dispatch: document.directives.dispatch,
        ..Default::default()
    };

    if options.dry_run {
        return Ok(outcome);
    }

    if extraction.stripped != extraction.original {
        atomic_write_file(path, &extraction.stripped)?;
        info!(
            file = %session.display_path(path),
            removed = outcome.macro_lines,
            "consumed macro lines"
        );
    }

    let composed_path = session.output_path(path, options.mode.artifact_suffix());
    atomic_write_file(&composed_path, &outcome.composed)?;
    info!(path = %session.display_path(&composed_path), "wrote composed text");
    outcome.composed_path = Some(composed_path);

    if options.no_send {
        return Ok(outcome);
    }
    let Some(directive) = outcome.dispatch else {
        return Ok(outcome);
    };

    let max_tokens = directive
        .max_tokens
        .unwrap_or(session.config.remote.default_max_tokens);
    let response = dispatcher.send(&outcome.composed, max_tokens)?;

    let response_path = session.output_path(path, "response.txt");
    atomic_write_file(&response_path, &response)?;
    info!(path = %session.display_path(&response_path), "wrote response");
    outcome.response_path = Some(response_path);

    let Some(block) = extract_code_block(&response) else {
        if directive.modify_in_place {
            warn!("response has no code block; source file left as is");
        }
        return Ok(outcome);
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "txt".to_string());
    let code_path = session.output_path(path, &format!("code.{}", extension));
    atomic_write_file(&code_path, &block.code)?;
    outcome.code_path = Some(code_path);

    if directive.modify_in_place {
        let record = BackupStore::new(session).store(path, "before in-place update from response")?;
        atomic_write_file(path, &block.code)?;
        info!(
            file = %session.display_path(path),
            backup = %record.id,
            "replaced source with response code"
        );
        outcome.backup = Some(record);
    }

    Ok(outcome)
}
