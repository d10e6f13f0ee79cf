//! Prompt-family post-processing.

use super::{PostProcessor, ResolvedItem, fold_checksum, merge_consecutive};
use crate::config::DuplicateDispatchPolicy;
use crate::engine::MacroMatch;
use crate::error::{Result, TagsmithError};
use crate::grammar::{Literal, TagKind};
use tracing::debug;

/// Parameters of a `#send` / `#makequery` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchDirective {
    /// Back up the source file and replace it with the returned code block.
    pub modify_in_place: bool,
    /// Token budget; the configured default applies when `None`.
    pub max_tokens: Option<u32>,
}

/// Out-of-band aggregates of a prompt file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDirectives {
    /// All `#B` texts, newline-joined in encounter order.
    pub begin_text: Option<String>,
    /// All `#E` texts, newline-joined in encounter order.
    pub end_text: Option<String>,
    pub dispatch: Option<DispatchDirective>,
    pub checksum: Option<i64>,
}

/// Ordered items plus directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDocument {
    pub items: Vec<ResolvedItem>,
    pub directives: PromptDirectives,
}

/// Post-processor for `prompt` and `query` runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptPostProcessor {
    pub duplicate_dispatch: DuplicateDispatchPolicy,
}

impl PromptPostProcessor {
    pub fn new(duplicate_dispatch: DuplicateDispatchPolicy) -> Self {
        Self { duplicate_dispatch }
    }
}

impl PostProcessor for PromptPostProcessor {
    type Output = PromptDocument;

    fn post_process(&self, matches: Vec<MacroMatch>) -> Result<PromptDocument> {
        let mut directives = PromptDirectives::default();
        let mut begin: Vec<String> = Vec::new();
        let mut end: Vec<String> = Vec::new();
        let mut items: Vec<ResolvedItem> = Vec::with_capacity(matches.len());

        // Directives leave the stream before merging, so a `#B` between two
        // `#C` lines does not split the comment run.
        for m in matches {
            match m.kind {
                TagKind::Checksum => {
                    directives.checksum = fold_checksum(directives.checksum, &m)?;
                }
                TagKind::Dispatch => {
                    let directive = dispatch_directive(&m)?;
                    if directives.dispatch.is_some()
                        && self.duplicate_dispatch == DuplicateDispatchPolicy::Reject
                    {
                        return Err(TagsmithError::ConflictError(format!(
                            "more than one #send/#makequery directive (second on line {})",
                            m.line
                        )));
                    }
                    if directives.dispatch.is_some() {
                        debug!(line = m.line, "later dispatch directive replaces earlier one");
                    }
                    directives.dispatch = Some(directive);
                }
                TagKind::BeginText => begin.push(m.content.unwrap_or_default()),
                TagKind::EndText => end.push(m.content.unwrap_or_default()),
                _ => items.push(ResolvedItem::from(m)),
            }
        }

        if !begin.is_empty() {
            directives.begin_text = Some(begin.join("\n"));
        }
        if !end.is_empty() {
            directives.end_text = Some(end.join("\n"));
        }

        Ok(PromptDocument {
            items: merge_consecutive(items),
            directives,
        })
    }
}

fn dispatch_directive(m: &MacroMatch) -> Result<DispatchDirective> {
    let modify_in_place = m
        .raw_arguments
        .first()
        .and_then(Literal::as_bool)
        .unwrap_or(false);

    let max_tokens = match m.raw_arguments.get(1).and_then(Literal::as_int) {
        None => None,
        Some(n) => Some(u32::try_from(n).ok().filter(|n| *n > 0).ok_or_else(|| {
            TagsmithError::ValidationError(format!(
                "max_tokens on line {} must be a positive integer, got {}",
                m.line, n
            ))
        })?),
    };

    Ok(DispatchDirective {
        modify_in_place,
        max_tokens,
    })
}
