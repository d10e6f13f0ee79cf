//! Post-processors: per-family policies over the flat match list.
//!
//! - **prompt**: directive extraction (begin/end text, dispatch, checksum)
//!   and merging of consecutive prose items
//! - **cleanup**: reduction of selection flags into a [`CleanupPlan`]
//!
//! Both run after the whole file has been scanned, so checks that need the
//! complete set of directives (conflicting selections, repeated checksums)
//! happen here.

mod cleanup;
mod prompt;

pub use cleanup::{CleanupPlan, CleanupPostProcessor};
pub use prompt::{DispatchDirective, PromptDirectives, PromptDocument, PromptPostProcessor};

use crate::engine::MacroMatch;
use crate::error::{Result, TagsmithError};
use crate::grammar::TagKind;
use std::path::PathBuf;

/// Family-specific reduction of raw matches.
pub trait PostProcessor {
    type Output;

    fn post_process(&self, matches: Vec<MacroMatch>) -> Result<Self::Output>;
}

/// An ordered unit ready for composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub kind: TagKind,
    pub default_title: Option<String>,
    /// `None` only for the current-file item, which is filled in by the composer.
    pub text: Option<String>,
    pub source: Option<PathBuf>,
}

impl From<MacroMatch> for ResolvedItem {
    fn from(m: MacroMatch) -> Self {
        Self {
            kind: m.kind,
            default_title: m.default_title,
            text: m.content,
            source: m.source,
        }
    }
}

/// Collapse runs of consecutive items of the same mergeable kind.
///
/// The merged item keeps the position and title of the first item of the
/// run; texts are joined with newlines. Applying this to an already merged
/// list changes nothing.
pub fn merge_consecutive(items: Vec<ResolvedItem>) -> Vec<ResolvedItem> {
    let mut merged: Vec<ResolvedItem> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(last) = merged.last_mut()
            && item.kind.is_mergeable()
            && last.kind == item.kind
        {
            let text = last.text.get_or_insert_with(String::new);
            text.push('\n');
            text.push_str(item.text.as_deref().unwrap_or_default());
            continue;
        }
        merged.push(item);
    }

    merged
}

/// Fold one `#checksum` value into the running declaration.
///
/// Repeating the same value is fine; two different values conflict.
pub(crate) fn fold_checksum(current: Option<i64>, m: &MacroMatch) -> Result<Option<i64>> {
    let value = m
        .content
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            TagsmithError::ValidationError(format!("invalid checksum on line {}", m.line))
        })?;

    match current {
        Some(existing) if existing != value => Err(TagsmithError::ConflictError(format!(
            "checksum declared as both {} and {} (line {})",
            existing, value, m.line
        ))),
        _ => Ok(Some(value)),
    }
}
