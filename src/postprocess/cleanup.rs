//! Cleanup-family post-processing.

use super::{PostProcessor, fold_checksum};
use crate::engine::MacroMatch;
use crate::error::{Result, TagsmithError};
use crate::grammar::{Literal, TagKind};
use std::collections::BTreeSet;

/// Strategy selection requested by a file's cleanup tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    pub select_only: BTreeSet<String>,
    pub select_not: BTreeSet<String>,
    pub force_select: BTreeSet<String>,
    pub checkpointing: bool,
    pub checksum: Option<i64>,
}

/// Reduces `#select_only`, `#select_not`, `#force_select` and
/// `#checkpointing` tags; comments are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupPostProcessor;

impl PostProcessor for CleanupPostProcessor {
    type Output = CleanupPlan;

    fn post_process(&self, matches: Vec<MacroMatch>) -> Result<CleanupPlan> {
        let mut plan = CleanupPlan::default();

        for m in &matches {
            match m.kind {
                TagKind::Checksum => plan.checksum = fold_checksum(plan.checksum, m)?,
                TagKind::SelectOnly => plan.select_only.extend(codes(m)),
                TagKind::SelectNot => plan.select_not.extend(codes(m)),
                TagKind::ForceSelect => plan.force_select.extend(codes(m)),
                TagKind::Checkpointing => {
                    plan.checkpointing = m
                        .raw_arguments
                        .first()
                        .and_then(Literal::as_bool)
                        .unwrap_or(true);
                }
                _ => {}
            }
        }

        if !plan.select_only.is_empty() && !plan.select_not.is_empty() {
            return Err(TagsmithError::ConflictError(format!(
                "#select_only [{}] and #select_not [{}] cannot be combined",
                join(&plan.select_only),
                join(&plan.select_not)
            )));
        }

        Ok(plan)
    }
}

fn codes(m: &MacroMatch) -> Vec<String> {
    m.raw_arguments
        .first()
        .and_then(Literal::as_str_list)
        .unwrap_or_default()
        .into_iter()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}
