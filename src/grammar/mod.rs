//! Macro tag grammar.
//!
//! This module provides:
//!
//! - **Literal**: the safe argument-list parser (`(2, true, ["a"])`)
//! - **Tags**: immutable tag descriptors and the ordered [`TagSet`] registry
//!
//! Lines are matched after trimming. Validators are tried in declaration
//! order and the first pattern that matches decides the tag kind, so a line
//! is never claimed by two tags.

mod literal;
mod tags;

#[cfg(test)]
mod tests;

pub use literal::{Literal, LiteralError, parse_arg_list, parse_literal};
pub use tags::{
    ArgSchema, ArgType, CLEANUP_TAGS, CURRENT_FILE_TOKEN, LineMatch, OpenTag, PROMPT_TAGS,
    TagDescriptor, TagFamily, TagKind, TagSet, ValidatedTag,
};
