//! Tagsmith: macro-tag extraction and prompt composition.
//!
//! A file is scanned line by line for macro tags (`#T Title`, `#run x.sh`,
//! `#tree src`, ...). Each tag is resolved against the project, the tag lines
//! are stripped from the file, and the resolved items are composed into a
//! prompt that can be dispatched to a remote model:
//!
//! ```text
//! grammar ─► engine ─► postprocess ─► compose ─► dispatch
//!              │
//!              └─► resolve (paths, subprocesses, trees, summaries)
//! ```
//!
//! The cleanup family of tags drives [`cleanup`] instead of composition.

pub mod backup;
pub mod batch;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod grammar;
pub mod postprocess;
pub mod render;
pub mod resolve;

#[cfg(test)]
pub(crate) mod test_support;
