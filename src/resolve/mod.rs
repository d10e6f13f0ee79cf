//! Resolvers: turn validated tag arguments into text.
//!
//! - **paths**: closest-match lookup of files and directories under the root
//! - **process**: subprocess runs with timeout (`#run`, `#run_pylint`, `#run_unittest`)
//! - **tree**: directory tree rendering (`#tree`)
//! - **summarize**: Python signature/docstring summaries (`#summarize*`)
//!
//! Resolvers read from the [`Session`] and the filesystem only. Template
//! expansion needs the engine itself and lives in [`crate::engine`].

pub mod paths;
pub mod process;
pub mod summarize;
pub mod tree;

pub use paths::{EntryKind, folder_files, lookup_named, read_text, resolve_path};
pub use process::{ProcessOutput, run_command, run_pylint, run_script, run_unittest};
pub use summarize::{summarize_file, summarize_folder, summarize_source};
pub use tree::{TreeOptions, render_tree};

use crate::context::Session;
use crate::error::Result;

/// Text of the fill snippet `name` from the session's fill directory.
pub fn fill_text(session: &Session, name: &str) -> Result<String> {
    let path = lookup_named(&session.fill_text_dir(), name, "fill text")?;
    read_text(session, &path)
}
