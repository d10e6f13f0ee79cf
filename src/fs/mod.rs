//! Filesystem utilities for tagsmith.
//!
//! Every rewrite of a user's source file goes through [`atomic_write`], so a
//! failed run leaves either the old content or the new content, never a mix.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file};
