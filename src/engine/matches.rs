//! Raw resolver output.

use crate::grammar::{Literal, TagKind};
use std::path::PathBuf;

/// One resolved tag occurrence, before post-processing.
///
/// A single source line may produce several matches (a folder tag yields one
/// per file) or none (a summary of a file without declarations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroMatch {
    pub kind: TagKind,
    /// Heading used when no `#T` title precedes the item.
    pub default_title: Option<String>,
    /// Resolved text. `None` for kinds filled in at composition time.
    pub content: Option<String>,
    pub raw_arguments: Vec<Literal>,
    /// File the content was read from, if any.
    pub source: Option<PathBuf>,
    /// 1-based line of the tag in the scanned file.
    pub line: usize,
}

impl MacroMatch {
    pub fn new(kind: TagKind, line: usize) -> Self {
        Self {
            kind,
            default_title: None,
            content: None,
            raw_arguments: Vec::new(),
            source: None,
            line,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Literal>) -> Self {
        self.raw_arguments = arguments;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}
