//! The macro engine.
//!
//! A single forward pass over the text. Each line is trimmed and tested
//! against the family's validators in declaration order:
//!
//! - no match: the line is kept verbatim in the stripped text
//! - a match: the tag is resolved, its matches are recorded, and the line is
//!   dropped from the stripped text
//! - an open multi-line tag: following lines are consumed until the argument
//!   list closes
//!
//! Any resolver error aborts the whole extraction. Nothing is written here;
//! the finalizer decides what to do with the result.

mod matches;
mod resolution;


pub use matches::MacroMatch;

use crate::context::Session;
use crate::error::{Result, TagsmithError};
use crate::grammar::{LineMatch, OpenTag, TagFamily, TagKind, TagSet};
use crate::postprocess::PostProcessor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Matches and stripped text from one pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub matches: Vec<MacroMatch>,
    /// Input with every macro line removed; other lines untouched.
    pub stripped: String,
    /// The removed macro lines, in order.
    pub macro_lines: Vec<String>,
}

/// A file extraction after post-processing.
#[derive(Debug, Clone)]
pub struct FileExtraction<T> {
    pub path: PathBuf,
    pub original: String,
    pub stripped: String,
    pub macro_lines: Vec<String>,
    pub result: T,
}

/// Per-run expansion state shared by nested template scans.
struct Expansion<'a> {
    current_file: &'a Path,
    /// Names of the templates currently being expanded, outermost first.
    stack: Vec<String>,
}

enum ScanState {
    Scanning,
    Continuing {
        open: OpenTag,
        start_line: usize,
    },
}

/// Line scanner bound to one tag family and one session.
pub struct MacroEngine<'s> {
    session: &'s Session,
    tags: TagSet,
}

impl<'s> MacroEngine<'s> {
    pub fn new(session: &'s Session, family: TagFamily) -> Result<Self> {
        Ok(Self {
            session,
            tags: TagSet::new(family)?,
        })
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Scan `text` as the content of `current_file`.
    pub fn extract_from_text(&self, text: &str, current_file: &Path) -> Result<Extraction> {
        let mut expansion = Expansion {
            current_file,
            stack: Vec::new(),
        };
        self.scan(text, &mut expansion, false)
    }

    /// Read, scan and post-process a file. The file itself is not modified.
    pub fn extract_from_file<P: PostProcessor>(
        &self,
        path: &Path,
        post_processor: &P,
    ) -> Result<FileExtraction<P::Output>> {
        let original = std::fs::read_to_string(path).map_err(|e| {
            TagsmithError::UserError(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let extraction = self.extract_from_text(&original, path)?;
        debug!(
            file = %self.session.display_path(path),
            matches = extraction.matches.len(),
            macro_lines = extraction.macro_lines.len(),
            "extracted macros"
        );
        let result = post_processor.post_process(extraction.matches)?;

        Ok(FileExtraction {
            path: path.to_path_buf(),
            original,
            stripped: extraction.stripped,
            macro_lines: extraction.macro_lines,
            result,
        })
    }

    /// One pass over `text`.
    ///
    /// Inside a template, plain lines become `#N` text items instead of being
    /// kept as stripped text.
    fn scan(&self, text: &str, expansion: &mut Expansion, in_template: bool) -> Result<Extraction> {
        let mut matches = Vec::new();
        let mut stripped = String::with_capacity(text.len());
        let mut macro_lines = Vec::new();
        let mut state = ScanState::Scanning;

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches(['\n', '\r']);

            state = match state {
                ScanState::Continuing {
                    mut open,
                    start_line,
                } => {
                    macro_lines.push(line.to_string());
                    if open.push_line(line) {
                        let tag = self.tags.finish(open)?;
                        matches.extend(self.resolve_tag(tag, start_line, expansion)?);
                        ScanState::Scanning
                    } else {
                        ScanState::Continuing { open, start_line }
                    }
                }
                ScanState::Scanning => match self.tags.validate(line)? {
                    None => {
                        if in_template {
                            if !line.trim().is_empty() {
                                matches.push(
                                    MacroMatch::new(TagKind::Normal, line_no)
                                        .with_content(line.trim_end()),
                                );
                            }
                        } else {
                            stripped.push_str(raw);
                        }
                        ScanState::Scanning
                    }
                    Some(LineMatch::Complete(tag)) => {
                        debug!(line = line_no, kind = %tag.kind, "matched tag");
                        macro_lines.push(line.to_string());
                        matches.extend(self.resolve_tag(tag, line_no, expansion)?);
                        ScanState::Scanning
                    }
                    Some(LineMatch::Open(open)) => {
                        macro_lines.push(line.to_string());
                        ScanState::Continuing {
                            open,
                            start_line: line_no,
                        }
                    }
                },
            };
        }

        if let ScanState::Continuing { start_line, .. } = state {
            return Err(TagsmithError::ValidationError(format!(
                "argument list opened on line {} is never closed",
                start_line
            )));
        }

        Ok(Extraction {
            matches,
            stripped,
            macro_lines,
        })
    }
}
