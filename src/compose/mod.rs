//! Composition of the final document.
//!
//! The composer walks the ordered items with a single pending-title register:
//! a `#T` item only sets the register, and the next item takes it as its
//! heading (or falls back to its own default title). Each item renders as
//!
//! ```text
//!
//!
//! --- {title} ---
//! {content}
//! ```
//!
//! Begin and end text wrap the body, separated by a `**********` rule.
//! In prompt mode, code items are fenced with a language inferred from the
//! file extension and tool output is fenced plain; query mode is unfenced.

mod finalize;

#[cfg(test)]
mod tests;

pub use finalize::{PromptOptions, PromptOutcome, run_prompt, verify_checksum};

use crate::grammar::TagKind;
use crate::postprocess::{PromptDocument, ResolvedItem};
use std::path::Path;

/// Separator between begin/end text and the body.
pub const RULE: &str = "**********";

/// Shape of the composed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Markdown with fenced code, written to `<stem>_prompt.md`.
    #[default]
    Prompt,
    /// Plain text, written to `<stem>_query.txt`.
    Query,
}

impl OutputMode {
    /// Artifact name suffix appended to the source file stem.
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            OutputMode::Prompt => "prompt.md",
            OutputMode::Query => "query.txt",
        }
    }
}

/// Renders a [`PromptDocument`] into text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Composer {
    mode: OutputMode,
}

impl Composer {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Compose the document. `current_file` is the stripped text of the file
    /// being processed, substituted for `#File` items.
    pub fn compose(&self, document: &PromptDocument, current_file: &str) -> String {
        let body = self.compose_items(&document.items, current_file);
        wrap(
            &body,
            document.directives.begin_text.as_deref(),
            document.directives.end_text.as_deref(),
        )
    }

    fn compose_items(&self, items: &[ResolvedItem], current_file: &str) -> String {
        let mut out = String::new();
        let mut pending_title: Option<&str> = None;

        for item in items {
            if item.kind == TagKind::Title {
                pending_title = item.text.as_deref();
                continue;
            }

            let title = pending_title
                .take()
                .map(str::to_string)
                .or_else(|| item.default_title.clone());

            let content = match item.kind {
                TagKind::CurrentFile => current_file,
                _ => item.text.as_deref().unwrap_or_default(),
            };
            let content = self.format_content(item, content.trim_end_matches('\n'));

            out.push_str("\n\n");
            if let Some(title) = title {
                out.push_str(&format!("--- {} ---\n", title));
            }
            out.push_str(&content);
        }

        out
    }

    fn format_content(&self, item: &ResolvedItem, content: &str) -> String {
        if self.mode == OutputMode::Query {
            return content.to_string();
        }
        if item.kind.is_code() {
            let language = item.source.as_deref().map(language_for).unwrap_or("");
            fence(language, content)
        } else if item.kind.is_output() {
            fence("", content)
        } else {
            content.to_string()
        }
    }
}

/// Wrap `body` with begin and end text.
pub fn wrap(body: &str, begin: Option<&str>, end: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(begin) = begin {
        out.push_str(begin);
        out.push_str("\n\n");
        out.push_str(RULE);
    }
    out.push_str(body);
    if let Some(end) = end {
        out.push_str("\n\n");
        out.push_str(RULE);
        out.push_str("\n\n");
        out.push_str(end);
    }
    out
}

fn fence(language: &str, content: &str) -> String {
    format!("```{}\n{}\n```", language, content)
}

/// Markdown fence language for a source path.
pub fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "py" | "pyi" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "sh" | "bash" => "bash",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "go" => "go",
        "java" => "java",
        _ => "",
    }
}
