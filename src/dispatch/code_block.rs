//! Fenced code block extraction from model responses.

use regex::Regex;
use std::sync::LazyLock;

static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[ \t]*([A-Za-z0-9_+.-]*)[^\n]*\n(.*?)^[ \t]*```")
        .expect("Invalid code fence regex")
});

/// A fenced block from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info string after the opening fence, possibly empty.
    pub language: String,
    /// Block body with a trailing newline.
    pub code: String,
}

/// The first fenced code block in `response`, if any.
pub fn extract_code_block(response: &str) -> Option<CodeBlock> {
    let caps = FENCE_REGEX.captures(response)?;
    let language = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
    let mut code = caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string();
    if !code.ends_with('\n') {
        code.push('\n');
    }
    Some(CodeBlock { language, code })
}
