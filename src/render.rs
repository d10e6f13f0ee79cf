//! `{placeholder}` substitution.
//!
//! [`render`] fills named placeholders in cleanup strategy commands
//! (`{file}`):
//!
//! - `{name}` substitutes the value of `name` (surrounding whitespace trimmed)
//! - `{{` and `}}` render literal braces
//! - an undefined name is an error, never an empty substitution
//!
//! [`render_positional`] fills `{1}`, `{2}`, ... in templates, which carry
//! code; every other brace is left alone.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static POSITIONAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("Invalid positional placeholder regex"));

/// Error type for placeholder rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    UndefinedVariable { name: String, position: usize },
    UnmatchedBrace { position: usize },
    EmptyVariableName { position: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UndefinedVariable { name, position } => {
                write!(f, "undefined placeholder '{{{}}}' at position {}", name, position)
            }
            RenderError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {}", position)
            }
            RenderError::EmptyVariableName { position } => {
                write!(f, "empty placeholder '{{}}' at position {}", position)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Substitute `{name}` placeholders in `template`.
pub fn render(template: &str, variables: &HashMap<String, String>) -> Result<String, RenderError> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    result.push('{');
                    continue;
                }

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(RenderError::UnmatchedBrace { position: pos }),
                    }
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(RenderError::EmptyVariableName { position: pos });
                }

                match variables.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        return Err(RenderError::UndefinedVariable {
                            name: name.to_string(),
                            position: pos,
                        });
                    }
                }
            }
            '}' => {
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                }
                result.push('}');
            }
            _ => result.push(ch),
        }
    }

    Ok(result)
}

/// Build a variables map from key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Substitute `{1}`, `{2}`, ... with `values` (1-based).
///
/// Out-of-range indexes and any other braces are kept verbatim.
pub fn render_positional<V: fmt::Display>(template: &str, values: &[V]) -> String {
    POSITIONAL_REGEX
        .replace_all(template, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| values.get(i))
                .map(|v| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
