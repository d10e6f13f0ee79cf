//! Python source summaries for `#summarize` and `#summarize_folder`.
//!
//! The source is parsed with tree-sitter, never imported. Top-level
//! functions and classes (decorators included) are emitted as their header
//! text up to the body, optionally followed by the docstring.

use crate::error::{Result, TagsmithError};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

/// Summarize Python source text.
///
/// Returns `None` when the text has no top-level declarations.
pub fn summarize_source(content: &str, docstrings: bool) -> Result<Option<String>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| TagsmithError::UserError(format!("failed to load Python grammar: {}", e)))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| TagsmithError::UserError("failed to parse Python source".to_string()))?;

    let root = tree.root_node();
    let mut cursor = root.walk();
    let blocks: Vec<String> = root
        .named_children(&mut cursor)
        .filter_map(|node| declaration(node, content, docstrings))
        .collect();

    if blocks.is_empty() {
        Ok(None)
    } else {
        Ok(Some(blocks.join("\n\n")))
    }
}

/// Summarize a Python file on disk.
pub fn summarize_file(path: &Path, docstrings: bool) -> Result<Option<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        TagsmithError::UserError(format!("failed to read '{}': {}", path.display(), e))
    })?;
    summarize_source(&content, docstrings)
}

/// Summarize every `.py` file under `dir`, recursively.
///
/// Directories and files are excluded by basename; hidden directories are
/// skipped. Files without declarations are omitted from the result.
pub fn summarize_folder(
    dir: &Path,
    docstrings: bool,
    excluded_dirs: &[String],
    excluded_files: &[String],
) -> Result<Vec<(PathBuf, String)>> {
    let walker = WalkDir::new(dir).min_depth(1).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !name.starts_with('.') && !excluded_dirs.iter().any(|d| *d == name)
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            TagsmithError::UserError(format!("failed to read directory '{}': {}", dir.display(), e))
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type().is_file() && name.ends_with(".py") && !excluded_files.contains(&name) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut summaries = Vec::new();
    for file in files {
        if let Some(summary) = summarize_file(&file, docstrings)? {
            summaries.push((file, summary));
        }
    }
    Ok(summaries)
}

/// Header (and docstring) of a top-level definition node.
fn declaration(node: Node, source: &str, docstrings: bool) -> Option<String> {
    let definition = match node.kind() {
        "function_definition" | "class_definition" => node,
        "decorated_definition" => node.child_by_field_name("definition")?,
        _ => return None,
    };
    let body = definition.child_by_field_name("body")?;
    let header = source[node.start_byte()..body.start_byte()].trim_end();

    let mut block = header.to_string();
    if docstrings && let Some(doc) = docstring(body, source, node.start_byte() + header.len()) {
        block.push('\n');
        block.push_str(doc);
    }
    Some(block)
}

/// The docstring statement opening `body`, with its indentation.
fn docstring<'s>(body: Node, source: &'s str, header_end: usize) -> Option<&'s str> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }

    let mut inner = first.walk();
    let expr = first.named_children(&mut inner).next()?;
    if expr.kind() != "string" {
        return None;
    }

    let line_start = source[..first.start_byte()].rfind('\n').map_or(0, |i| i + 1);
    Some(&source[line_start.max(header_end)..first.end_byte()])
}
