//! Directory tree rendering for `#tree`.

use crate::error::{Result, TagsmithError};
use std::path::Path;
use walkdir::WalkDir;

/// Options for [`render_tree`].
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Deepest level rendered below the root directory (1 = direct children).
    pub max_depth: usize,
    pub include_files: bool,
    /// Entries skipped by exact basename or root-relative path.
    pub ignore: Vec<String>,
}

/// Render `dir` as an indented tree.
///
/// Directories are listed before files, each group alphabetically.
///
/// ```text
/// src/
/// ├── pkg/
/// │   └── util.py
/// └── main.py
/// ```
pub fn render_tree(dir: &Path, root: &Path, options: &TreeOptions) -> Result<String> {
    let name = if dir == root {
        ".".to_string()
    } else {
        dir.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string())
    };

    let entries = list_entries(dir, root, options)?;
    let last = last_among_siblings(&entries);

    let mut out = format!("{}/\n", name);
    // Whether the open ancestor at each depth was the last of its siblings.
    let mut open: Vec<bool> = Vec::new();
    for (entry, is_last) in entries.iter().zip(last) {
        open.truncate(entry.depth - 1);
        for ancestor_last in &open {
            out.push_str(if *ancestor_last { "    " } else { "│   " });
        }
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(&entry.name);
        if entry.is_dir {
            out.push('/');
        }
        out.push('\n');
        open.push(is_last);
    }

    Ok(out.trim_end().to_string())
}

struct TreeEntry {
    depth: usize,
    name: String,
    is_dir: bool,
}

/// Entries below `dir` in preorder, directories before files at each level.
fn list_entries(dir: &Path, root: &Path, options: &TreeOptions) -> Result<Vec<TreeEntry>> {
    if options.max_depth == 0 {
        return Ok(Vec::new());
    }

    let include_files = options.include_files;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(options.max_depth)
        .sort_by(|a, b| {
            b.file_type()
                .is_dir()
                .cmp(&a.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || (!is_ignored(e.path(), root, &options.ignore)
                    && (include_files || e.file_type().is_dir()))
        });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            TagsmithError::UserError(format!("failed to read directory '{}': {}", dir.display(), e))
        })?;
        entries.push(TreeEntry {
            depth: entry.depth(),
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

/// For each preorder entry, whether no later sibling follows it.
fn last_among_siblings(entries: &[TreeEntry]) -> Vec<bool> {
    let mut sibling_seen: Vec<bool> = Vec::new();
    let mut last = vec![false; entries.len()];
    for (i, entry) in entries.iter().enumerate().rev() {
        sibling_seen.resize(entry.depth + 1, false);
        last[i] = !sibling_seen[entry.depth];
        sibling_seen[entry.depth] = true;
    }
    last
}

fn is_ignored(path: &Path, root: &Path, ignore: &[String]) -> bool {
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    ignore
        .iter()
        .map(|entry| entry.trim_end_matches('/'))
        .any(|entry| entry == basename || entry == relative)
}
