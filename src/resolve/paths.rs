//! Closest-match path resolution.
//!
//! Tags name files by bare name or path fragment (`#main.py`, `#pkg/util.py`,
//! `#tree src`). The fragment is matched component-wise against the tail of
//! every entry under the project root, and the candidate closest to the
//! reference file wins:
//!
//! 1. Longest common directory prefix with the reference file's directory
//! 2. Fewest steps between the two directories
//!
//! Candidates tied on both are reported as [`TagsmithError::Ambiguous`].

use crate::context::Session;
use crate::error::{Result, TagsmithError};
use crate::grammar::CURRENT_FILE_TOKEN;
use globset::GlobSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Which kind of filesystem entry a tag expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    fn matches(self, path: &Path) -> bool {
        match self {
            EntryKind::File => path.is_file(),
            EntryKind::Dir => path.is_dir(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "directory",
        }
    }
}

/// Resolve `fragment` to an absolute path under the session root.
///
/// `reference` is the file whose tags are being processed; the reserved
/// [`CURRENT_FILE_TOKEN`] resolves to it directly.
pub fn resolve_path(
    session: &Session,
    fragment: &str,
    kind: EntryKind,
    reference: &Path,
) -> Result<PathBuf> {
    if fragment == CURRENT_FILE_TOKEN {
        return match kind {
            EntryKind::File => Ok(reference.to_path_buf()),
            EntryKind::Dir => reference.parent().map(Path::to_path_buf).ok_or_else(|| {
                TagsmithError::NotFound(format!(
                    "directory of '{}'",
                    session.display_path(reference)
                ))
            }),
        };
    }

    let trimmed = fragment.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return match kind {
            EntryKind::Dir => Ok(session.root.clone()),
            EntryKind::File => Err(TagsmithError::NotFound(format!("file '{}'", fragment))),
        };
    }

    let direct = Path::new(trimmed);
    if direct.is_absolute() {
        return if kind.matches(direct) {
            Ok(direct.to_path_buf())
        } else {
            Err(TagsmithError::NotFound(format!(
                "{} '{}'",
                kind.describe(),
                fragment
            )))
        };
    }

    let wanted = normal_components(direct);
    let ignore = session.config.search_ignore_set()?;
    let candidates = collect_candidates(&session.root, &wanted, kind, &ignore)?;

    let reference_dir = reference.parent().unwrap_or(&session.root);
    pick_closest(session, fragment, kind, reference_dir, candidates)
}

fn pick_closest(
    session: &Session,
    fragment: &str,
    kind: EntryKind,
    reference_dir: &Path,
    candidates: Vec<PathBuf>,
) -> Result<PathBuf> {
    let reference = normal_components(reference_dir);
    let scored: Vec<((usize, usize), PathBuf)> = candidates
        .into_iter()
        .map(|path| {
            let dir = normal_components(path.parent().unwrap_or(Path::new("")));
            let common = reference
                .iter()
                .zip(dir.iter())
                .take_while(|(a, b)| a == b)
                .count();
            let distance = (reference.len() - common) + (dir.len() - common);
            ((common, distance), path)
        })
        .collect();

    let Some(best) = scored
        .iter()
        .map(|(score, _)| *score)
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
    else {
        return Err(TagsmithError::NotFound(format!(
            "{} '{}' under '{}'",
            kind.describe(),
            fragment,
            session.root.display()
        )));
    };

    let mut winners: Vec<PathBuf> = scored
        .into_iter()
        .filter(|(score, _)| *score == best)
        .map(|(_, path)| path)
        .collect();

    if winners.len() > 1 {
        let mut names: Vec<String> = winners.iter().map(|p| session.display_path(p)).collect();
        names.sort();
        return Err(TagsmithError::Ambiguous {
            name: fragment.to_string(),
            candidates: names.join(", "),
        });
    }

    let chosen = winners.remove(0);
    debug!(fragment, resolved = %chosen.display(), "resolved path");
    Ok(chosen)
}

fn collect_candidates(
    root: &Path,
    wanted: &[String],
    kind: EntryKind,
    ignore: &GlobSet,
) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !ignore.is_match(e.path().strip_prefix(root).unwrap_or(e.path()))
        });

    let mut out = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            TagsmithError::UserError(format!("failed to walk '{}': {}", root.display(), e))
        })?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if kind.matches(path) && normal_components(relative).ends_with(wanted) {
            out.push(path.to_path_buf());
        }
    }
    Ok(out)
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            Component::RootDir | Component::Prefix(_) => Some(String::from("/")),
            _ => None,
        })
        .collect()
}

/// Read a file as UTF-8 text.
pub fn read_text(session: &Session, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to read '{}': {}",
            session.display_path(path),
            e
        ))
    })
}

/// Files directly inside `dir`, sorted, skipping hidden entries.
pub fn folder_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            TagsmithError::UserError(format!("failed to read directory '{}': {}", dir.display(), e))
        })?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Look up `name` in `dir` as-is, then with `.txt` and `.md` appended.
pub fn lookup_named(dir: &Path, name: &str, what: &str) -> Result<PathBuf> {
    for candidate in [
        name.to_string(),
        format!("{}.txt", name),
        format!("{}.md", name),
    ] {
        let path = dir.join(&candidate);
        if path.is_file() {
            return Ok(path);
        }
    }

    Err(TagsmithError::NotFound(format!(
        "{} '{}' in '{}'",
        what,
        name,
        dir.display()
    )))
}
