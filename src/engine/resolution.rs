//! Tag-to-resolver dispatch and template expansion.

use super::{Expansion, MacroEngine, MacroMatch};
use crate::error::{Result, TagsmithError};
use crate::grammar::{Literal, TagKind, ValidatedTag};
use crate::render::render_positional;
use crate::resolve::{self, EntryKind, TreeOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `#tree` depth when the tag gives none.
const DEFAULT_TREE_DEPTH: usize = 3;

/// `#run_unittest` verbosity when the tag gives none.
const DEFAULT_UNITTEST_VERBOSITY: i64 = 1;

impl MacroEngine<'_> {
    pub(super) fn resolve_tag(
        &self,
        tag: ValidatedTag,
        line: usize,
        expansion: &mut Expansion,
    ) -> Result<Vec<MacroMatch>> {
        let kind = tag.kind;
        let base = MacroMatch::new(kind, line).with_arguments(tag.args.clone());

        let resolved = match kind {
            TagKind::Checksum => vec![base.with_content(target(&tag)?)],

            TagKind::Dispatch
            | TagKind::SelectOnly
            | TagKind::SelectNot
            | TagKind::ForceSelect
            | TagKind::Checkpointing => vec![base],

            TagKind::Title
            | TagKind::Comment
            | TagKind::Normal
            | TagKind::BeginText
            | TagKind::EndText => vec![base.with_content(tag.text.clone().unwrap_or_default())],

            TagKind::Error => vec![
                base.with_title("Error")
                    .with_content(tag.text.clone().unwrap_or_default()),
            ],

            TagKind::Fill => {
                let name = target(&tag)?;
                vec![base.with_content(resolve::fill_text(self.session, name)?)]
            }

            TagKind::CurrentFile => {
                let current = expansion.current_file;
                vec![
                    base.with_title(self.session.display_path(current))
                        .with_source(current),
                ]
            }

            TagKind::File => {
                let path = self.path(&tag, EntryKind::File, expansion)?;
                let content = resolve::read_text(self.session, &path)?;
                vec![
                    base.with_title(self.session.display_path(&path))
                        .with_content(content)
                        .with_source(path),
                ]
            }

            TagKind::Folder => {
                let dir = self.path(&tag, EntryKind::Dir, expansion)?;
                self.folder_matches(&dir, line)?
            }

            TagKind::Run => {
                let script = self.path(&tag, EntryKind::File, expansion)?;
                let args = tag.arg(0).and_then(Literal::as_str_list).unwrap_or_default();
                let output = resolve::run_script(self.session, &script, &args)?;
                vec![
                    base.with_title(format!("Output of {}", self.session.display_path(&script)))
                        .with_content(output.captured()),
                ]
            }

            TagKind::RunPylint => {
                let path = self.path(&tag, EntryKind::File, expansion)?;
                let output = resolve::run_pylint(self.session, &path)?;
                vec![
                    base.with_title(format!(
                        "Pylint report for {}",
                        self.session.display_path(&path)
                    ))
                    .with_content(output.captured()),
                ]
            }

            TagKind::RunUnittest => {
                let path = self.path(&tag, EntryKind::File, expansion)?;
                let verbosity = tag
                    .arg(0)
                    .and_then(Literal::as_int)
                    .unwrap_or(DEFAULT_UNITTEST_VERBOSITY);
                let output = resolve::run_unittest(self.session, &path, verbosity)?;
                vec![
                    base.with_title(format!(
                        "Unit test results for {}",
                        self.session.display_path(&path)
                    ))
                    .with_content(output.captured()),
                ]
            }

            TagKind::Tree => {
                let dir = self.path(&tag, EntryKind::Dir, expansion)?;
                let options = TreeOptions {
                    max_depth: tree_depth(&tag)?,
                    include_files: tag.arg(1).and_then(Literal::as_bool).unwrap_or(true),
                    ignore: tag
                        .arg(2)
                        .and_then(Literal::as_str_list)
                        .unwrap_or_else(|| self.session.config.tree_ignore.clone()),
                };
                let tree = resolve::render_tree(&dir, &self.session.root, &options)?;
                vec![
                    base.with_title(format!(
                        "Directory tree of {}",
                        self.session.display_path(&dir)
                    ))
                    .with_content(tree),
                ]
            }

            TagKind::Summarize => {
                let path = self.path(&tag, EntryKind::File, expansion)?;
                let docstrings = tag.arg(0).and_then(Literal::as_bool).unwrap_or(true);
                match resolve::summarize_file(&path, docstrings)? {
                    Some(summary) => vec![
                        base.with_title(format!("Summary of {}", self.session.display_path(&path)))
                            .with_content(summary)
                            .with_source(path),
                    ],
                    None => {
                        debug!(file = %path.display(), "no declarations to summarize");
                        Vec::new()
                    }
                }
            }

            TagKind::SummarizeFolder => {
                let dir = self.path(&tag, EntryKind::Dir, expansion)?;
                let docstrings = tag.arg(0).and_then(Literal::as_bool).unwrap_or(true);
                let excluded_dirs = tag.arg(1).and_then(Literal::as_str_list).unwrap_or_default();
                let excluded_files = tag.arg(2).and_then(Literal::as_str_list).unwrap_or_default();
                resolve::summarize_folder(&dir, docstrings, &excluded_dirs, &excluded_files)?
                    .into_iter()
                    .map(|(path, summary)| {
                        MacroMatch::new(kind, line)
                            .with_title(format!("Summary of {}", self.session.display_path(&path)))
                            .with_content(summary)
                            .with_source(path)
                    })
                    .collect()
            }

            TagKind::Template => {
                let name = target(&tag)?.to_string();
                self.expand_template(&name, &tag.args, line, expansion)?
            }
        };

        Ok(resolved)
    }

    fn path(&self, tag: &ValidatedTag, kind: EntryKind, expansion: &Expansion) -> Result<PathBuf> {
        resolve::resolve_path(self.session, target(tag)?, kind, expansion.current_file)
    }

    /// One file item per readable text file directly inside `dir`.
    fn folder_matches(&self, dir: &Path, line: usize) -> Result<Vec<MacroMatch>> {
        let mut matches = Vec::new();
        for file in resolve::folder_files(dir)? {
            let bytes = std::fs::read(&file).map_err(|e| {
                TagsmithError::UserError(format!("failed to read '{}': {}", file.display(), e))
            })?;
            let Ok(content) = String::from_utf8(bytes) else {
                debug!(file = %file.display(), "skipping non-text file");
                continue;
            };
            matches.push(
                MacroMatch::new(TagKind::File, line)
                    .with_title(self.session.display_path(&file))
                    .with_content(content)
                    .with_source(file),
            );
        }
        Ok(matches)
    }

    /// Expand a template in place.
    ///
    /// The template text is rendered with `{1}`, `{2}`, ... bound to `args`
    /// (only when arguments were given) and scanned with the same validators.
    /// Its plain lines become `#N` text.
    fn expand_template(
        &self,
        name: &str,
        args: &[Literal],
        line: usize,
        expansion: &mut Expansion,
    ) -> Result<Vec<MacroMatch>> {
        if expansion.stack.iter().any(|active| active == name) {
            let mut chain = expansion.stack.clone();
            chain.push(name.to_string());
            return Err(TagsmithError::ValidationError(format!(
                "template '{}' includes itself: {}",
                name,
                chain.join(" -> ")
            )));
        }

        let max_depth = self.session.config.max_template_depth;
        if expansion.stack.len() >= max_depth {
            return Err(TagsmithError::ValidationError(format!(
                "template '{}' exceeds the maximum nesting depth of {}",
                name, max_depth
            )));
        }

        let path = resolve::lookup_named(&self.session.templates_dir(), name, "template")?;
        let raw = resolve::read_text(self.session, &path)?;
        let text = if args.is_empty() {
            raw
        } else {
            render_positional(&raw, args)
        };

        debug!(template = name, depth = expansion.stack.len() + 1, "expanding template");
        expansion.stack.push(name.to_string());
        let scanned = self.scan(&text, expansion, true);
        expansion.stack.pop();

        // A checksum counts lines of the file being processed, not of a template.
        Ok(scanned?
            .matches
            .into_iter()
            .filter(|m| {
                if m.kind == TagKind::Checksum {
                    warn!(template = name, "ignoring #checksum inside template");
                    return false;
                }
                true
            })
            .map(|mut m| {
                m.line = line;
                m
            })
            .collect())
    }
}

fn target(tag: &ValidatedTag) -> Result<&str> {
    tag.target.as_deref().ok_or_else(|| {
        TagsmithError::ValidationError(format!("'{}' requires a target", tag.syntax))
    })
}

fn tree_depth(tag: &ValidatedTag) -> Result<usize> {
    match tag.arg(0).and_then(Literal::as_int) {
        None => Ok(DEFAULT_TREE_DEPTH),
        Some(depth) => usize::try_from(depth).map_err(|_| {
            TagsmithError::ValidationError(format!(
                "'{}' max_depth must not be negative, got {}",
                tag.syntax, depth
            ))
        }),
    }
}
