//! Tag descriptors and the ordered validator registry.

use super::literal::{Literal, parse_arg_list, parse_literal};
use crate::error::{Result, TagsmithError};
use regex::Regex;
use std::fmt;

/// Path argument that stands for the file being processed.
pub const CURRENT_FILE_TOKEN: &str = "File";

/// Classification of a recognized macro line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Checksum,
    Dispatch,
    RunPylint,
    RunUnittest,
    Run,
    Tree,
    SummarizeFolder,
    Summarize,
    Title,
    Comment,
    Normal,
    BeginText,
    EndText,
    Error,
    Fill,
    Template,
    CurrentFile,
    Folder,
    File,
    SelectOnly,
    SelectNot,
    ForceSelect,
    Checkpointing,
}

impl TagKind {
    /// Kinds whose consecutive runs collapse into one item.
    pub fn is_mergeable(self) -> bool {
        matches!(self, TagKind::Comment | TagKind::Normal | TagKind::Error)
    }

    /// Kinds whose content is source code (fenced with a language in prompt mode).
    pub fn is_code(self) -> bool {
        matches!(
            self,
            TagKind::File | TagKind::CurrentFile | TagKind::Summarize | TagKind::SummarizeFolder
        )
    }

    /// Kinds whose content is captured tool output.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            TagKind::Run | TagKind::RunPylint | TagKind::RunUnittest | TagKind::Tree
        )
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagKind::Checksum => "checksum",
            TagKind::Dispatch => "dispatch",
            TagKind::RunPylint => "run_pylint",
            TagKind::RunUnittest => "run_unittest",
            TagKind::Run => "run",
            TagKind::Tree => "tree",
            TagKind::SummarizeFolder => "summarize_folder",
            TagKind::Summarize => "summarize",
            TagKind::Title => "title",
            TagKind::Comment => "comment",
            TagKind::Normal => "normal",
            TagKind::BeginText => "begin_text",
            TagKind::EndText => "end_text",
            TagKind::Error => "error",
            TagKind::Fill => "fill",
            TagKind::Template => "template",
            TagKind::CurrentFile => "current_file",
            TagKind::Folder => "folder",
            TagKind::File => "file",
            TagKind::SelectOnly => "select_only",
            TagKind::SelectNot => "select_not",
            TagKind::ForceSelect => "force_select",
            TagKind::Checkpointing => "checkpointing",
        };
        write!(f, "{}", name)
    }
}

/// Expected type of one positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Bool,
    Int,
    /// An integer or `None`.
    OptInt,
    StrList,
}

impl ArgType {
    fn accepts(self, value: &Literal) -> bool {
        match self {
            ArgType::Bool => matches!(value, Literal::Bool(_)),
            ArgType::Int => matches!(value, Literal::Int(_)),
            ArgType::OptInt => matches!(value, Literal::Int(_) | Literal::None),
            ArgType::StrList => value.as_str_list().is_some(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::OptInt => "int or None",
            ArgType::StrList => "list of strings",
        }
    }
}

/// Argument contract of a tag.
#[derive(Debug, Clone, Copy)]
pub enum ArgSchema {
    /// Positional arguments, each type-checked; arity is the slice length.
    Positional(&'static [ArgType]),
    /// Any number of untyped arguments (template parameters).
    Variadic,
}

/// Immutable description of one macro tag.
#[derive(Debug, Clone, Copy)]
pub struct TagDescriptor {
    pub kind: TagKind,
    /// Human-readable syntax shown by `tagsmith tags` and in errors.
    pub syntax: &'static str,
    /// Anchored pattern with optional `target`, `text` and `args` groups.
    pub pattern: &'static str,
    pub schema: ArgSchema,
    /// The argument list may continue on following lines.
    pub multiline: bool,
}

const fn tag(kind: TagKind, syntax: &'static str, pattern: &'static str, params: &'static [ArgType]) -> TagDescriptor {
    TagDescriptor {
        kind,
        syntax,
        pattern,
        schema: ArgSchema::Positional(params),
        multiline: false,
    }
}

/// Prompt-family tags in first-match-wins order.
pub const PROMPT_TAGS: &[TagDescriptor] = &[
    tag(TagKind::Checksum, "#checksum <int>", r"^#checksum\s+(?P<target>[+-]?\d+)$", &[]),
    tag(
        TagKind::Dispatch,
        "#makequery | #send(modify_inplace, max_tokens)",
        r"^#(?:makequery|send)\s*(?P<args>\(.*)?$",
        &[ArgType::Bool, ArgType::OptInt],
    ),
    tag(
        TagKind::RunPylint,
        "#run_pylint <path>",
        r"^#run_pylint\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[],
    ),
    tag(
        TagKind::RunUnittest,
        "#run_unittest <path>(verbosity)",
        r"^#run_unittest\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[ArgType::Int],
    ),
    tag(
        TagKind::Run,
        "#run <path>(args)",
        r"^#run\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[ArgType::StrList],
    ),
    tag(
        TagKind::Tree,
        "#tree <path>(max_depth, include_files, ignore_list)",
        r"^#tree\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[ArgType::Int, ArgType::Bool, ArgType::StrList],
    ),
    tag(
        TagKind::SummarizeFolder,
        "#summarize_folder <path>(docstrings, excluded_dirs, excluded_files)",
        r"^#summarize_folder\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[ArgType::Bool, ArgType::StrList, ArgType::StrList],
    ),
    tag(
        TagKind::Summarize,
        "#summarize <path>(docstrings)",
        r"^#summarize\s+(?P<target>[^\s(]+)\s*(?P<args>\(.*)?$",
        &[ArgType::Bool],
    ),
    tag(TagKind::Title, "#T <text>", r"^#T(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::Comment, "#C <text>", r"^#C(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::Normal, "#N <text>", r"^#N(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::BeginText, "#B <text>", r"^#B(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::EndText, "#E <text>", r"^#E(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::Error, "#L <text>", r"^#L(?:\s(?P<text>.*))?$", &[]),
    tag(TagKind::Fill, "#*<name>", r"^#\*(?P<target>\S+)$", &[]),
    TagDescriptor {
        kind: TagKind::Template,
        syntax: "#<name>_macros+(args...)",
        pattern: r"^#(?P<target>\w+)_macros\+\s*(?P<args>\(.*)$",
        schema: ArgSchema::Variadic,
        multiline: true,
    },
    tag(TagKind::Template, "#<name>_macros", r"^#(?P<target>\w+)_macros$", &[]),
    tag(TagKind::CurrentFile, "#File", r"^#File$", &[]),
    tag(TagKind::Folder, "#<dir>/", r"^#(?P<target>[^\s#!*]\S*/)$", &[]),
    tag(
        TagKind::File,
        "#<path>",
        r"^#(?P<target>[^\s#!*]\S*\.[A-Za-z0-9_]+)$",
        &[],
    ),
];

/// Cleanup-family tags in first-match-wins order.
pub const CLEANUP_TAGS: &[TagDescriptor] = &[
    tag(TagKind::Checksum, "#checksum <int>", r"^#checksum\s+(?P<target>[+-]?\d+)$", &[]),
    tag(
        TagKind::SelectOnly,
        "#select_only [codes]",
        r"^#select_only\s*(?P<args>[\[(].*)$",
        &[ArgType::StrList],
    ),
    tag(
        TagKind::SelectNot,
        "#select_not [codes]",
        r"^#select_not\s*(?P<args>[\[(].*)$",
        &[ArgType::StrList],
    ),
    tag(
        TagKind::ForceSelect,
        "#force_select [codes]",
        r"^#force_select\s*(?P<args>[\[(].*)$",
        &[ArgType::StrList],
    ),
    tag(
        TagKind::Checkpointing,
        "#checkpointing(enabled)",
        r"^#checkpointing\s*(?P<args>\(.*)?$",
        &[ArgType::Bool],
    ),
    tag(TagKind::Comment, "#C <text>", r"^#C(?:\s(?P<text>.*))?$", &[]),
];

/// Which tag registry an engine is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFamily {
    Prompt,
    Cleanup,
}

impl TagFamily {
    pub fn descriptors(self) -> &'static [TagDescriptor] {
        match self {
            TagFamily::Prompt => PROMPT_TAGS,
            TagFamily::Cleanup => CLEANUP_TAGS,
        }
    }
}

/// Fields extracted from a recognized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTag {
    pub kind: TagKind,
    pub syntax: &'static str,
    /// Path, name, or integer operand following the tag keyword.
    pub target: Option<String>,
    /// Free text of prefix tags (`#T`, `#C`, ...).
    pub text: Option<String>,
    pub args: Vec<Literal>,
}

impl ValidatedTag {
    pub fn arg(&self, index: usize) -> Option<&Literal> {
        self.args.get(index)
    }
}

/// A tag whose argument list has not been closed yet.
#[derive(Debug, Clone)]
pub struct OpenTag {
    index: usize,
    target: Option<String>,
    args: String,
}

impl OpenTag {
    /// Append a continuation line. Returns true once the parentheses balance.
    pub fn push_line(&mut self, line: &str) -> bool {
        self.args.push(' ');
        self.args.push_str(line.trim());
        paren_depth(&self.args) <= 0
    }
}

/// Outcome of testing a line against the registry.
#[derive(Debug, Clone)]
pub enum LineMatch {
    Complete(ValidatedTag),
    Open(OpenTag),
}

struct CompiledTag {
    descriptor: TagDescriptor,
    regex: Regex,
}

/// Ordered validator registry for one tag family.
pub struct TagSet {
    family: TagFamily,
    tags: Vec<CompiledTag>,
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagSet")
            .field("family", &self.family)
            .field(
                "tags",
                &self.tags.iter().map(|t| t.descriptor.syntax).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TagSet {
    /// Compile the registry for a family, preserving declaration order.
    pub fn new(family: TagFamily) -> Result<Self> {
        let mut tags = Vec::with_capacity(family.descriptors().len());
        for descriptor in family.descriptors() {
            let regex = Regex::new(descriptor.pattern).map_err(|e| {
                TagsmithError::UserError(format!(
                    "invalid pattern for tag '{}': {}",
                    descriptor.syntax, e
                ))
            })?;
            tags.push(CompiledTag {
                descriptor: *descriptor,
                regex,
            });
        }
        Ok(Self { family, tags })
    }

    pub fn family(&self) -> TagFamily {
        self.family
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TagDescriptor> {
        self.tags.iter().map(|t| &t.descriptor)
    }

    /// Test a line against each validator in order; the first pattern match wins.
    ///
    /// Returns `Ok(None)` for ordinary text. A line that matches a pattern but
    /// carries an invalid argument list is a validation error, not a pass.
    pub fn validate(&self, line: &str) -> Result<Option<LineMatch>> {
        let line = line.trim();
        if !line.starts_with('#') {
            return Ok(None);
        }

        for (index, compiled) in self.tags.iter().enumerate() {
            let Some(caps) = compiled.regex.captures(line) else {
                continue;
            };
            let target = caps.name("target").map(|m| m.as_str().to_string());
            let text = caps.name("text").map(|m| m.as_str().trim_end().to_string());
            let args = caps.name("args").map(|m| m.as_str().to_string());

            if compiled.descriptor.multiline
                && let Some(args) = &args
                && paren_depth(args) > 0
            {
                return Ok(Some(LineMatch::Open(OpenTag {
                    index,
                    target,
                    args: args.clone(),
                })));
            }

            let tag = build_tag(&compiled.descriptor, target, text, args.as_deref())?;
            return Ok(Some(LineMatch::Complete(tag)));
        }

        Ok(None)
    }

    /// Validate a multi-line tag once its argument list is complete.
    pub fn finish(&self, open: OpenTag) -> Result<ValidatedTag> {
        let descriptor = self
            .tags
            .get(open.index)
            .map(|t| t.descriptor)
            .ok_or_else(|| TagsmithError::ValidationError("unknown open tag".to_string()))?;
        build_tag(&descriptor, open.target, None, Some(&open.args))
    }
}

fn build_tag(
    descriptor: &TagDescriptor,
    target: Option<String>,
    text: Option<String>,
    args: Option<&str>,
) -> Result<ValidatedTag> {
    let args = match args {
        Some(raw) => parse_args(raw).map_err(|e| {
            TagsmithError::ValidationError(format!(
                "malformed arguments for '{}': {}",
                descriptor.syntax, e
            ))
        })?,
        None => Vec::new(),
    };

    check_schema(descriptor, &args)?;

    if descriptor.kind == TagKind::Checksum
        && let Some(value) = &target
        && value.parse::<i64>().is_err()
    {
        return Err(TagsmithError::ValidationError(format!(
            "checksum value '{}' is not a valid integer",
            value
        )));
    }

    Ok(ValidatedTag {
        kind: descriptor.kind,
        syntax: descriptor.syntax,
        target,
        text,
        args,
    })
}

/// Parenthesized lists are positional; a bare `[...]` is a single argument.
fn parse_args(raw: &str) -> std::result::Result<Vec<Literal>, super::literal::LiteralError> {
    if raw.trim_start().starts_with('(') {
        parse_arg_list(raw)
    } else {
        parse_literal(raw).map(|value| vec![value])
    }
}

fn check_schema(descriptor: &TagDescriptor, args: &[Literal]) -> Result<()> {
    let ArgSchema::Positional(params) = descriptor.schema else {
        return Ok(());
    };

    if args.len() > params.len() {
        return Err(TagsmithError::ValidationError(format!(
            "'{}' takes at most {} argument(s), got {}",
            descriptor.syntax,
            params.len(),
            args.len()
        )));
    }

    for (position, (value, expected)) in args.iter().zip(params.iter()).enumerate() {
        if !expected.accepts(value) {
            return Err(TagsmithError::ValidationError(format!(
                "argument {} of '{}' must be {}, got {}",
                position + 1,
                descriptor.syntax,
                expected.describe(),
                value.type_name()
            )));
        }
    }

    Ok(())
}

/// Net parenthesis depth of `text`, ignoring parentheses inside quotes.
fn paren_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth
}
