//! Tests for tag validation.

use super::*;
use crate::error::TagsmithError;

fn prompt_tags() -> TagSet {
    TagSet::new(TagFamily::Prompt).unwrap()
}

fn complete(set: &TagSet, line: &str) -> ValidatedTag {
    match set.validate(line).unwrap() {
        Some(LineMatch::Complete(tag)) => tag,
        other => panic!("expected complete match for {:?}, got {:?}", line, other),
    }
}

#[test]
fn all_patterns_compile() {
    TagSet::new(TagFamily::Prompt).unwrap();
    TagSet::new(TagFamily::Cleanup).unwrap();
}

#[test]
fn plain_text_does_not_match() {
    let set = prompt_tags();
    assert!(set.validate("def main():").unwrap().is_none());
    assert!(set.validate("# a regular comment").unwrap().is_none());
    assert!(set.validate("#!/usr/bin/env python3").unwrap().is_none());
    assert!(set.validate("").unwrap().is_none());
}

#[test]
fn prefix_tags_capture_text() {
    let set = prompt_tags();
    let tag = complete(&set, "   #T Hello world  ");
    assert_eq!(tag.kind, TagKind::Title);
    assert_eq!(tag.text.as_deref(), Some("Hello world"));

    assert_eq!(complete(&set, "#C note").kind, TagKind::Comment);
    assert_eq!(complete(&set, "#N text").kind, TagKind::Normal);
    assert_eq!(complete(&set, "#B intro").kind, TagKind::BeginText);
    assert_eq!(complete(&set, "#E outro").kind, TagKind::EndText);
    assert_eq!(complete(&set, "#L Traceback").kind, TagKind::Error);
}

#[test]
fn prefix_tag_needs_separator() {
    let set = prompt_tags();
    // "#Tree" is not a title with text "ree".
    assert!(set.validate("#Tree").unwrap().is_none());
}

#[test]
fn tree_with_arguments() {
    let set = prompt_tags();
    let tag = complete(&set, "#tree src (2, true, [])");
    assert_eq!(tag.kind, TagKind::Tree);
    assert_eq!(tag.target.as_deref(), Some("src"));
    assert_eq!(
        tag.args,
        vec![Literal::Int(2), Literal::Bool(true), Literal::List(vec![])]
    );
}

#[test]
fn tree_arity_exceeded_is_validation_error() {
    let set = prompt_tags();
    let err = set.validate("#tree src (2, true, [], 4)").unwrap_err();
    assert!(matches!(err, TagsmithError::ValidationError(_)));
    assert!(err.to_string().contains("at most 3"));
}

#[test]
fn wrong_argument_type_is_validation_error() {
    let set = prompt_tags();
    let err = set.validate("#tree src (true)").unwrap_err();
    assert!(err.to_string().contains("argument 1"));
    assert!(err.to_string().contains("must be int"));
}

#[test]
fn malformed_argument_list_is_validation_error() {
    let set = prompt_tags();
    let err = set.validate("#summarize app.py (tru").unwrap_err();
    assert!(matches!(err, TagsmithError::ValidationError(_)));
}

#[test]
fn run_family_is_order_sensitive() {
    let set = prompt_tags();
    assert_eq!(complete(&set, "#run_pylint app.py").kind, TagKind::RunPylint);
    assert_eq!(
        complete(&set, "#run_unittest tests/test_app.py(2)").kind,
        TagKind::RunUnittest
    );
    let run = complete(&set, r#"#run script.py (["--fast"])"#);
    assert_eq!(run.kind, TagKind::Run);
    assert_eq!(run.target.as_deref(), Some("script.py"));
}

#[test]
fn summarize_folder_before_summarize() {
    let set = prompt_tags();
    let tag = complete(&set, r#"#summarize_folder pkg (true, ["tests"], ["setup.py"])"#);
    assert_eq!(tag.kind, TagKind::SummarizeFolder);
    assert_eq!(complete(&set, "#summarize pkg/mod.py").kind, TagKind::Summarize);
}

#[test]
fn dispatch_directive_forms() {
    let set = prompt_tags();
    assert!(complete(&set, "#makequery").args.is_empty());
    let send = complete(&set, "#send(true, 2000)");
    assert_eq!(send.kind, TagKind::Dispatch);
    assert_eq!(send.args, vec![Literal::Bool(true), Literal::Int(2000)]);
    let send = complete(&set, "#send(false, None)");
    assert_eq!(send.args[1], Literal::None);
}

#[test]
fn checksum_value() {
    let set = prompt_tags();
    let tag = complete(&set, "#checksum 12");
    assert_eq!(tag.kind, TagKind::Checksum);
    assert_eq!(tag.target.as_deref(), Some("12"));
}

#[test]
fn current_file_folder_and_file_paths() {
    let set = prompt_tags();
    assert_eq!(complete(&set, "#File").kind, TagKind::CurrentFile);
    let folder = complete(&set, "#src/utils/");
    assert_eq!(folder.kind, TagKind::Folder);
    assert_eq!(folder.target.as_deref(), Some("src/utils/"));
    let file = complete(&set, "#utils/helpers.py");
    assert_eq!(file.kind, TagKind::File);
    assert_eq!(file.target.as_deref(), Some("utils/helpers.py"));
}

#[test]
fn fill_and_templates() {
    let set = prompt_tags();
    let fill = complete(&set, "#*greeting");
    assert_eq!(fill.kind, TagKind::Fill);
    assert_eq!(fill.target.as_deref(), Some("greeting"));

    let plain = complete(&set, "#review_macros");
    assert_eq!(plain.kind, TagKind::Template);
    assert_eq!(plain.target.as_deref(), Some("review"));

    let with_args = complete(&set, r#"#review_macros+("app.py", 3)"#);
    assert_eq!(with_args.kind, TagKind::Template);
    assert_eq!(with_args.args.len(), 2);
}

#[test]
fn multiline_template_arguments() {
    let set = prompt_tags();
    let open = match set.validate("#review_macros+(\"app.py\",").unwrap() {
        Some(LineMatch::Open(open)) => open,
        other => panic!("expected open tag, got {:?}", other),
    };
    let mut open = open;
    assert!(!open.push_line("   \"a (paren) in a string\","));
    assert!(open.push_line("   3)"));
    let tag = set.finish(open).unwrap();
    assert_eq!(tag.kind, TagKind::Template);
    assert_eq!(
        tag.args,
        vec![
            Literal::Str("app.py".to_string()),
            Literal::Str("a (paren) in a string".to_string()),
            Literal::Int(3),
        ]
    );
}

#[test]
fn declaration_order_is_preserved() {
    let set = prompt_tags();
    let kinds: Vec<TagKind> = set.descriptors().map(|d| d.kind).collect();
    let expected: Vec<TagKind> = PROMPT_TAGS.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, expected);
    assert_eq!(kinds.first(), Some(&TagKind::Checksum));
    assert_eq!(kinds.last(), Some(&TagKind::File));
}

#[test]
fn cleanup_family_tags() {
    let set = TagSet::new(TagFamily::Cleanup).unwrap();
    let only = complete(&set, "#select_only [RL, BF]");
    assert_eq!(only.kind, TagKind::SelectOnly);
    assert_eq!(
        only.args[0].as_str_list(),
        Some(vec!["RL".to_string(), "BF".to_string()])
    );
    assert_eq!(complete(&set, "#select_not [\"BF\"]").kind, TagKind::SelectNot);
    assert_eq!(complete(&set, "#force_select [IS]").kind, TagKind::ForceSelect);
    assert_eq!(complete(&set, "#checkpointing").kind, TagKind::Checkpointing);
    assert_eq!(
        complete(&set, "#checkpointing(false)").args,
        vec![Literal::Bool(false)]
    );
    // Prompt tags are plain text for the cleanup family.
    assert!(set.validate("#T title").unwrap().is_none());
}
