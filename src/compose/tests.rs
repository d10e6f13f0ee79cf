//! Tests for composition and the prompt run.

use super::*;
use crate::backup::BackupStore;
use crate::config::{Config, DuplicateDispatchPolicy};
use crate::context::Session;
use crate::error::TagsmithError;
use crate::postprocess::PromptDirectives;
use crate::test_support::{RecordingDispatch, create_test_project, test_session, write_file};
use std::fs;
use std::path::PathBuf;

fn item(kind: TagKind, title: Option<&str>, text: Option<&str>) -> ResolvedItem {
    ResolvedItem {
        kind,
        default_title: title.map(str::to_string),
        text: text.map(str::to_string),
        source: None,
    }
}

fn document(items: Vec<ResolvedItem>) -> PromptDocument {
    PromptDocument {
        items,
        directives: PromptDirectives::default(),
    }
}

#[test]
fn test_title_propagates_to_next_item_only() {
    let doc = document(vec![
        item(TagKind::Title, None, Some("A")),
        item(TagKind::File, Some("x.py"), Some("x = 1\n")),
        item(TagKind::Title, None, Some("B")),
        item(TagKind::Comment, None, Some("note")),
        item(TagKind::Normal, None, Some("tail")),
    ]);

    let composed = Composer::new(OutputMode::Query).compose(&doc, "");
    assert_eq!(
        composed,
        "\n\n--- A ---\nx = 1\n\n--- B ---\nnote\n\ntail"
    );
    assert_eq!(composed.matches("--- ").count(), 2);
}

#[test]
fn test_default_title_used_without_pending_title() {
    let doc = document(vec![item(TagKind::File, Some("pkg/x.py"), Some("pass"))]);
    let composed = Composer::new(OutputMode::Query).compose(&doc, "");
    assert_eq!(composed, "\n\n--- pkg/x.py ---\npass");
}

#[test]
fn test_hello_world_scenario() {
    let doc = document(vec![
        item(TagKind::Title, None, Some("Hello")),
        item(TagKind::Comment, None, Some("World")),
    ]);
    let composed = Composer::new(OutputMode::Prompt).compose(&doc, "");
    assert_eq!(composed, "\n\n--- Hello ---\nWorld");
}

#[test]
fn test_current_file_uses_stripped_text() {
    let doc = document(vec![item(TagKind::CurrentFile, Some("app.py"), None)]);
    let composed = Composer::new(OutputMode::Query).compose(&doc, "a = 1\nb = 2\n");
    assert_eq!(composed, "\n\n--- app.py ---\na = 1\nb = 2");
}

#[test]
fn test_prompt_mode_fences_code_and_output() {
    let mut code = item(TagKind::File, Some("x.py"), Some("x = 1\n"));
    code.source = Some(PathBuf::from("/p/x.py"));
    let doc = document(vec![
        code,
        item(TagKind::Run, Some("Output of run.sh"), Some("ok\n")),
        item(TagKind::Comment, None, Some("prose")),
    ]);

    let composed = Composer::new(OutputMode::Prompt).compose(&doc, "");
    assert_eq!(
        composed,
        "\n\n--- x.py ---\n```python\nx = 1\n```\
         \n\n--- Output of run.sh ---\n```\nok\n```\
         \n\nprose"
    );
}

#[test]
fn test_begin_and_end_wrap_body() {
    let mut doc = document(vec![item(TagKind::Comment, None, Some("body"))]);
    doc.directives.begin_text = Some("Start".to_string());
    doc.directives.end_text = Some("End".to_string());

    let composed = Composer::new(OutputMode::Query).compose(&doc, "");
    assert_eq!(
        composed,
        "Start\n\n**********\n\nbody\n\n**********\n\nEnd"
    );
}

#[test]
fn test_language_for_extensions() {
    assert_eq!(language_for(Path::new("a.py")), "python");
    assert_eq!(language_for(Path::new("a.rs")), "rust");
    assert_eq!(language_for(Path::new("Makefile")), "");
}

#[test]
fn test_verify_checksum() {
    let original = "#T a\n#C b\nx\ny\nz\n";
    let stripped = "x\ny\nz\n";
    assert!(verify_checksum(original, stripped, Some(2), false).is_ok());
    assert!(verify_checksum(original, stripped, None, false).is_ok());

    let err = verify_checksum(original, stripped, Some(3), false).unwrap_err();
    match err {
        TagsmithError::IntegrityError { expected, actual } => {
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("expected integrity error, got {other:?}"),
    }

    let err = verify_checksum(original, stripped, None, true).unwrap_err();
    assert!(err.to_string().contains("#checksum 2"));
}

#[test]
fn test_run_prompt_scenario_writes_stripped_and_composed() {
    let project = create_test_project();
    let file = write_file(
        project.path(),
        "app.py",
        "#T Hello\n#C World\n#checksum 3\na\nb\n",
    );
    let session = test_session(&project);
    let dispatcher = RecordingDispatch::failing();

    let outcome = run_prompt(&session, &file, &PromptOptions::default(), &dispatcher).unwrap();

    assert_eq!(outcome.composed, "\n\n--- Hello ---\nWorld");
    assert_eq!(outcome.macro_lines, 3);
    assert_eq!(fs::read_to_string(&file).unwrap(), "a\nb\n");
    let composed_path = outcome.composed_path.unwrap();
    assert!(composed_path.ends_with(".tagsmith/chat/app_prompt.md"));
    assert_eq!(
        fs::read_to_string(composed_path).unwrap(),
        "\n\n--- Hello ---\nWorld"
    );
    assert!(dispatcher.calls.borrow().is_empty());
}

#[test]
fn test_run_prompt_checks_only_the_file_checksum() {
    let project = create_test_project();
    write_file(
        project.path(),
        ".tagsmith/templates/review.txt",
        "#checksum 1\n#C review this\n",
    );
    let file = write_file(project.path(), "app.py", "#review_macros\n#checksum 2\nx = 1\n");
    let session = test_session(&project);

    let outcome = run_prompt(&session, &file, &PromptOptions::default(), &RecordingDispatch::failing()).unwrap();
    assert_eq!(outcome.composed, "\n\nreview this");
    assert_eq!(fs::read_to_string(&file).unwrap(), "x = 1\n");
}

#[test]
fn test_run_prompt_query_mode_artifact() {
    let project = create_test_project();
    let file = write_file(project.path(), "job.py", "#C ask\nx\n");
    let session = test_session(&project);
    let options = PromptOptions {
        mode: OutputMode::Query,
        ..Default::default()
    };

    let outcome = run_prompt(&session, &file, &options, &RecordingDispatch::failing()).unwrap();
    assert!(outcome.composed_path.unwrap().ends_with("job_query.txt"));
}

#[test]
fn test_checksum_mismatch_leaves_everything_untouched() {
    let project = create_test_project();
    let original = "#T Hello\n#C World\n#checksum 2\na\nb\n";
    let file = write_file(project.path(), "app.py", original);
    let session = test_session(&project);

    let err = run_prompt(
        &session,
        &file,
        &PromptOptions::default(),
        &RecordingDispatch::failing(),
    )
    .unwrap_err();

    assert!(matches!(err, TagsmithError::IntegrityError { expected: 2, actual: 3 }));
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
    assert!(!session.output_path(&file, "prompt.md").exists());
}

#[test]
fn test_resolver_failure_leaves_source_untouched() {
    let project = create_test_project();
    let original = "#T x\n#missing.py\nbody\n";
    let file = write_file(project.path(), "app.py", original);
    let session = test_session(&project);

    let err = run_prompt(
        &session,
        &file,
        &PromptOptions::default(),
        &RecordingDispatch::failing(),
    )
    .unwrap_err();
    assert!(matches!(err, TagsmithError::NotFound(_)));
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[test]
fn test_dry_run_writes_nothing() {
    let project = create_test_project();
    let original = "#C hi\n#send\nbody\n";
    let file = write_file(project.path(), "app.py", original);
    let session = test_session(&project);
    let dispatcher = RecordingDispatch::replying("unused");
    let options = PromptOptions {
        dry_run: true,
        ..Default::default()
    };

    let outcome = run_prompt(&session, &file, &options, &dispatcher).unwrap();
    assert_eq!(outcome.composed, "\n\nhi");
    assert!(outcome.composed_path.is_none());
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
    assert!(dispatcher.calls.borrow().is_empty());
}

#[test]
fn test_dispatch_writes_response_and_code() {
    let project = create_test_project();
    let file = write_file(project.path(), "app.py", "#C fix it\n#send(false, 500)\nx = 1\n");
    let session = test_session(&project);
    let dispatcher = RecordingDispatch::replying("Sure:\n```python\nx = 2\n```\n");

    let outcome = run_prompt(&session, &file, &PromptOptions::default(), &dispatcher).unwrap();

    let calls = dispatcher.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ("\n\nfix it".to_string(), 500));

    let response_path = outcome.response_path.unwrap();
    assert!(response_path.ends_with("app_response.txt"));
    let code_path = outcome.code_path.unwrap();
    assert!(code_path.ends_with("app_code.py"));
    assert_eq!(fs::read_to_string(code_path).unwrap(), "x = 2\n");
    // Not in place: the source keeps its stripped content.
    assert_eq!(fs::read_to_string(&file).unwrap(), "x = 1\n");
    assert!(outcome.backup.is_none());
}

#[test]
fn test_dispatch_uses_default_token_budget() {
    let project = create_test_project();
    let file = write_file(project.path(), "app.py", "#makequery\n#C q\n");
    let mut config = Config::default();
    config.remote.default_max_tokens = 777;
    let session = Session::with_config(project.path().to_path_buf(), config);
    let dispatcher = RecordingDispatch::replying("no code");

    let outcome = run_prompt(&session, &file, &PromptOptions::default(), &dispatcher).unwrap();
    assert_eq!(dispatcher.calls.borrow()[0].1, 777);
    assert!(outcome.code_path.is_none());
}

#[test]
fn test_modify_in_place_backs_up_then_overwrites() {
    let project = create_test_project();
    let file = write_file(project.path(), "app.py", "#C refactor\n#send(true)\nold = 1\n");
    let session = test_session(&project);
    let dispatcher = RecordingDispatch::replying("```python\nnew = 2\n```");

    let outcome = run_prompt(&session, &file, &PromptOptions::default(), &dispatcher).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "new = 2\n");
    let record = outcome.backup.unwrap();
    let store = BackupStore::new(&session);
    assert_eq!(
        fs::read_to_string(store.dir().join(&record.blob)).unwrap(),
        "old = 1\n"
    );
}

#[test]
fn test_no_send_skips_dispatch() {
    let project = create_test_project();
    let file = write_file(project.path(), "app.py", "#send\n#C q\n");
    let session = test_session(&project);
    let dispatcher = RecordingDispatch::replying("x");
    let options = PromptOptions {
        no_send: true,
        ..Default::default()
    };

    let outcome = run_prompt(&session, &file, &options, &dispatcher).unwrap();
    assert!(outcome.composed_path.is_some());
    assert!(outcome.response_path.is_none());
    assert!(dispatcher.calls.borrow().is_empty());
}

#[test]
fn test_dispatch_failure_is_surfaced_after_writes() {
    let project = create_test_project();
    let file = write_file(project.path(), "app.py", "#send\n#C q\nbody\n");
    let session = test_session(&project);

    let err = run_prompt(
        &session,
        &file,
        &PromptOptions::default(),
        &RecordingDispatch::failing(),
    )
    .unwrap_err();
    assert!(matches!(err, TagsmithError::DispatchError(_)));
    assert!(session.output_path(&file, "prompt.md").exists());
}

#[test]
fn test_duplicate_dispatch_override_rejects() {
    let project = create_test_project();
    let original = "#send\n#makequery\nbody\n";
    let file = write_file(project.path(), "app.py", original);
    let session = test_session(&project);
    let options = PromptOptions {
        duplicate_dispatch: Some(DuplicateDispatchPolicy::Reject),
        ..Default::default()
    };

    let err = run_prompt(&session, &file, &options, &RecordingDispatch::failing()).unwrap_err();
    assert!(matches!(err, TagsmithError::ConflictError(_)));
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}
