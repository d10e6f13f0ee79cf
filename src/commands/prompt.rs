//! Implementation of the `tagsmith prompt` command.

use super::existing_file;
use crate::cli::{DuplicateDispatchArg, PromptArgs};
use crate::compose::{OutputMode, PromptOptions, PromptOutcome, run_prompt};
use crate::config::DuplicateDispatchPolicy;
use crate::context::Session;
use crate::dispatch::{AnthropicDispatch, RemoteDispatch};
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use serde_json::json;
use std::path::Path;

impl From<DuplicateDispatchArg> for DuplicateDispatchPolicy {
    fn from(arg: DuplicateDispatchArg) -> Self {
        match arg {
            DuplicateDispatchArg::LastWins => DuplicateDispatchPolicy::LastWins,
            DuplicateDispatchArg::Reject => DuplicateDispatchPolicy::Reject,
        }
    }
}

/// Execute the `tagsmith prompt` command.
pub fn cmd_prompt(args: PromptArgs) -> Result<()> {
    let file = existing_file(&args.file)?;
    let session = Session::resolve_from(&file)?;
    let dispatcher = AnthropicDispatch::new(session.config.remote.clone());
    prompt_with(&session, &file, &args, &dispatcher).map(|_| ())
}

pub(crate) fn prompt_with(
    session: &Session,
    file: &Path,
    args: &PromptArgs,
    dispatcher: &dyn RemoteDispatch,
) -> Result<PromptOutcome> {
    let options = PromptOptions {
        mode: if args.query {
            OutputMode::Query
        } else {
            OutputMode::Prompt
        },
        dry_run: args.dry_run,
        no_send: args.no_send,
        duplicate_dispatch: args.duplicate_dispatch.map(Into::into),
    };

    let outcome = run_prompt(session, file, &options, dispatcher)?;

    if args.dry_run || args.print {
        println!("{}", outcome.composed);
    }
    if args.dry_run {
        return Ok(outcome);
    }

    print_outcome(session, file, &outcome);

    let relative = session.display_path(file);
    let path_detail = |p: &Option<std::path::PathBuf>| p.as_deref().map(|p| session.display_path(p));
    append_event(
        session,
        &Event::new(EventAction::Prompt)
            .with_file(relative)
            .with_details(json!({
                "mode": if args.query { "query" } else { "prompt" },
                "macro_lines": outcome.macro_lines,
                "composed": path_detail(&outcome.composed_path),
                "response": path_detail(&outcome.response_path),
                "code": path_detail(&outcome.code_path),
                "backup": outcome.backup.as_ref().map(|b| b.id.clone()),
            })),
    )?;

    Ok(outcome)
}

fn print_outcome(session: &Session, file: &Path, outcome: &PromptOutcome) {
    println!(
        "Processed {} ({} macro line(s) removed)",
        session.display_path(file),
        outcome.macro_lines
    );
    if let Some(path) = &outcome.composed_path {
        println!("  composed: {}", session.display_path(path));
    }
    if let Some(path) = &outcome.response_path {
        println!("  response: {}", session.display_path(path));
    }
    if let Some(path) = &outcome.code_path {
        println!("  code:     {}", session.display_path(path));
    }
    if let Some(record) = &outcome.backup {
        println!(
            "  replaced source in place (backup {}; undo with `tagsmith backup recover {}`)",
            record.id, record.source
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_events;
    use crate::test_support::{DirGuard, RecordingDispatch, create_test_project, test_session, write_file};
    use serial_test::serial;
    use std::fs;
    use std::path::PathBuf;

    fn args(file: &Path) -> PromptArgs {
        PromptArgs {
            file: file.to_path_buf(),
            query: false,
            dry_run: false,
            no_send: false,
            duplicate_dispatch: None,
            print: false,
        }
    }

    #[test]
    fn test_prompt_logs_event_with_artifacts() {
        let project = create_test_project();
        let file = write_file(project.path(), "src/app.py", "#T Hello\n#C World\nx = 1\n");
        let session = test_session(&project);

        let outcome = prompt_with(&session, &file, &args(&file), &RecordingDispatch::failing()).unwrap();
        assert_eq!(outcome.macro_lines, 2);

        let events = read_events(&session).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::Prompt);
        assert_eq!(events[0].file.as_deref(), Some("src/app.py"));
        assert_eq!(events[0].details["mode"], "prompt");
        assert_eq!(events[0].details["composed"], ".tagsmith/chat/app_prompt.md");
        assert!(events[0].details["response"].is_null());
    }

    #[test]
    fn test_dry_run_logs_nothing() {
        let project = create_test_project();
        let original = "#C hi\nbody\n";
        let file = write_file(project.path(), "app.py", original);
        let session = test_session(&project);
        let mut prompt_args = args(&file);
        prompt_args.dry_run = true;

        prompt_with(&session, &file, &prompt_args, &RecordingDispatch::failing()).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
        assert!(read_events(&session).unwrap().is_empty());
    }

    #[test]
    fn test_cli_policy_overrides_config() {
        let project = create_test_project();
        let file = write_file(project.path(), "app.py", "#send\n#makequery\n");
        let session = test_session(&project);
        let mut prompt_args = args(&file);
        prompt_args.duplicate_dispatch = Some(DuplicateDispatchArg::Reject);

        let err = prompt_with(&session, &file, &prompt_args, &RecordingDispatch::failing()).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::CONFLICT_FAILURE);
    }

    #[test]
    #[serial]
    fn test_cmd_prompt_with_relative_path() {
        let project = create_test_project();
        write_file(project.path(), "pkg/mod.py", "#C from cwd\nvalue = 2\n");
        let _guard = DirGuard::new(&project.path().join("pkg"));

        cmd_prompt(args(&PathBuf::from("mod.py"))).unwrap();

        let output = project.path().join(".tagsmith/chat/mod_prompt.md");
        assert_eq!(fs::read_to_string(output).unwrap(), "\n\nfrom cwd");
        assert_eq!(
            fs::read_to_string(project.path().join("pkg/mod.py")).unwrap(),
            "value = 2\n"
        );
    }

    #[test]
    #[serial]
    fn test_cmd_prompt_missing_file() {
        let project = create_test_project();
        let _guard = DirGuard::new(project.path());
        let err = cmd_prompt(args(&PathBuf::from("absent.py"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
