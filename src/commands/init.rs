//! Implementation of the `tagsmith init` command.
//!
//! Scaffolds `.tagsmith/` in the current directory:
//!
//! 1. Writes `config.yaml` with the default profile (if missing)
//! 2. Creates every directory the profile names (templates, fill texts,
//!    output, backups, checkpoints, scratch)
//! 3. Writes `.tagsmith/.gitignore` so scratch files stay untracked
//!
//! Running it again keeps an existing config and only creates what is
//! missing.

use crate::config::Config;
use crate::context::{CONFIG_FILE_NAME, STATE_DIR_NAME, Session};
use crate::error::{Result, TagsmithError};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use serde_json::json;
use std::env;
use std::fs;
use std::path::Path;

const GITIGNORE_ENTRIES: &[&str] = &["tmp/", "events.ndjson", "batch_status.csv"];

/// Execute the `tagsmith init` command.
pub fn cmd_init() -> Result<()> {
    let cwd = env::current_dir().map_err(|e| {
        TagsmithError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    let created_config = init_project(&cwd)?;
    let session = Session::resolve_from(&cwd)?;

    append_event(
        &session,
        &Event::new(EventAction::Init).with_details(json!({ "created_config": created_config })),
    )?;

    println!("Initialized tagsmith project in {}", cwd.display());
    println!();
    if created_config {
        println!("Created {}/{}", STATE_DIR_NAME, CONFIG_FILE_NAME);
    } else {
        println!("Kept existing {}/{}", STATE_DIR_NAME, CONFIG_FILE_NAME);
    }
    println!("Directories:");
    for dir in project_dirs(&session.config) {
        println!("  {}/", dir);
    }
    println!();
    println!("Add tags such as `#T Title` or `#tree src` to a file, then run `tagsmith prompt <file>`.");

    Ok(())
}

/// Create the state directory, config and profile directories under `root`.
///
/// Returns whether a new config file was written.
pub(crate) fn init_project(root: &Path) -> Result<bool> {
    let state_dir = root.join(STATE_DIR_NAME);
    create_dir(&state_dir)?;

    let config_path = state_dir.join(CONFIG_FILE_NAME);
    let created_config = !config_path.exists();
    let config = if created_config {
        let config = Config::default();
        atomic_write_file(&config_path, &config.to_yaml()?)?;
        config
    } else {
        Config::load(&config_path)?
    };

    for dir in project_dirs(&config) {
        create_dir(&root.join(dir))?;
    }

    ensure_gitignore(&state_dir.join(".gitignore"))?;
    Ok(created_config)
}

fn project_dirs(config: &Config) -> [&str; 6] {
    [
        config.templates_dir.as_str(),
        config.fill_text_dir.as_str(),
        config.output_dir.as_str(),
        config.backup_dir.as_str(),
        config.checkpoint_dir.as_str(),
        config.temp_dir.as_str(),
    ]
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to create directory '{}': {}",
            path.display(),
            e
        ))
    })
}

fn ensure_gitignore(path: &Path) -> Result<()> {
    let existing = fs::read_to_string(path).unwrap_or_default();
    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for entry in missing {
        content.push_str(entry);
        content.push('\n');
    }
    atomic_write_file(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::read_events;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_init_project_scaffolds_everything() {
        let temp_dir = TempDir::new().unwrap();
        let created = init_project(temp_dir.path()).unwrap();
        assert!(created);

        let state = temp_dir.path().join(".tagsmith");
        assert!(state.join("config.yaml").is_file());
        for dir in ["templates", "fill", "chat", "backups", "checkpoints", "tmp"] {
            assert!(state.join(dir).is_dir(), "missing {dir}");
        }
        let gitignore = fs::read_to_string(state.join(".gitignore")).unwrap();
        assert!(gitignore.lines().any(|l| l == "tmp/"));

        let config = Config::load(state.join("config.yaml")).unwrap();
        assert_eq!(config.max_backups, Config::default().max_backups);
    }

    #[test]
    fn test_init_project_is_idempotent_and_keeps_config() {
        let temp_dir = TempDir::new().unwrap();
        init_project(temp_dir.path()).unwrap();

        let config_path = temp_dir.path().join(".tagsmith/config.yaml");
        fs::write(&config_path, "max_backups: 3\noutput_dir: out\n").unwrap();
        fs::write(temp_dir.path().join(".tagsmith/.gitignore"), "custom\ntmp/").unwrap();

        let created = init_project(temp_dir.path()).unwrap();
        assert!(!created);
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "max_backups: 3\noutput_dir: out\n"
        );
        assert!(temp_dir.path().join("out").is_dir());

        let gitignore = fs::read_to_string(temp_dir.path().join(".tagsmith/.gitignore")).unwrap();
        assert_eq!(gitignore, "custom\ntmp/\nevents.ndjson\nbatch_status.csv\n");
    }

    #[test]
    #[serial]
    fn test_cmd_init_in_cwd_logs_event() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_init().unwrap();

        let session = Session::resolve_from(temp_dir.path()).unwrap();
        let events = read_events(&session).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, EventAction::Init);
        assert_eq!(events[0].details["created_config"], true);
    }
}
