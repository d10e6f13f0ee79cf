//! Append-only run log for tagsmith.
//!
//! Every prompt, cleanup, backup and batch action appends one event to
//! `.tagsmith/events.ndjson` (one JSON object per line).
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: the action performed (prompt, cleanup, backup_store, ...)
//! - `actor`: `user@HOST`
//! - `file`: optional root-relative path the action worked on
//! - `details`: freeform object with action-specific details
//!
//! ```no_run
//! use tagsmith::context::Session;
//! use tagsmith::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let session = Session::resolve()?;
//! let event = Event::new(EventAction::Prompt)
//!     .with_file("src/app.py")
//!     .with_details(json!({"macro_lines": 3}));
//! append_event(&session, &event)?;
//! # Ok::<(), tagsmith::error::TagsmithError>(())
//! ```

use crate::context::Session;
use crate::error::{Result, TagsmithError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Project scaffolded
    Init,
    /// Prompt or query composed (and possibly dispatched)
    Prompt,
    /// Cleanup strategies run on a file
    Cleanup,
    BackupStore,
    BackupRecover,
    BackupCleanup,
    /// One file of a batch run finished
    Batch,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::Prompt => write!(f, "prompt"),
            EventAction::Cleanup => write!(f, "cleanup"),
            EventAction::BackupStore => write!(f, "backup_store"),
            EventAction::BackupRecover => write!(f, "backup_recover"),
            EventAction::BackupCleanup => write!(f, "backup_cleanup"),
            EventAction::Batch => write!(f, "batch"),
        }
    }
}

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// Who ran the action (e.g., `user@HOST`).
    pub actor: String,

    /// Root-relative path of the file the action worked on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            file: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            TagsmithError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the run log, creating the file if needed.
pub fn append_event(session: &Session, event: &Event) -> Result<()> {
    let events_file = session.events_file();
    let json_line = event.to_ndjson_line()?;

    if let Some(dir) = events_file.parent()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to create events directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            TagsmithError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event in the run log, oldest first.
///
/// A missing log is empty. Malformed lines are an error naming the line.
pub fn read_events(session: &Session) -> Result<Vec<Event>> {
    let events_file = session.events_file();
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&events_file).map_err(|e| {
        TagsmithError::UserError(format!(
            "failed to read events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                TagsmithError::UserError(format!(
                    "malformed event on line {} of '{}': {}",
                    index + 1,
                    events_file.display(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_project, test_session};
    use serde_json::json;

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Init);

        assert_eq!(event.action, EventAction::Init);
        assert!(!event.actor.is_empty());
        assert!(event.file.is_none());
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new(EventAction::Prompt)
            .with_file("src/app.py")
            .with_details(json!({"macro_lines": 3, "dispatched": false}));

        let json_line = event.to_ndjson_line().unwrap();
        assert!(!json_line.contains('\n'));

        let parsed: Event = serde_json::from_str(&json_line).unwrap();
        assert_eq!(parsed.action, EventAction::Prompt);
        assert_eq!(parsed.file, Some("src/app.py".to_string()));
        assert_eq!(parsed.details["macro_lines"], 3);
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json_line = Event::new(EventAction::BackupRecover).to_ndjson_line().unwrap();
        assert!(json_line.contains("\"backup_recover\""));
        assert_eq!(EventAction::BackupCleanup.to_string(), "backup_cleanup");
    }

    #[test]
    fn test_event_without_file_omits_field() {
        let json_line = Event::new(EventAction::Init).to_ndjson_line().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_line).unwrap();
        assert!(parsed.get("file").is_none());
    }

    #[test]
    fn test_append_and_read_events() {
        let project = create_test_project();
        let session = test_session(&project);
        assert!(read_events(&session).unwrap().is_empty());

        append_event(&session, &Event::new(EventAction::Init)).unwrap();
        append_event(
            &session,
            &Event::new(EventAction::Cleanup).with_file("app.py"),
        )
        .unwrap();

        let content = fs::read_to_string(session.events_file()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));

        let events = read_events(&session).unwrap();
        assert_eq!(events[0].action, EventAction::Init);
        assert_eq!(events[1].action, EventAction::Cleanup);
        assert_eq!(events[1].file.as_deref(), Some("app.py"));
    }

    #[test]
    fn test_append_creates_state_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let session = Session::with_config(
            temp_dir.path().to_path_buf(),
            crate::config::Config::default(),
        );
        append_event(&session, &Event::new(EventAction::Init)).unwrap();
        assert!(session.events_file().exists());
    }

    #[test]
    fn test_malformed_line_is_reported() {
        let project = create_test_project();
        let session = test_session(&project);
        fs::write(session.events_file(), "{not json}\n").unwrap();
        let err = read_events(&session).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_get_actor_string() {
        assert!(get_actor_string().contains('@'));
    }
}
