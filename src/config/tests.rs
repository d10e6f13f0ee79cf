//! Tests for config functionality.

use crate::config::types::{default_cleanup_strategies, default_search_ignore};
use crate::config::{Config, DuplicateDispatchPolicy};

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.backup_dir, ".tagsmith/backups");
    assert_eq!(config.checkpoint_dir, ".tagsmith/checkpoints");
    assert_eq!(config.fill_text_dir, ".tagsmith/fill");
    assert_eq!(config.templates_dir, ".tagsmith/templates");
    assert_eq!(config.output_dir, ".tagsmith/chat");
    assert_eq!(config.python, "python3");
    assert!(config.python_env.is_none());
    assert_eq!(config.subprocess_timeout_secs, 120);
    assert_eq!(config.max_backups, 20);
    assert_eq!(config.max_template_depth, 8);
    assert_eq!(config.duplicate_dispatch, DuplicateDispatchPolicy::LastWins);
    assert!(!config.require_checksum);
    assert_eq!(config.search_ignore, default_search_ignore());
    assert_eq!(config.cleanup_strategies, default_cleanup_strategies());
    assert!(config.unknown.is_empty());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.max_backups, 20);
    assert_eq!(config.python, "python3");
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
python: /usr/bin/python3.12
max_backups: 5
duplicate_dispatch: reject
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.python, "/usr/bin/python3.12");
    assert_eq!(config.max_backups, 5);
    assert_eq!(config.duplicate_dispatch, DuplicateDispatchPolicy::Reject);

    // Unspecified values should use defaults
    assert_eq!(config.max_template_depth, 8);
    assert_eq!(config.output_dir, ".tagsmith/chat");
}

#[test]
fn test_parse_nested_sections() {
    let yaml = r#"
remote:
  model: test-model
  default_max_tokens: 1000
cleanup_strategies:
  - code: FMT
    name: format
    command: "fmt {file}"
    enabled_by_default: true
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.remote.model, "test-model");
    assert_eq!(config.remote.default_max_tokens, 1000);
    assert_eq!(config.remote.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(config.strategy_codes(), vec!["FMT"]);
}

#[test]
fn test_unknown_keys_are_collected_not_fatal() {
    let yaml = r#"
max_backups: 3
future_setting: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.max_backups, 3);
    assert!(config.unknown.contains_key("future_setting"));
}

#[test]
fn test_invalid_yaml_is_user_error() {
    let err = Config::from_yaml("max_backups: [not, a, number]").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_zero_timeout_rejected() {
    let err = Config::from_yaml("subprocess_timeout_secs: 0").unwrap_err();
    assert!(err.to_string().contains("subprocess_timeout_secs"));
}

#[test]
fn test_zero_max_backups_rejected() {
    let err = Config::from_yaml("max_backups: 0").unwrap_err();
    assert!(err.to_string().contains("max_backups"));
}

#[test]
fn test_zero_template_depth_rejected() {
    let err = Config::from_yaml("max_template_depth: 0").unwrap_err();
    assert!(err.to_string().contains("max_template_depth"));
}

#[test]
fn test_duplicate_strategy_codes_rejected() {
    let yaml = r#"
cleanup_strategies:
  - code: BF
    command: "black {file}"
  - code: BF
    command: "black -q {file}"
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate cleanup strategy code 'BF'"));
}

#[test]
fn test_invalid_search_glob_rejected() {
    let yaml = r#"
search_ignore:
  - "**/[unclosed"
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("invalid search_ignore glob"));
}

#[test]
fn test_search_ignore_set_matches_nested_dirs() {
    let config = Config::default();
    let set = config.search_ignore_set().unwrap();
    assert!(set.is_match(".git"));
    assert!(set.is_match("pkg/__pycache__"));
    assert!(!set.is_match("pkg/src"));
}

#[test]
fn test_roundtrip_yaml() {
    let config = Config {
        max_backups: 7,
        python_env: Some(".venv".to_string()),
        ..Default::default()
    };
    let yaml = config.to_yaml().unwrap();
    let parsed = Config::from_yaml(&yaml).unwrap();
    assert_eq!(parsed.max_backups, 7);
    assert_eq!(parsed.python_env.as_deref(), Some(".venv"));
}

#[test]
fn test_duplicate_policy_from_str() {
    assert_eq!(
        DuplicateDispatchPolicy::from_str("reject"),
        Some(DuplicateDispatchPolicy::Reject)
    );
    assert_eq!(
        DuplicateDispatchPolicy::from_str("last_wins"),
        Some(DuplicateDispatchPolicy::LastWins)
    );
    assert_eq!(DuplicateDispatchPolicy::from_str("first"), None);
}
