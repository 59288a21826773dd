use std::fs;
use tempfile::TempDir;
use widgetbind::config::{ConfigError, EngineConfig};
use widgetbind::scheduler::CoalescePolicy;
use widgetbind::tree::RenderMode;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config");
    (dir, path)
}

#[test]
fn test_config_default_values() {
    let config = EngineConfig::default();
    assert_eq!(config.evaluation.coalesce, CoalescePolicy::Merge);
    assert_eq!(config.actions.timeout_ms, 10_000);
    assert_eq!(config.actions.max_actions, 32);
    assert_eq!(config.render.mode, RenderMode::View);
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = EngineConfig::config_path();
    assert!(path.ends_with("widgetbind/config.toml"));
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.actions.timeout_ms, 10_000);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config(
        r#"
[evaluation]
coalesce = "defer"

[render]
mode = "editor"
"#,
    );
    let config = EngineConfig::load_from(&path).unwrap();
    assert_eq!(config.evaluation.coalesce, CoalescePolicy::Defer);
    assert_eq!(config.render.mode, RenderMode::Editor);
    assert_eq!(config.actions.max_actions, 32);
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[actions\ntimeout_ms = 5");
    let err = EngineConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_zero_timeout_fails_validation() {
    let (_dir, path) = write_config("[actions]\ntimeout_ms = 0\n");
    let err = EngineConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}
