use hostbind_kernel::config::{ConfigError, load_config};
use hostbind_kernel::domain::config::ControllerConfig;
use std::fs;

#[test]
fn loads_toml_file_over_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("controller.toml");
    fs::write(
        &path,
        r#"
[controller]
workers = 4
conflict_retries = 9

[verification]
record_prefix = "_verify"

[logging]
format = "json"
"#,
    )?;

    let cfg: ControllerConfig = load_config(Some(&path))?;
    assert_eq!(cfg.controller.workers, 4);
    assert_eq!(cfg.controller.conflict_retries, 9);
    assert_eq!(cfg.controller.requeue_delay_ms, 5_000);
    assert_eq!(cfg.verification.record_prefix, "_verify");
    assert_eq!(cfg.logging.format, "json");
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");

    let err = load_config::<ControllerConfig>(Some(&missing)).expect_err("missing file");
    assert!(matches!(err, ConfigError::Config { context: Some(_), .. }));
}

#[test]
fn malformed_values_fail_deserialization() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("controller.toml");
    fs::write(&path, "[controller]\nworkers = \"many\"\n")?;

    let err = load_config::<ControllerConfig>(Some(&path)).expect_err("bad type");
    assert!(err.to_string().contains("Failed to deserialize config"));
    Ok(())
}
