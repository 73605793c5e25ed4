use hostbind_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("hostbind-file-logging")
        .console(false)
        .path(&log_dir)
        .json()
        .level(LevelFilter::INFO)
        .init()?;

    tracing::info!(domain = "acme.example", "domain binding ensured");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|l| l.contains("domain binding ensured")).expect("log line");
    assert!(line.trim_start().starts_with('{'), "file lines should be JSON objects: {line}");
    assert!(line.contains("acme.example"));

    Ok(())
}
