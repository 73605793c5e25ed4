use hostbind_logger::{LevelFilter, LogFormat, Logger};

#[test]
fn json_console_logger_has_no_file_guard() {
    let logger = Logger::builder()
        .name("hostbind-console-json")
        .console_format(LogFormat::Json)
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    tracing::info!(registration = "default/acme", "reconcile finished");

    assert!(logger.guard().is_none(), "console-only logger should not create a file guard");
}
