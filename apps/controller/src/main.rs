use anyhow::Context;
use hostbind_controller::App;
use hostbind_domain::config::{ControllerConfig, LoggingConfig};
use hostbind_kernel::config::load_config;
use hostbind_logger::{LogFormat, Logger, parse_level};

fn init_logger(cfg: &LoggingConfig) -> anyhow::Result<Logger> {
    let mut builder = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .level(parse_level(&cfg.level)?)
        .console_format(cfg.format.parse::<LogFormat>()?);
    if let Some(filter) = &cfg.filter {
        builder = builder.env_filter(filter);
    }

    let logger = match &cfg.path {
        Some(path) => {
            let builder = builder.path(path).max_files(cfg.max_files);
            if cfg.json_files { builder.json().init() } else { builder.init() }
        },
        None => builder.init(),
    };
    logger.context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1);
    let cfg: ControllerConfig =
        load_config(path.as_ref()).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg.logging)?;

    App::builder().config(cfg).build().await?.run().await
}
