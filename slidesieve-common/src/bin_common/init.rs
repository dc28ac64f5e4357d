use std::{fs::File, io::IsTerminal, path::Path};

use color_eyre::eyre::{self, Context};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger,
    TermLogger, TerminalMode, ThreadLogMode, WriteLogger,
};

const LEVEL: LevelFilter = LevelFilter::Debug;

pub fn init_eyre() -> eyre::Result<()> {
    color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .install()
        .wrap_err("Failed to install eyre")
}

pub fn init_logger(logfile: Option<&Path>) -> eyre::Result<()> {
    let (config, in_local_time) = logger_config();

    let color = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LEVEL,
        config.clone(),
        TerminalMode::Stdout,
        color,
    )];

    let file_failed = match logfile.map(File::create) {
        Some(Ok(file)) => {
            loggers.push(WriteLogger::new(LEVEL, config, file));
            None
        }
        Some(Err(e)) => Some(e),
        None => None,
    };

    CombinedLogger::init(loggers).wrap_err("Failed to set the logger")?;

    if !in_local_time {
        log::warn!("Could not find the local time zone, timestamps are in UTC");
    }
    match (logfile, file_failed) {
        (Some(path), Some(e)) => log::error!(
            "Failed to create the log file at '{}' because: {e}",
            path.display()
        ),
        (Some(path), None) => log::debug!("Logging to: {}", path.display()),
        (None, _) => (),
    }

    Ok(())
}

fn logger_config() -> (Config, bool) {
    let mut builder = ConfigBuilder::new();
    builder.set_thread_level(LevelFilter::Error);
    builder.set_target_level(LevelFilter::Error);
    builder.set_location_level(LevelFilter::Off);
    builder.set_thread_mode(ThreadLogMode::Both);

    // NOTE: only works while the process is still single threaded.
    let in_local_time = builder.set_time_offset_to_local().is_ok();

    (builder.build(), in_local_time)
}
