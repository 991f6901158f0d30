//! Logger setup for the binary. The library only uses the `log` macros.

use crate::config::LogSettings;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

/// Install the global logger.
///
/// Records go to stderr unless `settings.file` is set, in which case they
/// are appended to that file. `verbose` forces the `debug` level.
pub fn init(settings: &LogSettings, verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        settings.level_filter()?
    };

    match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => {
            TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )?;
        }
    }
    log::debug!("logging initialised at {level}");
    Ok(())
}
