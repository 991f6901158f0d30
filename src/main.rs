use anyhow::Result;
use argh::FromArgs;
use pipeshell::{Config, Session, logging, repl};
use std::path::PathBuf;
use std::process::ExitCode;

/// A small pipeline command interpreter.
#[derive(FromArgs)]
struct Args {
    /// run a single line and exit
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// path to a TOML config file
    #[argh(option)]
    config: Option<PathBuf>,

    /// log at debug level
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args: Args = argh::from_env();
    let config = Config::load(args.config.as_deref())?;
    logging::init(&config.log, args.verbose)?;

    let mut session = Session::new(&config)?;

    if let Some(line) = args.command {
        let result = session.execute(&line);
        repl::print_result(&result);
        let failed = result.interrupted && !result.terminated;
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    repl::run(&mut session, &config.repl)?;
    Ok(ExitCode::SUCCESS)
}
