//! Shared command-line plumbing for the binaries.

use clap::error::ErrorKind;
use clap::{Args, Parser};
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::telemetry;

/// Options every tool accepts.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (optional; defaults apply when it does not exist)
    #[arg(short = 'f', long, env = "STELE_BENCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log per-entry detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Initialize logging and load the configuration.
    pub fn init(&self) -> anyhow::Result<Config> {
        telemetry::init_telemetry(self.verbose)?;
        let config = Config::load(&self.config)?;
        tracing::debug!(config = ?config, "Loaded configuration");
        Ok(config)
    }
}

/// Outcome of command-line parsing, before any process exit.
#[derive(Debug)]
pub enum Parsed<T> {
    Run(T),
    Exit { code: i32, message: String, to_stderr: bool },
}

/// Parse `args`, mapping help and version requests to exit status 0 and every usage error
/// (including a missing positional argument) to exit status 1.
pub fn try_parse_from<T, I, S>(args: I) -> Parsed<T>
where
    T: Parser,
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(parsed) => Parsed::Run(parsed),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Parsed::Exit {
                code: 0,
                message: err.to_string(),
                to_stderr: false,
            },
            _ => Parsed::Exit {
                code: 1,
                message: err.render().to_string(),
                to_stderr: true,
            },
        },
    }
}

/// Parse the process arguments, exiting on help or usage errors.
pub fn parse_args<T: Parser>() -> T {
    match try_parse_from::<T, _, _>(std::env::args_os()) {
        Parsed::Run(parsed) => parsed,
        Parsed::Exit { code, message, to_stderr } => {
            if to_stderr {
                eprint!("{message}");
            } else {
                print!("{message}");
            }
            std::process::exit(code);
        }
    }
}
