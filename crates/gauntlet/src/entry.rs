//! Whole-tree process entry point.

use std::fs::File;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

use gauntlet_core::{Config, FanoutReporter, FilterError, NameFilter, Outcome, Reporter, SuiteCase};
use gauntlet_engine::EngineError;
use gauntlet_report::{
    ConsoleReporter, DocumentBuilder, JsonlReporter, ReportError, TapReporter, Verbosity,
};

use crate::cli::{Cli, Format};

/// Anything that can stop a test binary before a verdict exists.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Parse the real command line, execute `root`, and map the verdict to
/// an exit status: success covers pass, skip, and fully-filtered trees.
pub fn run_main(root: SuiteCase) -> ExitCode {
    let cli = Cli::parse();
    match execute(&cli, &root) {
        Ok(verdict) if verdict.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("gauntlet: {err}");
            ExitCode::from(2)
        }
    }
}

/// Execute (or list) `root` under the parsed flags.
pub fn execute(cli: &Cli, root: &SuiteCase) -> Result<Outcome, HarnessError> {
    let mut config = Config::new().with_debug(cli.debug);
    if let Some(pattern) = &cli.filter {
        config = config.with_filter(NameFilter::new(pattern, cli.icase)?);
    }

    if cli.list {
        let mut console = ConsoleReporter::stdout(Verbosity::Verbose, cli.color.choice());
        gauntlet_engine::show(&config, root, &mut console);
        return Ok(Outcome::Pass);
    }

    let mut log = match &cli.log {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| HarnessError::Report(ReportError::Io(err)))?;
            Some(JsonlReporter::new(file))
        }
        None => None,
    };

    let verdict = match cli.format {
        Format::Console => {
            let verbosity = if cli.verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Terse
            };
            let mut console = ConsoleReporter::stdout(verbosity, cli.color.choice());
            run_with_log(&config, root, &mut console, log.as_mut())?
        }
        Format::Tap => {
            let mut tap = TapReporter::new(io::stdout());
            run_with_log(&config, root, &mut tap, log.as_mut())?
        }
        Format::Json => {
            let mut builder = DocumentBuilder::new();
            let verdict = run_with_log(&config, root, &mut builder, log.as_mut())?;
            let document = builder.finish()?;
            println!("{}", document.to_json()?);
            verdict
        }
    };
    Ok(verdict)
}

fn run_with_log(
    config: &Config,
    root: &SuiteCase,
    primary: &mut dyn Reporter,
    log: Option<&mut JsonlReporter<File>>,
) -> Result<Outcome, EngineError> {
    let summary = match log {
        Some(log) => {
            let mut fanout = FanoutReporter::new().with(primary).with(log);
            gauntlet_engine::run(config, root, &mut fanout)?
        }
        None => gauntlet_engine::run(config, root, primary)?,
    };
    Ok(summary.verdict)
}
