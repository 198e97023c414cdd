mod cli;
mod commands;
mod paths;
mod schema;

use std::fs;
use std::fs::File;

use clap::Parser;
use log::info;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::cli::Cli;
use crate::cli::Command;

/// Logs to the rotated file under the cache directory, and to stderr with
/// `--verbose`. Logging is best effort; failing to set it up never stops a
/// command.
fn init_logging(verbose: bool) {
    paths::rotate_logs();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if let Some(path) = paths::log_file() {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        match File::create(&path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file)),
            Err(e) => eprintln!("warning: cannot create log file {}: {}", path.display(), e),
        }
    }
    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("datagrid {} on table '{}'", env!("CARGO_PKG_VERSION"), cli.table);

    match &cli.command {
        Command::Export(args) => commands::export(&cli, args).await,
        Command::View(args) => commands::view(&cli, args).await,
        Command::Columns { action } => commands::columns(&cli, action).await,
    }
}
