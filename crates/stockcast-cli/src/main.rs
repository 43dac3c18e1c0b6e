mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "stockcast=info,stockcast_core=info";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Command::Dashboard(_));
    init_tracing(cli.log_file.as_deref(), interactive)?;

    let Some(result) = commands::run(&cli).await? else {
        return Ok(ExitCode::SUCCESS);
    };
    output::render(&result, cli.format, cli.pretty)?;

    Ok(ExitCode::from(result.exit_code()))
}

/// Logs go to `log_file` when given, otherwise to stderr. The dashboard owns
/// the terminal, so without a file it logs nothing.
fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn log_file_is_created_then_appended() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("stockcast.log");

        writeln!(open_log_file(&path).expect("create"), "first").expect("write");
        writeln!(open_log_file(&path).expect("reopen"), "second").expect("write");

        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "first\nsecond\n");
    }
}
