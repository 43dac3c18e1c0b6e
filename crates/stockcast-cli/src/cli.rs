//! CLI argument definitions for stockcast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forecast` | Fetch, forecast and print one dashboard view |
//! | `dashboard` | Interactive terminal dashboard |
//! | `tickers` | List the ticker allow-list and horizon bounds |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve deterministic offline data |
//! | `--log-file` | none | Write logs to a file instead of stderr |
//!
//! # Examples
//!
//! ```bash
//! stockcast forecast --ticker AAPL --years 2 --pretty
//! stockcast --mock dashboard --ticker GME
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stock price history and forecast dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "stockcast",
    author,
    version,
    about = "Stock price history and forecast dashboard",
    long_about = "Fetches daily price history for a fixed set of tickers, fits an additive \
trend and seasonality model to the closing price and shows the forecast with its components.\n\
\n\
The API key is read from STOCKCAST_API_KEY (a .env file is honoured)."
)]
pub struct Cli {
    /// Output format for non-interactive commands.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic synthetic history instead of calling the remote API.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Append logs to this file. The dashboard is silent without it.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text tables.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline once and print the resulting view.
    Forecast(ForecastArgs),
    /// Open the interactive terminal dashboard.
    Dashboard(DashboardArgs),
    /// List selectable tickers and horizon bounds.
    Tickers,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Ticker from the allow-list.
    #[arg(long, short)]
    pub ticker: String,

    /// Forecast horizon in years.
    #[arg(long, short, default_value_t = 1)]
    pub years: u32,

    /// Rows shown from the end of each table.
    #[arg(long)]
    pub tail: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Initial ticker; defaults to the first allow-listed one.
    #[arg(long, short)]
    pub ticker: Option<String>,

    /// Initial horizon in years.
    #[arg(long, short, default_value_t = 1)]
    pub years: u32,
}
