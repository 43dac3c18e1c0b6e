mod dashboard;
mod forecast;
mod tickers;

use std::sync::Arc;

use serde_json::Value;
use stockcast_core::{
    AdditiveEngine, Dashboard, DashboardConfig, DashboardView, Envelope, EnvelopeError,
    HttpClient, ReqwestHttpClient, SyntheticHttpClient,
};
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub view: Option<DashboardView>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            view: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
        }
    }

    pub fn with_view(mut self, view: DashboardView) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    /// Wrap into an envelope; `setup_warnings` come first in the metadata.
    pub fn into_output(self, setup_warnings: Vec<String>) -> CommandOutput {
        let mut metadata = Metadata::new(self.latency_ms, self.cache_hit);
        for warning in setup_warnings.into_iter().chain(self.warnings) {
            metadata.push_warning(warning);
        }

        CommandOutput {
            envelope: Envelope::with_errors(metadata.into_envelope_meta(), self.data, self.errors),
            view: self.view,
        }
    }
}

/// Exit code when a command ran but the dashboard landed in its error state.
pub const ERROR_STATE_EXIT_CODE: u8 = 3;

/// What a non-interactive command hands to the output layer.
pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    /// Typed view for the table renderer, when the command produced one.
    pub view: Option<DashboardView>,
}

impl CommandOutput {
    pub fn exit_code(&self) -> u8 {
        if self.envelope.errors.is_empty() {
            0
        } else {
            ERROR_STATE_EXIT_CODE
        }
    }
}

/// Run the selected command. The dashboard draws to the terminal itself and
/// returns `None`.
pub async fn run(cli: &Cli) -> Result<Option<CommandOutput>, CliError> {
    let (app, setup_warnings) = build_dashboard(cli)?;

    let command_result = match &cli.command {
        Command::Forecast(args) => forecast::run(args, &app).await?,
        Command::Tickers => tickers::run(app.config())?,
        Command::Dashboard(args) => {
            dashboard::run(args, &app).await?;
            return Ok(None);
        }
    };

    Ok(Some(command_result.into_output(setup_warnings)))
}

/// Read configuration and pick the transport for `--mock`.
fn build_dashboard(cli: &Cli) -> Result<(Dashboard<AdditiveEngine>, Vec<String>), CliError> {
    let mut config = DashboardConfig::from_env()?;
    if let Command::Forecast(args) = &cli.command {
        if let Some(tail) = args.tail {
            config = config.with_tail_rows(tail);
        }
    }

    let mut warnings = Vec::new();
    let http_client: Arc<dyn HttpClient> = if cli.mock {
        Arc::new(SyntheticHttpClient::new(config.start_date, config.end_date))
    } else {
        if config.api_key.is_empty() && !matches!(cli.command, Command::Tickers) {
            warn!("no API key configured");
            warnings.push(String::from(
                "STOCKCAST_API_KEY is not set; upstream requests will likely be rejected",
            ));
        }
        Arc::new(ReqwestHttpClient::new())
    };

    let app = Dashboard::new(config, http_client, AdditiveEngine::default())?;
    Ok((app, warnings))
}
