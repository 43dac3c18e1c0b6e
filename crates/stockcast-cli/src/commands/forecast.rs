use stockcast_core::{AdditiveEngine, CacheMode, Dashboard, DashboardView, EnvelopeError};

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &ForecastArgs,
    dashboard: &Dashboard<AdditiveEngine>,
) -> Result<CommandResult, CliError> {
    let selection = dashboard.select(&args.ticker, args.years)?;
    let run = dashboard.run(&selection, CacheMode::Use).await?;

    let data = serde_json::to_value(&run.view)?;
    let mut result = CommandResult::ok(data)
        .with_warnings(run.warnings)
        .with_latency(run.latency_ms)
        .with_cache_hit(run.cache_hit);

    if let DashboardView::Unavailable(unavailable) = &run.view {
        result = result.with_error(EnvelopeError::from(unavailable));
    }

    Ok(result.with_view(run.view))
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    use stockcast_core::{
        DashboardConfig, HttpClient, HttpError, HttpRequest, HttpResponse, SyntheticHttpClient,
    };
    use time::macros::date;

    use super::*;
    use crate::commands::ERROR_STATE_EXIT_CODE;

    struct ServerError;

    impl HttpClient for ServerError {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async { Ok(HttpResponse::with_status(500, "oops")) })
        }
    }

    fn args(ticker: &str) -> ForecastArgs {
        ForecastArgs {
            ticker: ticker.to_owned(),
            years: 1,
            tail: None,
        }
    }

    fn config() -> DashboardConfig {
        DashboardConfig::default()
            .with_base_url("https://prices.example")
            .with_api_key("k3y")
    }

    #[tokio::test]
    async fn upstream_failure_attaches_an_error_and_exits_with_error_state_code() {
        let dashboard =
            Dashboard::new(config(), Arc::new(ServerError), AdditiveEngine::default())
                .expect("valid config");

        let result = run(&args("GME"), &dashboard).await.expect("command runs");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "upstream_status");
        assert_eq!(result.data["state"], "unavailable");

        let output = result.into_output(Vec::new());
        assert_eq!(output.exit_code(), ERROR_STATE_EXIT_CODE);
        let envelope = serde_json::to_value(&output.envelope).expect("serializes");
        assert_eq!(envelope["errors"][0]["code"], "upstream_status");
    }

    #[tokio::test]
    async fn loaded_history_exits_cleanly() {
        let config = config().with_start_date(date!(2023 - 01 - 01));
        let client = Arc::new(SyntheticHttpClient::new(config.start_date, date!(2023 - 06 - 30)));
        let dashboard =
            Dashboard::new(config, client, AdditiveEngine::default()).expect("valid config");

        let result = run(&args("msft"), &dashboard).await.expect("command runs");

        assert!(result.errors.is_empty());
        assert_eq!(result.data["state"], "available");
        assert_eq!(result.into_output(Vec::new()).exit_code(), 0);
    }
}
