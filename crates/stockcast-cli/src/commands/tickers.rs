use serde::Serialize;
use stockcast_core::domain::date::format_date;
use stockcast_core::{DashboardConfig, DAYS_PER_YEAR};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TickersResponseData<'a> {
    tickers: Vec<&'a str>,
    min_years: u32,
    max_years: u32,
    days_per_year: u32,
    start_date: String,
    end_date: String,
}

pub fn run(config: &DashboardConfig) -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(TickersResponseData {
        tickers: config.tickers.iter().map(|symbol| symbol.as_str()).collect(),
        min_years: config.min_years,
        max_years: config.max_years,
        days_per_year: DAYS_PER_YEAR,
        start_date: format_date(config.start_date),
        end_date: format_date(config.end_date),
    })?;

    Ok(CommandResult::ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_default_allow_list() {
        let result = run(&DashboardConfig::default()).expect("serializes");
        assert_eq!(
            result.data["tickers"],
            serde_json::json!(["AAPL", "GOOG", "MSFT", "GME"])
        );
        assert_eq!(result.data["min_years"], 1);
        assert_eq!(result.data["max_years"], 4);
        assert_eq!(result.data["start_date"], "2015-01-01");
    }
}
