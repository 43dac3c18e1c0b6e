//! Offline transport that serves deterministic `historical-price-full` payloads.
//!
//! Used by the CLI `--mock` flag and by demos; prices depend only on the
//! ticker and the date so repeated runs render identical dashboards.

use std::f64::consts::PI;
use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};
use time::{Date, Weekday};

use crate::domain::date::format_date;
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

const PATH_MARKER: &str = "/historical-price-full/";

#[derive(Debug, Clone)]
pub struct SyntheticHttpClient {
    start: Date,
    end: Date,
}

impl SyntheticHttpClient {
    /// Serve one record per weekday in `[start, end]`.
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    fn payload(&self, ticker: &str) -> Value {
        let seed = ticker_seed(ticker);
        let base = 40.0 + (seed % 160) as f64;
        let drift = 0.02 + (seed % 7) as f64 / 100.0;

        let mut historical = Vec::new();
        let mut day = self.end;
        let mut index = (self.end - self.start).whole_days();
        while day >= self.start {
            if !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
                let t = index as f64;
                let yearly = (2.0 * PI * f64::from(day.ordinal()) / 365.25).sin();
                let wobble = ((seed as f64 + t) * 0.37).sin();
                let close = base + drift * t + base * 0.05 * yearly + wobble;
                let open = close - 0.4 * wobble;
                historical.push(json!({
                    "date": format_date(day),
                    "open": round2(open),
                    "high": round2(open.max(close) + 0.8),
                    "low": round2(open.min(close) - 0.8),
                    "close": round2(close),
                    "adjClose": round2(close),
                    "volume": 1_000_000 + (seed % 50_000) * 10 + (index as u64 % 97) * 1_000,
                }));
            }
            match day.previous_day() {
                Some(previous) => day = previous,
                None => break,
            }
            index -= 1;
        }

        json!({ "symbol": ticker, "historical": historical })
    }
}

impl HttpClient for SyntheticHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let ticker = request
                .url
                .split_once(PATH_MARKER)
                .map(|(_, rest)| rest.split('?').next().unwrap_or_default())
                .filter(|ticker| !ticker.is_empty());

            match ticker {
                Some(ticker) => Ok(HttpResponse::ok_json(self.payload(ticker).to_string())),
                None => Ok(HttpResponse::with_status(404, "{}")),
            }
        })
    }
}

fn ticker_seed(ticker: &str) -> u64 {
    ticker.bytes().fold(11_u64, |acc, byte| {
        acc.wrapping_mul(31).wrapping_add(u64::from(byte))
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[tokio::test]
    async fn serves_weekday_records_newest_first() {
        let client = SyntheticHttpClient::new(date!(2024 - 01 - 01), date!(2024 - 01 - 14));
        let response = client
            .execute(HttpRequest::get(
                "https://mock.test/api/v3/historical-price-full/AAPL?apikey=x",
            ))
            .await
            .expect("mock never fails");

        let body: Value = serde_json::from_str(&response.body).expect("json");
        let historical = body["historical"].as_array().expect("array");
        assert_eq!(historical.len(), 10);
        assert_eq!(historical[0]["date"], "2024-01-12");
        assert_eq!(historical[9]["date"], "2024-01-01");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let client = SyntheticHttpClient::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02));
        let response = client
            .execute(HttpRequest::get("https://mock.test/elsewhere"))
            .await
            .expect("mock never fails");
        assert_eq!(response.status, 404);
    }

    #[test]
    fn payload_is_deterministic_per_ticker() {
        let client = SyntheticHttpClient::new(date!(2024 - 01 - 01), date!(2024 - 02 - 01));
        assert_eq!(client.payload("GME"), client.payload("GME"));
        assert_ne!(client.payload("GME"), client.payload("MSFT"));
    }
}
