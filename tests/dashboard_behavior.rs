//! Behavior-driven tests for the dashboard pipeline
//!
//! These tests drive a full selection through fetch, forecast and projection
//! against a scripted transport and check what the user would see.

use std::sync::Arc;

use serde_json::json;
use stockcast_core::presentation::{
    COMPONENTS_CHART_TITLE, FORECAST_CHART_TITLE, LOAD_FAILED_MESSAGE, RAW_CHART_TITLE,
};
use stockcast_core::{CacheMode, DashboardView, HttpResponse, ValidationError};
use stockcast_tests::{daily_payload, dashboard, ok, record, ScriptedHttpClient};
use time::macros::date;

// =============================================================================
// Data available
// =============================================================================

#[tokio::test]
async fn user_selecting_aapl_for_one_year_sees_tables_and_three_charts() {
    // Given: 500 consecutive daily records for AAPL starting 2015-01-01
    let client = Arc::new(
        ScriptedHttpClient::new().respond("AAPL", ok(&daily_payload("AAPL", date!(2015 - 01 - 01), 500))),
    );
    let dashboard = dashboard(Arc::clone(&client));

    // When: The user selects AAPL with a one year horizon
    let selection = dashboard.select("AAPL", 1).expect("valid selection");
    let run = dashboard
        .run(&selection, CacheMode::Use)
        .await
        .expect("pipeline runs");

    // Then: The raw table covers all 500 rows
    let report = run.view.report().expect("data available");
    assert_eq!(report.raw_rows, 500);
    assert_eq!(report.raw_tail.len(), 5);
    assert_eq!(report.raw_tail[4].date, date!(2016 - 05 - 14));

    // And: The forecast spans the history plus 365 future days
    assert_eq!(report.horizon_days, 365);
    assert_eq!(report.forecast_rows, 865);
    assert_eq!(
        report.forecast_tail.last().map(|row| row.timestamp),
        Some(date!(2017 - 05 - 14))
    );
    assert!(report.forecast_tail.iter().all(|row| row.actual.is_none()));

    // And: Exactly three charts are shown in order
    let titles: Vec<&str> = report.charts.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![RAW_CHART_TITLE, FORECAST_CHART_TITLE, COMPONENTS_CHART_TITLE]
    );
    assert_eq!(report.raw_chart().series.len(), 2);
    assert_eq!(report.forecast_chart().series[0].points.len(), 865);
    assert_eq!(report.forecast_chart().series[1].points.len(), 500);
    assert_eq!(
        report.components,
        vec!["trend", "season_yearly", "season_weekly"]
    );

    // And: One upstream request was made
    assert_eq!(client.calls(), 1);
    assert!(!run.cache_hit);
}

#[tokio::test]
async fn records_before_the_start_date_never_reach_the_tables() {
    // Given: A payload with records on both sides of the 2015-01-01 start date
    let payload = json!({
        "symbol": "MSFT",
        "historical": [
            record(date!(2015 - 01 - 03), 47.0),
            record(date!(2015 - 01 - 02), 46.5),
            record(date!(2014 - 12 - 31), 46.0),
            record(date!(2014 - 12 - 30), 45.5),
        ],
    });
    let client = Arc::new(ScriptedHttpClient::new().respond("MSFT", ok(&payload)));
    let dashboard = dashboard(Arc::clone(&client));

    // When: The pipeline runs for MSFT
    let selection = dashboard.select("MSFT", 1).expect("valid selection");
    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");

    // Then: Only on-or-after records are shown, in ascending order
    let report = run.view.report().expect("data available");
    assert_eq!(report.raw_rows, 2);
    let dates: Vec<_> = report.raw_tail.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date!(2015 - 01 - 02), date!(2015 - 01 - 03)]);

    // And: The forecast starts at the first retained date
    let first_prediction = report.forecast_chart().series[0].points.first().map(|p| p.date);
    assert_eq!(first_prediction, Some(date!(2015 - 01 - 02)));
    assert_eq!(report.forecast_rows, 2 + 365);
}

#[tokio::test]
async fn raw_tail_follows_configured_row_count() {
    // Given: A dashboard configured to show ten tail rows
    let client = Arc::new(
        ScriptedHttpClient::new().respond("GOOG", ok(&daily_payload("GOOG", date!(2015 - 01 - 01), 40))),
    );
    let dashboard = stockcast_core::Dashboard::new(
        stockcast_tests::test_config().with_tail_rows(10),
        client,
        stockcast_core::AdditiveEngine::default(),
    )
    .expect("valid config");

    // When: The pipeline runs
    let selection = dashboard.select("GOOG", 2).expect("valid selection");
    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");

    // Then: Both tables show ten rows
    let report = run.view.report().expect("data available");
    assert_eq!(report.raw_tail.len(), 10);
    assert_eq!(report.forecast_tail.len(), 10);
    assert_eq!(report.forecast_rows, 40 + 730);
}

// =============================================================================
// Data unavailable
// =============================================================================

#[tokio::test]
async fn upstream_server_error_shows_the_error_view_without_charts() {
    // Given: The upstream answers HTTP 500 for GME
    let client = Arc::new(
        ScriptedHttpClient::new().respond("GME", HttpResponse::with_status(500, "oops")),
    );
    let dashboard = dashboard(Arc::clone(&client));

    // When: The user selects GME
    let selection = dashboard.select("GME", 2).expect("valid selection");
    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");

    // Then: The error message is shown and no tables or charts exist
    let DashboardView::Unavailable(unavailable) = &run.view else {
        panic!("expected the error view, got {:?}", run.view);
    };
    assert_eq!(unavailable.message, LOAD_FAILED_MESSAGE);
    assert_eq!(unavailable.code, "upstream_status");
    assert!(run.view.report().is_none());

    // And: The serialized view carries no chart data
    let value = serde_json::to_value(&run.view).expect("serializes");
    assert_eq!(value["state"], "unavailable");
    assert!(value.get("charts").is_none());
}

#[tokio::test]
async fn every_kind_of_upstream_failure_lands_in_the_error_view() {
    // Given: A different upstream failure scripted for each ticker
    let client = Arc::new(
        ScriptedHttpClient::new()
            .respond("AAPL", HttpResponse::with_status(404, "{}"))
            .respond("GOOG", HttpResponse::ok_json(r#"{"symbol":"GOOG"}"#))
            .respond("MSFT", HttpResponse::ok_json("not json"))
            .fail("GME", "connection refused"),
    );
    let dashboard = dashboard(Arc::clone(&client));

    // When/Then: Each selection produces the error view with a matching code
    for (ticker, code) in [
        ("AAPL", "upstream_status"),
        ("GOOG", "missing_historical"),
        ("MSFT", "decode"),
        ("GME", "transport"),
    ] {
        let selection = dashboard.select(ticker, 1).expect("valid selection");
        let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");
        match &run.view {
            DashboardView::Unavailable(unavailable) => {
                assert_eq!(unavailable.code, code, "ticker {ticker}");
                assert_eq!(unavailable.message, LOAD_FAILED_MESSAGE);
            }
            other => panic!("{ticker} should be unavailable, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn empty_history_is_treated_as_no_data() {
    // Given: A well-formed payload whose records all predate the start date
    let payload = json!({
        "symbol": "AAPL",
        "historical": [record(date!(2014 - 06 - 01), 90.0)],
    });
    let client = Arc::new(ScriptedHttpClient::new().respond("AAPL", ok(&payload)));
    let dashboard = dashboard(client);

    // When: The pipeline runs
    let selection = dashboard.select("AAPL", 1).expect("valid selection");
    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");

    // Then: The error view is shown
    assert!(!run.view.is_available());
    match run.view {
        DashboardView::Unavailable(unavailable) => assert_eq!(unavailable.code, "no_records"),
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn single_record_history_fails_to_fit_and_shows_an_error() {
    // Given: Only one usable record
    let payload = json!({
        "symbol": "MSFT",
        "historical": [record(date!(2020 - 03 - 02), 160.0)],
    });
    let client = Arc::new(ScriptedHttpClient::new().respond("MSFT", ok(&payload)));
    let dashboard = dashboard(client);

    // When: The pipeline runs
    let selection = dashboard.select("MSFT", 1).expect("valid selection");
    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");

    // Then: The forecast failure is reported instead of crashing
    match run.view {
        DashboardView::Unavailable(unavailable) => assert_eq!(unavailable.code, "forecast"),
        other => panic!("expected unavailable, got {other:?}"),
    }
}

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn selections_outside_the_allow_list_or_year_bounds_are_rejected() {
    // Given: A dashboard with the default allow-list
    let client = Arc::new(ScriptedHttpClient::new());
    let dashboard = dashboard(Arc::clone(&client));

    // When/Then: An unknown ticker is rejected before any request
    let error = dashboard.select("TSLA", 1).expect_err("not allow-listed");
    assert!(matches!(error, ValidationError::TickerNotAllowed { .. }));
    assert!(error.to_string().contains("AAPL, GOOG, MSFT, GME"));

    // And: Horizons outside 1..=4 years are rejected
    for years in [0, 5] {
        let error = dashboard.select("AAPL", years).expect_err("out of range");
        assert_eq!(
            error,
            ValidationError::HorizonOutOfRange {
                value: years,
                min: 1,
                max: 4
            }
        );
    }

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn lowercase_ticker_input_resolves_to_the_allow_listed_symbol() {
    let client = Arc::new(
        ScriptedHttpClient::new().respond("GME", ok(&daily_payload("GME", date!(2019 - 01 - 01), 30))),
    );
    let dashboard = dashboard(Arc::clone(&client));

    let selection = dashboard.select("gme", 4).expect("case-insensitive");
    assert_eq!(selection.symbol.as_str(), "GME");
    assert_eq!(selection.horizon.get(), 1460);

    let run = dashboard.run(&selection, CacheMode::Use).await.expect("runs");
    assert!(run.view.is_available());
    assert!(client.urls()[0].contains("/api/v3/historical-price-full/GME?apikey=test-key"));
}
