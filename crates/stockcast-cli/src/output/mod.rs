pub mod terminal;

use std::io::{self, Write};

use serde_json::Value;
use stockcast_core::domain::date::format_date;
use stockcast_core::{ChartPanel, DashboardReport, DashboardView, Envelope, Renderer, Unavailable};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::commands::CommandOutput;

/// Failure while writing a view or envelope to the user.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn render(
    output: &CommandOutput,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&output.envelope)?
            } else {
                serde_json::to_string(&output.envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            render_meta(&mut out, &output.envelope)?;
            match &output.view {
                Some(view) => TableRenderer::new(&mut out).render(view)?,
                None => render_data(&mut out, &output.envelope.data)?,
            }
        }
    }

    Ok(())
}

fn render_meta(out: &mut impl Write, envelope: &Envelope<Value>) -> Result<(), RenderError> {
    writeln!(out, "request_id  : {}", envelope.meta.request_id)?;
    writeln!(out, "schema      : {}", envelope.meta.schema_version)?;
    writeln!(out, "generated_at: {}", envelope.meta.generated_at)?;
    writeln!(out, "latency_ms  : {}", envelope.meta.latency_ms)?;
    writeln!(out, "cache_hit   : {}", envelope.meta.cache_hit)?;

    if !envelope.meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn render_data(out: &mut impl Write, data: &Value) -> Result<(), RenderError> {
    writeln!(out, "data:")?;
    let pretty_data = serde_json::to_string_pretty(data)?;
    for line in pretty_data.lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

/// Plain-text rendering of a [`DashboardView`].
pub struct TableRenderer<W> {
    out: W,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn available(&mut self, report: &DashboardReport) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "{}  horizon: {} days", report.symbol, report.horizon_days)?;
        writeln!(out)?;

        writeln!(
            out,
            "Raw data (last {} of {} rows)",
            report.raw_tail.len(),
            report.raw_rows
        )?;
        writeln!(
            out,
            "{:<10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>12}",
            "date", "open", "high", "low", "close", "volume"
        )?;
        for record in &report.raw_tail {
            writeln!(
                out,
                "{:<10}  {:>10.2}  {:>10.2}  {:>10.2}  {:>10.2}  {:>12}",
                format_date(record.date),
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume
            )?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "Forecast data (last {} of {} rows)",
            report.forecast_tail.len(),
            report.forecast_rows
        )?;
        write!(out, "{:<10}  {:>10}  {:>10}", "date", "predicted", "actual")?;
        for name in &report.components {
            write!(out, "  {name:>14}")?;
        }
        writeln!(out)?;
        for row in &report.forecast_tail {
            let actual = row
                .actual
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| String::from("-"));
            write!(
                out,
                "{:<10}  {:>10.2}  {:>10}",
                format_date(row.timestamp),
                row.predicted,
                actual
            )?;
            for name in &report.components {
                match row.component(name) {
                    Some(value) => write!(out, "  {value:>14.4}")?,
                    None => write!(out, "  {:>14}", "-")?,
                }
            }
            writeln!(out)?;
        }

        for panel in &report.charts {
            writeln!(out)?;
            chart_summary(&mut *out, panel)?;
        }
        Ok(())
    }

    fn unavailable(&mut self, unavailable: &Unavailable) -> io::Result<()> {
        writeln!(self.out, "{}: {}", unavailable.symbol, unavailable.message)?;
        writeln!(self.out, "  code  : {}", unavailable.code)?;
        writeln!(self.out, "  detail: {}", unavailable.detail)
    }
}

impl<W: Write> Renderer for TableRenderer<W> {
    type Error = RenderError;

    fn render(&mut self, view: &DashboardView) -> Result<(), Self::Error> {
        match view {
            DashboardView::Available(report) => self.available(report),
            DashboardView::Unavailable(unavailable) => self.unavailable(unavailable),
        }?;
        self.out.flush()?;
        Ok(())
    }
}

fn chart_summary(out: &mut impl Write, panel: &ChartPanel) -> io::Result<()> {
    writeln!(out, "{}", panel.title)?;
    for series in &panel.series {
        let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
            writeln!(out, "  {:<14} (no points)", series.name)?;
            continue;
        };
        let (lo, hi) = series.value_bounds().unwrap_or((first.value, first.value));
        writeln!(
            out,
            "  {:<14} {:>6} pts  {} .. {}  range {:.2} .. {:.2}",
            series.name,
            series.points.len(),
            format_date(first.date),
            format_date(last.date),
            lo,
            hi
        )?;
    }
    Ok(())
}
