//! Interactive terminal rendering of dashboard views.
//!
//! Drawing is a pure function of [`DashboardState`], so it is tested against
//! ratatui's `TestBackend` without a real terminal.

use std::io;

use crossterm::event::KeyCode;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs, Wrap,
};
use ratatui::{Frame, Terminal};
use stockcast_core::domain::date::format_date;
use stockcast_core::{ChartPanel, DashboardReport, DashboardView, Renderer, Symbol, Unavailable};
use time::Date;

use super::RenderError;

const SERIES_COLORS: [Color; 4] = [Color::Cyan, Color::Yellow, Color::Green, Color::Magenta];
const HELP: &str = "←/→ ticker  ↑/↓ years  r refresh  q quit";

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Selection changed; rerun the pipeline using the cache.
    Reload,
    /// Rerun the pipeline and refetch the current ticker.
    Refresh,
}

/// Selection widgets plus the last rendered view.
#[derive(Debug, Clone)]
pub struct DashboardState {
    tickers: Vec<Symbol>,
    selected: usize,
    years: u32,
    min_years: u32,
    max_years: u32,
    view: Option<DashboardView>,
    loading: bool,
    status: String,
}

impl DashboardState {
    /// `initial` must be one of `tickers`; an unknown symbol selects the first.
    pub fn new(
        tickers: Vec<Symbol>,
        initial: &Symbol,
        years: u32,
        min_years: u32,
        max_years: u32,
    ) -> Self {
        let selected = tickers.iter().position(|symbol| symbol == initial).unwrap_or(0);
        Self {
            tickers,
            selected,
            years: years.clamp(min_years, max_years),
            min_years,
            max_years,
            view: None,
            loading: false,
            status: String::new(),
        }
    }

    pub fn ticker(&self) -> Option<&Symbol> {
        self.tickers.get(self.selected)
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Action {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Right | KeyCode::Char('l') if !self.tickers.is_empty() => {
                self.selected = (self.selected + 1) % self.tickers.len();
                Action::Reload
            }
            KeyCode::Left | KeyCode::Char('h') if !self.tickers.is_empty() => {
                self.selected = (self.selected + self.tickers.len() - 1) % self.tickers.len();
                Action::Reload
            }
            KeyCode::Up | KeyCode::Char('k') if self.years < self.max_years => {
                self.years += 1;
                Action::Reload
            }
            KeyCode::Down | KeyCode::Char('j') if self.years > self.min_years => {
                self.years -= 1;
                Action::Reload
            }
            _ => Action::None,
        }
    }
}

/// [`Renderer`] that draws into a ratatui terminal.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    state: DashboardState,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>, state: DashboardState) -> Self {
        Self { terminal, state }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DashboardState {
        &mut self.state
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn redraw(&mut self) -> io::Result<()> {
        let state = &self.state;
        self.terminal.draw(|frame| draw(frame, state))?;
        Ok(())
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    type Error = RenderError;

    fn render(&mut self, view: &DashboardView) -> Result<(), Self::Error> {
        self.state.view = Some(view.clone());
        self.state.loading = false;
        self.redraw()?;
        Ok(())
    }
}

pub fn draw(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_selection(frame, chunks[0], state);

    match (&state.view, state.loading) {
        (_, true) | (None, false) => {
            let loading = Paragraph::new("  Loading price history and fitting forecast...")
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, chunks[1]);
        }
        (Some(DashboardView::Available(report)), false) => draw_report(frame, chunks[1], report),
        (Some(DashboardView::Unavailable(unavailable)), false) => {
            draw_unavailable(frame, chunks[1], unavailable)
        }
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(format!("  {HELP}"), Style::default().fg(Color::DarkGray)),
        Span::raw("   "),
        Span::raw(state.status.as_str()),
    ]));
    frame.render_widget(footer, chunks[2]);
}

fn draw_selection(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    let titles: Vec<Line> = state
        .tickers
        .iter()
        .map(|symbol| Line::from(symbol.as_str()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Select Ticker "))
        .select(state.selected)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[0]);

    let years = Paragraph::new(format!(
        " {} year(s)  [{}-{}]",
        state.years, state.min_years, state.max_years
    ))
    .block(Block::default().borders(Borders::ALL).title(" Horizon "));
    frame.render_widget(years, chunks[1]);
}

fn draw_unavailable(frame: &mut Frame, area: Rect, unavailable: &Unavailable) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", unavailable.message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  {} ({})", unavailable.detail, unavailable.code)),
    ];
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", unavailable.symbol)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_report(frame: &mut Frame, area: Rect, report: &DashboardReport) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(report.raw_tail.len().max(report.forecast_tail.len()) as u16 + 3),
            Constraint::Min(8),
        ])
        .split(area);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);
    draw_raw_table(frame, tables[0], report);
    draw_forecast_table(frame, tables[1], report);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, report.charts.len().max(1) as u32);
            report.charts.len()
        ])
        .split(rows[1]);
    for (panel, chunk) in report.charts.iter().zip(charts.iter()) {
        draw_chart(frame, *chunk, panel);
    }
}

fn draw_raw_table(frame: &mut Frame, area: Rect, report: &DashboardReport) {
    let header = Row::new(["Date", "Open", "High", "Low", "Close", "Volume"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = report.raw_tail.iter().map(|record| {
        Row::new(vec![
            Cell::from(format_date(record.date)),
            Cell::from(format!("{:.2}", record.open)),
            Cell::from(format!("{:.2}", record.high)),
            Cell::from(format!("{:.2}", record.low)),
            Cell::from(format!("{:.2}", record.close)),
            Cell::from(record.volume.to_string()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Raw data ({} rows) ", report.raw_rows)),
    );
    frame.render_widget(table, area);
}

fn draw_forecast_table(frame: &mut Frame, area: Rect, report: &DashboardReport) {
    let mut header = vec![String::from("Date"), String::from("Predicted"), String::from("Actual")];
    header.extend(report.components.iter().cloned());

    let rows = report.forecast_tail.iter().map(|row| {
        let mut cells = vec![
            Cell::from(format_date(row.timestamp)),
            Cell::from(format!("{:.2}", row.predicted)),
            Cell::from(
                row.actual
                    .map(|value| format!("{value:.2}"))
                    .unwrap_or_else(|| String::from("-")),
            ),
        ];
        cells.extend(report.components.iter().map(|name| {
            Cell::from(
                row.component(name)
                    .map(|value| format!("{value:.3}"))
                    .unwrap_or_else(|| String::from("-")),
            )
        }));
        Row::new(cells)
    });

    let mut widths = vec![
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
    ];
    widths.extend(report.components.iter().map(|_| Constraint::Min(9)));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Forecast data ({} rows) ", report.forecast_rows)),
        );
    frame.render_widget(table, area);
}

fn draw_chart(frame: &mut Frame, area: Rect, panel: &ChartPanel) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", panel.title));

    let (Some((first, last)), Some((lo, hi))) = (panel.date_bounds(), panel.value_bounds()) else {
        let empty = Paragraph::new("  No data").block(block);
        frame.render_widget(empty, area);
        return;
    };

    let points: Vec<Vec<(f64, f64)>> = panel
        .series
        .iter()
        .map(|series| {
            series
                .points
                .iter()
                .map(|point| (day_number(point.date), point.value))
                .collect()
        })
        .collect();

    let datasets = panel
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(index, (series, data))| {
            Dataset::default()
                .name(series.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[index % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect::<Vec<_>>();

    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
    let x_max = day_number(last).max(day_number(first) + 1.0);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([day_number(first), x_max])
                .labels(vec![Span::raw(format_date(first)), Span::raw(format_date(last))]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{lo:.1}")),
                    Span::raw(format!("{hi:.1}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn day_number(date: Date) -> f64 {
    f64::from(date.to_julian_day())
}
