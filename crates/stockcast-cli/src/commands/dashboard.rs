use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use stockcast_core::{AdditiveEngine, CacheMode, Dashboard, Renderer, ValidationError};
use tracing::{info, warn};

use crate::cli::DashboardArgs;
use crate::error::CliError;
use crate::output::terminal::{Action, DashboardState, TerminalRenderer};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(
    args: &DashboardArgs,
    dashboard: &Dashboard<AdditiveEngine>,
) -> Result<(), CliError> {
    let config = dashboard.config();
    let initial = match &args.ticker {
        Some(raw) => config.resolve_ticker(raw)?,
        None => config
            .tickers
            .first()
            .cloned()
            .ok_or(ValidationError::EmptyAllowList)?,
    };
    config.horizon(args.years)?;

    let state = DashboardState::new(
        config.tickers.clone(),
        &initial,
        args.years,
        config.min_years,
        config.max_years,
    );

    enable_raw_mode()?;
    let terminal = or_restore(open_terminal, || {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        disable_raw_mode()
    })?;
    let mut renderer = TerminalRenderer::new(terminal, state);

    let result = event_loop(&mut renderer, dashboard).await;

    disable_raw_mode()?;
    execute!(renderer.terminal_mut().backend_mut(), LeaveAlternateScreen)?;
    renderer.terminal_mut().show_cursor()?;

    result
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Runs `setup`; if it fails, runs `restore` before handing back the setup
/// error so the shell is not left in raw mode.
fn or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce() -> io::Result<()>,
) -> io::Result<T> {
    setup().or_else(|error| {
        if let Err(restore_error) = restore() {
            warn!(error = %restore_error, "failed to restore terminal");
        }
        Err(error)
    })
}

/// Each selection change reruns the whole pipeline; `r` bypasses the cached
/// series for the current ticker.
async fn event_loop<B: Backend>(
    renderer: &mut TerminalRenderer<B>,
    dashboard: &Dashboard<AdditiveEngine>,
) -> Result<(), CliError> {
    let mut pending = Some(CacheMode::Use);

    loop {
        if let Some(mode) = pending.take() {
            renderer.state_mut().set_loading(true);
            renderer.redraw()?;

            let state = renderer.state();
            let ticker = state
                .ticker()
                .ok_or(ValidationError::EmptyAllowList)?
                .clone();
            let selection = dashboard.select(ticker.as_str(), state.years())?;
            let run = dashboard.run(&selection, mode).await?;
            info!(
                symbol = %selection.symbol,
                horizon = %selection.horizon,
                available = run.view.is_available(),
                "dashboard updated"
            );

            let source = if run.cache_hit { "cached" } else { "fetched" };
            renderer
                .state_mut()
                .set_status(format!("{source} in {} ms", run.latency_ms));
            renderer.render(&run.view)?;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match renderer.state_mut().handle_key(key.code) {
                    Action::Quit => return Ok(()),
                    Action::Reload => pending = Some(CacheMode::Use),
                    Action::Refresh => pending = Some(CacheMode::Refresh),
                    Action::None => {}
                }
            }
            Event::Resize(_, _) => renderer.redraw()?,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn failed_setup_restores_the_terminal() {
        let restored = Cell::new(false);

        let error = or_restore(
            || Err::<(), _>(io::Error::other("no tty")),
            || {
                restored.set(true);
                Ok(())
            },
        )
        .expect_err("setup fails");

        assert!(restored.get());
        assert_eq!(error.to_string(), "no tty");
    }

    #[test]
    fn successful_setup_leaves_the_terminal_alone() {
        let restored = Cell::new(false);

        let value = or_restore(
            || Ok(7),
            || {
                restored.set(true);
                Ok(())
            },
        )
        .expect("setup succeeds");

        assert_eq!(value, 7);
        assert!(!restored.get());
    }

    #[test]
    fn restore_failure_keeps_the_setup_error() {
        let error = or_restore(
            || Err::<(), _>(io::Error::other("alternate screen refused")),
            || Err(io::Error::other("still raw")),
        )
        .expect_err("setup fails");

        assert_eq!(error.to_string(), "alternate screen refused");
    }
}
