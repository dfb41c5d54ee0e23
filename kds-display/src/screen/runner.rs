//! Terminal event loop

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use kds_client::LiveFeed;
use ratatui::prelude::*;

use super::{AppChannels, KdsApp, TerminalBell, render};
use crate::core::{AppResult, Config};

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Run the kitchen screen until the operator quits
pub async fn run(config: &Config, feed: Arc<dyn LiveFeed>) -> AppResult<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, channels) = KdsApp::new(config, feed, Box::new(TerminalBell), Local::now());
    let res = run_app(&mut terminal, &mut app, channels, config.elapsed_refresh()).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut KdsApp,
    channels: AppChannels,
    elapsed_refresh: Duration,
) -> AppResult<()> {
    let AppChannels {
        mut feed_rx,
        mut outcomes,
    } = channels;
    let mut events = EventStream::new();
    let mut clock = tokio::time::interval(CLOCK_TICK);
    let mut elapsed = tokio::time::interval(elapsed_refresh);

    loop {
        let size = terminal.size()?;
        let board = render::board_area(Rect::new(0, 0, size.width, size.height), app.show_logs());
        app.set_board_size(board.width, board.height);
        terminal.draw(|f| render::draw(f, app))?;

        if app.should_quit() {
            return Ok(());
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key, Local::now());
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some((generation, event)) = feed_rx.recv() => {
                app.on_feed_event(generation, event, Local::now().timestamp_millis());
            }
            Some(outcome) = outcomes.recv() => {
                app.on_write_outcome(outcome, Local::now().timestamp_millis());
            }
            _ = clock.tick() => app.tick_clock(Local::now()),
            _ = elapsed.tick() => app.refresh_elapsed(Local::now().timestamp_millis()),
        }
    }
}
