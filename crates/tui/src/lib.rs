mod app;
mod async_ops;
mod clipboard;
pub mod config;
mod guard;
mod logging;
mod theme;
mod ui;
mod views;

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use app::{App, FlashLevel, PollRequest};
use async_ops::Backend;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;
use vigil_api_client::{ApiClient, PollEvent, Poller, RetryConfig, SessionController};
use vigil_core::TimeRange;
use vigil_local_store::DisplayNameStore;
use vigil_runtime_config::VigilConfig;

/// Launch the dashboard against the configured server.
pub fn run(config: VigilConfig) -> Result<()> {
    if let Err(e) = logging::init_file_logging() {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let api = ApiClient::new(
        &config.server.url,
        Duration::from_secs(config.server.timeout_secs),
    )?;
    let session = SessionController::new(api.clone(), vigil_local_store::default_store())
        .remember_name(config.ui.remember_username);
    let mut backend = Backend {
        session,
        retry: RetryConfig::with_retries(config.metrics.discovery_retries),
    };

    let default_range = config
        .metrics
        .default_time_range
        .parse::<TimeRange>()
        .unwrap_or_default();
    let mut app = App::new(&config.server.url, default_range);

    let rt = tokio::runtime::Runtime::new()?;
    let (mut poller, poll_rx) = Poller::new(
        Arc::new(api),
        Duration::from_secs(config.metrics.poll_interval_secs),
        rt.handle().clone(),
    );

    // Terminal setup
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut ctx = LoopContext {
        rt: &rt,
        backend: &mut backend,
        poller: &mut poller,
        poll_rx,
    };
    let result = event_loop(&mut terminal, &mut app, &mut ctx);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    poller.stop();
    result
}

struct LoopContext<'a, H> {
    rt: &'a tokio::runtime::Runtime,
    backend: &'a mut Backend<H>,
    poller: &'a mut Poller<ApiClient>,
    poll_rx: UnboundedReceiver<PollEvent>,
}

fn event_loop<H: DisplayNameStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    ctx: &mut LoopContext<'_, H>,
) -> Result<()> {
    loop {
        // Session and agent calls block the loop; the poller does not.
        if let Some(cmd) = app.pending_command.take() {
            terminal.draw(|frame| ui::render(frame, app))?;
            let result = ctx.rt.block_on(async_ops::execute(cmd, ctx.backend));
            app.apply_command_result(result);
        }

        match app.poll_request.take() {
            Some(PollRequest::Restart(selection)) => {
                app.metrics.epoch = ctx.poller.restart(&selection);
            }
            Some(PollRequest::Stop) => {
                ctx.poller.stop();
                app.metrics.epoch = ctx.poller.epoch();
            }
            None => {}
        }

        while let Ok(event) = ctx.poll_rx.try_recv() {
            app.apply_poll_event(event);
        }

        if let Some(text) = app.clipboard_request.take() {
            if let Err(e) = clipboard::copy(&mut stdout(), &text) {
                warn!("clipboard write failed: {e}");
                app.flash_message = Some(("Could not copy token".to_string(), FlashLevel::Error));
            }
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) {
                    break;
                }
            }
        }
    }
    Ok(())
}
