//! terralens — NASA's Astronomy Picture of the Day in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ FetchEvent ┌──────────┐  draw()  ┌──────────┐
//! │ fetcher.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │  (tokio)   │  (channel) │ (state)  │          │ (render) │
//! └────────────┘            └──────────┘          └──────────┘
//!       │                        ▲
//!       │ ApodSource::fetch      │ handle_key_event()
//!       ▼                        │
//! ┌────────────┐            ┌──────────┐
//! │  source/   │            │ input.rs │
//! └────────────┘            └──────────┘
//! ```
//!
//! * **`source/`** — the `ApodSource` trait, `RemoteItem`, and the NASA
//!   endpoint implementation.
//! * **`fetcher`** — primary fetch with retry/backoff, then history backfill,
//!   run as a cancellable tokio task.
//! * **`state`** — folds fetch events into loading / error / ready.
//! * **`app`** — owns application state (fetch state, status line, flags).
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`config`** / **`logging`** — TOML settings and the log file.
//! * **`main`** — wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod config;
mod error;
mod fetcher;
mod input;
mod logging;
mod source;
mod state;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use app::App;
use config::{Config, Overrides, API_KEY_ENV};
use fetcher::{FetchHandle, FetchSettings};
use source::{ApodSource, NasaApod};

/// Browse NASA's Astronomy Picture of the Day and the week before it.
#[derive(Debug, Parser)]
#[command(name = "terralens", version, about)]
struct Cli {
    /// NASA API key (falls back to the config file, then $NASA_API_KEY, then DEMO_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Number of days in the history window, today included.
    #[arg(long)]
    days: Option<u32>,

    /// Retries after the first failed request.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Delay before the first retry; doubles on each further retry.
    #[arg(long)]
    base_delay_ms: Option<u64>,

    /// Endpoint URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            history_days: self.days,
        }
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard — cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    // -- configuration -------------------------------------------------------
    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = file_config.resolve(cli.overrides(), std::env::var(API_KEY_ENV).ok())?;

    let log_path = logging::init(&config.logging)?;
    eprintln!("terralens log: {}", log_path.display());
    tracing::info!(
        base_url = %config.endpoint.base_url,
        history_days = config.endpoint.history_days,
        max_retries = config.endpoint.max_retries,
        "terralens starting"
    );

    // -- start fetching --------------------------------------------------------
    let runtime = tokio::runtime::Runtime::new()?;
    let source: Arc<dyn ApodSource> = Arc::new(NasaApod::new(&config.endpoint)?);
    let mut fetch = FetchHandle::new(
        source,
        FetchSettings::from(&config.endpoint),
        runtime.handle().clone(),
    );
    fetch.start()?;

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(config.endpoint.history_days);

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any events from the fetch task.
    //   2. Start a fresh sequence if the user asked to retry.
    //   3. Render the UI.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Some(event) = fetch.try_recv() {
            app.handle_fetch_event(event);
        }

        if app.restart_requested {
            match fetch.start() {
                Ok(()) => {
                    tracing::info!(source = fetch.source_name(), "restarting fetch");
                    app.reset_for_restart();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "retry ignored");
                    app.restart_requested = false;
                }
            }
        }

        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    fetch.dispose();
    drop(guard);
    runtime.shutdown_timeout(Duration::from_millis(500));
    tracing::info!("terralens exiting");
    Ok(())
}
