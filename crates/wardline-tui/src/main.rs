//! Wardline TUI - a terminal dashboard for a panchayath agent hierarchy.
//!
//! Browse panchayaths with their coordinator, supervisor, group leader and
//! PRO counts, drill into supervisors and group leaders, and add, edit or
//! delete agents at every level.

mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wardline_core::api::ApiClient;
use wardline_core::credentials::KeyStore;
use wardline_core::{Backend, Config, MemoryBackend};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "wardline.log";

const USAGE: &str = "\
Usage: wardline [--demo | --store-key [URL] | --forget-key]

  --demo              Run against built-in sample data
  --store-key [URL]   Save the API key for the backend in the keychain.
                      A URL given here is also written to the config file.
  --forget-key        Remove the saved API key for the configured backend

Environment:
  WARDLINE_BACKEND_URL   Backend base URL (overrides the config file)
  WARDLINE_API_KEY       API key (overrides the keychain)
  RUST_LOG               Log filter, e.g. wardline=debug";

const NO_BACKEND_URL: &str =
    "No backend URL configured. Set WARDLINE_BACKEND_URL or add backend_url to the config file";

/// Initialize the tracing subscriber. The terminal belongs to the UI, so
/// logs go to a daily file in the cache directory.
fn init_tracing() -> Result<WorkerGuard> {
    let log_dir = Config::cache_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str);

    match mode {
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some("--store-key") => return store_key(args.get(1).map(String::as_str)),
        Some("--forget-key") => return forget_key(),
        Some("--demo") | None => {}
        Some(other) => {
            eprintln!("Unknown argument: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    let _guard = init_tracing()?;
    info!("Wardline starting");

    // Resolve the backend before touching the terminal so errors print cleanly
    let (backend, source): (Arc<dyn Backend>, String) = if mode == Some("--demo") {
        (Arc::new(MemoryBackend::demo()), "demo".to_string())
    } else {
        let connection = Config::load()?.connection()?;
        let client = ApiClient::with_timeout(&connection.backend_url, connection.api_key, connection.timeout)?;
        (Arc::new(client), connection.backend_url)
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut app = App::new(backend, source);
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Wardline shutting down");
    Ok(())
}

/// Prompt for an API key and save it in the OS keychain. An explicit URL
/// is remembered in the config file.
fn store_key(url: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    let backend_url = match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            config.backend_url = Some(url.to_string());
            config.save()?;
            println!("Backend URL saved to {}", Config::config_path()?.display());
            url.to_string()
        }
        None => config.backend_url().context(NO_BACKEND_URL)?,
    };

    let api_key = rpassword::prompt_password(format!("API key for {}: ", backend_url))?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("No API key entered");
    }

    KeyStore::store(&backend_url, api_key)?;
    println!("API key saved for {}", backend_url);
    Ok(())
}

/// Remove the saved API key for the configured backend.
fn forget_key() -> Result<()> {
    let backend_url = Config::load()?.backend_url().context(NO_BACKEND_URL)?;
    KeyStore::delete(&backend_url)?;
    println!("API key removed for {}", backend_url);
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            // Windows also reports key releases
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    // Handle input
                    if handle_input(app, key)? {
                        return Ok(());
                    }
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
