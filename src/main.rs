//! Canteen TUI - a terminal client for the school canteen reporting
//! Central Server.
//!
//! Provides a keyboard-driven view of notifications, monthly reports,
//! and the signed-in user's profile.

mod api;
mod app;
mod auth;
mod config;
mod guard;
mod models;
mod ui;
mod user;
mod utils;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in the data directory
const LOG_FILE: &str = "canteen.log";

/// Initialize tracing with a non-blocking file writer so log output
/// never corrupts the alternate screen. Returns the worker guard,
/// which must stay alive for the duration of the program.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let data_dir = config::Config::data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;

    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // CLI login path: authenticate and store credentials without
    // entering the TUI
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return cli_login().await;
    }

    let _log_guard = init_tracing();
    info!("Canteen TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new()?;

    // Guard the protected layout before the first frame: an
    // unauthenticated session goes straight to the login view
    app.enforce_guard();
    if app.is_authenticated() {
        app.refresh_all_background();
    }

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Canteen TUI shutting down");
    Ok(())
}

/// Prompt-based login for scripted or first-run use.
async fn cli_login() -> Result<()> {
    use std::io::Write;

    use auth::CredentialStore;

    println!("\n=== Canteen Login ===\n");

    let config = config::Config::load().unwrap_or_default();

    print!("Username{}: ", match config.last_username {
        Some(ref u) => format!(" [{}]", u),
        None => String::new(),
    });
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    let username = if input.is_empty() {
        config
            .last_username
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Username required"))?
    } else {
        input.to_string()
    };

    let password = if CredentialStore::has_credentials(&username) {
        print!("Use stored password? [Y/n]: ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;

        if answer.trim().to_lowercase() != "n" {
            CredentialStore::get_password(&username)?
        } else {
            rpassword::prompt_password("Password: ")?
        }
    } else {
        rpassword::prompt_password("Password: ")?
    };

    println!("\nAuthenticating...");

    let api = api::ApiClient::new(config.resolved_base_url())?;
    let token = api.login(&username, &password).await?;

    CredentialStore::store(&username, &password)?;

    let mut config = config;
    config.last_username = Some(username);
    config.save()?;

    let data_dir = config::Config::data_dir()?;
    let store = auth::LocalStore::open(data_dir);
    let mut session = auth::SessionState::new(store);
    session.login(&token)?;

    println!("Login successful!\n");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Re-evaluate the guard before constructing protected views;
        // a mid-session logout redirects before the next frame
        app.enforce_guard();

        terminal.draw(|f| render(f, app))?;

        // Poll with timeout so background updates keep flowing
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
