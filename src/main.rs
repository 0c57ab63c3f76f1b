use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod agent;
mod app;
mod config;
mod handler;
mod tui;
mod ui;

use agent::AgentClient;
use app::App;
use config::Config;

#[derive(Parser)]
#[command(name = "cdp-chat")]
#[command(about = "Terminal chat client for a CDP support agent", version)]
struct Cli {
    /// Base URL of the support agent server
    #[arg(short, long, env = "CDP_CHAT_SERVER")]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::load_or_create().unwrap_or_else(|err| {
        warn!(error = %err, "failed to load config, using defaults");
        Config::new()
    });
    let server_url = config.resolve_server_url(cli.server);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(AgentClient::new(&server_url));
    app.greet();
    app.fetch_supported_cdps();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);

        // Completions are picked up between events; the 300ms tick
        // bounds how long a settled request waits to be processed
        app.poll_platforms().await;
        app.poll_response().await;
    }
    Ok(())
}

/// Log to a file under the config dir; the terminal belongs to the TUI.
/// Logging is best-effort: failure to set up the sink never blocks the
/// chat session.
fn init_logging() {
    let Ok(dir) = Config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("cdp-chat.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}
