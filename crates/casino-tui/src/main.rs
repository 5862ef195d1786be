use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use casino_core::{ApiClient, Config, FileStorage, SessionStore};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod call;
mod cli;
mod form;
mod handler;
mod pages;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "casino-mis")]
#[command(version, about = "Terminal console for the casino management information system")]
struct Cli {
    /// Directory holding config.json, the stored session and logs
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Default log level; RUST_LOG directives are applied on top
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Location to open at startup, e.g. /finance/cash-operations
    #[arg(long)]
    route: Option<String>,
    #[command(subcommand)]
    command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };
    init_logging(&dir, &cli.log_level)?;

    let config = Config::load_from(&dir)?;
    let storage = FileStorage::open(Config::session_path(&dir))?;
    let store = SessionStore::load(Box::new(storage));
    let client = ApiClient::new(&config.proxy_origin);

    match cli.command {
        Some(command) => cli::run(command, &config, store, client).await,
        None => run_tui(config, store, client, cli.route.as_deref()).await,
    }
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging(dir: &Path, level: &str) -> Result<()> {
    let log_dir = Config::log_dir(dir);
    fs::create_dir_all(&log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("casino-mis.log"))?;

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_tui(config: Config, store: SessionStore, client: ApiClient, route: Option<&str>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(config, store, client);
    app.navigate_to(route.unwrap_or("/"));
    app.start_lookups();
    info!(route = %app.route.path(), "console started");

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event).await?;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}
