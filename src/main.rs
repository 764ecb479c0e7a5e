use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod composer;
mod config;
mod handler;
mod reply;
mod state;
mod storage;
mod store;
mod theme;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::EventHandler;

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(data_dir: &Path) {
    let file = fs::create_dir_all(data_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("simple-chat.log"))
    });
    let Ok(file) = file else {
        return;
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Config problems are reported before the terminal is taken over
    let config = Config::load_or_create()?;
    init_logging(&config.data_dir()?);

    let mut events = EventHandler::new();
    let mut app = App::new(&config, events.sender())?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    tracing::info!("exiting");
    Ok(())
}
