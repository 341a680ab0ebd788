mod config;
mod render;
mod shell;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use booking_core::{BookingSession, HttpBookingService, NoticeLevel, SessionConfig, SessionEvent};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, DEFAULT_SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(about = "Front-desk client for the hotel room reservation service")]
struct Args {
    /// Base URL of the reservation service; `/api/` is appended.
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    highlight_ttl_ms: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the floor grid.
    Rooms,
    /// Book between 1 and 5 rooms.
    Book { rooms: String },
    /// Clear every booking.
    Reset,
    /// Generate random occupancy.
    Random,
    /// Show booking history.
    History,
    /// Interactive session (the default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(url) = args.backend_url {
        settings.backend_url = url;
    }
    if let Some(ms) = args.highlight_ttl_ms {
        settings.highlight_ttl = Duration::from_millis(ms);
    }

    let service = HttpBookingService::with_timeout(&settings.backend_url, settings.request_timeout)
        .with_context(|| format!("invalid backend url {}", settings.backend_url))?;
    info!(api_root = %service.api_root(), "frontdesk: starting");

    let session_config = SessionConfig {
        highlight_ttl: settings.highlight_ttl,
    };

    let session = BookingSession::new(Arc::new(service), session_config);
    let command = args.command.unwrap_or(Command::Shell);
    if matches!(command, Command::Shell) {
        return shell::run(session).await;
    }

    let mut events = shell::start(&session).await;
    let load_failed = print_notices(&mut events);

    let outcome = match &command {
        Command::Rooms | Command::History | Command::Shell => Ok(()),
        Command::Book { rooms } => session.book(rooms).await.map(drop),
        Command::Reset => session.reset().await,
        Command::Random => session.randomize().await.map(drop),
    };
    print_notices(&mut events);

    if matches!(command, Command::History) {
        print!("{}", render::render_history(&session.history().await));
    } else {
        let grid = session.floor_grid().await;
        print!("{}", render::render_grid(&grid, session.inventory_summary().await));
    }

    outcome.context("action failed")?;
    if load_failed && matches!(command, Command::Rooms | Command::History) {
        bail!("could not load data from {}", settings.backend_url);
    }
    Ok(())
}

/// Prints queued notices, returning whether any of them was an error.
fn print_notices(events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Notice(notice) = event {
            saw_error |= notice.level == NoticeLevel::Error;
            println!("{}", render::render_notice(&notice));
        }
    }
    saw_error
}
