//! Interactive front-desk loop. Actions run as spawned tasks so the prompt
//! stays responsive; a new action is refused while one is in flight.

use std::sync::Arc;

use anyhow::Result;
use booking_core::{ActionError, BookingSession, SessionEvent};
use shared::domain::RoomCount;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::render;

const HELP: &str = "\
commands:
  book [n]   book n rooms (1-5); repeats the last count when omitted
  reset      clear every booking
  random     generate random occupancy
  history    show booking history
  rooms      show the floor grid
  refresh    reload rooms and history
  help       show this text
  quit       leave the shell";

const BUSY_MESSAGE: &str = "busy: wait for the current action to finish";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Book(Option<String>),
    Reset,
    Random,
    History,
    Rooms,
    Refresh,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next().map(str::to_string);
    if words.next().is_some() {
        return Err(format!("too many arguments for `{verb}`"));
    }

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("book" | "b", argument) => ShellCommand::Book(argument),
        ("reset", None) => ShellCommand::Reset,
        ("random", None) => ShellCommand::Random,
        ("history", None) => ShellCommand::History,
        ("rooms" | "grid", None) => ShellCommand::Rooms,
        ("refresh", None) => ShellCommand::Refresh,
        ("help" | "?", None) => ShellCommand::Help,
        ("quit" | "exit" | "q", None) => ShellCommand::Quit,
        (
            known @ ("reset" | "random" | "history" | "rooms" | "grid" | "refresh" | "help" | "?"
            | "quit" | "exit" | "q"),
            Some(_),
        ) => {
            return Err(format!("`{known}` takes no arguments"));
        }
        (other, _) => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}

/// Subscribes to session events, then performs the initial load, so a
/// failed first fetch still reaches the operator.
pub async fn start(session: &BookingSession) -> broadcast::Receiver<SessionEvent> {
    let events = session.subscribe_events();
    session.load().await;
    events
}

pub async fn run(session: Arc<BookingSession>) -> Result<()> {
    let events = start(&session).await;
    let printer = tokio::spawn(print_events(Arc::clone(&session), events));
    print_grid(&session).await;
    println!("{HELP}");

    let mut last_count = String::from("1");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Rooms => print_grid(&session).await,
            ShellCommand::History => print!("{}", history_view(&session).await),
            // The event printer redraws the grid once rooms land.
            ShellCommand::Refresh => session.load().await,
            action => {
                if session.is_busy() {
                    println!("{BUSY_MESSAGE}");
                    continue;
                }
                let count = match &action {
                    ShellCommand::Book(requested) => {
                        book_input(requested.as_deref(), &mut last_count)
                    }
                    _ => String::new(),
                };
                spawn_action(Arc::clone(&session), action, count);
            }
        }
    }

    printer.abort();
    Ok(())
}

/// Text to book with. Only a valid count is remembered for a bare `book`.
fn book_input(requested: Option<&str>, last_count: &mut String) -> String {
    let Some(requested) = requested else {
        return last_count.clone();
    };
    if requested.parse::<RoomCount>().is_ok() {
        *last_count = requested.to_string();
    }
    requested.to_string()
}

/// Re-reads history before rendering it. A failed fetch is logged by the
/// session and the last snapshot is shown.
async fn history_view(session: &BookingSession) -> String {
    let _ = session.refresh_history().await;
    render::render_history(&session.history().await)
}

fn spawn_action(session: Arc<BookingSession>, action: ShellCommand, count: String) {
    tokio::spawn(async move {
        let outcome = match action {
            ShellCommand::Book(_) => session.book(&count).await.map(drop),
            ShellCommand::Reset => session.reset().await,
            ShellCommand::Random => session.randomize().await.map(drop),
            _ => Ok(()),
        };
        match outcome {
            Err(ActionError::Busy) => println!("{BUSY_MESSAGE}"),
            // Failures already surfaced as notices.
            Err(err) => debug!(%err, "shell: action failed"),
            Ok(()) => {}
        }
    });
}

async fn print_events(
    session: Arc<BookingSession>,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(output) = event_output(&session, event).await {
                    print!("{output}");
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "shell: dropped session events"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// What the shell prints for a session event, if anything.
async fn event_output(session: &BookingSession, event: SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Notice(notice) => Some(format!("{}\n", render::render_notice(&notice))),
        SessionEvent::RoomsChanged => Some(grid_view(session).await),
        SessionEvent::HighlightChanged(rooms) if rooms.is_empty() => Some(grid_view(session).await),
        _ => None,
    }
}

async fn grid_view(session: &BookingSession) -> String {
    let grid = session.floor_grid().await;
    render::render_grid(&grid, session.inventory_summary().await)
}

async fn print_grid(session: &BookingSession) {
    print!("{}", grid_view(session).await);
}
