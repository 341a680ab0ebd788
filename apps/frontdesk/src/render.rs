//! Plain-text rendering of the floor grid, history panel and notices.

use std::fmt::{Display, Write as _};

use booking_core::{DisplayState, FloorGrid, InventorySummary, Notice, NoticeLevel};
use chrono::{Local, TimeZone};
use shared::domain::Booking;

const STAIRS_LABEL: &str = "STAIRS / LIFT";

fn cell_marker(state: DisplayState) -> char {
    match state {
        DisplayState::Available => ' ',
        DisplayState::Booked => '#',
        DisplayState::JustSelected => '*',
    }
}

pub fn render_grid(grid: &FloorGrid, summary: InventorySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  | {STAIRS_LABEL} |");
    for row in &grid.floors {
        let _ = write!(out, "  |{:^15}| F{:<3}", "", row.floor);
        for cell in &row.cells {
            let _ = write!(out, " [{:>4}{}]", cell.room_number, cell_marker(cell.state));
        }
        out.push('\n');
    }

    out.push_str("  ");
    let legend = DisplayState::LEGEND
        .iter()
        .map(|state| format!("[n{}] {}", cell_marker(*state), state.label()))
        .collect::<Vec<_>>();
    out.push_str(&legend.join("   "));
    out.push('\n');

    let _ = writeln!(
        out,
        "  {} rooms: {} booked, {} available",
        summary.total, summary.booked, summary.available
    );
    out
}

pub fn render_history(bookings: &[Booking]) -> String {
    render_history_in(bookings, &Local)
}

/// Timestamps are shown in `tz`.
pub fn render_history_in<Tz>(bookings: &[Booking], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::from("Booking History\n");
    if bookings.is_empty() {
        out.push_str("  No bookings yet\n");
        return out;
    }

    for booking in bookings {
        let rooms = booking
            .rooms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {}", booking.booking_id);
        let _ = writeln!(out, "    Rooms: {rooms}");
        let _ = writeln!(out, "    Travel Time: {:.1} min", booking.total_travel_time);
        let _ = writeln!(
            out,
            "    {}",
            booking
                .created_at
                .with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => format!("ok: {}", notice.message),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use booking_core::grid;
    use chrono::Utc;
    use shared::domain::{Room, RoomNumber};

    use super::*;

    #[test]
    fn grid_marks_each_state_and_keeps_empty_floors() {
        let rooms = vec![
            Room::new(101, 1, false),
            Room::new(102, 1, true),
            Room::new(201, 2, true),
        ];
        let highlight = BTreeSet::from([RoomNumber(201)]);
        let grid = grid::project(&rooms, &highlight);

        let text = render_grid(
            &grid,
            InventorySummary {
                total: 3,
                booked: 2,
                available: 1,
            },
        );

        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[0].contains(STAIRS_LABEL));
        assert!(lines[1].contains("F10"));
        assert!(lines[1].trim_end().ends_with("F10"));
        assert!(lines[9].contains("[ 201*]"));
        assert!(lines[10].contains("[ 101 ]"));
        assert!(lines[10].contains("[ 102#]"));
        assert!(text.contains("[n*] Just Selected"));
        assert!(text.contains("3 rooms: 2 booked, 1 available"));
    }

    #[test]
    fn history_lists_rooms_and_one_decimal_travel_time() {
        let bookings = vec![Booking {
            booking_id: "BK1738404000000".into(),
            rooms: vec![RoomNumber(101), RoomNumber(102), RoomNumber(201)],
            total_travel_time: 3.0,
            created_at: "2025-02-01T10:00:00Z".parse().expect("timestamp"),
        }];

        let text = render_history_in(&bookings, &Utc);

        assert!(text.contains("BK1738404000000"));
        assert!(text.contains("Rooms: 101, 102, 201"));
        assert!(text.contains("Travel Time: 3.0 min"));
        assert!(text.contains("2025-02-01 10:00:00"));
    }

    #[test]
    fn empty_history_says_so() {
        assert!(render_history_in(&[], &Utc).contains("No bookings yet"));
    }

    #[test]
    fn notices_are_prefixed_by_level() {
        assert_eq!(
            render_notice(&Notice::success("All bookings cleared")),
            "ok: All bookings cleared"
        );
        assert_eq!(
            render_notice(&Notice::error("Failed to load rooms")),
            "error: Failed to load rooms"
        );
    }
}
