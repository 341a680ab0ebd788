//! Floor grid projection: groups the room inventory by floor and assigns each
//! room its display state.

use std::collections::{BTreeSet, HashMap};

use shared::domain::{Room, RoomNumber, LOWEST_FLOOR, TOP_FLOOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    JustSelected,
    Booked,
    Available,
}

impl DisplayState {
    /// Legend order as shown under the grid.
    pub const LEGEND: [DisplayState; 3] = [
        DisplayState::Available,
        DisplayState::Booked,
        DisplayState::JustSelected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::JustSelected => "Just Selected",
            Self::Booked => "Booked",
            Self::Available => "Available",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub room_number: RoomNumber,
    pub state: DisplayState,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorRow {
    pub floor: u8,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorGrid {
    /// Always one row per floor, top floor first.
    pub floors: Vec<FloorRow>,
}

impl FloorGrid {
    pub fn floor(&self, floor: u8) -> Option<&FloorRow> {
        self.floors.iter().find(|row| row.floor == floor)
    }

    pub fn cell(&self, room_number: RoomNumber) -> Option<&GridCell> {
        self.floors
            .iter()
            .flat_map(|row| row.cells.iter())
            .find(|cell| cell.room_number == room_number)
    }
}

/// The highlight outranks the persisted booking flag.
pub fn display_state(room: &Room, highlight: &BTreeSet<RoomNumber>) -> DisplayState {
    if highlight.contains(&room.room_number) {
        DisplayState::JustSelected
    } else if room.is_booked {
        DisplayState::Booked
    } else {
        DisplayState::Available
    }
}

/// Rooms keep inventory order within a floor; they are not re-sorted by
/// number. Floors without rooms still get an empty row.
pub fn project(rooms: &[Room], highlight: &BTreeSet<RoomNumber>) -> FloorGrid {
    let mut by_floor: HashMap<u8, Vec<GridCell>> = HashMap::new();
    for room in rooms {
        by_floor.entry(room.floor).or_default().push(GridCell {
            room_number: room.room_number,
            state: display_state(room, highlight),
            tooltip: room.tooltip(),
        });
    }

    let floors = (LOWEST_FLOOR..=TOP_FLOOR)
        .rev()
        .map(|floor| FloorRow {
            floor,
            cells: by_floor.remove(&floor).unwrap_or_default(),
        })
        .collect();

    FloorGrid { floors }
}

#[cfg(test)]
#[path = "tests/grid_tests.rs"]
mod tests;
