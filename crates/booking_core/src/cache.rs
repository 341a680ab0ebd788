//! Replace-only snapshots of service state.
//!
//! A fetch always swaps the whole collection. Nothing is merged, so two
//! clients that saw different intermediate updates converge after their next
//! fetch.

use chrono::{DateTime, Utc};
use shared::domain::{Booking, Room, RoomNumber};

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    items: Vec<T>,
    refreshed_at: Option<DateTime<Utc>>,
}

pub type RoomInventory = Snapshot<Room>;
pub type BookingHistory = Snapshot<Booking>;

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            refreshed_at: None,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.refreshed_at = Some(Utc::now());
    }

    pub fn current(&self) -> &[T] {
        &self.items
    }

    /// `None` until the first successful fetch.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl Snapshot<Room> {
    pub fn find(&self, room_number: RoomNumber) -> Option<&Room> {
        self.items.iter().find(|room| room.room_number == room_number)
    }

    pub fn booked_count(&self) -> usize {
        self.items.iter().filter(|room| room.is_booked).count()
    }

    pub fn available_count(&self) -> usize {
        self.items.len() - self.booked_count()
    }
}
