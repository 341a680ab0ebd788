use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoomCountError;

pub const LOWEST_FLOOR: u8 = 1;
pub const TOP_FLOOR: u8 = 10;
pub const MIN_ROOMS_PER_BOOKING: u8 = 1;
pub const MAX_ROOMS_PER_BOOKING: u8 = 5;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(RoomNumber);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub room_number: RoomNumber,
    pub floor: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub is_booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<DateTime<Utc>>,
}

impl Room {
    pub fn new(room_number: i64, floor: u8, is_booked: bool) -> Self {
        Self {
            room_number: RoomNumber(room_number),
            floor,
            position: None,
            is_booked,
            booked_at: None,
        }
    }

    /// Hover text shown for a grid cell.
    pub fn tooltip(&self) -> String {
        let status = if self.is_booked { "Booked" } else { "Available" };
        format!("Room {} - {status}", self.room_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub booking_id: String,
    pub rooms: Vec<RoomNumber>,
    pub total_travel_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful booking request, as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: Option<String>,
    pub rooms: Vec<RoomNumber>,
    pub total_travel_time: f64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomOccupancy {
    pub rooms_booked: u32,
}

/// Number of rooms an operator may request in one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCount(u8);

impl RoomCount {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RoomCount {
    type Error = RoomCountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let allowed = i64::from(MIN_ROOMS_PER_BOOKING)..=i64::from(MAX_ROOMS_PER_BOOKING);
        if !allowed.contains(&value) {
            return Err(RoomCountError::OutOfRange(value));
        }
        // Range check above keeps this inside u8.
        Ok(Self(value as u8))
    }
}

impl FromStr for RoomCount {
    type Err = RoomCountError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RoomCountError::Empty);
        }
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| RoomCountError::NotAnInteger(trimmed.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for RoomCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
