//! Wire shapes of the booking service and their validation into domain types.
//!
//! Records are deserialized leniently (`serde_json::Value` for the fields
//! whose type the service has been known to vary) and then checked against
//! the domain schema. A single malformed record rejects the whole response.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{
        Booking, BookingReceipt, RandomOccupancy, Room, RoomCount, RoomNumber, LOWEST_FLOOR,
        TOP_FLOOR,
    },
    error::SchemaError,
};

pub fn rooms_route() -> &'static str {
    "rooms"
}

pub fn bookings_route() -> &'static str {
    "bookings"
}

pub fn book_route() -> &'static str {
    "book"
}

pub fn reset_route() -> &'static str {
    "reset"
}

pub fn random_route() -> &'static str {
    "random"
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookRequest {
    pub num_rooms: u8,
}

impl From<RoomCount> for BookRequest {
    fn from(count: RoomCount) -> Self {
        Self {
            num_rooms: count.get(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomRecord {
    #[serde(default)]
    pub room_number: Option<Value>,
    #[serde(default)]
    pub floor: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub is_booked: Option<Value>,
    #[serde(default)]
    pub booked_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRecord {
    #[serde(default)]
    pub booking_id: Option<Value>,
    #[serde(default)]
    pub rooms: Option<Vec<Value>>,
    #[serde(default)]
    pub total_travel_time: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookResponse {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub rooms: Option<Vec<Value>>,
    #[serde(default)]
    pub total_travel_time: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub rooms_reset: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomResponse {
    #[serde(default)]
    pub rooms_booked: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TryFrom<RoomRecord> for Room {
    type Error = SchemaError;

    fn try_from(record: RoomRecord) -> Result<Self, Self::Error> {
        let room_number = room_number(required("room_number", record.room_number.as_ref())?)?;
        let floor = integer("floor", required("floor", record.floor.as_ref())?)?;
        if !(i64::from(LOWEST_FLOOR)..=i64::from(TOP_FLOOR)).contains(&floor) {
            return Err(SchemaError::FloorOutOfRange { room_number, floor });
        }
        let position = match record.position.as_ref() {
            None | Some(Value::Null) => None,
            Some(value) => {
                let raw = integer("position", value)?;
                Some(u32::try_from(raw).map_err(|_| SchemaError::invalid("position", value))?)
            }
        };
        let booked_at = record
            .booked_at
            .as_deref()
            .map(|raw| timestamp("booked_at", raw))
            .transpose()?;

        Ok(Room {
            room_number,
            // Range checked above.
            floor: floor as u8,
            position,
            is_booked: flag("is_booked", record.is_booked.as_ref())?,
            booked_at,
        })
    }
}

impl RoomsResponse {
    pub fn into_rooms(self) -> Result<Vec<Room>, SchemaError> {
        let mut seen = HashSet::with_capacity(self.rooms.len());
        let mut rooms = Vec::with_capacity(self.rooms.len());
        for record in self.rooms {
            let room = Room::try_from(record)?;
            if !seen.insert(room.room_number) {
                return Err(SchemaError::DuplicateRoom(room.room_number));
            }
            rooms.push(room);
        }
        Ok(rooms)
    }
}

impl TryFrom<BookingRecord> for Booking {
    type Error = SchemaError;

    fn try_from(record: BookingRecord) -> Result<Self, Self::Error> {
        let booking_id = match required("booking_id", record.booking_id.as_ref())? {
            Value::String(id) if !id.trim().is_empty() => id.clone(),
            Value::Number(id) => id.to_string(),
            other => return Err(SchemaError::invalid("booking_id", other)),
        };
        let rooms = room_list(record.rooms.as_deref())?;
        if rooms.is_empty() {
            return Err(SchemaError::EmptyBooking(booking_id));
        }
        let total_travel_time = travel_time(record.total_travel_time.as_ref())?;
        let created_at = timestamp(
            "created_at",
            record
                .created_at
                .as_deref()
                .ok_or(SchemaError::Missing {
                    field: "created_at",
                })?,
        )?;

        Ok(Booking {
            booking_id,
            rooms,
            total_travel_time,
            created_at,
        })
    }
}

impl BookingsResponse {
    pub fn into_bookings(self) -> Result<Vec<Booking>, SchemaError> {
        self.bookings.into_iter().map(Booking::try_from).collect()
    }
}

impl TryFrom<BookResponse> for BookingReceipt {
    type Error = SchemaError;

    fn try_from(response: BookResponse) -> Result<Self, Self::Error> {
        let rooms = room_list(response.rooms.as_deref())?;
        if rooms.is_empty() {
            return Err(SchemaError::EmptyBooking(
                response.booking_id.unwrap_or_default(),
            ));
        }
        let created_at = response
            .created_at
            .as_deref()
            .map(|raw| timestamp("created_at", raw))
            .transpose()?;

        Ok(BookingReceipt {
            booking_id: response.booking_id,
            rooms,
            total_travel_time: travel_time(response.total_travel_time.as_ref())?,
            created_at,
        })
    }
}

impl TryFrom<RandomResponse> for RandomOccupancy {
    type Error = SchemaError;

    fn try_from(response: RandomResponse) -> Result<Self, Self::Error> {
        let value = required("rooms_booked", response.rooms_booked.as_ref())?;
        let rooms_booked = u32::try_from(integer("rooms_booked", value)?)
            .map_err(|_| SchemaError::invalid("rooms_booked", value))?;
        Ok(RandomOccupancy { rooms_booked })
    }
}

fn required<'a>(field: &'static str, value: Option<&'a Value>) -> Result<&'a Value, SchemaError> {
    match value {
        None | Some(Value::Null) => Err(SchemaError::Missing { field }),
        Some(value) => Ok(value),
    }
}

fn integer(field: &'static str, value: &Value) -> Result<i64, SchemaError> {
    let Value::Number(number) = value else {
        return Err(SchemaError::invalid(field, value));
    };
    if let Some(whole) = number.as_i64() {
        return Ok(whole);
    }
    // Some serializers emit integral floats such as `3.0`.
    number
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
        .map(|f| f as i64)
        .ok_or_else(|| SchemaError::invalid(field, value))
}

fn room_number(value: &Value) -> Result<RoomNumber, SchemaError> {
    let raw = integer("room_number", value)?;
    if raw <= 0 {
        return Err(SchemaError::invalid("room_number", value));
    }
    Ok(RoomNumber(raw))
}

fn room_list(values: Option<&[Value]>) -> Result<Vec<RoomNumber>, SchemaError> {
    values
        .ok_or(SchemaError::Missing { field: "rooms" })?
        .iter()
        .map(room_number)
        .collect()
}

/// Missing or null flags read as `false`, the service's default.
fn flag(field: &'static str, value: Option<&Value>) -> Result<bool, SchemaError> {
    let Some(value) = value else {
        return Ok(false);
    };
    let parsed = match value {
        Value::Null => Some(false),
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| SchemaError::invalid(field, value))
}

fn travel_time(value: Option<&Value>) -> Result<f64, SchemaError> {
    let value = required("total_travel_time", value)?;
    value
        .as_f64()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| SchemaError::invalid("total_travel_time", value))
}

/// RFC 3339, or an offset-less ISO timestamp read as UTC.
fn timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, SchemaError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| SchemaError::Invalid {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
