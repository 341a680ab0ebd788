use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::RoomNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCountError {
    #[error("room count is empty")]
    Empty,
    #[error("room count {0:?} is not a whole number")]
    NotAnInteger(String),
    #[error("room count {0} is outside 1..=5")]
    OutOfRange(i64),
}

/// A response from the booking service that does not match the expected schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("field `{field}` is missing")]
    Missing { field: &'static str },
    #[error("field `{field}` has invalid value {value}")]
    Invalid { field: &'static str, value: String },
    #[error("room {room_number} is on floor {floor}, outside 1..=10")]
    FloorOutOfRange { room_number: RoomNumber, floor: i64 },
    #[error("room {0} appears more than once")]
    DuplicateRoom(RoomNumber),
    #[error("booking {0} lists no rooms")]
    EmptyBooking(String),
}

impl SchemaError {
    pub fn invalid(field: &'static str, value: &Value) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
        }
    }
}

/// Error body returned by the booking service on non-2xx responses.
///
/// `detail` is either a plain message or a list of validation entries that
/// each carry a `msg`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ServiceErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Array(entries) => {
                let messages = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .collect::<Vec<_>>();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_detail_is_used_verbatim() {
        let body: ServiceErrorBody =
            serde_json::from_value(json!({ "detail": "Only 3 rooms available" })).expect("body");
        assert_eq!(body.message().as_deref(), Some("Only 3 rooms available"));
    }

    #[test]
    fn validation_entries_are_joined() {
        let body: ServiceErrorBody = serde_json::from_value(json!({
            "detail": [
                { "loc": ["body", "num_rooms"], "msg": "Input should be less than or equal to 5" },
                { "loc": ["body"], "msg": "second" }
            ]
        }))
        .expect("body");
        assert_eq!(
            body.message().as_deref(),
            Some("Input should be less than or equal to 5; second")
        );
    }

    #[test]
    fn missing_or_blank_detail_yields_none() {
        assert!(ServiceErrorBody::default().message().is_none());
        assert!(ServiceErrorBody::new("  ").message().is_none());
        let body: ServiceErrorBody =
            serde_json::from_value(json!({ "detail": { "code": 7 } })).expect("body");
        assert!(body.message().is_none());
    }
}
