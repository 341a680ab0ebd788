use super::*;
use serde_json::json;

fn rooms_from(value: Value) -> Result<Vec<Room>, SchemaError> {
    serde_json::from_value::<RoomsResponse>(value)
        .expect("rooms envelope")
        .into_rooms()
}

#[test]
fn accepts_service_room_shape_and_ignores_unknown_fields() {
    let rooms = rooms_from(json!({
        "rooms": [
            { "room_number": 101, "floor": 1, "position": 1, "is_booked": false, "booked_at": null },
            { "room_number": 1007, "floor": 10, "position": 7, "is_booked": true,
              "booked_at": "2025-02-01T10:00:00+00:00", "wing": "east" }
        ]
    }))
    .expect("valid rooms");

    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].room_number, RoomNumber(101));
    assert_eq!(rooms[0].position, Some(1));
    assert!(!rooms[0].is_booked);
    assert_eq!(rooms[1].floor, 10);
    assert!(rooms[1].is_booked);
    assert!(rooms[1].booked_at.is_some());
}

#[test]
fn normalizes_loosely_typed_booking_flags() {
    let rooms = rooms_from(json!({
        "rooms": [
            { "room_number": 1, "floor": 1, "is_booked": 1 },
            { "room_number": 2, "floor": 1, "is_booked": "false" },
            { "room_number": 3, "floor": 1.0, "is_booked": null },
            { "room_number": 4, "floor": 2 }
        ]
    }))
    .expect("normalized rooms");

    let flags = rooms.iter().map(|room| room.is_booked).collect::<Vec<_>>();
    assert_eq!(flags, vec![true, false, false, false]);
    assert_eq!(rooms[2].floor, 1);
}

#[test]
fn rejects_unusable_flag_values() {
    let err = rooms_from(json!({
        "rooms": [{ "room_number": 1, "floor": 1, "is_booked": "maybe" }]
    }))
    .expect_err("flag should be rejected");
    assert!(matches!(err, SchemaError::Invalid { field: "is_booked", .. }));
}

#[test]
fn rejects_floors_outside_the_building() {
    for floor in [json!(0), json!(11), json!(-3)] {
        let err = rooms_from(json!({
            "rooms": [{ "room_number": 5, "floor": floor, "is_booked": false }]
        }))
        .expect_err("floor should be rejected");
        assert!(matches!(err, SchemaError::FloorOutOfRange { .. }), "{err}");
    }

    let err = rooms_from(json!({
        "rooms": [{ "room_number": 5, "floor": "3", "is_booked": false }]
    }))
    .expect_err("string floor should be rejected");
    assert!(matches!(err, SchemaError::Invalid { field: "floor", .. }));
}

#[test]
fn rejects_duplicate_and_missing_room_numbers() {
    let err = rooms_from(json!({
        "rooms": [
            { "room_number": 7, "floor": 1 },
            { "room_number": 7, "floor": 2 }
        ]
    }))
    .expect_err("duplicate should be rejected");
    assert_eq!(err, SchemaError::DuplicateRoom(RoomNumber(7)));

    let err = rooms_from(json!({ "rooms": [{ "floor": 1 }] })).expect_err("missing number");
    assert_eq!(
        err,
        SchemaError::Missing {
            field: "room_number"
        }
    );
}

#[test]
fn parses_history_records_in_service_order() {
    let bookings = serde_json::from_value::<BookingsResponse>(json!({
        "bookings": [
            { "booking_id": "BK2", "rooms": [201, 202], "total_travel_time": 1.0,
              "created_at": "2025-02-01T10:05:00.123456+00:00" },
            { "booking_id": "BK1", "rooms": [101], "total_travel_time": 0,
              "created_at": "2025-02-01T10:00:00" }
        ]
    }))
    .expect("bookings envelope")
    .into_bookings()
    .expect("valid bookings");

    assert_eq!(bookings[0].booking_id, "BK2");
    assert_eq!(bookings[0].rooms, vec![RoomNumber(201), RoomNumber(202)]);
    assert_eq!(bookings[1].total_travel_time, 0.0);
    assert!(bookings[0].created_at > bookings[1].created_at);
}

#[test]
fn rejects_bookings_without_rooms_or_with_negative_travel_time() {
    let empty = BookingRecord {
        booking_id: Some(json!("BK9")),
        rooms: Some(Vec::new()),
        total_travel_time: Some(json!(1.0)),
        created_at: Some("2025-02-01T10:00:00Z".into()),
    };
    assert_eq!(
        Booking::try_from(empty),
        Err(SchemaError::EmptyBooking("BK9".into()))
    );

    let negative = BookingRecord {
        booking_id: Some(json!("BK9")),
        rooms: Some(vec![json!(101)]),
        total_travel_time: Some(json!(-0.5)),
        created_at: Some("2025-02-01T10:00:00Z".into()),
    };
    assert!(matches!(
        Booking::try_from(negative),
        Err(SchemaError::Invalid {
            field: "total_travel_time",
            ..
        })
    ));
}

#[test]
fn book_response_becomes_receipt() {
    let response: BookResponse = serde_json::from_value(json!({
        "booking_id": "BK1738404000000",
        "rooms": [3, 5],
        "total_travel_time": 1.5,
        "created_at": "2025-02-01T10:00:00+00:00",
        "message": "Rooms booked successfully"
    }))
    .expect("book response");

    let receipt = BookingReceipt::try_from(response).expect("receipt");
    assert_eq!(receipt.rooms, vec![RoomNumber(3), RoomNumber(5)]);
    assert_eq!(receipt.total_travel_time, 1.5);
    assert_eq!(receipt.booking_id.as_deref(), Some("BK1738404000000"));
}

#[test]
fn book_response_requires_rooms_and_travel_time() {
    let missing_time: BookResponse =
        serde_json::from_value(json!({ "rooms": [3] })).expect("book response");
    assert_eq!(
        BookingReceipt::try_from(missing_time),
        Err(SchemaError::Missing {
            field: "total_travel_time"
        })
    );

    let missing_rooms: BookResponse =
        serde_json::from_value(json!({ "total_travel_time": 0.0 })).expect("book response");
    assert_eq!(
        BookingReceipt::try_from(missing_rooms),
        Err(SchemaError::Missing { field: "rooms" })
    );
}

#[test]
fn random_response_reports_booked_count() {
    let response: RandomResponse = serde_json::from_value(json!({
        "message": "Random occupancy generated",
        "rooms_booked": 42
    }))
    .expect("random response");
    assert_eq!(
        RandomOccupancy::try_from(response),
        Ok(RandomOccupancy { rooms_booked: 42 })
    );

    let negative: RandomResponse =
        serde_json::from_value(json!({ "rooms_booked": -1 })).expect("random response");
    assert!(RandomOccupancy::try_from(negative).is_err());
}

#[test]
fn book_request_carries_room_count() {
    let count: RoomCount = "4".parse().expect("count");
    let body = serde_json::to_value(BookRequest::from(count)).expect("serialize");
    assert_eq!(body, json!({ "num_rooms": 4 }));
}
