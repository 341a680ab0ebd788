//! Types shared between the booking client and its operator surfaces.

pub mod domain;
pub mod error;
pub mod protocol;
