use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{Booking, BookingReceipt, RandomOccupancy, Room, RoomCount, RoomNumber},
    error::RoomCountError,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub mod cache;
pub mod grid;
pub mod highlight;
pub mod remote;

pub use cache::{BookingHistory, RoomInventory, Snapshot};
pub use grid::{DisplayState, FloorGrid, FloorRow, GridCell};
pub use remote::{HttpBookingService, RequestError};

use highlight::Highlight;

pub const DEFAULT_HIGHLIGHT_TTL: Duration = Duration::from_secs(3);

pub const INVALID_ROOM_COUNT_MESSAGE: &str = "Please enter a valid number between 1 and 5";
const ROOMS_LOAD_FAILED_MESSAGE: &str = "Failed to load rooms";
const BOOK_FAILED_MESSAGE: &str = "Failed to book rooms";
const RESET_FAILED_MESSAGE: &str = "Failed to reset bookings";
const RANDOM_FAILED_MESSAGE: &str = "Failed to generate random occupancy";
const RESET_OK_MESSAGE: &str = "All bookings cleared";

/// The remote service that owns room state and performs allocation.
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<Room>, RequestError>;
    async fn list_bookings(&self) -> Result<Vec<Booking>, RequestError>;
    async fn book(&self, count: RoomCount) -> Result<BookingReceipt, RequestError>;
    async fn reset(&self) -> Result<(), RequestError>;
    async fn randomize(&self) -> Result<RandomOccupancy, RequestError>;
}

pub struct MissingBookingService;

#[async_trait]
impl BookingService for MissingBookingService {
    async fn list_rooms(&self) -> Result<Vec<Room>, RequestError> {
        Err(RequestError::Unavailable("no booking service configured".into()))
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, RequestError> {
        Err(RequestError::Unavailable("no booking service configured".into()))
    }

    async fn book(&self, _count: RoomCount) -> Result<BookingReceipt, RequestError> {
        Err(RequestError::Unavailable("no booking service configured".into()))
    }

    async fn reset(&self) -> Result<(), RequestError> {
        Err(RequestError::Unavailable("no booking service configured".into()))
    }

    async fn randomize(&self) -> Result<RandomOccupancy, RequestError> {
        Err(RequestError::Unavailable("no booking service configured".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient operator notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Notice(Notice),
    RoomsChanged,
    HistoryChanged,
    HighlightChanged(Vec<RoomNumber>),
    BusyChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Busy,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("another booking action is already in flight")]
    Busy,
    #[error(transparent)]
    InvalidRoomCount(#[from] RoomCountError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub highlight_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            highlight_ttl: DEFAULT_HIGHLIGHT_TTL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySummary {
    pub total: usize,
    pub booked: usize,
    pub available: usize,
}

/// Client-side view of the hotel and the controller for operator actions.
///
/// Book, reset and randomize are serialized by the busy flag: an action that
/// arrives while another is in flight returns [`ActionError::Busy`] without
/// touching the service. Room and history refreshes are not gated. Each one
/// replaces its cache when its response lands, so a slow refresh issued
/// before a booking can land after the booking's own refresh and show the
/// pre-booking state until the next refresh. That window is accepted.
///
/// Local room state is never mutated ahead of the service; every successful
/// action is followed by a full refetch.
pub struct BookingSession {
    service: Arc<dyn BookingService>,
    config: SessionConfig,
    busy: AtomicBool,
    rooms: RwLock<RoomInventory>,
    history: RwLock<BookingHistory>,
    highlight: Mutex<Highlight>,
    events: broadcast::Sender<SessionEvent>,
}

/// Holds the busy flag; releasing it on drop covers every exit path,
/// including cancellation of the action future.
struct BusyGuard<'a> {
    session: &'a BookingSession,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::Release);
        let _ = self.session.events.send(SessionEvent::BusyChanged(false));
    }
}

impl BookingSession {
    /// Builds an empty session. Call [`BookingSession::load`] (or use
    /// [`BookingSession::open`]) to populate it.
    pub fn new(service: Arc<dyn BookingService>, config: SessionConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            config,
            busy: AtomicBool::new(false),
            rooms: RwLock::new(RoomInventory::default()),
            history: RwLock::new(BookingHistory::default()),
            highlight: Mutex::new(Highlight::default()),
            events,
        })
    }

    pub async fn open(service: Arc<dyn BookingService>, config: SessionConfig) -> Arc<Self> {
        let session = Self::new(service, config);
        session.load().await;
        session
    }

    /// Initial fetch of rooms and history, issued concurrently.
    pub async fn load(&self) {
        self.refresh_all().await;
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SessionState {
        if self.is_busy() {
            SessionState::Busy
        } else {
            SessionState::Idle
        }
    }

    pub async fn rooms(&self) -> Vec<Room> {
        self.rooms.read().await.current().to_vec()
    }

    pub async fn history(&self) -> Vec<Booking> {
        self.history.read().await.current().to_vec()
    }

    pub async fn highlighted(&self) -> BTreeSet<RoomNumber> {
        self.highlight.lock().await.rooms().clone()
    }

    pub async fn inventory_summary(&self) -> InventorySummary {
        let rooms = self.rooms.read().await;
        InventorySummary {
            total: rooms.len(),
            booked: rooms.booked_count(),
            available: rooms.available_count(),
        }
    }

    pub async fn floor_grid(&self) -> FloorGrid {
        let highlighted = self.highlighted().await;
        let rooms = self.rooms.read().await;
        grid::project(rooms.current(), &highlighted)
    }

    /// Replaces the room inventory. A failure keeps the previous snapshot and
    /// is reported to the operator.
    pub async fn refresh_rooms(&self) -> Result<(), RequestError> {
        match self.service.list_rooms().await {
            Ok(rooms) => {
                debug!(count = rooms.len(), "rooms: refreshed");
                self.rooms.write().await.replace(rooms);
                self.emit(SessionEvent::RoomsChanged);
                Ok(())
            }
            Err(err) => {
                error!(%err, "rooms: refresh failed");
                self.notify(Notice::error(ROOMS_LOAD_FAILED_MESSAGE));
                Err(err)
            }
        }
    }

    /// Replaces the booking history. Failures are logged only.
    pub async fn refresh_history(&self) -> Result<(), RequestError> {
        match self.service.list_bookings().await {
            Ok(bookings) => {
                debug!(count = bookings.len(), "history: refreshed");
                self.history.write().await.replace(bookings);
                self.emit(SessionEvent::HistoryChanged);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "history: refresh failed");
                Err(err)
            }
        }
    }

    /// Books the number of rooms typed by the operator.
    pub async fn book(self: &Arc<Self>, requested: &str) -> Result<BookingReceipt, ActionError> {
        if self.is_busy() {
            return Err(ActionError::Busy);
        }
        let count = match requested.parse::<RoomCount>() {
            Ok(count) => count,
            Err(err) => {
                warn!(%err, requested, "booking: rejected room count");
                self.notify(Notice::error(INVALID_ROOM_COUNT_MESSAGE));
                return Err(err.into());
            }
        };
        self.book_rooms(count).await
    }

    pub async fn book_rooms(
        self: &Arc<Self>,
        count: RoomCount,
    ) -> Result<BookingReceipt, ActionError> {
        let Some(_busy) = self.try_begin() else {
            return Err(ActionError::Busy);
        };

        let receipt = match self.service.book(count).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(%err, requested = count.get(), "booking: request failed");
                let message = err.detail().unwrap_or(BOOK_FAILED_MESSAGE).to_string();
                self.notify(Notice::error(message));
                return Err(err.into());
            }
        };

        self.highlight_booked(&receipt.rooms).await;
        self.refresh_all().await;

        info!(
            rooms = ?receipt.rooms,
            total_travel_time = receipt.total_travel_time,
            booking_id = ?receipt.booking_id,
            "booking: completed"
        );
        self.notify(Notice::success(format!(
            "Booked {} rooms! Travel time: {:.1} min",
            receipt.rooms.len(),
            receipt.total_travel_time
        )));
        Ok(receipt)
    }

    pub async fn reset(&self) -> Result<(), ActionError> {
        let Some(_busy) = self.try_begin() else {
            return Err(ActionError::Busy);
        };

        if let Err(err) = self.service.reset().await {
            error!(%err, "reset: request failed");
            self.notify(Notice::error(RESET_FAILED_MESSAGE));
            return Err(err.into());
        }

        self.clear_highlight().await;
        self.refresh_all().await;

        info!("reset: all bookings cleared");
        self.notify(Notice::success(RESET_OK_MESSAGE));
        Ok(())
    }

    /// Random occupancy is not a booking, so only the room inventory is
    /// refreshed afterwards.
    pub async fn randomize(&self) -> Result<RandomOccupancy, ActionError> {
        let Some(_busy) = self.try_begin() else {
            return Err(ActionError::Busy);
        };

        let occupancy = match self.service.randomize().await {
            Ok(occupancy) => occupancy,
            Err(err) => {
                error!(%err, "random: request failed");
                self.notify(Notice::error(RANDOM_FAILED_MESSAGE));
                return Err(err.into());
            }
        };

        self.clear_highlight().await;
        let _ = self.refresh_rooms().await;

        info!(rooms_booked = occupancy.rooms_booked, "random: occupancy generated");
        self.notify(Notice::success(format!(
            "Generated random occupancy: {} rooms booked",
            occupancy.rooms_booked
        )));
        Ok(occupancy)
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.emit(SessionEvent::BusyChanged(true));
        Some(BusyGuard { session: self })
    }

    async fn refresh_all(&self) {
        // Both refreshes report their own failures.
        let _ = futures::join!(self.refresh_rooms(), self.refresh_history());
    }

    async fn highlight_booked(self: &Arc<Self>, rooms: &[RoomNumber]) {
        let session = Arc::downgrade(self);
        let ttl = self.config.highlight_ttl;
        let mut highlight = self.highlight.lock().await;
        let generation = highlight.replace(rooms.iter().copied());
        highlight.arm(tokio::spawn(expire_highlight_after(session, ttl, generation)));
        // Announced under the lock so the expiry's clear is always sent after it.
        self.emit(SessionEvent::HighlightChanged(rooms.to_vec()));
    }

    async fn clear_highlight(&self) {
        let mut highlight = self.highlight.lock().await;
        if highlight.clear() {
            self.emit(SessionEvent::HighlightChanged(Vec::new()));
        }
    }

    fn notify(&self, notice: Notice) {
        self.emit(SessionEvent::Notice(notice));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn expire_highlight_after(session: Weak<BookingSession>, ttl: Duration, generation: u64) {
    tokio::time::sleep(ttl).await;
    let Some(session) = session.upgrade() else {
        return;
    };
    let mut highlight = session.highlight.lock().await;
    if highlight.expire(generation) {
        debug!(generation, "highlight: expired");
        session.emit(SessionEvent::HighlightChanged(Vec::new()));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
