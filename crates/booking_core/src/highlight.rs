//! The "just booked" highlight and its pending expiry.

use std::collections::BTreeSet;

use shared::domain::RoomNumber;
use tokio::task::JoinHandle;

/// Highlighted rooms tagged with a generation.
///
/// Every replace or clear bumps the generation and aborts the pending expiry
/// task. An expiry that still fires (already past its sleep when aborted)
/// only clears the set when its generation is still current.
#[derive(Default)]
pub struct Highlight {
    rooms: BTreeSet<RoomNumber>,
    generation: u64,
    pending_clear: Option<JoinHandle<()>>,
}

impl Highlight {
    pub fn rooms(&self) -> &BTreeSet<RoomNumber> {
        &self.rooms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn has_pending_clear(&self) -> bool {
        self.pending_clear.is_some()
    }

    /// Returns the generation the caller's expiry task must present.
    pub fn replace(&mut self, rooms: impl IntoIterator<Item = RoomNumber>) -> u64 {
        self.cancel_pending();
        self.rooms = rooms.into_iter().collect();
        self.generation += 1;
        self.generation
    }

    pub fn arm(&mut self, expiry: JoinHandle<()>) {
        self.cancel_pending();
        self.pending_clear = Some(expiry);
    }

    /// Immediate clear. Returns whether anything was highlighted.
    pub fn clear(&mut self) -> bool {
        self.cancel_pending();
        self.generation += 1;
        let had_rooms = !self.rooms.is_empty();
        self.rooms.clear();
        had_rooms
    }

    /// Called from the expiry task itself, so the handle is released rather
    /// than aborted.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending_clear = None;
        let had_rooms = !self.rooms.is_empty();
        self.rooms.clear();
        had_rooms
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending_clear.take() {
            pending.abort();
        }
    }
}

impl Drop for Highlight {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    };

    fn rooms(numbers: &[i64]) -> Vec<RoomNumber> {
        numbers.iter().copied().map(RoomNumber).collect()
    }

    #[test]
    fn stale_generation_does_not_clear_newer_highlight() {
        let mut highlight = Highlight::default();
        let first = highlight.replace(rooms(&[101, 102]));
        let second = highlight.replace(rooms(&[305]));

        assert!(!highlight.expire(first));
        assert_eq!(highlight.rooms().len(), 1);

        assert!(highlight.expire(second));
        assert!(highlight.is_empty());
    }

    #[test]
    fn clear_invalidates_outstanding_expiry() {
        let mut highlight = Highlight::default();
        let generation = highlight.replace(rooms(&[101]));
        assert!(highlight.clear());

        highlight.replace(rooms(&[201]));
        assert!(!highlight.expire(generation));
        assert!(!highlight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_aborts_the_pending_expiry_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let mut highlight = Highlight::default();
        highlight.replace(rooms(&[101]));
        let flag = Arc::clone(&fired);
        highlight.arm(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            flag.store(true, Ordering::SeqCst);
        }));
        assert!(highlight.has_pending_clear());

        highlight.replace(rooms(&[102]));
        assert!(!highlight.has_pending_clear());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
