//! Broadcast event with automatic re-arm.
//!
//! A `BroadcastEvent` hands out `EventHandle`s, each tied to one broadcast
//! round. `broadcast()` releases every waiter of the current round and installs a
//! fresh, unset round. Waiters that arrive after a broadcast fetch the new handle
//! and therefore wait for the *next* change only.
//!
//! # Example
//!
//! ```rust,ignore
//! let event = BroadcastEvent::new();
//! let handle = event.wait_handle();
//!
//! tokio::spawn(async move {
//!     handle.wait().await;
//!     // handle is now spent; fetch a new one to observe the next change
//! });
//!
//! event.broadcast();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// One broadcast round. Never reset; replaced by the next round on broadcast.
#[derive(Debug)]
struct Round {
    generation: u64,
    fired: AtomicBool,
    notify: Notify,
}

impl Round {
    fn new(generation: u64) -> Arc<Self> {
        Arc::new(Self {
            generation,
            fired: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Generation the next created round will carry.
    generation: u64,
    /// Created lazily on the first `wait_handle()`.
    current: Option<Arc<Round>>,
}

/// Single-shot, multi-waiter wake primitive that re-arms on every broadcast.
#[derive(Debug, Default)]
pub struct BroadcastEvent {
    slot: Mutex<Slot>,
}

/// Reference to one broadcast round.
///
/// A handle fires at most once. After it fires the holder must fetch a new handle
/// from the owning `BroadcastEvent` to observe later changes.
#[derive(Debug, Clone)]
pub struct EventHandle {
    round: Arc<Round>,
}

impl BroadcastEvent {
    /// Creates an event with no round allocated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle of the current round, creating it if none exists.
    pub fn wait_handle(&self) -> EventHandle {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = slot.generation;
        let round = slot.current.get_or_insert_with(|| Round::new(generation));
        EventHandle {
            round: Arc::clone(round),
        }
    }

    /// Releases every waiter of the current round and installs a fresh one.
    ///
    /// With no round allocated this only advances the generation.
    pub fn broadcast(&self) {
        let old = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            let old = slot.current.take();
            if old.is_some() {
                slot.current = Some(Round::new(slot.generation));
            }
            old
        };

        // Fire outside the lock so woken tasks can fetch the new handle at once.
        if let Some(round) = old {
            round.fire();
        }
    }

    /// Generation of the round a new `wait_handle()` would join.
    pub fn generation(&self) -> u64 {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Non-blocking check whether `handle` has been superseded.
    pub fn is_fired(&self, handle: &EventHandle) -> bool {
        handle.is_fired()
    }
}

impl EventHandle {
    /// Generation of the round this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.round.generation
    }

    /// Whether this handle's round has been superseded by a broadcast.
    pub fn is_fired(&self) -> bool {
        self.round.fired.load(Ordering::Acquire)
    }

    /// Waits until this handle's round is superseded.
    ///
    /// Returns immediately if it already was. Dropping the future withdraws only
    /// this waiter's registration.
    pub async fn wait(&self) {
        let notified = self.round.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent fire is not missed.
        notified.as_mut().enable();
        if self.is_fired() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_handle_created_lazily() {
        let event = BroadcastEvent::new();
        assert_eq!(event.generation(), 0);

        let handle = event.wait_handle();
        assert_eq!(handle.generation(), 0);
        assert!(!handle.is_fired());

        // Same round until a broadcast happens
        let again = event.wait_handle();
        assert!(Arc::ptr_eq(&handle.round, &again.round));
    }

    #[test]
    fn test_broadcast_without_handle_is_noop() {
        let event = BroadcastEvent::new();
        event.broadcast();
        event.broadcast();

        let handle = event.wait_handle();
        assert!(!handle.is_fired());
        assert_eq!(handle.generation(), 2);
    }

    #[test]
    fn test_broadcast_swaps_round() {
        let event = BroadcastEvent::new();
        let first = event.wait_handle();

        event.broadcast();

        assert!(event.is_fired(&first));
        let second = event.wait_handle();
        assert!(!second.is_fired());
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn test_wait_pending_until_broadcast() {
        let event = BroadcastEvent::new();
        let handle = event.wait_handle();

        let mut wait = tokio_test::task::spawn(handle.wait());
        tokio_test::assert_pending!(wait.poll());

        event.broadcast();
        assert!(wait.is_woken());
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn test_all_waiters_released() {
        let event = Arc::new(BroadcastEvent::new());
        let mut tasks = Vec::new();

        for _ in 0..4 {
            let handle = event.wait_handle();
            tasks.push(tokio::spawn(async move {
                handle.wait().await;
                handle.generation()
            }));
        }

        tokio::task::yield_now().await;
        event.broadcast();

        for task in tasks {
            let generation = timeout(Duration::from_secs(1), task)
                .await
                .expect("waiter not released")
                .unwrap();
            assert_eq!(generation, 0);
        }
    }

    #[tokio::test]
    async fn test_waiter_only_released_by_its_own_round() {
        let event = BroadcastEvent::new();
        let handle = event.wait_handle();
        event.broadcast();

        // Joined after broadcast 1; must not see it
        let late = event.wait_handle();
        assert!(timeout(Duration::from_millis(50), late.wait()).await.is_err());

        event.broadcast();
        assert!(timeout(Duration::from_millis(50), late.wait()).await.is_ok());
        // Spent handles return immediately
        assert!(timeout(Duration::from_millis(50), handle.wait()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_affect_others() {
        let event = Arc::new(BroadcastEvent::new());
        let handle = event.wait_handle();

        // Cancelled waiter
        let cancelled = event.wait_handle();
        let _ = timeout(Duration::from_millis(10), cancelled.wait()).await;

        let waiter = tokio::spawn(async move { handle.wait().await });
        tokio::task::yield_now().await;
        event.broadcast();

        assert!(timeout(Duration::from_secs(1), waiter).await.is_ok());
    }
}
