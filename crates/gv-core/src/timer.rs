//! Deferred actions driven by an explicit clock
//!
//! Debounced work lives in named slots: scheduling into a slot cancels what
//! was pending there and restarts the delay. One-shot entries have no slot
//! and cannot be replaced. Nothing fires on its own; the owner calls
//! [`TimerQueue::take_due`] with the current time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of the current time, measured from an arbitrary origin
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock advanced by hand
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Handle of a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<K, A> {
    id: TimerId,
    due: Duration,
    slot: Option<K>,
    action: A,
}

/// Pending actions ordered by due time
#[derive(Debug)]
pub struct TimerQueue<K, A> {
    entries: Vec<Entry<K, A>>,
    next_id: u64,
}

impl<K, A> Default for TimerQueue<K, A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<K: PartialEq, A> TimerQueue<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due: Duration, slot: Option<K>, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, due, slot, action });
        id
    }

    /// Schedule `action` in `slot`, cancelling whatever was pending there
    pub fn debounce(&mut self, slot: K, due: Duration, action: A) -> TimerId {
        self.cancel_slot(&slot);
        self.push(due, Some(slot), action)
    }

    /// Schedule a one-shot action
    pub fn once(&mut self, due: Duration, action: A) -> TimerId {
        self.push(due, None, action)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn cancel_slot(&mut self, slot: &K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.slot.as_ref() != Some(slot));
        self.entries.len() != before
    }

    pub fn is_pending(&self, slot: &K) -> bool {
        self.entries.iter().any(|entry| entry.slot.as_ref() == Some(slot))
    }

    /// Slot action pending in `slot`
    pub fn pending_action(&self, slot: &K) -> Option<&A> {
        self.entries
            .iter()
            .find(|entry| entry.slot.as_ref() == Some(slot))
            .map(|entry| &entry.action)
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every action due at `now`, earliest first
    pub fn take_due(&mut self, now: Duration) -> Vec<A> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due, entry.id));
        due.into_iter().map(|entry| entry.action).collect()
    }
}
