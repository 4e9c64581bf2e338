// vizboard_app/src/timers.rs

use std::collections::{BTreeMap, HashMap};
use vizboard_core::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Delayed actions on the dashboard clock.
///
/// Timers fire in `(due, insertion order)` order, so two timers due at the
/// same instant fire in the order they were scheduled. Nothing here sleeps:
/// the owner advances the clock and drains what is due.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    queue: BTreeMap<(Millis, u64), T>,
    due_by_id: HashMap<u64, Millis>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.queue.insert((due, id), payload);
        self.due_by_id.insert(id, due);
        TimerId(id)
    }

    /// Cancels a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id.0) {
            Some(due) => self.queue.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    /// Removes and returns the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerId, T)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > now {
            return None;
        }
        self.due_by_id.remove(&id);
        self.queue.remove(&(due, id)).map(|payload| (TimerId(id), payload))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
