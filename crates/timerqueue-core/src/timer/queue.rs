//! FIFO of pending timer specs.
//!
//! The queue knows nothing about the run log or the active timer; the
//! execution controller dequeues from it and owns everything after that.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::spec::{TimerId, TimerSpec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerQueue {
    pending: VecDeque<TimerSpec>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn enqueue(&mut self, spec: TimerSpec) {
        self.pending.push_back(spec);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn dequeue_front(&mut self) -> Option<TimerSpec> {
        self.pending.pop_front()
    }

    /// Remove the entry with this identity. Returns `false` if it was not
    /// queued; the order of the remaining entries is unchanged either way.
    pub fn remove(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|spec| spec.id() == id) {
            Some(index) => self.pending.remove(index).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn front(&self) -> Option<&TimerSpec> {
        self.pending.front()
    }

    pub fn get(&self, id: TimerId) -> Option<&TimerSpec> {
        self.pending.iter().find(|spec| spec.id() == id)
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimerSpec> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sum of planned durations still waiting to run.
    pub fn total_planned_ms(&self) -> u64 {
        self.pending
            .iter()
            .fold(0u64, |acc, spec| acc.saturating_add(spec.planned_duration_ms()))
    }
}
