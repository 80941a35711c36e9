use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{RunPhase, TimerId};

/// Every state change in the execution controller produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        id: TimerId,
        label: String,
        planned_duration_ms: u64,
        /// Specs still waiting behind this one.
        queued: usize,
        at: DateTime<Utc>,
    },
    TimerTick {
        id: TimerId,
        remaining_ms: u64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        id: TimerId,
        label: String,
        planned_duration_ms: u64,
        actual_elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerCancelled {
        id: TimerId,
        label: String,
        planned_duration_ms: u64,
        actual_elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// A cancel request for a timer that was not active.
    TimerRemoved {
        id: TimerId,
        found: bool,
        at: DateTime<Utc>,
    },
    /// The last queued timer completed; the runner is idle again.
    QueueFinished {
        at: DateTime<Utc>,
    },
    ClearedAll {
        discarded_active: Option<TimerId>,
        dropped_queued: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: RunPhase,
        active_id: Option<TimerId>,
        active_label: Option<String>,
        remaining_ms: Option<u64>,
        queued: usize,
        queued_planned_ms: u64,
        logged_runs: usize,
        at: DateTime<Utc>,
    },
}
