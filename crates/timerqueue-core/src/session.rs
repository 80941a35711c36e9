use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::runlog::{RunLog, RunLogEntry, RunOutcome};
use crate::timer::{elapsed_ms, TimerQueue, TimerSpec};

/// Caller-owned context handed to every controller operation.
///
/// Nothing here is global; independent sessions can run side by side.
/// Only the execution controller appends to `log`, apart from
/// [`Session::recover_interrupted`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub queue: TimerQueue,
    #[serde(default)]
    pub log: RunLog,
    /// Timer a runner process has dequeued but not logged yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_flight: Option<InFlight>,
}

/// Record of an active timer kept alongside a saved session, refreshed by
/// its runner while it is alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlight {
    pub spec: TimerSpec,
    pub started_at: DateTime<Utc>,
    pub heartbeat_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an in-flight timer as cancelled once its runner has been silent
    /// for `stale_after_ms`. The entry ends at the last heartbeat.
    pub fn recover_interrupted(
        &mut self,
        now: DateTime<Utc>,
        stale_after_ms: u64,
    ) -> Option<RunLogEntry> {
        let stale = self
            .in_flight
            .as_ref()
            .is_some_and(|flight| elapsed_ms(flight.heartbeat_at, now) >= stale_after_ms);
        if !stale {
            return None;
        }
        let flight = self.in_flight.take()?;
        let ended_at = flight.heartbeat_at.max(flight.started_at);
        let entry = RunLogEntry::new(&flight.spec, flight.started_at, ended_at, RunOutcome::Cancelled);
        tracing::warn!(
            label = flight.spec.label(),
            actual_ms = entry.actual_elapsed_ms,
            "runner went away, timer logged as cancelled"
        );
        self.log.append(entry.clone());
        Some(entry)
    }
}
