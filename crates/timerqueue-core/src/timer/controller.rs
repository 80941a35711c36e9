//! Execution controller.
//!
//! Drives queued timers one at a time. Like the rest of the crate it has no
//! internal thread: the caller dispatches `Command::Tick` periodically and
//! completion is detected by comparing wall-clock time against
//! `started_at + planned`, so late or skipped ticks still report the real
//! overshoot.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --reach zero--> Completing --advance--> Running | Idle
//!                 Running --cancel------> Idle        (never auto-advances)
//! any  --clear_all------------------------> Idle        (nothing logged)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = ExecutionController::new(prefs, Effects::silent());
//! controller.enqueue(&mut session, "Tea", 180_000)?;
//! controller.dispatch(&mut session, Command::Start)?;
//! // In a loop:
//! controller.dispatch(&mut session, Command::Tick)?;
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cancel::CancelToken;
use super::clock::{elapsed_ms, Clock, SystemClock};
use super::spec::{TimerId, TimerSpec};
use crate::effects::{BlockHandle, Effects};
use crate::error::{ControlError, ValidationError};
use crate::events::Event;
use crate::preferences::Preferences;
use crate::runlog::{RunLogEntry, RunOutcome};
use crate::session::Session;

/// Externally visible phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    /// Countdown reached zero; alerts and log write done, waiting for
    /// `advance()`.
    Completing,
}

/// The one timer currently executing.
#[derive(Debug, Clone)]
pub struct ActiveTimer {
    spec: TimerSpec,
    started_at: DateTime<Utc>,
    cancel: CancelToken,
}

impl ActiveTimer {
    pub fn spec(&self) -> &TimerSpec {
        &self.spec
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// The active handle lives inside the state, so "running" and "has an
/// active timer" cannot disagree.
#[derive(Debug)]
enum RunState {
    Idle,
    Running(ActiveTimer),
    Completing(ActiveTimer),
}

/// Inputs to `ExecutionController::dispatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Tick,
    Cancel(TimerId),
    ClearAll,
}

pub struct ExecutionController {
    state: RunState,
    prefs: Preferences,
    clock: Box<dyn Clock>,
    effects: Effects,
    blocks: HashMap<TimerId, BlockHandle>,
    /// Exit animations that may still be running.
    pending_exits: Vec<CancelToken>,
}

impl ExecutionController {
    pub fn new(prefs: Preferences, effects: Effects) -> Self {
        Self::with_clock(prefs, effects, SystemClock)
    }

    pub fn with_clock(prefs: Preferences, effects: Effects, clock: impl Clock + 'static) -> Self {
        Self {
            state: RunState::Idle,
            prefs,
            clock: Box::new(clock),
            effects,
            blocks: HashMap::new(),
            pending_exits: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> RunPhase {
        match self.state {
            RunState::Idle => RunPhase::Idle,
            RunState::Running(_) => RunPhase::Running,
            RunState::Completing(_) => RunPhase::Completing,
        }
    }

    /// The queue runner's "running" flag.
    pub fn is_running(&self) -> bool {
        self.active().is_some()
    }

    pub fn active(&self) -> Option<&ActiveTimer> {
        match &self.state {
            RunState::Idle => None,
            RunState::Running(active) | RunState::Completing(active) => Some(active),
        }
    }

    /// Time left on the running timer, from the clock rather than the last
    /// tick.
    pub fn remaining_ms(&self) -> Option<u64> {
        match &self.state {
            RunState::Running(active) => {
                let elapsed = elapsed_ms(active.started_at, self.clock.now());
                Some(active.spec.planned_duration_ms().saturating_sub(elapsed))
            }
            RunState::Completing(_) => Some(0),
            RunState::Idle => None,
        }
    }

    /// Exit animations started by completions that have not finished yet.
    pub fn exits_in_flight(&self) -> usize {
        self.pending_exits
            .iter()
            .filter(|token| !token.is_cancelled())
            .count()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, session: &Session) -> Event {
        let active = self.active();
        Event::StateSnapshot {
            state: self.phase(),
            active_id: active.map(|a| a.spec.id()),
            active_label: active.map(|a| a.spec.label().to_string()),
            remaining_ms: self.remaining_ms(),
            queued: session.queue.len(),
            queued_planned_ms: session.queue.total_planned_ms(),
            logged_runs: session.log.len(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Route one command to its transition. A tick that reaches zero is
    /// followed by `advance()` in the same dispatch, so callers only see
    /// `Completing` if they drive `tick()` themselves.
    pub fn dispatch(
        &mut self,
        session: &mut Session,
        command: Command,
    ) -> Result<Vec<Event>, ControlError> {
        match command {
            Command::Start => self.start(session),
            Command::Tick => {
                let mut events = self.tick(session);
                if self.phase() == RunPhase::Completing {
                    events.extend(self.advance(session));
                }
                Ok(events)
            }
            Command::Cancel(id) => Ok(vec![self.cancel(session, id)]),
            Command::ClearAll => Ok(vec![self.clear_all(session)]),
        }
    }

    /// Create a spec, render its block and append it to the queue.
    pub fn enqueue(
        &mut self,
        session: &mut Session,
        label: &str,
        planned_duration_ms: u64,
    ) -> Result<TimerId, ValidationError> {
        let spec = TimerSpec::new(label, planned_duration_ms)?;
        Ok(self.enqueue_spec(session, spec))
    }

    pub fn enqueue_spec(&mut self, session: &mut Session, spec: TimerSpec) -> TimerId {
        let id = spec.id();
        self.block_for(&spec);
        tracing::debug!(%id, label = spec.label(), "timer queued");
        session.queue.enqueue(spec);
        id
    }

    /// Render blocks for queued specs that do not have one yet, e.g. after
    /// restoring a saved session.
    pub fn sync_blocks(&mut self, session: &Session) {
        for spec in session.queue.iter() {
            self.block_for(spec);
        }
    }

    /// Dequeue the front spec and start it.
    ///
    /// # Errors
    /// `AlreadyRunning` while a timer is active (nothing changes, nothing
    /// is queued); `QueueEmpty` when there is nothing to start.
    pub fn start(&mut self, session: &mut Session) -> Result<Vec<Event>, ControlError> {
        if self.is_running() {
            tracing::debug!("start rejected: already running");
            return Err(ControlError::AlreadyRunning);
        }
        let spec = session
            .queue
            .dequeue_front()
            .ok_or(ControlError::QueueEmpty)?;
        Ok(vec![self.activate(spec, session.queue.len())])
    }

    /// Periodic check. Reports remaining time, or completes the timer once
    /// the clock has passed its planned end.
    pub fn tick(&mut self, session: &mut Session) -> Vec<Event> {
        self.effects.animator.frame();
        self.pending_exits.retain(|token| !token.is_cancelled());

        let now = self.clock.now();
        match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Running(active)
                if elapsed_ms(active.started_at, now) >= active.spec.planned_duration_ms() =>
            {
                vec![self.complete(session, active, now)]
            }
            RunState::Running(active) => {
                let id = active.spec.id();
                let planned = active.spec.planned_duration_ms();
                let elapsed = elapsed_ms(active.started_at, now);
                let remaining_ms = planned - elapsed;
                if let Some(&block) = self.blocks.get(&id) {
                    self.effects
                        .animator
                        .update_progress(block, remaining_ms, planned);
                }
                self.state = RunState::Running(active);
                vec![Event::TimerTick {
                    id,
                    remaining_ms,
                    elapsed_ms: elapsed,
                    at: now,
                }]
            }
            other => {
                self.state = other;
                Vec::new()
            }
        }
    }

    /// Leave `Completing`: start the next queued spec or go idle.
    pub fn advance(&mut self, session: &mut Session) -> Vec<Event> {
        let active = match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Completing(active) => active,
            other => {
                self.state = other;
                return Vec::new();
            }
        };
        if let Some(block) = self.blocks.remove(&active.spec.id()) {
            self.effects.view.remove_block(block);
        }

        match session.queue.dequeue_front() {
            Some(next) => vec![self.activate(next, session.queue.len())],
            None => {
                self.effects.view.highlight(&[]);
                tracing::info!("queue finished");
                vec![Event::QueueFinished {
                    at: self.clock.now(),
                }]
            }
        }
    }

    /// Cancel by identity.
    ///
    /// The running timer is stopped and logged, and the controller goes
    /// idle even if more timers are queued. Any other id is removed from
    /// the queue if present; `found: false` otherwise.
    pub fn cancel(&mut self, session: &mut Session, id: TimerId) -> Event {
        let active = match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Running(active) if active.spec.id() == id => active,
            other => {
                self.state = other;
                let found = session.queue.remove(id);
                if found {
                    if let Some(block) = self.blocks.remove(&id) {
                        self.effects.view.remove_block(block);
                    }
                }
                tracing::debug!(%id, found, "queued timer removal");
                return Event::TimerRemoved {
                    id,
                    found,
                    at: self.clock.now(),
                };
            }
        };
        active.cancel.cancel();
        let now = self.clock.now();
        let entry = RunLogEntry::new(&active.spec, active.started_at, now, RunOutcome::Cancelled);
        let actual_elapsed_ms = entry.actual_elapsed_ms;
        session.log.append(entry);

        if let Some(block) = self.blocks.remove(&id) {
            self.effects.view.remove_block(block);
        }
        self.effects.view.highlight(&[]);

        tracing::info!(
            %id,
            label = active.spec.label(),
            planned_ms = active.spec.planned_duration_ms(),
            actual_ms = actual_elapsed_ms,
            remaining_queued = session.queue.len(),
            "timer cancelled"
        );
        Event::TimerCancelled {
            id,
            label: active.spec.label().to_string(),
            planned_duration_ms: active.spec.planned_duration_ms(),
            actual_elapsed_ms,
            at: now,
        }
    }

    /// Administrative reset from any state. Stops the active timer and any
    /// exit animations, empties the queue, and writes nothing to the log.
    pub fn clear_all(&mut self, session: &mut Session) -> Event {
        let discarded_active = match std::mem::replace(&mut self.state, RunState::Idle) {
            RunState::Idle => None,
            RunState::Running(active) | RunState::Completing(active) => {
                active.cancel.cancel();
                Some(active.spec.id())
            }
        };
        for token in self.pending_exits.drain(..) {
            token.cancel();
        }

        let dropped_queued = session.queue.len();
        session.queue.clear();
        for (_, block) in self.blocks.drain() {
            self.effects.view.remove_block(block);
        }
        self.effects.view.highlight(&[]);

        tracing::info!(?discarded_active, dropped_queued, "cleared all timers");
        Event::ClearedAll {
            discarded_active,
            dropped_queued,
            at: self.clock.now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn block_for(&mut self, spec: &TimerSpec) -> BlockHandle {
        if let Some(&block) = self.blocks.get(&spec.id()) {
            return block;
        }
        let block = self.effects.view.render_block(spec);
        self.blocks.insert(spec.id(), block);
        block
    }

    fn activate(&mut self, spec: TimerSpec, queued: usize) -> Event {
        let now = self.clock.now();
        let token = CancelToken::new();
        let block = self.block_for(&spec);
        self.effects.view.highlight(&[block]);
        self.effects
            .animator
            .start_progress(block, &spec, token.clone());

        tracing::debug!(id = %spec.id(), label = spec.label(), "timer started");
        let event = Event::TimerStarted {
            id: spec.id(),
            label: spec.label().to_string(),
            planned_duration_ms: spec.planned_duration_ms(),
            queued,
            at: now,
        };
        self.state = RunState::Running(ActiveTimer {
            spec,
            started_at: now,
            cancel: token,
        });
        event
    }

    /// Running -> Completing. Only called once `now >= started_at + planned`.
    fn complete(&mut self, session: &mut Session, active: ActiveTimer, now: DateTime<Utc>) -> Event {
        active.cancel.cancel();

        self.signal_completion(&active.spec);

        let entry = RunLogEntry::new(&active.spec, active.started_at, now, RunOutcome::Completed);
        let actual_elapsed_ms = entry.actual_elapsed_ms;
        session.log.append(entry);

        if let Some(&block) = self.blocks.get(&active.spec.id()) {
            let exit = CancelToken::new();
            self.pending_exits.push(exit.clone());
            self.effects.animator.exit(block, exit);
        }

        tracing::info!(
            id = %active.spec.id(),
            label = active.spec.label(),
            planned_ms = active.spec.planned_duration_ms(),
            actual_ms = actual_elapsed_ms,
            "timer completed"
        );
        let event = Event::TimerCompleted {
            id: active.spec.id(),
            label: active.spec.label().to_string(),
            planned_duration_ms: active.spec.planned_duration_ms(),
            actual_elapsed_ms,
            at: now,
        };
        self.state = RunState::Completing(active);
        event
    }

    fn signal_completion(&mut self, spec: &TimerSpec) {
        let level = self.prefs.alert_level;
        if let Err(e) = self.effects.alerts.play_alert(level) {
            tracing::warn!(error = %e, %level, "alert failed");
        }
        if self.prefs.notifications_enabled {
            if let Err(e) = self.effects.alerts.notify(spec.label()) {
                tracing::warn!(error = %e, label = spec.label(), "notification failed");
            }
        }
    }
}
