//! # timerqueue Core Library
//!
//! Business logic for a sequential timer runner: labeled countdowns are
//! queued, then run one after another. Every completion or cancellation is
//! written to a run log that keeps what was planned next to what actually
//! happened. The `timerqueue` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Execution Controller**: a wall-clock state machine (`Idle`,
//!   `Running`, `Completing`) that the caller drives with commands and
//!   periodic ticks
//! - **Timer Queue**: FIFO of pending specs addressed by opaque ids
//! - **Run Log**: append-only history with a JSON export
//! - **Preferences**: alert level and notifications over a key-value store
//! - **Effects**: rendering, animation and alert traits the controller
//!   calls into
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! ## Key Components
//!
//! - [`ExecutionController`]: Core timer state machine
//! - [`Session`]: Caller-owned queue and log
//! - [`RunLog`]: Run history and export
//! - [`Preferences`]: Alert settings

pub mod effects;
pub mod error;
pub mod events;
pub mod format;
pub mod preferences;
pub mod runlog;
pub mod session;
pub mod storage;
pub mod timer;

pub use effects::{Alerts, Animator, BlockHandle, BlockView, EffectError, Effects};
pub use error::{ConfigError, ControlError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use format::{format_duration, format_remaining, parse_duration};
pub use preferences::{AlertLevel, PreferenceWarning, Preferences};
pub use runlog::{RunLog, RunLogEntry, RunLogSummary, RunOutcome};
pub use session::{InFlight, Session};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{
    CancelToken, Clock, Command, ExecutionController, ManualClock, RunPhase, SystemClock, TimerId,
    TimerQueue, TimerSpec,
};
