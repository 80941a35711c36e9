//! Shared session state between `timerqueue` processes.
//!
//! Every command reads and writes the saved session through one
//! transaction, and recovers timers whose runner has gone away.

use chrono::Utc;
use timerqueue_core::{Database, Session};

/// A runner refreshes its in-flight heartbeat at least this often.
pub const HEARTBEAT_MS: u64 = 1_000;

/// An in-flight timer whose runner has been silent this long is logged as
/// cancelled by the next command that touches the session.
pub const STALE_AFTER_MS: u64 = 10_000;

pub fn update_session<R>(
    db: &Database,
    f: impl FnOnce(&mut Session) -> R,
) -> Result<R, Box<dyn std::error::Error>> {
    let now = Utc::now();
    let result = db.update_session(|session| {
        session.recover_interrupted(now, STALE_AFTER_MS);
        f(session)
    })?;
    Ok(result)
}

pub fn load_session(db: &Database) -> Result<Session, Box<dyn std::error::Error>> {
    update_session(db, |session| session.clone())
}
