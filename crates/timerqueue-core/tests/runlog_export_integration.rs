//! Integration tests for run log export and persisted state.
//!
//! Runs real timers through the controller, exports the log, parses it
//! back, and checks that preferences and sessions survive a reopen of the
//! SQLite store.

use timerqueue_core::effects::Effects;
use timerqueue_core::{
    AlertLevel, Command, Database, ExecutionController, ManualClock, Preferences, RunLog,
    RunOutcome, Session,
};

fn run_sample_session() -> Session {
    let clock = ManualClock::default();
    let mut ctl =
        ExecutionController::with_clock(Preferences::default(), Effects::silent(), clock.clone());
    let mut session = Session::new();

    ctl.enqueue(&mut session, "Warm up", 60_000).unwrap();
    let second = ctl.enqueue(&mut session, "Sprint", 120_000).unwrap();

    ctl.dispatch(&mut session, Command::Start).unwrap();
    clock.advance_ms(60_123);
    ctl.dispatch(&mut session, Command::Tick).unwrap();
    clock.advance_ms(45_000);
    ctl.dispatch(&mut session, Command::Cancel(second)).unwrap();
    session
}

#[test]
fn export_then_parse_matches_appended_entries() {
    let session = run_sample_session();
    assert_eq!(session.log.len(), 2);

    let text = session.log.serialize().unwrap();
    let parsed = RunLog::parse(&text).unwrap();

    assert_eq!(parsed.len(), 2);
    for (got, want) in parsed.iter().zip(session.log.entries()) {
        assert_eq!(got.label, want.label);
        assert_eq!(got.planned_duration_ms, want.planned_duration_ms);
        assert_eq!(got.actual_elapsed_ms, want.actual_elapsed_ms);
        assert_eq!(got.started_at, want.started_at);
        assert_eq!(got.ended_at, want.ended_at);
        assert_eq!(got.outcome, want.outcome);
    }
    assert_eq!(parsed[0].outcome, RunOutcome::Completed);
    assert_eq!(parsed[0].actual_elapsed_ms, 60_123);
    assert_eq!(parsed[1].outcome, RunOutcome::Cancelled);
    assert_eq!(parsed[1].actual_elapsed_ms, 45_000);
}

#[test]
fn export_is_a_pure_projection() {
    let session = run_sample_session();
    let before = session.log.entries().to_vec();
    let _ = session.log.serialize().unwrap();
    let _ = session.log.serialize().unwrap();
    assert_eq!(session.log.entries(), before.as_slice());
}

#[test]
fn session_and_preferences_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timerqueue.db");
    let session = run_sample_session();

    {
        let db = Database::open_at(&path).unwrap();
        db.save_session(&session).unwrap();
        let mut prefs = Preferences::default();
        prefs.set_alert_level("soft");
        prefs.set_notifications_enabled(true);
        prefs.save(&db);
    }

    let db = Database::open_at(&path).unwrap();
    let restored = db.load_session().unwrap().unwrap();
    assert_eq!(restored.log.entries(), session.log.entries());
    assert!(restored.queue.is_empty());

    let prefs = Preferences::load(&db);
    assert_eq!(prefs.alert_level, AlertLevel::Soft);
    assert!(prefs.notifications_enabled);
}

#[test]
fn unrecognized_alert_level_is_stored_as_off() {
    let db = Database::open_memory().unwrap();
    let mut prefs = Preferences::default();
    let warning = prefs.set_alert_level("foghorn");
    assert!(warning.is_some());
    prefs.save(&db);

    assert_eq!(Preferences::load(&db).alert_level, AlertLevel::Off);
}
