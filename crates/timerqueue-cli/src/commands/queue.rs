use clap::Args;
use timerqueue_core::effects::Effects;
use timerqueue_core::{
    format_duration, parse_duration, Database, ExecutionController, Preferences, TimerId,
    TimerQueue,
};

use crate::state::{load_session, update_session};

#[derive(Args)]
pub struct AddArgs {
    /// Label shown while the timer runs
    pub label: String,
    /// Duration, e.g. "90s", "5m", "1h30m"; bare numbers are minutes
    pub duration: String,
}

fn controller(db: &Database) -> ExecutionController {
    ExecutionController::new(Preferences::load(db), Effects::silent())
}

pub fn add(args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let duration_ms = parse_duration(&args.duration)?;
    let mut ctl = controller(&db);

    let (id, position) = update_session(&db, |session| {
        ctl.enqueue(session, &args.label, duration_ms)
            .map(|id| (id, session.queue.len()))
    })??;
    println!(
        "queued {} {} ({}), position {}",
        id.short(),
        args.label.trim(),
        format_duration(duration_ms),
        position
    );
    Ok(())
}

pub fn list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let session = load_session(&db)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session.queue)?);
        return Ok(());
    }
    if session.queue.is_empty() {
        println!("queue is empty");
        return Ok(());
    }
    for (i, spec) in session.queue.iter().enumerate() {
        println!(
            "{:>3}  {}  {:>8}  {}",
            i + 1,
            spec.id().short(),
            format_duration(spec.planned_duration_ms()),
            spec.label()
        );
    }
    println!(
        "{} timer(s), {} total",
        session.queue.len(),
        format_duration(session.queue.total_planned_ms())
    );
    Ok(())
}

/// Resolve a full id or a unique prefix of one against the queue.
pub fn resolve_id(queue: &TimerQueue, text: &str) -> Result<Option<TimerId>, String> {
    if let Ok(id) = text.parse::<TimerId>() {
        return Ok(Some(id));
    }
    let wanted = text.trim().to_ascii_lowercase().replace('-', "");
    if wanted.is_empty() {
        return Ok(None);
    }
    let mut matches = queue
        .iter()
        .map(|spec| spec.id())
        .filter(|id| id.to_string().replace('-', "").starts_with(&wanted));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(Some(id)),
        (Some(_), Some(_)) => Err(format!("id prefix '{text}' matches more than one timer")),
        (None, _) => Ok(None),
    }
}

pub fn remove(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let removed = update_session(&db, |session| {
        resolve_id(&session.queue, text)
            .map(|found| found.is_some_and(|id| session.queue.remove(id)))
    })??;
    if removed {
        println!("removed {text}");
    } else {
        println!("not found: {text}");
    }
    Ok(())
}

pub fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut ctl = controller(&db);
    // A timer already running in another process is left to its runner.
    let event = update_session(&db, |session| ctl.clear_all(session))?;
    tracing::debug!(?event, "queue cleared");
    println!("queue cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use timerqueue_core::TimerSpec;

    #[test]
    fn resolves_unique_prefix() {
        let mut queue = TimerQueue::new();
        let spec = TimerSpec::new("a", 1_000).unwrap();
        let id = spec.id();
        queue.enqueue(spec);

        assert_eq!(resolve_id(&queue, &id.short()).unwrap(), Some(id));
        assert_eq!(resolve_id(&queue, &id.to_string()).unwrap(), Some(id));
    }

    #[test]
    fn unknown_prefix_is_not_found() {
        let queue = TimerQueue::new();
        assert_eq!(resolve_id(&queue, "deadbeef").unwrap(), None);
        assert_eq!(resolve_id(&queue, "").unwrap(), None);
    }
}
