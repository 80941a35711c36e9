use std::collections::HashSet;
use std::io::Write;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Args;
use timerqueue_core::effects::{Effects, MinimalAnimator, RichAnimator};
use timerqueue_core::storage::AnimationStyle;
use timerqueue_core::{
    format_duration, Command, Config, ControlError, Database, Event, ExecutionController,
    InFlight, Preferences, Session, TimerId, TimerQueue,
};
use tokio::time::MissedTickBehavior;

use crate::state::{self, HEARTBEAT_MS};
use crate::terminal::{TerminalAlerts, TerminalView};

#[derive(Args)]
pub struct RunArgs {
    /// Plain status lines instead of the in-place progress bar
    #[arg(long)]
    pub minimal: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let style = if args.minimal {
        AnimationStyle::Minimal
    } else {
        config.runner.animation
    };
    let effects = match style {
        AnimationStyle::Rich => Effects::new(
            TerminalView::default(),
            RichAnimator::new(std::io::stdout()),
            TerminalAlerts,
        ),
        AnimationStyle::Minimal => Effects::new(
            TerminalView::default(),
            MinimalAnimator::new(std::io::stdout()),
            TerminalAlerts,
        ),
    };
    let ctl = ExecutionController::new(Preferences::load(&db), effects);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(drive(
        Runner::new(&db, ctl),
        style,
        Duration::from_millis(config.runner.tick_interval_ms),
    ))
}

/// The foreground controller plus its view of the shared session.
///
/// The saved session stays authoritative: other processes may add, remove
/// or clear while a run is going. Each sync merges this runner's changes
/// (dequeued specs, new log entries, the in-flight timer) into what is
/// stored and takes the stored queue back.
struct Runner<'a> {
    db: &'a Database,
    ctl: ExecutionController,
    session: Session,
    started: HashSet<TimerId>,
    synced_log: usize,
    last_sync: Instant,
}

impl<'a> Runner<'a> {
    fn new(db: &'a Database, ctl: ExecutionController) -> Self {
        Self {
            db,
            ctl,
            session: Session::new(),
            started: HashSet::new(),
            synced_log: 0,
            last_sync: Instant::now(),
        }
    }

    /// Claim the front of the stored queue and start it.
    ///
    /// # Errors
    /// `AlreadyRunning` while another runner holds a live in-flight timer;
    /// `QueueEmpty` when there is nothing to run.
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ctl = &mut self.ctl;
        let (events, session) = state::update_session(self.db, |stored| {
            if stored.in_flight.is_some() {
                return Err(ControlError::AlreadyRunning);
            }
            ctl.sync_blocks(stored);
            let events = ctl.dispatch(stored, Command::Start)?;
            stored.in_flight = in_flight(ctl);
            Ok((events, stored.clone()))
        })??;

        self.session = session;
        self.synced_log = self.session.log.len();
        self.last_sync = Instant::now();
        self.note(&events);
        Ok(())
    }

    /// Remember which specs this runner dequeued. True when anything other
    /// than a tick happened.
    fn note(&mut self, events: &[Event]) -> bool {
        let mut changed = false;
        for event in events {
            match event {
                Event::TimerTick { .. } => {}
                Event::TimerStarted { id, .. } => {
                    self.started.insert(*id);
                    changed = true;
                }
                _ => changed = true,
            }
        }
        changed
    }

    /// Heartbeat is due, or the active timer may finish on the next tick
    /// and the queue it advances into should be current.
    fn sync_due(&self, tick_every: Duration) -> bool {
        let tick_ms = u64::try_from(tick_every.as_millis()).unwrap_or(u64::MAX);
        self.last_sync.elapsed() >= Duration::from_millis(HEARTBEAT_MS)
            || self.ctl.remaining_ms().is_some_and(|left| left <= tick_ms)
    }

    fn sync(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let flight = in_flight(&self.ctl);
        let fresh = self.session.log.entries()[self.synced_log..].to_vec();
        let started = &self.started;
        let stored_queue = self.db.update_session(|stored| {
            for id in started {
                stored.queue.remove(*id);
            }
            for entry in fresh {
                stored.log.append(entry);
            }
            stored.in_flight = flight;
            stored.queue.clone()
        })?;

        self.synced_log = self.session.log.len();
        self.last_sync = Instant::now();
        self.adopt_queue(stored_queue);
        Ok(())
    }

    /// Replace the local queue with the stored one, dropping the blocks of
    /// specs removed elsewhere and rendering the ones added elsewhere.
    fn adopt_queue(&mut self, stored: TimerQueue) {
        let vanished: Vec<TimerId> = self
            .session
            .queue
            .iter()
            .map(|spec| spec.id())
            .filter(|id| !stored.contains(*id))
            .collect();
        for id in vanished {
            self.ctl.cancel(&mut self.session, id);
        }
        self.session.queue = stored;
        self.ctl.sync_blocks(&self.session);
    }

    fn cancel_active(&mut self) -> Option<Event> {
        let id = self.ctl.active().map(|active| active.spec().id())?;
        Some(self.ctl.cancel(&mut self.session, id))
    }
}

fn in_flight(ctl: &ExecutionController) -> Option<InFlight> {
    ctl.active().map(|active| InFlight {
        spec: active.spec().clone(),
        started_at: active.started_at(),
        heartbeat_at: Utc::now(),
    })
}

async fn drive(
    mut runner: Runner<'_>,
    style: AnimationStyle,
    tick_every: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut shutdown = Shutdown::install()?;
    runner.start()?;
    let logged_before = runner.synced_log;

    let mut interval = tokio::time::interval(tick_every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if runner.sync_due(tick_every) {
                    runner.sync()?;
                }
                let events = runner.ctl.dispatch(&mut runner.session, Command::Tick)?;
                if runner.note(&events) {
                    runner.sync()?;
                }
            }
            reason = shutdown.recv() => {
                tracing::info!(reason, "stopping run");
                if let Some(event) = runner.cancel_active() {
                    report_cancel(&event, style);
                }
                break;
            }
        }
        if !runner.ctl.is_running() && runner.ctl.exits_in_flight() == 0 {
            break;
        }
    }
    runner.sync()?;

    let ran = &runner.session.log.entries()[logged_before..];
    let actual: u64 = ran.iter().map(|entry| entry.actual_elapsed_ms).sum();
    writeln!(
        std::io::stdout(),
        "{} timer(s) run in {}, {} still queued",
        ran.len(),
        format_duration(actual),
        runner.session.queue.len()
    )
    .ok();
    Ok(())
}

fn report_cancel(event: &Event, style: AnimationStyle) {
    if let Event::TimerCancelled {
        label,
        actual_elapsed_ms,
        ..
    } = event
    {
        let mut out = std::io::stdout();
        if style == AnimationStyle::Rich {
            write!(out, "\r\x1b[2K").ok();
        }
        writeln!(out, "cancelled: {label} after {}", format_duration(*actual_elapsed_ms)).ok();
    }
}

/// Termination requests, each turned into a cancellation of the active
/// timer. Handlers are installed before the first timer starts.
#[cfg(unix)]
struct Shutdown {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Shutdown {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "interrupt",
            _ = self.terminate.recv() => "terminate",
            _ = self.hangup.recv() => "hangup",
        }
    }
}

#[cfg(not(unix))]
struct Shutdown;

#[cfg(not(unix))]
impl Shutdown {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "interrupt"
    }
}
