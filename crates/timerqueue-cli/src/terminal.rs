//! Terminal implementations of the controller's side-effect traits.

use std::collections::HashMap;
use std::io::Write;

use timerqueue_core::effects::{Alerts, BlockHandle, BlockView, EffectError};
use timerqueue_core::{format_duration, AlertLevel, TimerSpec};

/// Prints each timer once as it is rendered, giving the run a visible
/// line-up before the first countdown starts.
#[derive(Default)]
pub struct TerminalView {
    next: u64,
    labels: HashMap<BlockHandle, String>,
}

impl BlockView for TerminalView {
    fn render_block(&mut self, spec: &TimerSpec) -> BlockHandle {
        self.next += 1;
        let block = BlockHandle(self.next);
        // The terminal may already be gone after a hangup.
        writeln!(
            std::io::stdout(),
            "  {:>2}. {} ({})",
            self.next,
            spec.label(),
            format_duration(spec.planned_duration_ms())
        )
        .ok();
        self.labels.insert(block, spec.label().to_string());
        block
    }

    fn remove_block(&mut self, block: BlockHandle) {
        self.labels.remove(&block);
    }

    fn highlight(&mut self, blocks: &[BlockHandle]) {
        for block in blocks {
            if let Some(label) = self.labels.get(block) {
                tracing::debug!(label, "active block");
            }
        }
    }
}

/// Terminal bell for sound, desktop notifications via the OS.
pub struct TerminalAlerts;

impl TerminalAlerts {
    fn bells(level: AlertLevel) -> usize {
        match level {
            AlertLevel::Off => 0,
            AlertLevel::Soft => 1,
            AlertLevel::Medium => 2,
            AlertLevel::Loud => 3,
        }
    }
}

impl Alerts for TerminalAlerts {
    fn play_alert(&mut self, level: AlertLevel) -> Result<(), EffectError> {
        let count = Self::bells(level);
        if count == 0 {
            return Ok(());
        }
        let mut err = std::io::stderr();
        err.write_all("\x07".repeat(count).as_bytes())
            .and_then(|()| err.flush())
            .map_err(|e| EffectError::new("audio", e.to_string()))
    }

    fn notify(&mut self, label: &str) -> Result<(), EffectError> {
        notify_rust::Notification::new()
            .summary("Timer finished")
            .body(label)
            .appname("timerqueue")
            .show()
            .map(|_| ())
            .map_err(|e| EffectError::new("notification", e.to_string()))
    }
}
