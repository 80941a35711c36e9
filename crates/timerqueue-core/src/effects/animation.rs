use std::io::Write;

use super::{Animator, BlockHandle};
use crate::format::{format_duration, format_remaining};
use crate::timer::{CancelToken, TimerSpec};

const BAR_WIDTH: usize = 24;
const EXIT_FRAMES: u8 = 6;

struct Current {
    block: BlockHandle,
    label: String,
    token: CancelToken,
    last_drawn: String,
}

struct PendingExit {
    label: String,
    token: CancelToken,
    frames_left: u8,
}

/// Redraws a single-line progress bar in place and flashes the finished
/// bar for a few frames on exit.
pub struct RichAnimator<W: Write> {
    out: W,
    current: Option<Current>,
    exits: Vec<PendingExit>,
}

impl<W: Write> RichAnimator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current: None,
            exits: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Exit animations still running.
    pub fn exits_in_flight(&self) -> usize {
        self.exits.len()
    }

    fn draw(&mut self, line: &str) {
        write!(self.out, "\r\x1b[2K{line}").ok();
        self.out.flush().ok();
    }
}

fn bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0)) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl<W: Write> Animator for RichAnimator<W> {
    fn start_progress(&mut self, block: BlockHandle, spec: &TimerSpec, token: CancelToken) {
        let line = format!(
            "{} {} {:>3}% {}",
            spec.label(),
            bar(0.0),
            0,
            format_remaining(spec.planned_duration_ms())
        );
        // An exit flash owns the line until it finishes.
        if self.exits.is_empty() {
            self.draw(&line);
        }
        self.current = Some(Current {
            block,
            label: spec.label().to_string(),
            token,
            last_drawn: line,
        });
    }

    fn update_progress(&mut self, block: BlockHandle, remaining_ms: u64, total_ms: u64) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        if current.block != block || current.token.is_cancelled() {
            return;
        }
        let fraction = if total_ms == 0 {
            1.0
        } else {
            1.0 - remaining_ms as f64 / total_ms as f64
        };
        let line = format!(
            "{} {} {:>3}% {}",
            current.label,
            bar(fraction),
            (fraction * 100.0).floor() as u64,
            format_remaining(remaining_ms)
        );
        if line == current.last_drawn {
            return;
        }
        if self.exits.is_empty() {
            self.draw(&line);
        }
        if let Some(current) = self.current.as_mut() {
            current.last_drawn = line;
        }
    }

    fn exit(&mut self, block: BlockHandle, token: CancelToken) {
        let label = match self.current.take() {
            Some(current) if current.block == block => current.label,
            other => {
                self.current = other;
                String::new()
            }
        };
        self.exits.push(PendingExit {
            label,
            token,
            frames_left: EXIT_FRAMES,
        });
    }

    fn frame(&mut self) {
        if self.exits.is_empty() {
            return;
        }
        let mut exits = std::mem::take(&mut self.exits);
        exits.retain_mut(|exit| {
            if exit.token.is_cancelled() {
                return false;
            }
            exit.frames_left = exit.frames_left.saturating_sub(1);
            let marker = if exit.frames_left % 2 == 0 { "done" } else { "    " };
            let line = format!("{} {} {marker}", exit.label, bar(1.0));
            write!(self.out, "\r\x1b[2K{line}").ok();
            if exit.frames_left == 0 {
                writeln!(self.out, "\r\x1b[2K{} {} done", exit.label, bar(1.0)).ok();
                exit.token.cancel();
                return false;
            }
            true
        });
        self.out.flush().ok();
        self.exits = exits;

        // Bring back the bar of whatever started while the flash ran.
        if self.exits.is_empty() {
            if let Some(line) = self
                .current
                .as_ref()
                .filter(|current| !current.token.is_cancelled())
                .map(|current| current.last_drawn.clone())
            {
                self.draw(&line);
            }
        }
    }
}

/// Plain status lines, no cursor tricks.
pub struct MinimalAnimator<W: Write> {
    out: W,
    label: String,
    last_minute: Option<u64>,
}

impl<W: Write> MinimalAnimator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label: String::new(),
            last_minute: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Animator for MinimalAnimator<W> {
    fn start_progress(&mut self, _block: BlockHandle, spec: &TimerSpec, _token: CancelToken) {
        self.label = spec.label().to_string();
        self.last_minute = Some(spec.planned_duration_ms().div_ceil(60_000));
        writeln!(
            self.out,
            "started: {} ({})",
            spec.label(),
            format_duration(spec.planned_duration_ms())
        )
        .ok();
    }

    fn update_progress(&mut self, _block: BlockHandle, remaining_ms: u64, _total_ms: u64) {
        // One line per whole minute left.
        let minute = remaining_ms.div_ceil(60_000);
        if self.last_minute == Some(minute) {
            return;
        }
        self.last_minute = Some(minute);
        writeln!(self.out, "{}: {} left", self.label, format_remaining(remaining_ms)).ok();
    }

    fn exit(&mut self, _block: BlockHandle, token: CancelToken) {
        writeln!(self.out, "finished: {}", self.label).ok();
        self.last_minute = None;
        token.cancel();
    }
}
