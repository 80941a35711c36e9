//! Side-effect seams the execution controller calls into.
//!
//! Rendering, animation, sound and notifications are fire-and-forget from
//! the controller's point of view: it never reads visual state back, and a
//! failing alert is logged and ignored.

mod animation;

pub use animation::{MinimalAnimator, RichAnimator};

use thiserror::Error;

use crate::preferences::AlertLevel;
use crate::timer::{CancelToken, TimerSpec};

/// Opaque handle to a rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(pub u64);

#[derive(Error, Debug)]
#[error("{effect} unavailable: {message}")]
pub struct EffectError {
    pub effect: &'static str,
    pub message: String,
}

impl EffectError {
    pub fn new(effect: &'static str, message: impl Into<String>) -> Self {
        Self {
            effect,
            message: message.into(),
        }
    }
}

/// Visual representation of queued and active timers.
pub trait BlockView {
    fn render_block(&mut self, spec: &TimerSpec) -> BlockHandle;
    fn remove_block(&mut self, block: BlockHandle);
    /// Mark `blocks` as active; every other block is un-highlighted.
    fn highlight(&mut self, blocks: &[BlockHandle]);
}

/// Progress and exit animation.
///
/// Two implementations exist and one is picked at startup; the controller
/// only talks to this trait.
pub trait Animator {
    fn start_progress(&mut self, block: BlockHandle, spec: &TimerSpec, token: CancelToken);

    fn update_progress(&mut self, block: BlockHandle, remaining_ms: u64, total_ms: u64);

    /// Start the exit animation for a finished block. Must return without
    /// waiting; the animation cancels `token` itself once it is done, and
    /// must stop early if someone else cancels it first.
    fn exit(&mut self, block: BlockHandle, token: CancelToken);

    /// Advance in-flight exit animations by one frame.
    fn frame(&mut self) {}
}

/// Completion signals.
pub trait Alerts {
    fn play_alert(&mut self, level: AlertLevel) -> Result<(), EffectError>;
    fn notify(&mut self, label: &str) -> Result<(), EffectError>;
}

/// Everything the controller may poke at, chosen once at startup.
pub struct Effects {
    pub view: Box<dyn BlockView>,
    pub animator: Box<dyn Animator>,
    pub alerts: Box<dyn Alerts>,
}

impl Effects {
    pub fn new(
        view: impl BlockView + 'static,
        animator: impl Animator + 'static,
        alerts: impl Alerts + 'static,
    ) -> Self {
        Self {
            view: Box::new(view),
            animator: Box::new(animator),
            alerts: Box::new(alerts),
        }
    }

    /// Effects that do nothing, for headless use.
    pub fn silent() -> Self {
        Self::new(NoView::default(), NoAnimation, NoAlerts)
    }
}

/// Hands out handles and draws nothing.
#[derive(Debug, Default)]
pub struct NoView {
    next: u64,
}

impl BlockView for NoView {
    fn render_block(&mut self, _spec: &TimerSpec) -> BlockHandle {
        self.next += 1;
        BlockHandle(self.next)
    }

    fn remove_block(&mut self, _block: BlockHandle) {}

    fn highlight(&mut self, _blocks: &[BlockHandle]) {}
}

#[derive(Debug, Default)]
pub struct NoAnimation;

impl Animator for NoAnimation {
    fn start_progress(&mut self, _block: BlockHandle, _spec: &TimerSpec, _token: CancelToken) {}

    fn update_progress(&mut self, _block: BlockHandle, _remaining_ms: u64, _total_ms: u64) {}

    fn exit(&mut self, _block: BlockHandle, token: CancelToken) {
        token.cancel();
    }
}

#[derive(Debug, Default)]
pub struct NoAlerts;

impl Alerts for NoAlerts {
    fn play_alert(&mut self, _level: AlertLevel) -> Result<(), EffectError> {
        Ok(())
    }

    fn notify(&mut self, _label: &str) -> Result<(), EffectError> {
        Ok(())
    }
}
