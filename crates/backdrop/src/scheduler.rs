//! Cooperative per-frame animation loop.
//!
//! The host drives the loop: it calls [`AnimationScheduler::tick`] once per
//! display refresh and requests another refresh while the outcome is
//! [`TickOutcome::Continue`]. Nothing here spawns threads or timers.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::clock::FrameClock;
use crate::error::FrameError;

/// Monotonic cancellation flag shared with late host callbacks.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was produced; schedule the next tick.
    Continue,
    /// The mount was torn down. Stop scheduling.
    Cancelled,
    /// The loop stopped after an error or because nothing can be rendered.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Halted,
    Cancelled,
}

pub struct AnimationScheduler {
    clock: FrameClock,
    token: CancellationToken,
    halted: bool,
    frames: u64,
}

impl AnimationScheduler {
    pub fn new(time_scale: f32) -> Self {
        Self {
            clock: FrameClock::new(time_scale),
            token: CancellationToken::new(),
            halted: false,
            frames: 0,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!(frames = self.frames, "animation loop cancelled");
        }
        self.token.cancel();
    }

    /// Stops the loop without cancelling the mount.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn state(&self) -> LoopState {
        if self.token.is_cancelled() {
            LoopState::Cancelled
        } else if self.halted {
            LoopState::Halted
        } else {
            LoopState::Running
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Frames successfully produced since the mount started.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one tick. `body` receives the scaled time and must update the
    /// effect and present exactly one frame. A body error halts the loop; it
    /// is logged here and not returned.
    pub fn tick<F>(&mut self, elapsed: Duration, body: F) -> TickOutcome
    where
        F: FnOnce(f32) -> Result<(), FrameError>,
    {
        match self.state() {
            LoopState::Cancelled => return TickOutcome::Cancelled,
            LoopState::Halted => return TickOutcome::Halted,
            LoopState::Running => {}
        }

        let time = self.clock.advance(elapsed);
        match body(time) {
            Ok(()) => {
                self.frames += 1;
                trace!(frame = self.frames, time, "tick");
                if self.token.is_cancelled() {
                    TickOutcome::Cancelled
                } else {
                    TickOutcome::Continue
                }
            }
            Err(err) => {
                error!(error = %err, frame = self.frames, "frame failed; halting animation loop");
                self.halted = true;
                TickOutcome::Halted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_scaled_time_and_continues() {
        let mut scheduler = AnimationScheduler::new(0.5);
        let mut seen = None;
        let outcome = scheduler.tick(Duration::from_secs(2), |time| {
            seen = Some(time);
            Ok(())
        });
        assert_eq!(outcome, TickOutcome::Continue);
        assert_eq!(seen, Some(1.0));
        assert_eq!(scheduler.frames(), 1);
    }

    #[test]
    fn cancelled_tick_touches_nothing() {
        let mut scheduler = AnimationScheduler::new(1.0);
        let token = scheduler.token();
        token.cancel();
        token.cancel();

        let mut called = false;
        let outcome = scheduler.tick(Duration::from_millis(16), |_| {
            called = true;
            Ok(())
        });
        assert_eq!(outcome, TickOutcome::Cancelled);
        assert!(!called);
        assert_eq!(scheduler.clock().ticks(), 0);
        assert_eq!(scheduler.state(), LoopState::Cancelled);
    }

    #[test]
    fn cancel_during_tick_stops_rescheduling() {
        let mut scheduler = AnimationScheduler::new(1.0);
        let token = scheduler.token();
        let outcome = scheduler.tick(Duration::from_millis(16), |_| {
            token.cancel();
            Ok(())
        });
        assert_eq!(outcome, TickOutcome::Cancelled);
    }

    #[test]
    fn frame_error_halts_loop() {
        let mut scheduler = AnimationScheduler::new(1.0);
        let outcome = scheduler.tick(Duration::from_millis(16), |_| Err(FrameError::OutOfMemory));
        assert_eq!(outcome, TickOutcome::Halted);

        let mut called = false;
        let next = scheduler.tick(Duration::from_millis(16), |_| {
            called = true;
            Ok(())
        });
        assert_eq!(next, TickOutcome::Halted);
        assert!(!called);
        assert_eq!(scheduler.frames(), 0);
    }
}
