/// Frame scheduling.
///
/// `FrameTicker` fires forever at a fixed interval; it never stops on its own.
/// `FrameGate` decides per frame whether to simulate and paint:
///   - while the game runs: advance, then paint
///   - after game over: paint the final screen once, then idle
///
/// Elapsed time between frames is not constant (sleep jitter, slow terminals),
/// which is why the engine reads the wall clock itself.

use std::time::{Duration, Instant};

pub struct FrameTicker {
    interval: Duration,
    next: Instant,
}

impl FrameTicker {
    pub fn new(interval: Duration, start: Instant) -> Self {
        FrameTicker { interval, next: start }
    }

    /// Time left before the next frame is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Mark a frame as fired at `now` and schedule the next one.
    /// A late frame does not cause a burst of catch-up frames.
    pub fn fire(&mut self, now: Instant) {
        let next = self.next + self.interval;
        self.next = if next <= now { now + self.interval } else { next };
    }

    /// Sleep until the next frame is due, fire it and return its timestamp.
    pub fn wait(&mut self) -> Instant {
        let left = self.remaining(Instant::now());
        if !left.is_zero() {
            std::thread::sleep(left);
        }
        let now = Instant::now();
        self.fire(now);
        now
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrameAction {
    /// Run `advance()` and paint.
    Advance,
    /// Game over: paint the final screen.
    Paint,
    /// Nothing changed since the last paint.
    Idle,
}

#[derive(Default)]
pub struct FrameGate {
    final_painted: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        FrameGate::default()
    }

    pub fn next(&mut self, running: bool) -> FrameAction {
        if running {
            self.final_painted = false;
            FrameAction::Advance
        } else if !self.final_painted {
            self.final_painted = true;
            FrameAction::Paint
        } else {
            FrameAction::Idle
        }
    }

    /// Force one more paint (terminal resized or cleared underneath us).
    pub fn invalidate(&mut self) {
        self.final_painted = false;
    }
}
