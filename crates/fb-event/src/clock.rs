//! Frame timing.

use std::time::Instant;

use crate::event::FrameEvent;

/// Turns frame timestamps into [`FrameEvent`]s.
///
/// The first tick has nothing to measure against and yields `dt = 0`.
#[derive(Debug, Default)]
pub struct FrameClock {
    previous: Option<Instant>,
    frame: u64,
    elapsed: f64,
}

impl FrameClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: None,
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Advance to `now`.
    pub fn tick(&mut self, now: Instant) -> FrameEvent {
        let dt = self
            .previous
            .map_or(0.0, |previous| now.saturating_duration_since(previous).as_secs_f32());
        self.previous = Some(now);
        self.frame += 1;
        self.elapsed += f64::from(dt);
        FrameEvent { dt }
    }

    /// Number of ticks so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of every `dt` produced, in seconds.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
