//! Frame clock — wall-time deltas between frames.

use std::time::Instant;

/// Produces the `dt` value for each frame: seconds elapsed since the
/// previous tick, or since construction for the first frame.
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        FrameClock {
            last: Instant::now(),
        }
    }

    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
