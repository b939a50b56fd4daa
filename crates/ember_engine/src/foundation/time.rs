//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-timestep accumulator
///
/// Accumulates variable frame time and drains whole fixed-size ticks, so the
/// simulation step stays stable regardless of frame rate. The number of ticks
/// drained per frame is capped; when the cap is hit the excess time is
/// discarded rather than carried into a catch-up spiral.
pub struct FixedStep {
    step: f32,
    accumulator: f32,
    max_ticks_per_frame: u32,
}

impl FixedStep {
    /// Create an accumulator with the given step size in seconds
    pub fn new(step: f32, max_ticks_per_frame: u32) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_ticks_per_frame,
        }
    }

    /// The fixed step size in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Accumulate `dt` seconds and return the number of whole ticks to run
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if self.accumulator >= self.step {
            // Behind by more than the cap allows; drop the excess
            log::trace!("fixed step fell behind, discarding {:.3}s", self.accumulator);
            self.accumulator %= self.step;
        }
        ticks
    }

    /// Time accumulated towards the next tick, in seconds
    pub fn leftover(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_step_drains_whole_ticks() {
        let mut fixed = FixedStep::new(0.02, 8);

        assert_eq!(fixed.advance(0.01), 0);
        assert_relative_eq!(fixed.leftover(), 0.01);

        // 0.01 carried + 0.05 = 0.06 -> three ticks
        assert_eq!(fixed.advance(0.05), 3);
        assert!(fixed.leftover() < 0.02);
    }

    #[test]
    fn test_fixed_step_caps_catch_up() {
        let mut fixed = FixedStep::new(0.02, 4);

        // A two-second hitch must not produce 100 ticks
        assert_eq!(fixed.advance(2.0), 4);
        // Excess beyond the cap is discarded, not carried forward
        assert!(fixed.leftover() < 0.02);
    }

    #[test]
    fn test_timer_accumulates_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= 0.0);
    }
}
