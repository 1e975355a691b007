//! Fixed-timestep frame clock fed with explicit frame times.

use tracing::warn;

/// Longest frame the clock will accept before clamping.
pub(crate) const MAX_FRAME_TIME: f64 = 0.25;

/// Accumulates variable frame times and releases them as fixed steps.
pub(crate) struct FrameClock {
    fixed_dt: f64,
    accumulator: f64,
    total_sim_time: f64,
    update_count: u64,
}

impl FrameClock {
    pub(crate) fn new(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            accumulator: 0.0,
            total_sim_time: 0.0,
            update_count: 0,
        }
    }

    /// Feed one frame of `frame_time` seconds, calling `update_fn(fixed_dt, total_sim_time)`
    /// once per whole step that fits.
    pub(crate) fn tick(&mut self, mut frame_time: f64, mut update_fn: impl FnMut(f64, f64)) {
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time.max(0.0);
        while self.accumulator >= self.fixed_dt {
            update_fn(self.fixed_dt, self.total_sim_time);
            self.total_sim_time += self.fixed_dt;
            self.accumulator -= self.fixed_dt;
            self.update_count += 1;
        }
    }

    pub(crate) fn update_count(&self) -> u64 {
        self.update_count
    }

    pub(crate) fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}
