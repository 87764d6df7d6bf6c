use std::time::Duration;

/// Scaled, monotonically increasing animation time for one mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    time_scale: f32,
    elapsed: f32,
    ticks: u64,
}

impl FrameClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale: time_scale.max(0.0),
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Adds `real * time_scale` seconds and returns the new scaled time.
    pub fn advance(&mut self, real: Duration) -> f32 {
        self.elapsed += real.as_secs_f32() * self.time_scale;
        self.ticks += 1;
        self.elapsed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_applies_time_scale() {
        let mut clock = FrameClock::new(0.5);
        clock.advance(Duration::from_millis(1000));
        let time = clock.advance(Duration::from_millis(500));
        assert!((time - 0.75).abs() < 1e-6);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn never_goes_backwards() {
        let mut clock = FrameClock::new(1.0);
        let mut previous = 0.0;
        for millis in [16, 0, 33, 1, 0] {
            let now = clock.advance(Duration::from_millis(millis));
            assert!(now >= previous);
            previous = now;
        }
        assert_eq!(clock.ticks(), 5);
    }
}
