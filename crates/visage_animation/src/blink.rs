use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::config::BlinkConfig;

/// Blink timer state, part of [`AnimationState`](crate::AnimationState).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkClock {
    /// Time since the current cycle started.
    pub timer: f32,
    /// Idle time before the next blink starts, in `[interval_min, interval_max)`.
    pub next_interval: f32,
}

/// Drives [`BlinkClock`]s and draws blink intervals.
#[derive(Debug)]
pub struct BlinkCycle {
    config: BlinkConfig,
    rng: StdRng,
}

impl BlinkCycle {
    #[must_use]
    pub fn new(config: BlinkConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        Self { config, rng }
    }

    /// A clock at the start of a cycle with a freshly drawn interval.
    pub fn start(&mut self) -> BlinkClock {
        BlinkClock {
            timer: 0.0,
            next_interval: self.draw_interval(),
        }
    }

    fn draw_interval(&mut self) -> f32 {
        self.rng
            .random_range(self.config.interval_min..self.config.interval_max)
    }

    /// Advances by the nominal step and returns the blink intensity.
    pub fn advance(&mut self, clock: &mut BlinkClock) -> f32 {
        self.advance_by(clock, self.config.step)
    }

    /// Advances by `step` and returns the blink intensity in `[0, 1]`.
    ///
    /// When the timer reaches `next_interval + duration` the cycle restarts:
    /// the timer goes back to 0 and a new interval is drawn.
    pub fn advance_by(&mut self, clock: &mut BlinkClock, step: f32) -> f32 {
        clock.timer += step;
        if clock.timer >= clock.next_interval + self.config.duration {
            *clock = self.start();
            return 0.0;
        }
        intensity(clock, self.config.duration)
    }

    #[must_use]
    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }
}

/// Blink envelope: 0 while waiting, then `sin(π · x)` over the blink.
#[must_use]
pub fn intensity(clock: &BlinkClock, duration: f32) -> f32 {
    if clock.timer < clock.next_interval {
        return 0.0;
    }
    let x = (clock.timer - clock.next_interval) / duration;
    if x >= 1.0 {
        return 0.0;
    }
    (PI * x).sin()
}
