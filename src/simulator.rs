use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::signal::ChannelTag;

/// Synthetic device: A0 carries a sine, A1 a triangle riding on a DC offset.
pub struct Simulator {
    step: u64,
    rng: StdRng,
    noise: f64,
}

impl Simulator {
    /// Samples per sine period on A0.
    pub const A0_PERIOD: u64 = 20;
    /// Samples per triangle period on A1.
    pub const A1_PERIOD: u64 = 40;

    pub fn new(noise: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), noise)
    }

    pub fn seeded(seed: u64, noise: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), noise)
    }

    fn with_rng(rng: StdRng, noise: f64) -> Self {
        Self {
            step: 0,
            rng,
            noise: noise.abs(),
        }
    }

    pub fn next_values(&mut self) -> (f64, f64) {
        // Quarter-sample phase keeps samples off the mean line.
        let t = self.step as f64 + 0.25;
        let a0 = 20.0 * (2.0 * PI * t / Self::A0_PERIOD as f64).sin();
        let phase = ((self.step % Self::A1_PERIOD) as f64 + 0.5) / Self::A1_PERIOD as f64;
        let a1 = 8.0 + 15.0 * (4.0 * (phase - 0.5).abs() - 1.0);
        self.step += 1;
        (a0 + self.jitter(), a1 + self.jitter())
    }

    /// One line in the device's wire format.
    pub fn next_line(&mut self) -> String {
        let (a0, a1) = self.next_values();
        format!(
            "{} {a0:.3} {} {a1:.3}",
            ChannelTag::A0.marker(),
            ChannelTag::A1.marker()
        )
    }

    fn jitter(&mut self) -> f64 {
        if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..self.noise)
        } else {
            0.0
        }
    }
}
