//! Seeded noise source for the glove simulation
//!
//! Every random draw of a glove goes through one generator seeded at
//! construction, so equal seeds and equal call sequences give equal output.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Noise generator with a fixed seed
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Zero-mean Gaussian noise with given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Uniform real in `[low, high)`
    #[inline]
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }

    /// Uniform integer in `[low, high]`
    #[inline]
    pub fn int_range(&mut self, low: i32, high: i32) -> i32 {
        self.rng.gen_range(low..=high)
    }
}
