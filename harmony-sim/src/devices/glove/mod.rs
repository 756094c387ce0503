//! Simulated sensor glove
//!
//! One [`GloveSimulator`] per hand. Each owns a seeded [`NoiseGenerator`] and
//! advances by an explicit `dt`, so two gloves built with the same seed and
//! fed the same `dt` and gesture sequence produce identical readings.
//!
//! # Step order
//!
//! ```text
//! advance(dt, motion):
//! 1. Move flex baselines toward the gesture (uses time before the step)
//! 2. t += dt
//! 3. Generate flex readings      (indices 0-4)
//! 4. Generate accel/gyro/ypr     (indices 5-13)
//! ```
//!
//! # Module Structure
//!
//! - [`flex_sim`]: finger bend sensors and gesture interpolation
//! - [`imu_sim`]: accelerometer, gyroscope and orientation
//! - [`noise`]: seeded noise generator

pub mod flex_sim;
pub mod imu_sim;
pub mod noise;

use crate::core::types::{ACCEL_START, FLEX_COUNT, GYRO_START, SensorVector, YPR_START};
use crate::gesture::GestureMotion;

use flex_sim::FlexSimulator;
use imu_sim::ImuSimulator;
use noise::NoiseGenerator;

/// Baseline convergence rates (1/s) for gesture presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRates {
    /// Rate toward fixed hold targets
    pub hold: f64,
    /// Rate toward the moving wave target
    pub wave: f64,
}

impl Default for MotionRates {
    fn default() -> Self {
        Self {
            hold: 3.0,
            wave: 5.0,
        }
    }
}

/// Sensor glove simulator
#[derive(Clone)]
pub struct GloveSimulator {
    name: String,
    noise: NoiseGenerator,
    flex: FlexSimulator,
    imu: ImuSimulator,
    rates: MotionRates,
    /// Simulated seconds since construction
    elapsed: f64,
    current: SensorVector,
}

impl GloveSimulator {
    /// Create a glove whose whole output is determined by `seed`
    pub fn new(name: impl Into<String>, seed: u64, rates: MotionRates) -> Self {
        let mut noise = NoiseGenerator::new(seed);
        let flex = FlexSimulator::new(&mut noise);
        let imu = ImuSimulator::new(&mut noise);

        Self {
            name: name.into(),
            noise,
            flex,
            imu,
            rates,
            elapsed: 0.0,
            current: SensorVector::ZERO,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated seconds since construction
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Readings produced by the last [`advance`](Self::advance)
    pub fn current(&self) -> SensorVector {
        self.current
    }

    /// Flex baselines the gestures steer
    pub fn flex_baseline(&self) -> [f64; FLEX_COUNT] {
        self.flex.baseline()
    }

    /// Advance the simulation by `dt` seconds and return the new readings
    ///
    /// Negative or NaN `dt` is treated as zero.
    pub fn advance(&mut self, dt: f64, motion: Option<GestureMotion>) -> SensorVector {
        let dt = dt.max(0.0);

        self.flex.apply_gesture(motion, self.elapsed, dt, &self.rates);
        self.elapsed += dt;

        let flex = self.flex.generate(self.elapsed, &mut self.noise);
        let imu = self.imu.generate(self.elapsed, &mut self.noise);

        let mut values = SensorVector::ZERO;
        for (i, v) in flex.into_iter().enumerate() {
            values[i] = v;
        }
        for j in 0..3 {
            values[ACCEL_START + j] = imu.accel[j];
            values[GYRO_START + j] = imu.gyro[j];
            values[YPR_START + j] = imu.ypr[j];
        }

        log::trace!("{} t={:.3}s -> {:?}", self.name, self.elapsed, values.values());
        self.current = values;
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FLEX_MAX;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GloveSimulator::new("a", 42, MotionRates::default());
        let mut b = GloveSimulator::new("b", 42, MotionRates::default());
        let motions = [
            None,
            Some(GestureMotion::Wave),
            Some(GestureMotion::Hold([3500.0; 5])),
        ];

        for step in 0..300 {
            let dt = if step % 7 == 0 { 0.05 } else { 1.0 / 30.0 };
            let motion = motions[step % motions.len()];
            assert_eq!(a.advance(dt, motion), b.advance(dt, motion), "step {}", step);
        }
    }

    #[test]
    fn test_different_seed_differs() {
        let mut a = GloveSimulator::new("a", 42, MotionRates::default());
        let mut b = GloveSimulator::new("b", 99, MotionRates::default());
        assert_ne!(a.advance(0.1, None), b.advance(0.1, None));
    }

    #[test]
    fn test_negative_dt_is_zero() {
        let mut glove = GloveSimulator::new("g", 5, MotionRates::default());
        glove.advance(-1.0, None);
        assert_eq!(glove.elapsed(), 0.0);
        glove.advance(f64::NAN, None);
        assert_eq!(glove.elapsed(), 0.0);
    }

    #[test]
    fn test_fist_bends_fingers() {
        let mut glove = GloveSimulator::new("g", 42, MotionRates::default());
        let motion = Some(GestureMotion::Hold([3500.0; 5]));
        for _ in 0..150 {
            glove.advance(1.0 / 30.0, motion);
        }
        for base in glove.flex_baseline() {
            assert!(base > 3400.0, "baseline {}", base);
        }
        for v in glove.current().flex() {
            assert!((0..=FLEX_MAX).contains(&v));
        }
    }
}
