//! Flex sensor simulation
//!
//! Each finger oscillates around a baseline:
//!
//! ```text
//! flex[i] = base[i] + 800 * sin(2π f[i] t + φ[i]) + N(0, 30)     clamped to 0..=4095
//! ```
//!
//! Gestures move the baselines, never the readings directly. A baseline
//! follows its target through a first-order lag,
//! `base += (target - base) * (1 - exp(-rate * dt))`, so a preset switch
//! bends the fingers over a few hundred milliseconds instead of jumping.
//! The factor stays below 1 for any `dt`, so a baseline never overshoots.

use super::MotionRates;
use super::noise::NoiseGenerator;
use crate::core::types::{FLEX_COUNT, FLEX_MAX};
use crate::gesture::GestureMotion;
use std::f64::consts::{PI, TAU};

/// Oscillation amplitude around the baseline (ADC counts)
const WAVE_AMPLITUDE: f64 = 800.0;

/// Per-reading noise standard deviation (ADC counts)
const NOISE_STDDEV: f64 = 30.0;

/// Low and high end of the animated wave gesture
const WAVE_LOW: f64 = 500.0;
const WAVE_SPAN: f64 = 2500.0;

/// Wave gesture angular speed (rad/s) and per-finger phase step (rad)
const WAVE_SPEED: f64 = 3.0;
const WAVE_FINGER_PHASE: f64 = 0.8;

/// Flex simulator for the five fingers of one glove
#[derive(Debug, Clone)]
pub struct FlexSimulator {
    base: [f64; FLEX_COUNT],
    freq: [f64; FLEX_COUNT],
    phase: [f64; FLEX_COUNT],
}

impl FlexSimulator {
    /// Draw baselines, frequencies and phases from the glove's generator
    pub fn new(noise: &mut NoiseGenerator) -> Self {
        let mut base = [0.0; FLEX_COUNT];
        let mut freq = [0.0; FLEX_COUNT];
        let mut phase = [0.0; FLEX_COUNT];

        for b in &mut base {
            *b = noise.int_range(500, 1500) as f64;
        }
        for f in &mut freq {
            *f = noise.uniform(0.3, 1.2);
        }
        for p in &mut phase {
            *p = noise.uniform(0.0, 2.0 * PI);
        }

        Self { base, freq, phase }
    }

    /// Current baselines
    pub fn baseline(&self) -> [f64; FLEX_COUNT] {
        self.base
    }

    /// Move baselines toward the gesture targets
    ///
    /// `t` is the glove time before this step is applied.
    pub fn apply_gesture(&mut self, motion: Option<GestureMotion>, t: f64, dt: f64, rates: &MotionRates) {
        match motion {
            None => {}
            Some(GestureMotion::Hold(targets)) => {
                let alpha = lag_factor(rates.hold, dt);
                for (base, target) in self.base.iter_mut().zip(targets) {
                    *base += (target - *base) * alpha;
                }
            }
            Some(GestureMotion::Wave) => {
                let alpha = lag_factor(rates.wave, dt);
                for (i, base) in self.base.iter_mut().enumerate() {
                    let phase = t * WAVE_SPEED + i as f64 * WAVE_FINGER_PHASE;
                    let target = (WAVE_LOW + WAVE_SPAN * (0.5 + 0.5 * phase.sin())).trunc();
                    *base += (target - *base) * alpha;
                }
            }
        }
    }

    /// Produce flex readings at time `t`
    pub fn generate(&self, t: f64, noise: &mut NoiseGenerator) -> [i32; FLEX_COUNT] {
        let mut out = [0; FLEX_COUNT];
        for (i, value) in out.iter_mut().enumerate() {
            let wave = (TAU * self.freq[i] * t + self.phase[i]).sin();
            let raw = self.base[i] + WAVE_AMPLITUDE * wave + noise.gaussian(NOISE_STDDEV);
            *value = (raw as i32).clamp(0, FLEX_MAX);
        }
        out
    }
}

/// Fraction of the remaining gap closed in `dt` seconds
#[inline]
fn lag_factor(rate: f64, dt: f64) -> f64 {
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_ranges() {
        let mut noise = NoiseGenerator::new(42);
        let flex = FlexSimulator::new(&mut noise);
        for i in 0..FLEX_COUNT {
            assert!((500.0..=1500.0).contains(&flex.base[i]));
            assert!((0.3..1.2).contains(&flex.freq[i]));
            assert!((0.0..TAU).contains(&flex.phase[i]));
        }
    }

    #[test]
    fn test_hold_converges_without_overshoot() {
        let mut noise = NoiseGenerator::new(1);
        let mut flex = FlexSimulator::new(&mut noise);
        let rates = MotionRates::default();
        let target = 3500.0;

        let mut prev_gap = f64::INFINITY;
        for step in 0..600 {
            flex.apply_gesture(Some(GestureMotion::Hold([target; 5])), step as f64 / 30.0, 1.0 / 30.0, &rates);
            let gap = target - flex.base[0];
            assert!(gap >= -1e-9, "overshoot at step {}: base={}", step, flex.base[0]);
            assert!(gap <= prev_gap + 1e-9, "gap grew at step {}", step);
            prev_gap = gap;
        }
        assert!(prev_gap < 1.0);
    }

    #[test]
    fn test_huge_dt_lands_on_target() {
        let mut noise = NoiseGenerator::new(1);
        let mut flex = FlexSimulator::new(&mut noise);
        flex.apply_gesture(Some(GestureMotion::Hold([100.0; 5])), 0.0, 1000.0, &MotionRates::default());
        for b in flex.baseline() {
            assert!((b - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_readings_clamped() {
        let mut noise = NoiseGenerator::new(3);
        let mut flex = FlexSimulator::new(&mut noise);
        flex.base = [-5000.0, 9000.0, 0.0, 4095.0, 2000.0];
        for step in 0..100 {
            for v in flex.generate(step as f64 * 0.1, &mut noise) {
                assert!((0..=FLEX_MAX).contains(&v));
            }
        }
    }
}
