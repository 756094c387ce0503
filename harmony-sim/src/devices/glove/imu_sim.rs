//! IMU simulator for one glove
//!
//! Generates accelerometer, gyroscope and orientation readings as slow
//! sinusoidal drift plus noise.
//!
//! ## Sensor Outputs
//!
//! - **Accelerometer**: raw i16 units, ±2g range (16384 LSB/g).
//!   At rest the Z axis reads about +16384.
//! - **Gyroscope**: raw i16 units, centered on zero.
//! - **Orientation**: yaw/pitch/roll in hundredths of a degree.
//!   Yaw and roll clamp to `[-18000, 18000]`, pitch to `[-9000, 9000]`.
//!   No wrap-around, so tick-to-tick changes stay far inside the i16 delta range.

use super::noise::NoiseGenerator;
use crate::core::types::{HALF_TURN_CENTIDEG, QUARTER_TURN_CENTIDEG};

/// Scale factor: g to raw accel units (±2g range)
const ACCEL_SCALE: f64 = 16384.0;

const ACCEL_SWING: f64 = 1000.0;
const ACCEL_STDDEV: f64 = 200.0;

const GYRO_SWING: f64 = 500.0;
const GYRO_STDDEV: f64 = 100.0;

/// Orientation swing amplitude (centidegrees) and jitter half-width
const YPR_SWING: f64 = 3000.0;
const YPR_JITTER: i32 = 50;

/// IMU reading in raw units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuReading {
    /// [ax, ay, az]
    pub accel: [i32; 3],
    /// [gx, gy, gz]
    pub gyro: [i32; 3],
    /// [yaw, pitch, roll]
    pub ypr: [i32; 3],
}

/// IMU simulator
#[derive(Debug, Clone)]
pub struct ImuSimulator {
    accel_offset: [f64; 3],
    gyro_offset: [f64; 3],
    /// Orientation the glove swings around
    ypr_base: [i32; 3],
}

impl ImuSimulator {
    /// Draw the orientation baseline from the glove's generator
    pub fn new(noise: &mut NoiseGenerator) -> Self {
        let ypr_base = [
            noise.int_range(-HALF_TURN_CENTIDEG, HALF_TURN_CENTIDEG),
            noise.int_range(-QUARTER_TURN_CENTIDEG, QUARTER_TURN_CENTIDEG),
            noise.int_range(-QUARTER_TURN_CENTIDEG, QUARTER_TURN_CENTIDEG),
        ];

        Self {
            accel_offset: [0.0, 0.0, ACCEL_SCALE],
            gyro_offset: [0.0; 3],
            ypr_base,
        }
    }

    /// Generate a reading at glove time `t`
    pub fn generate(&self, t: f64, noise: &mut NoiseGenerator) -> ImuReading {
        let mut accel = [0; 3];
        for (j, value) in accel.iter_mut().enumerate() {
            let slow_move = ACCEL_SWING * (0.5 * t + j as f64).sin();
            *value = clamp_i16(self.accel_offset[j] + slow_move + noise.gaussian(ACCEL_STDDEV));
        }

        let mut gyro = [0; 3];
        for (j, value) in gyro.iter_mut().enumerate() {
            let drift = GYRO_SWING * (0.7 * t + j as f64 * 1.5).sin();
            *value = clamp_i16(self.gyro_offset[j] + drift + noise.gaussian(GYRO_STDDEV));
        }

        let mut ypr = [0; 3];
        for (j, value) in ypr.iter_mut().enumerate() {
            let swing = (YPR_SWING * (0.3 * t + j as f64 * 2.0).sin()) as i32;
            let jitter = noise.int_range(-YPR_JITTER, YPR_JITTER);
            *value = self.ypr_base[j] + swing + jitter;
        }
        ypr[0] = ypr[0].clamp(-HALF_TURN_CENTIDEG, HALF_TURN_CENTIDEG);
        ypr[1] = ypr[1].clamp(-QUARTER_TURN_CENTIDEG, QUARTER_TURN_CENTIDEG);
        ypr[2] = ypr[2].clamp(-HALF_TURN_CENTIDEG, HALF_TURN_CENTIDEG);

        ImuReading { accel, gyro, ypr }
    }
}

/// Clamp to i16 range
#[inline]
fn clamp_i16(value: f64) -> i32 {
    value.clamp(i16::MIN as f64, i16::MAX as f64) as i32
}
