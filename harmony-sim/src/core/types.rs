//! Sensor vector layout shared by the simulator, the codec and the JSON view.
//!
//! Index order is part of the binary wire contract:
//!
//! | Index | Sensor | Range |
//! |-------|--------|-------|
//! | 0-4 | Flex (thumb, index, middle, ring, little) | 0..=4095 |
//! | 5-7 | Accelerometer (ax, ay, az) | i16 |
//! | 8-10 | Gyroscope (gx, gy, gz) | i16 |
//! | 11-13 | Orientation (yaw, pitch, roll), 1/100 degree | ±18000 / ±9000 |

use std::ops::{Index, IndexMut};

/// Sensors per device
pub const SENSOR_COUNT: usize = 14;

/// Number of flex sensors (one per finger)
pub const FLEX_COUNT: usize = 5;

/// First accelerometer index
pub const ACCEL_START: usize = 5;

/// First gyroscope index
pub const GYRO_START: usize = 8;

/// First orientation index
pub const YPR_START: usize = 11;

/// Maximum flex reading (12-bit ADC)
pub const FLEX_MAX: i32 = 4095;

/// Yaw/roll range half-width in hundredths of a degree
pub const HALF_TURN_CENTIDEG: i32 = 18000;

/// Pitch range half-width in hundredths of a degree
pub const QUARTER_TURN_CENTIDEG: i32 = 9000;

/// One of the two simulated gloves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Left glove, `esp1` on the wire
    Left,
    /// Right glove, `esp2` on the wire
    Right,
}

impl Device {
    /// Both devices in wire order
    pub const ALL: [Device; 2] = [Device::Left, Device::Right];

    /// Bit offset of this device's 14-bit mask inside the combined mask
    #[inline]
    pub const fn mask_shift(self) -> u32 {
        match self {
            Device::Left => 0,
            Device::Right => SENSOR_COUNT as u32,
        }
    }

    /// Key used in the verbose JSON payload
    pub const fn wire_name(self) -> &'static str {
        match self {
            Device::Left => "esp1",
            Device::Right => "esp2",
        }
    }
}

/// Fixed-width ordered readings for one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SensorVector([i32; SENSOR_COUNT]);

impl SensorVector {
    /// All sensors zero
    pub const ZERO: SensorVector = SensorVector([0; SENSOR_COUNT]);

    /// Wrap raw readings
    pub const fn new(values: [i32; SENSOR_COUNT]) -> Self {
        Self(values)
    }

    /// Raw readings in wire order
    #[inline]
    pub fn values(&self) -> &[i32; SENSOR_COUNT] {
        &self.0
    }

    /// Flex readings, thumb first
    pub fn flex(&self) -> [i32; FLEX_COUNT] {
        let mut out = [0; FLEX_COUNT];
        out.copy_from_slice(&self.0[..FLEX_COUNT]);
        out
    }

    /// Accelerometer [ax, ay, az]
    pub fn accel(&self) -> [i32; 3] {
        self.triple(ACCEL_START)
    }

    /// Gyroscope [gx, gy, gz]
    pub fn gyro(&self) -> [i32; 3] {
        self.triple(GYRO_START)
    }

    /// Orientation [yaw, pitch, roll]
    pub fn ypr(&self) -> [i32; 3] {
        self.triple(YPR_START)
    }

    fn triple(&self, start: usize) -> [i32; 3] {
        [self.0[start], self.0[start + 1], self.0[start + 2]]
    }
}

impl From<[i32; SENSOR_COUNT]> for SensorVector {
    fn from(values: [i32; SENSOR_COUNT]) -> Self {
        Self(values)
    }
}

impl Index<usize> for SensorVector {
    type Output = i32;

    #[inline]
    fn index(&self, index: usize) -> &i32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for SensorVector {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut i32 {
        &mut self.0[index]
    }
}

/// Readings of both gloves for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlovePair {
    pub left: SensorVector,
    pub right: SensorVector,
}

impl GlovePair {
    pub fn new(left: SensorVector, right: SensorVector) -> Self {
        Self { left, right }
    }

    /// Vector for the given device
    #[inline]
    pub fn get(&self, device: Device) -> &SensorVector {
        match device {
            Device::Left => &self.left,
            Device::Right => &self.right,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, device: Device) -> &mut SensorVector {
        match device {
            Device::Left => &mut self.left,
            Device::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_groups() {
        let v = SensorVector::new([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        assert_eq!(v.flex(), [1, 2, 3, 4, 5]);
        assert_eq!(v.accel(), [6, 7, 8]);
        assert_eq!(v.gyro(), [9, 10, 11]);
        assert_eq!(v.ypr(), [12, 13, 14]);
    }

    #[test]
    fn test_device_mask_layout() {
        assert_eq!(Device::Left.mask_shift(), 0);
        assert_eq!(Device::Right.mask_shift(), 14);
        assert_eq!(Device::Right.wire_name(), "esp2");
    }

    #[test]
    fn test_pair_access() {
        let mut pair = GlovePair::default();
        pair.get_mut(Device::Right)[3] = 42;
        assert_eq!(pair.right[3], 42);
        assert_eq!(pair.get(Device::Left), &SensorVector::ZERO);
    }
}
