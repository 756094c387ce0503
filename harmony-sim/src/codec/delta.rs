//! Delta encoder and decoder for glove frames
//!
//! Both sides keep the last pair of vectors of one stream. The encoder sends
//! only the sensors whose value changed since that pair; the decoder adds the
//! received deltas back onto its copy.
//!
//! # Full vs delta
//!
//! - **Full frame**: sent when the encoder has no history (fresh or reset) or
//!   when forced. All 28 bits set, absolute values.
//! - **Delta frame**: one `curr - prev` value per changed sensor. Unchanged
//!   sensors cost zero bytes; a tick where nothing moved is an 8-byte frame.
//!
//! A decoder without history starts from all-zero vectors, so adding the
//! values of a full frame reproduces the absolute readings. A decoder must
//! therefore be fresh (or [`reset`](DeltaDecoder::reset)) when it receives a
//! full frame; a decoder with history reads every frame as deltas.
//!
//! # Precision limit
//!
//! Values outside the i16 range are clamped to `[-32768, 32767]` before they
//! go on the wire. This only happens on extreme single-tick jumps and is
//! counted, never raised. The encoder always remembers the true readings,
//! so the clamping error of one frame does not carry into the next.

use super::frame::{FULL_MASK, Frame};
use crate::core::types::{Device, GlovePair, SENSOR_COUNT};
use crate::error::{FrameError, Result};
use std::time::Instant;

/// Millisecond clock local to one encoder session
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since start, wrapping at 2^32
    pub fn elapsed_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u64 as u32
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Stateful frame encoder for one output stream
#[derive(Debug, Clone, Default)]
pub struct DeltaEncoder {
    /// Last encoded pair; `None` means the next frame must be full
    last: Option<GlovePair>,
    clock: SessionClock,
    /// Values clamped into i16 since construction
    clamped: u64,
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the next frame will be full regardless of `force_full`
    pub fn is_unset(&self) -> bool {
        self.last.is_none()
    }

    /// Last encoded pair
    pub fn last(&self) -> Option<&GlovePair> {
        self.last.as_ref()
    }

    /// Forget history; the next frame is full
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Number of values clamped into i16 so far
    pub fn clamped_count(&self) -> u64 {
        self.clamped
    }

    /// Session timestamp for a frame encoded now
    pub fn timestamp_ms(&self) -> u32 {
        self.clock.elapsed_ms()
    }

    /// Encode `pair` stamped with the session clock
    pub fn encode(&mut self, pair: &GlovePair, force_full: bool) -> Frame {
        let timestamp_ms = self.timestamp_ms();
        self.encode_at(timestamp_ms, pair, force_full)
    }

    /// Encode `pair` with an explicit timestamp
    ///
    /// Afterwards the encoder's history is exactly `pair`.
    pub fn encode_at(&mut self, timestamp_ms: u32, pair: &GlovePair, force_full: bool) -> Frame {
        let mut values = Vec::with_capacity(2 * SENSOR_COUNT);
        let mut clamped = 0u64;

        let mask = match self.last {
            Some(prev) if !force_full => {
                let mut mask = 0u32;
                for device in Device::ALL {
                    let curr = pair.get(device);
                    let prev = prev.get(device);
                    for i in 0..SENSOR_COUNT {
                        let delta = i64::from(curr[i]) - i64::from(prev[i]);
                        if delta != 0 {
                            mask |= 1 << (device.mask_shift() + i as u32);
                            values.push(clamp_i16(delta, &mut clamped));
                        }
                    }
                }
                mask
            }
            _ => {
                for device in Device::ALL {
                    for value in pair.get(device).values() {
                        values.push(clamp_i16(i64::from(*value), &mut clamped));
                    }
                }
                FULL_MASK
            }
        };

        if clamped > 0 {
            self.clamped += clamped;
            log::debug!(
                "Clamped {} value(s) into i16 range ({} total)",
                clamped,
                self.clamped
            );
        }

        self.last = Some(*pair);

        Frame {
            timestamp_ms,
            mask,
            values,
        }
    }
}

/// Stateful frame decoder mirroring one [`DeltaEncoder`] stream
#[derive(Debug, Clone, Default)]
pub struct DeltaDecoder {
    last: Option<GlovePair>,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.last.is_none()
    }

    pub fn last(&self) -> Option<&GlovePair> {
        self.last.as_ref()
    }

    /// Forget history before accepting a full frame
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Parse wire bytes and apply them
    ///
    /// On error the decoder's history is left untouched.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<GlovePair> {
        let frame = Frame::parse(bytes)?;
        Ok(self.apply(&frame)?)
    }

    /// Apply an already parsed frame
    pub fn apply(&mut self, frame: &Frame) -> std::result::Result<GlovePair, FrameError> {
        if frame.mask & !FULL_MASK != 0 {
            return Err(FrameError::ReservedBits { mask: frame.mask });
        }
        let expected = frame.mask.count_ones() as usize;
        if frame.values.len() != expected {
            return Err(FrameError::PayloadLength {
                expected: 2 * expected,
                actual: 2 * frame.values.len(),
            });
        }

        let mut next = self.last.unwrap_or_default();
        let mut values = frame.values.iter();

        for device in Device::ALL {
            let bits = frame.device_mask(device);
            let vector = next.get_mut(device);
            for i in 0..SENSOR_COUNT {
                if bits & (1 << i) != 0
                    && let Some(value) = values.next()
                {
                    vector[i] = vector[i].wrapping_add(i32::from(*value));
                }
            }
        }

        self.last = Some(next);
        Ok(next)
    }
}

#[inline]
fn clamp_i16(value: i64, clamped: &mut u64) -> i16 {
    if value > i64::from(i16::MAX) {
        *clamped += 1;
        i16::MAX
    } else if value < i64::from(i16::MIN) {
        *clamped += 1;
        i16::MIN
    } else {
        value as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::frame::HEADER_SIZE;
    use crate::core::types::SensorVector;
    use crate::devices::{GloveSimulator, MotionRates};
    use crate::error::Error;
    use crate::gesture::GestureMotion;

    fn pair(left: [i32; 14], right: [i32; 14]) -> GlovePair {
        GlovePair::new(SensorVector::new(left), SensorVector::new(right))
    }

    #[test]
    fn test_full_then_single_delta() {
        let mut encoder = DeltaEncoder::new();
        let zeros = GlovePair::default();

        let full = encoder.encode_at(1234, &zeros, true);
        let bytes = full.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE + 56);
        assert_eq!(&bytes[0..4], &1234u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x0FFF_FFFFu32.to_le_bytes());
        assert!(bytes[8..].iter().all(|b| *b == 0));

        let mut left = [0; 14];
        left[0] = 5;
        let delta = encoder.encode_at(1267, &pair(left, [0; 14]), false);
        assert_eq!(delta.mask, 0b1);
        assert_eq!(delta.values, vec![5]);
        assert_eq!(&delta.to_bytes()[8..], &5i16.to_le_bytes());
    }

    #[test]
    fn test_first_frame_is_full_without_force() {
        let mut encoder = DeltaEncoder::new();
        assert!(encoder.is_unset());
        let frame = encoder.encode_at(0, &GlovePair::default(), false);
        assert!(frame.is_full());
        assert!(!encoder.is_unset());
    }

    #[test]
    fn test_noop_frame_is_header_only() {
        let mut encoder = DeltaEncoder::new();
        let p = pair([7; 14], [-3; 14]);
        encoder.encode_at(0, &p, false);
        let frame = encoder.encode_at(33, &p, false);
        assert!(frame.is_noop());
        assert_eq!(frame.to_bytes().len(), 8);

        let mut decoder = DeltaDecoder::new();
        decoder.decode(&encoder.encode_at(0, &p, true).to_bytes()).unwrap();
        assert_eq!(decoder.decode(&frame.to_bytes()).unwrap(), p);
    }

    #[test]
    fn test_force_full_dominates_history() {
        let mut encoder = DeltaEncoder::new();
        let p = pair([1; 14], [2; 14]);
        encoder.encode_at(0, &p, false);
        let frame = encoder.encode_at(10, &p, true);
        assert_eq!(frame.mask, FULL_MASK);
        assert_eq!(frame.encoded_len() - HEADER_SIZE, 56);
        assert_eq!(&frame.values[..14], &[1; 14]);
        assert_eq!(&frame.values[14..], &[2; 14]);
    }

    #[test]
    fn test_right_device_bits_start_at_14() {
        let mut encoder = DeltaEncoder::new();
        encoder.encode_at(0, &GlovePair::default(), false);
        let mut right = [0; 14];
        right[2] = -9;
        right[13] = 4;
        let frame = encoder.encode_at(1, &pair([0; 14], right), false);
        assert_eq!(frame.mask, (1 << 16) | (1 << 27));
        assert_eq!(frame.values, vec![-9, 4]);
    }

    #[test]
    fn test_clamping_boundaries() {
        let mut encoder = DeltaEncoder::new();
        encoder.encode_at(0, &GlovePair::default(), false);

        let mut left = [0; 14];
        left[0] = 32767;
        left[1] = 32768;
        left[2] = -32769;
        left[3] = -32768;
        let frame = encoder.encode_at(1, &pair(left, [0; 14]), false);
        assert_eq!(frame.values, vec![32767, 32767, -32768, -32768]);
        assert_eq!(encoder.clamped_count(), 2);

        // History keeps the true values
        assert_eq!(encoder.last().unwrap().left[1], 32768);
        let frame = encoder.encode_at(2, &pair(left, [0; 14]), false);
        assert!(frame.is_noop());
    }

    #[test]
    fn test_full_frame_clamps_absolute_values() {
        let mut encoder = DeltaEncoder::new();
        let mut left = [0; 14];
        left[5] = 40000;
        let frame = encoder.encode_at(0, &pair(left, [0; 14]), true);
        assert_eq!(frame.values[5], i16::MAX);
        assert_eq!(encoder.clamped_count(), 1);
    }

    #[test]
    fn test_round_trip_simulated_stream() {
        let mut left = GloveSimulator::new("left", 42, MotionRates::default());
        let mut right = GloveSimulator::new("right", 99, MotionRates::default());
        let mut encoder = DeltaEncoder::new();
        let mut decoder = DeltaDecoder::new();

        for step in 0..500 {
            let motion = if step < 250 {
                Some(GestureMotion::Wave)
            } else {
                Some(GestureMotion::Hold([3500.0; 5]))
            };
            let p = GlovePair::new(
                left.advance(1.0 / 30.0, motion),
                right.advance(1.0 / 30.0, motion),
            );
            let bytes = encoder.encode_at(step, &p, false).to_bytes();
            assert_eq!(decoder.decode(&bytes).unwrap(), p, "step {}", step);
        }
    }

    #[test]
    fn test_round_trip_from_arbitrary_prior_state() {
        let priors = [
            pair([0; 14], [0; 14]),
            pair([4095; 14], [-20000; 14]),
            pair([1, -1, 2, -2, 3, -3, 4, -4, 5, -5, 6, -6, 7, -7], [100; 14]),
        ];
        let next = pair(
            [12, 0, 4000, 3, 0, 16384, -5, 7, 0, 0, 17999, -9000, 9000, 1],
            [100; 14],
        );

        for prior in priors {
            let mut encoder = DeltaEncoder::new();
            let mut decoder = DeltaDecoder::new();
            decoder.decode(&encoder.encode_at(0, &prior, false).to_bytes()).unwrap();
            let bytes = encoder.encode_at(1, &next, false).to_bytes();
            assert_eq!(decoder.decode(&bytes).unwrap(), next);
        }
    }

    #[test]
    fn test_decode_error_keeps_state() {
        let mut encoder = DeltaEncoder::new();
        let mut decoder = DeltaDecoder::new();
        let p = pair([3; 14], [4; 14]);
        decoder.decode(&encoder.encode_at(0, &p, false).to_bytes()).unwrap();

        let err = decoder.decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedFrame(FrameError::Truncated { len: 3 })
        ));

        let mut bad = encoder.encode_at(1, &pair([5; 14], [4; 14]), false).to_bytes();
        bad.pop();
        assert!(matches!(
            decoder.decode(&bad),
            Err(Error::MalformedFrame(FrameError::PayloadLength { .. }))
        ));
        assert_eq!(decoder.last(), Some(&p));
    }

    #[test]
    fn test_decoder_reset_accepts_full_frame() {
        let mut encoder = DeltaEncoder::new();
        let mut decoder = DeltaDecoder::new();
        let first = encoder.encode_at(0, &pair([9; 14], [9; 14]), false);
        decoder.decode(&first.to_bytes()).unwrap();

        let p = pair([100; 14], [200; 14]);
        let full = encoder.encode_at(1, &p, true);
        decoder.reset();
        assert_eq!(decoder.apply(&full).unwrap(), p);
    }

    #[test]
    fn test_encoder_reset_forces_full() {
        let mut encoder = DeltaEncoder::new();
        let p = GlovePair::default();
        encoder.encode_at(0, &p, false);
        encoder.reset();
        assert!(encoder.encode_at(1, &p, false).is_full());
    }
}
