//! Binary frame layout
//!
//! # Wire Format (little-endian)
//!
//! ```text
//! ┌────────────────────┬────────────────────┬──────────────────────────────┐
//! │ timestamp_ms (u32) │ combined_mask (u32)│ values (i16 × popcount(mask))│
//! └────────────────────┴────────────────────┴──────────────────────────────┘
//!   offset 0             offset 4             offset 8
//! ```
//!
//! - **combined_mask**: bits 0-13 = left glove sensors, bits 14-27 = right
//!   glove sensors, bits 28-31 reserved (zero).
//! - **values**: left glove's set bits in ascending order, then the right
//!   glove's. Deltas in a delta frame, absolute readings in a full frame.
//!
//! Frame length is always `8 + 2 × popcount(mask)`: 8 bytes for a no-op frame,
//! 64 bytes for a full frame.

use crate::core::types::{Device, SENSOR_COUNT};
use crate::error::FrameError;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 8;

/// One device's 14 sensor bits
pub const DEVICE_MASK: u32 = (1 << SENSOR_COUNT) - 1;

/// All 28 sensor bits of both devices
pub const FULL_MASK: u32 = DEVICE_MASK | (DEVICE_MASK << SENSOR_COUNT);

/// Decoded representation of one binary frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Milliseconds since the encoder session started (wrapping)
    pub timestamp_ms: u32,
    /// Combined change mask
    pub mask: u32,
    /// One value per set mask bit, in bit order
    pub values: Vec<i16>,
}

impl Frame {
    /// True when every sensor of both devices is present
    #[inline]
    pub fn is_full(&self) -> bool {
        self.mask == FULL_MASK
    }

    /// True when no sensor changed
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.mask == 0
    }

    /// The 14-bit mask of one device
    #[inline]
    pub fn device_mask(&self, device: Device) -> u32 {
        (self.mask >> device.mask_shift()) & DEVICE_MASK
    }

    /// Serialized length in bytes
    #[inline]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + 2 * self.values.len()
    }

    /// Append the wire bytes to `buffer`
    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(self.encoded_len());
        buffer.extend_from_slice(&self.timestamp_ms.to_le_bytes());
        buffer.extend_from_slice(&self.mask.to_le_bytes());
        for value in &self.values {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buffer);
        buffer
    }

    /// Parse and validate wire bytes
    pub fn parse(bytes: &[u8]) -> Result<Frame, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::Truncated { len: bytes.len() });
        }

        let timestamp_ms = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let mask = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        if mask & !FULL_MASK != 0 {
            return Err(FrameError::ReservedBits { mask });
        }

        let payload = &bytes[HEADER_SIZE..];
        let expected = 2 * mask.count_ones() as usize;
        if payload.len() != expected {
            return Err(FrameError::PayloadLength {
                expected,
                actual: payload.len(),
            });
        }

        let values = payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Frame {
            timestamp_ms,
            mask,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_constants() {
        assert_eq!(DEVICE_MASK, 0x3FFF);
        assert_eq!(FULL_MASK, 0x0FFF_FFFF);
    }

    #[test]
    fn test_byte_layout() {
        let frame = Frame {
            timestamp_ms: 0x0403_0201,
            mask: 0b1 | (0b10 << 14),
            values: vec![5, -2],
        };
        assert_eq!(
            frame.to_bytes(),
            vec![0x01, 0x02, 0x03, 0x04, 0x01, 0x00, 0x02, 0x00, 0x05, 0x00, 0xFE, 0xFF]
        );
        assert_eq!(frame.device_mask(Device::Left), 0b1);
        assert_eq!(frame.device_mask(Device::Right), 0b10);
    }

    #[test]
    fn test_parse_noop() {
        let bytes = [7, 0, 0, 0, 0, 0, 0, 0];
        let frame = Frame::parse(&bytes).unwrap();
        assert!(frame.is_noop());
        assert_eq!(frame.timestamp_ms, 7);
        assert!(frame.values.is_empty());
    }

    #[test]
    fn test_parse_truncated_header() {
        assert_eq!(
            Frame::parse(&[0, 0, 0]),
            Err(FrameError::Truncated { len: 3 })
        );
    }

    #[test]
    fn test_parse_payload_mismatch() {
        // Mask claims two values, one present
        let bytes = [0, 0, 0, 0, 0b11, 0, 0, 0, 1, 0];
        assert_eq!(
            Frame::parse(&bytes),
            Err(FrameError::PayloadLength {
                expected: 4,
                actual: 2
            })
        );
        // Trailing byte after a no-op header
        let bytes = [0, 0, 0, 0, 0, 0, 0, 0, 9];
        assert!(matches!(
            Frame::parse(&bytes),
            Err(FrameError::PayloadLength { .. })
        ));
    }

    #[test]
    fn test_parse_reserved_bits() {
        let bytes = [0, 0, 0, 0, 0, 0, 0, 0x10];
        assert_eq!(
            Frame::parse(&bytes),
            Err(FrameError::ReservedBits { mask: 0x1000_0000 })
        );
    }
}
