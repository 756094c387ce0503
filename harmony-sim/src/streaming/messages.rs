//! JSON message types for the text side of the WebSocket.
//!
//! - Snapshot (outbound, JSON mode): both gloves in a self-describing layout
//! - Control replies (outbound): gesture acknowledgement, resync marker and
//!   preset listing

use crate::core::types::{GlovePair, SensorVector};
use crate::gesture::Gesture;
use serde::{Deserialize, Serialize};

/// Verbose readings of both gloves for one tick
///
/// Serialized as `{"esp1": {...}, "esp2": {...}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub esp1: GloveReading,
    pub esp2: GloveReading,
}

impl Snapshot {
    pub fn from_pair(pair: &GlovePair) -> Self {
        Self {
            esp1: GloveReading::from(&pair.left),
            esp2: GloveReading::from(&pair.right),
        }
    }
}

/// One glove in the verbose payload
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GloveReading {
    /// Thumb, index, middle, ring, little
    pub flex: [i32; 5],
    pub imu: ImuFields,
    pub ypr: Orientation,
    /// Always true for a simulated glove
    pub connected: bool,
}

impl From<&SensorVector> for GloveReading {
    fn from(vector: &SensorVector) -> Self {
        let [ax, ay, az] = vector.accel();
        let [gx, gy, gz] = vector.gyro();
        let [yaw, pitch, roll] = vector.ypr();

        Self {
            flex: vector.flex(),
            imu: ImuFields {
                ax,
                ay,
                az,
                gx,
                gy,
                gz,
            },
            ypr: Orientation { yaw, pitch, roll },
            connected: true,
        }
    }
}

/// Raw accelerometer and gyroscope values
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuFields {
    pub ax: i32,
    pub ay: i32,
    pub az: i32,
    pub gx: i32,
    pub gy: i32,
    pub gz: i32,
}

/// Orientation in hundredths of a degree
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub yaw: i32,
    pub pitch: i32,
    pub roll: i32,
}

/// Reply to a successful gesture switch
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GestureAck {
    pub status: String,
    pub gesture: String,
    pub description: String,
}

impl GestureAck {
    pub fn ok(gesture: &Gesture) -> Self {
        Self {
            status: "ok".to_string(),
            gesture: gesture.name().to_string(),
            description: gesture.description().to_string(),
        }
    }
}

/// Reply to `resync`; every binary message after it starts with a full frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResyncAck {
    pub status: String,
}

impl ResyncAck {
    pub const STATUS: &'static str = "resync";

    pub fn new() -> Self {
        Self {
            status: Self::STATUS.to_string(),
        }
    }
}

impl Default for ResyncAck {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply to `list`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PresetList {
    pub presets: Vec<String>,
}
