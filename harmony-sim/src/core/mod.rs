//! Core sensor data types

pub mod types;

pub use types::{Device, GlovePair, SENSOR_COUNT, SensorVector};
