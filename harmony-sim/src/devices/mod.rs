//! Device implementations

pub mod glove;

pub use glove::{GloveSimulator, MotionRates};
