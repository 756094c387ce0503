//! Gesture presets steering the simulated flex sensors
//!
//! A preset either holds the five flex baselines at fixed targets or animates
//! them as a travelling wave. Built-in presets are a closed set; extra presets
//! come from configuration as [`Gesture::Custom`] and are validated once when
//! the [`GestureTable`] is built, so lookups never fail later.
//!
//! The active preset is shared between connection threads (writers) and the
//! tick loop (reader) as a single [`AtomicUsize`] index into the immutable
//! table. A switch is one store; the tick loop sees either the old or the new
//! preset, never a mix.

use crate::core::types::{FLEX_COUNT, FLEX_MAX};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Words the control channel reserves for itself
pub const RESERVED_NAMES: [&str; 2] = ["list", "resync"];

/// How a preset drives the flex baselines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMotion {
    /// Converge on fixed per-finger targets
    Hold([f64; FLEX_COUNT]),
    /// Sweep each finger with a phase-shifted sine
    Wave,
}

/// Preset supplied by configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CustomGesture {
    pub name: String,
    pub description: String,
    pub motion: GestureMotion,
}

/// A gesture preset
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Open hand at rest
    Rest,
    /// Closed fist
    Fist,
    /// Index finger extended
    Point,
    /// Index and middle extended
    Peace,
    /// Thumb up
    ThumbsUp,
    /// Animated wave
    Wave,
    /// Configuration-defined preset
    Custom(CustomGesture),
}

impl Gesture {
    /// Built-in presets in listing order
    pub const BUILTIN: [Gesture; 6] = [
        Gesture::Rest,
        Gesture::Fist,
        Gesture::Point,
        Gesture::Peace,
        Gesture::ThumbsUp,
        Gesture::Wave,
    ];

    /// Command word selecting this preset
    pub fn name(&self) -> &str {
        match self {
            Gesture::Rest => "repos",
            Gesture::Fist => "poing",
            Gesture::Point => "pointer",
            Gesture::Peace => "peace",
            Gesture::ThumbsUp => "pouce",
            Gesture::Wave => "wave",
            Gesture::Custom(custom) => &custom.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Gesture::Rest => "Open hand, at rest",
            Gesture::Fist => "Closed fist",
            Gesture::Point => "Index extended, other fingers folded",
            Gesture::Peace => "Peace sign (index + middle)",
            Gesture::ThumbsUp => "Thumb up",
            Gesture::Wave => "Animated wave (sinusoidal motion)",
            Gesture::Custom(custom) => &custom.description,
        }
    }

    pub fn motion(&self) -> GestureMotion {
        match self {
            Gesture::Rest => GestureMotion::Hold([500.0; FLEX_COUNT]),
            Gesture::Fist => GestureMotion::Hold([3500.0; FLEX_COUNT]),
            Gesture::Point => GestureMotion::Hold([3000.0, 500.0, 3500.0, 3500.0, 3500.0]),
            Gesture::Peace => GestureMotion::Hold([3000.0, 500.0, 500.0, 3500.0, 3500.0]),
            Gesture::ThumbsUp => GestureMotion::Hold([500.0, 3500.0, 3500.0, 3500.0, 3500.0]),
            Gesture::Wave => GestureMotion::Wave,
            Gesture::Custom(custom) => custom.motion,
        }
    }
}

/// Index of a preset inside its [`GestureTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureId(usize);

/// Immutable, validated list of presets
#[derive(Debug, Clone)]
pub struct GestureTable {
    entries: Vec<Gesture>,
}

impl GestureTable {
    /// Table with the built-in presets only
    pub fn builtin() -> Self {
        Self {
            entries: Gesture::BUILTIN.to_vec(),
        }
    }

    /// Built-in presets followed by the given custom ones
    ///
    /// Custom names are normalized to trimmed lowercase. Fails on empty,
    /// reserved or duplicate names and on hold targets outside the flex range.
    pub fn with_custom(custom: Vec<CustomGesture>) -> Result<Self> {
        let mut table = Self::builtin();
        let mut seen: HashSet<String> = table
            .entries
            .iter()
            .map(|g| g.name().to_string())
            .collect();

        for mut gesture in custom {
            gesture.name = gesture.name.trim().to_lowercase();

            if gesture.name.is_empty() {
                return Err(Error::Config("gesture name must not be empty".to_string()));
            }
            if RESERVED_NAMES.contains(&gesture.name.as_str()) {
                return Err(Error::Config(format!(
                    "gesture name '{}' is a reserved command",
                    gesture.name
                )));
            }
            if !seen.insert(gesture.name.clone()) {
                return Err(Error::Config(format!(
                    "duplicate gesture name '{}'",
                    gesture.name
                )));
            }
            if let GestureMotion::Hold(targets) = gesture.motion
                && let Some(bad) = targets
                    .iter()
                    .find(|t| !t.is_finite() || **t < 0.0 || **t > FLEX_MAX as f64)
            {
                return Err(Error::Config(format!(
                    "gesture '{}' target {} outside 0..={}",
                    gesture.name, bad, FLEX_MAX
                )));
            }

            table.entries.push(Gesture::Custom(gesture));
        }

        Ok(table)
    }

    /// Find a preset by command word (case-insensitive, trimmed)
    pub fn lookup(&self, name: &str) -> Option<GestureId> {
        let name = name.trim().to_lowercase();
        self.entries
            .iter()
            .position(|g| g.name() == name)
            .map(GestureId)
    }

    pub fn get(&self, id: GestureId) -> &Gesture {
        &self.entries[id.0]
    }

    /// Presets in listing order
    pub fn iter(&self) -> impl Iterator<Item = &Gesture> {
        self.entries.iter()
    }

    /// Preset names in listing order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Gesture::name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Active preset shared between control handlers and the tick loop
#[derive(Debug)]
pub struct GestureState {
    table: GestureTable,
    current: AtomicUsize,
}

impl GestureState {
    pub fn new(table: GestureTable, initial: GestureId) -> Self {
        Self {
            table,
            current: AtomicUsize::new(initial.0),
        }
    }

    pub fn table(&self) -> &GestureTable {
        &self.table
    }

    pub fn current_id(&self) -> GestureId {
        GestureId(self.current.load(Ordering::Acquire))
    }

    /// Currently active preset
    pub fn current(&self) -> &Gesture {
        self.table.get(self.current_id())
    }

    /// Switch to the named preset; `None` leaves the active preset untouched
    pub fn select(&self, name: &str) -> Option<&Gesture> {
        let id = self.table.lookup(name)?;
        Some(self.select_id(id))
    }

    /// Switch to a preset already resolved against this table
    pub fn select_id(&self, id: GestureId) -> &Gesture {
        self.current.store(id.0, Ordering::Release);
        self.table.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str, motion: GestureMotion) -> CustomGesture {
        CustomGesture {
            name: name.to_string(),
            description: "test".to_string(),
            motion,
        }
    }

    #[test]
    fn test_builtin_order() {
        let table = GestureTable::builtin();
        assert_eq!(
            table.names(),
            vec!["repos", "poing", "pointer", "peace", "pouce", "wave"]
        );
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let table = GestureTable::builtin();
        let id = table.lookup("  POING ").unwrap();
        assert_eq!(table.get(id), &Gesture::Fist);
        assert!(table.lookup("nope").is_none());
    }

    #[test]
    fn test_custom_appended() {
        let table =
            GestureTable::with_custom(vec![custom(" Rock ", GestureMotion::Hold([0.0; 5]))])
                .unwrap();
        assert_eq!(table.len(), 7);
        let id = table.lookup("rock").unwrap();
        assert_eq!(table.get(id).name(), "rock");
        assert_eq!(table.get(id).motion(), GestureMotion::Hold([0.0; 5]));
    }

    #[test]
    fn test_custom_non_ascii_name_matches_any_case() {
        let table =
            GestureTable::with_custom(vec![custom("Ñandú", GestureMotion::Wave)]).unwrap();
        let id = table.lookup("Ñandú").unwrap();
        assert_eq!(table.get(id).name(), "ñandú");
        assert_eq!(table.lookup(" ÑANDÚ "), Some(id));
        assert_eq!(table.lookup("ñandú"), Some(id));

        let state = GestureState::new(table, GestureId(0));
        assert_eq!(state.select("Ñandú").map(Gesture::name), Some("ñandú"));
        assert_eq!(state.current_id(), id);
    }

    #[test]
    fn test_custom_rejects_reserved_and_duplicates() {
        assert!(GestureTable::with_custom(vec![custom("list", GestureMotion::Wave)]).is_err());
        assert!(GestureTable::with_custom(vec![custom("Wave", GestureMotion::Wave)]).is_err());
        assert!(
            GestureTable::with_custom(vec![
                custom("a", GestureMotion::Wave),
                custom("a", GestureMotion::Wave)
            ])
            .is_err()
        );
        assert!(GestureTable::with_custom(vec![custom("  ", GestureMotion::Wave)]).is_err());
    }

    #[test]
    fn test_custom_rejects_out_of_range_targets() {
        let motion = GestureMotion::Hold([0.0, 0.0, 5000.0, 0.0, 0.0]);
        assert!(GestureTable::with_custom(vec![custom("big", motion)]).is_err());
    }

    #[test]
    fn test_select_swaps_token() {
        let table = GestureTable::builtin();
        let rest = table.lookup("repos").unwrap();
        let state = GestureState::new(table, rest);
        assert_eq!(state.current(), &Gesture::Rest);

        let picked = state.select("Wave").unwrap();
        assert_eq!(picked, &Gesture::Wave);
        assert_eq!(state.current(), &Gesture::Wave);

        assert!(state.select("unknown").is_none());
        assert_eq!(state.current(), &Gesture::Wave);
    }
}
