//! Simulation tuning
//!
//! Loaded by the host from JSON next to the level data; every field has a default
//! so partial files are accepted.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::CoreError;
use crate::sim::Rect;

/// Broad-phase granularity presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexPreset {
    /// Few, shallow nodes. Cheap rebuilds, more candidates per probe.
    Coarse,
    #[default]
    Balanced,
    /// Deep tree for crowded levels
    Fine,
}

impl IndexPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexPreset::Coarse => "Coarse",
            IndexPreset::Balanced => "Balanced",
            IndexPreset::Fine => "Fine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "coarse" => Some(IndexPreset::Coarse),
            "balanced" | "default" => Some(IndexPreset::Balanced),
            "fine" => Some(IndexPreset::Fine),
            _ => None,
        }
    }

    /// Split threshold for this preset
    pub fn max_objects_per_node(&self) -> usize {
        match self {
            IndexPreset::Coarse => 20,
            IndexPreset::Balanced => MAX_OBJECTS_PER_NODE,
            IndexPreset::Fine => 4,
        }
    }

    /// Recursion ceiling for this preset
    pub fn max_depth(&self) -> u32 {
        match self {
            IndexPreset::Coarse => 3,
            IndexPreset::Balanced => MAX_DEPTH,
            IndexPreset::Fine => 8,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Integration ===
    /// Frame delta (ms) to simulation step factor
    pub time_scale: f64,
    /// Snap-to-zero threshold for velocity and candidate position
    pub epsilon: f64,
    /// Kinematic bodies slower than this stop
    pub kinematic_threshold: f64,
    /// Initial gravity for new worlds
    pub gravity: f64,

    // === Broad phase ===
    /// Region covered by the quadtree root
    pub world_bounds: Rect,
    pub max_objects_per_node: usize,
    pub max_depth: u32,
    /// Pair events kept per tick
    pub event_capacity: usize,

    // === Tile contacts ===
    /// Snap entities against blocking tiles before committing motion
    pub clamp_blocking: bool,

    // === Diagnostics ===
    pub debug_level: u8,
    /// Tile sampling is traced when `debug_level` exceeds this
    pub trace_threshold: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_scale: TIME_SCALE,
            epsilon: EPSILON,
            kinematic_threshold: KINEMATIC_THRESHOLD,
            gravity: GRAVITY,

            world_bounds: Rect::new(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT),
            max_objects_per_node: MAX_OBJECTS_PER_NODE,
            max_depth: MAX_DEPTH,
            event_capacity: EVENT_CAPACITY,

            clamp_blocking: true,

            debug_level: 0,
            trace_threshold: TRACE_THRESHOLD,
        }
    }
}

impl SimConfig {
    /// Create a config with the broad-phase limits of a preset
    pub fn from_preset(preset: IndexPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a broad-phase preset (leaves everything else alone)
    pub fn apply_preset(&mut self, preset: IndexPreset) {
        self.max_objects_per_node = preset.max_objects_per_node();
        self.max_depth = preset.max_depth();
    }

    /// Whether tile sampling should record a debug trace
    pub fn tracing(&self) -> bool {
        self.debug_level > self.trace_threshold
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        log::info!(
            "Loaded sim config (time_scale={}, capacity={}, depth={})",
            config.time_scale,
            config.event_capacity,
            config.max_depth
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "event_capacity": 32, "debug_level": 3 }"#).unwrap();
        assert_eq!(config.event_capacity, 32);
        assert_eq!(config.debug_level, 3);
        assert_eq!(config.max_depth, MAX_DEPTH);
        assert!((config.time_scale - TIME_SCALE).abs() < 1e-12);
        assert!(config.tracing());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimConfig::from_preset(IndexPreset::Fine);
        let json = config.to_json().unwrap();
        let back = SimConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
        assert_eq!(back.max_depth, 8);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = SimConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!(IndexPreset::from_str("FINE"), Some(IndexPreset::Fine));
        assert_eq!(IndexPreset::from_str("default"), Some(IndexPreset::Balanced));
        assert_eq!(IndexPreset::from_str("huge"), None);
        assert_eq!(IndexPreset::Coarse.as_str(), "Coarse");
    }
}
