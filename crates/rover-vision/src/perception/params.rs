use serde::{Deserialize, Serialize};

use crate::calibration::{Calibration, MAP_WEIGHT, TARGET_SCALE, TERRAIN_SCALE, WORLD_SIZE};
use crate::segment::{ColorThreshold, NAVIGABLE, OBSTACLE, TARGET};

/// Configuration for [`crate::Perception`].
///
/// `Default` is the fixed rover calibration; every field may be omitted from
/// a serialized config and falls back to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionParams {
    /// Camera-to-ground calibration.
    pub calibration: Calibration,
    /// Color range for drivable ground.
    pub navigable: ColorThreshold,
    /// Color range for obstacles.
    pub obstacle: ColorThreshold,
    /// Color range for target samples.
    pub target: ColorThreshold,
    /// World map side, in cells.
    pub world_size: usize,
    /// Rover-space units per cell for navigable and obstacle evidence.
    pub terrain_scale: f64,
    /// Rover-space units per cell for target evidence. Finer than terrain so
    /// samples are localized more tightly.
    pub target_scale: f64,
    /// Evidence added per projected pixel.
    pub map_weight: u64,
}

impl Default for PerceptionParams {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            navigable: NAVIGABLE,
            obstacle: OBSTACLE,
            target: TARGET,
            world_size: WORLD_SIZE,
            terrain_scale: TERRAIN_SCALE,
            target_scale: TARGET_SCALE,
            map_weight: MAP_WEIGHT,
        }
    }
}

impl PerceptionParams {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let text = r#"{ "world_size": 50, "calibration": { "dst_size": 4.0 } }"#;
        let p = PerceptionParams::from_json(text).expect("valid json");
        assert_eq!(p.world_size, 50);
        assert_eq!(p.calibration.dst_size, 4.0);
        assert_eq!(p.calibration.bottom_offset, 6.0);
        assert_eq!(p.target, TARGET);
        assert_eq!(p.terrain_scale, 10.0);
        assert_eq!(p.target_scale, 15.0);
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let p = PerceptionParams::default();
        let text = serde_json::to_string(&p).expect("serialize");
        assert_eq!(PerceptionParams::from_json(&text).expect("parse"), p);
    }
}
