use rover_vision_core::RgbImage;
use serde::{Deserialize, Serialize};

use crate::worldmap::WorldMap;

/// Rover position in map cells and heading in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoverPose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl RoverPose {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }
}

/// Caller-owned state updated by [`crate::Perception::step`].
///
/// The world map persists across frames; the overlay and the polar readings
/// are replaced on every successful step.
#[derive(Clone, Debug, PartialEq)]
pub struct RoverState {
    pub worldmap: WorldMap,
    /// R = obstacle, G = target, B = navigable, each 0 or 255.
    pub vision_image: RgbImage,
    pub nav_dists: Vec<f64>,
    pub nav_angles: Vec<f64>,
    pub target_dists: Vec<f64>,
    pub target_angles: Vec<f64>,
}

impl RoverState {
    pub fn new(frame_width: usize, frame_height: usize, world_size: usize) -> Self {
        Self {
            worldmap: WorldMap::new(world_size),
            vision_image: RgbImage::new(frame_width, frame_height),
            nav_dists: Vec::new(),
            nav_angles: Vec::new(),
            target_dists: Vec::new(),
            target_angles: Vec::new(),
        }
    }

    /// Mean bearing of navigable pixels, radians.
    pub fn mean_nav_angle(&self) -> Option<f64> {
        if self.nav_angles.is_empty() {
            return None;
        }
        Some(self.nav_angles.iter().sum::<f64>() / self.nav_angles.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_nav_angle_of_empty_readings_is_none() {
        let mut s = RoverState::new(4, 4, 10);
        assert_eq!(s.mean_nav_angle(), None);
        s.nav_angles = vec![0.5, -0.1, 0.2];
        let mean = s.mean_nav_angle().expect("non-empty");
        assert!((mean - 0.2).abs() < 1e-12);
    }
}
