use rover_vision_core::{BinaryMask, RgbImage};
use serde::{Deserialize, Serialize};

use crate::coords::PolarPoints;
use crate::world::WorldCells;

/// Everything derived from one frame, before any caller state is touched.
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    /// Top-down view of the frame.
    pub warped: RgbImage,
    pub navigable: BinaryMask,
    pub obstacle: BinaryMask,
    pub target: BinaryMask,
    pub nav_polar: PolarPoints,
    pub target_polar: PolarPoints,
    pub nav_cells: WorldCells,
    pub obstacle_cells: WorldCells,
    pub target_cells: WorldCells,
}

impl FrameAnalysis {
    /// Display overlay: R = obstacle, G = target, B = navigable.
    pub fn overlay(&self) -> RgbImage {
        let mut img = RgbImage::new(self.warped.width, self.warped.height);
        let masks = [&self.obstacle, &self.target, &self.navigable];
        for (i, px) in img.data.chunks_exact_mut(3).enumerate() {
            for (c, mask) in masks.iter().enumerate() {
                px[c] = if mask.data[i] != 0 { 255 } else { 0 };
            }
        }
        img
    }

    pub fn report(&self) -> StepReport {
        StepReport {
            navigable_pixels: self.nav_cells.len(),
            obstacle_pixels: self.obstacle_cells.len(),
            target_pixels: self.target_cells.len(),
            navigable_clipped: self.nav_cells.clipped,
            obstacle_clipped: self.obstacle_cells.clipped,
            target_clipped: self.target_cells.clipped,
        }
    }
}

/// Per-frame summary for logs and reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub navigable_pixels: usize,
    pub obstacle_pixels: usize,
    pub target_pixels: usize,
    /// Projected points saturated at the map edge, per channel.
    pub navigable_clipped: usize,
    pub obstacle_clipped: usize,
    pub target_clipped: usize,
}

impl StepReport {
    pub fn total_clipped(&self) -> usize {
        self.navigable_clipped + self.obstacle_clipped + self.target_clipped
    }
}
