//! Single-frame perception for an exploration rover.
//!
//! One forward camera frame is turned into three artifacts:
//! - a rover-centric classification overlay (obstacle / target / navigable),
//! - polar readings (distance, bearing) of navigable ground and targets,
//! - additive evidence in a persistent world map.
//!
//! ## Quickstart
//!
//! ```
//! use rover_vision::{Perception, PerceptionParams, RoverPose};
//! use rover_vision::core::RgbImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let perception = Perception::new(PerceptionParams::default(), 320, 160)?;
//! let mut state = perception.new_state();
//!
//! let frame = RgbImage::filled(320, 160, [200, 190, 180]);
//! let report = perception.step(&frame.view(), &RoverPose::new(100.0, 100.0, 0.0), &mut state)?;
//! println!("navigable pixels: {}", report.navigable_pixels);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `rover_vision::core`: RGB frames, masks, homographies, warping.
//! - [`calibration`]: fixed camera-to-ground constants.
//! - [`segment`]: color range thresholds and presets.
//! - [`coords`]: image to rover-frame and polar conversion.
//! - [`world`]: rover-frame to world-grid projection.
//! - [`worldmap`]: the accumulating evidence grid.
//! - `rover_vision::io` (feature `image`): conversions from `image::RgbImage` and PNG export.

pub use rover_vision_core as core;

pub mod calibration;
pub mod coords;
pub mod segment;
pub mod world;
pub mod worldmap;

mod perception;

#[cfg(feature = "image")]
pub mod io;

pub use calibration::{Calibration, CalibrationError};
pub use coords::{rover_coords, to_polar_coords, PolarPoints, RoverPoints};
pub use perception::{
    FrameAnalysis, Perception, PerceptionError, PerceptionParams, RoverPose, RoverState,
    StepReport,
};
pub use segment::{color_thresh, ColorThreshold};
pub use world::{pix_to_world, rotate_pix, translate_pix, WorldCells};
pub use worldmap::{MapChannel, WorldMap};
