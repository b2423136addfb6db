//! Single-frame perception pipeline.
//!
//! This module wires together perspective rectification, color segmentation,
//! rover-frame conversion, world projection and map accumulation.

mod error;
mod params;
mod pipeline;
mod result;
mod state;

pub use error::PerceptionError;
pub use params::PerceptionParams;
pub use pipeline::Perception;
pub use result::{FrameAnalysis, StepReport};
pub use state::{RoverPose, RoverState};
