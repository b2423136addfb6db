use nalgebra::Point2;
use rover_vision_core::{warp_perspective_rgb, Homography, RgbImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{FrameAnalysis, PerceptionError, PerceptionParams, RoverPose, RoverState, StepReport};
use crate::calibration::CalibrationError;
use crate::coords::{rover_coords, to_polar_coords};
use crate::segment::color_thresh;
use crate::world::pix_to_world;
use crate::worldmap::MapChannel;

/// Perception for a fixed frame size.
///
/// Construction validates the calibration and precomputes the rectifying
/// transform; per-frame calls never re-derive it.
#[derive(Clone, Debug)]
pub struct Perception {
    params: PerceptionParams,
    width: usize,
    height: usize,
    h_top_from_cam: Homography,
}

impl Perception {
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(params)))]
    pub fn new(
        params: PerceptionParams,
        width: usize,
        height: usize,
    ) -> Result<Self, CalibrationError> {
        if params.world_size == 0 {
            return Err(CalibrationError::EmptyWorld);
        }
        for scale in [params.terrain_scale, params.target_scale] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(CalibrationError::InvalidScale { scale });
            }
        }

        let h_top_from_cam = params.calibration.homography_for(width, height)?;
        log::debug!(
            "calibrated {}x{} frame, world {}x{}",
            width,
            height,
            params.world_size,
            params.world_size
        );

        Ok(Self {
            params,
            width,
            height,
            h_top_from_cam,
        })
    }

    pub fn frame_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Fresh state sized for this pipeline.
    pub fn new_state(&self) -> RoverState {
        RoverState::new(self.width, self.height, self.params.world_size)
    }

    fn check_frame(&self, frame: &RgbImageView<'_>) -> Result<(), PerceptionError> {
        if frame.width != self.width || frame.height != self.height {
            return Err(PerceptionError::ShapeMismatch {
                what: "frame",
                expected_w: self.width,
                expected_h: self.height,
                got_w: frame.width,
                got_h: frame.height,
            });
        }
        let expected = frame.expected_len();
        if frame.data.len() != expected {
            return Err(PerceptionError::InvalidRgbBuffer {
                expected,
                got: frame.data.len(),
            });
        }
        Ok(())
    }

    fn check_state(&self, state: &RoverState) -> Result<(), PerceptionError> {
        let overlay = &state.vision_image;
        if overlay.width != self.width
            || overlay.height != self.height
            || overlay.data.len() != self.width * self.height * 3
        {
            return Err(PerceptionError::ShapeMismatch {
                what: "vision overlay",
                expected_w: self.width,
                expected_h: self.height,
                got_w: overlay.width,
                got_h: overlay.height,
            });
        }
        if state.worldmap.size() != self.params.world_size {
            return Err(PerceptionError::WorldSizeMismatch {
                expected: self.params.world_size,
                got: state.worldmap.size(),
            });
        }
        Ok(())
    }

    /// The rectified view and all three masks must match the calibrated
    /// frame size, so the overlay written into the state does too.
    fn check_analysis(&self, analysis: &FrameAnalysis) -> Result<(), PerceptionError> {
        let (w, h) = (self.width, self.height);
        let mismatch = |what: &'static str, got_w: usize, got_h: usize| {
            Err(PerceptionError::ShapeMismatch {
                what,
                expected_w: w,
                expected_h: h,
                got_w,
                got_h,
            })
        };

        let warped = &analysis.warped;
        if warped.width != w || warped.height != h || warped.data.len() != w * h * 3 {
            return mismatch("rectified view", warped.width, warped.height);
        }
        let masks = [
            ("navigable mask", &analysis.navigable),
            ("obstacle mask", &analysis.obstacle),
            ("target mask", &analysis.target),
        ];
        for (what, mask) in masks {
            if mask.width != w || mask.height != h || mask.data.len() != w * h {
                return mismatch(what, mask.width, mask.height);
            }
        }
        Ok(())
    }

    /// Run the whole chain on one frame without touching any caller state.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(x = pose.x, y = pose.y, yaw = pose.yaw))
    )]
    pub fn analyze(
        &self,
        frame: &RgbImageView<'_>,
        pose: &RoverPose,
    ) -> Result<FrameAnalysis, PerceptionError> {
        self.check_frame(frame)?;
        let p = &self.params;

        let warped = warp_perspective_rgb(frame, &self.h_top_from_cam, self.width, self.height)
            .map_err(CalibrationError::from)?;
        let top = warped.view();

        let navigable = color_thresh(&top, &p.navigable);
        let target = color_thresh(&top, &p.target);
        let obstacle = color_thresh(&top, &p.obstacle);

        let nav_pts = rover_coords(&navigable);
        let target_pts = rover_coords(&target);
        let obstacle_pts = rover_coords(&obstacle);

        let pos = Point2::new(pose.x, pose.y);
        let nav_cells = pix_to_world(&nav_pts, pos, pose.yaw, p.world_size, p.terrain_scale);
        let obstacle_cells =
            pix_to_world(&obstacle_pts, pos, pose.yaw, p.world_size, p.terrain_scale);
        let target_cells = pix_to_world(&target_pts, pos, pose.yaw, p.world_size, p.target_scale);

        Ok(FrameAnalysis {
            nav_polar: to_polar_coords(&nav_pts),
            target_polar: to_polar_coords(&target_pts),
            warped,
            navigable,
            obstacle,
            target,
            nav_cells,
            obstacle_cells,
            target_cells,
        })
    }

    /// Write an analysis into `state`: overlay and polar readings are
    /// replaced, map evidence is added. An analysis whose images do not
    /// match this pipeline's frame size is rejected before any write.
    pub fn commit(
        &self,
        analysis: FrameAnalysis,
        state: &mut RoverState,
    ) -> Result<StepReport, PerceptionError> {
        self.check_state(state)?;
        self.check_analysis(&analysis)?;
        let report = analysis.report();
        let weight = self.params.map_weight;

        state.vision_image = analysis.overlay();

        let map = &mut state.worldmap;
        map.accumulate(MapChannel::Obstacle, &analysis.obstacle_cells, weight);
        map.accumulate(MapChannel::Target, &analysis.target_cells, weight);
        map.accumulate(MapChannel::Navigable, &analysis.nav_cells, weight);

        state.nav_dists = analysis.nav_polar.dists;
        state.nav_angles = analysis.nav_polar.angles;
        state.target_dists = analysis.target_polar.dists;
        state.target_angles = analysis.target_polar.angles;

        log::debug!(
            "frame: nav={} obstacle={} target={} clipped={}",
            report.navigable_pixels,
            report.obstacle_pixels,
            report.target_pixels,
            report.total_clipped()
        );
        Ok(report)
    }

    /// Analyze `frame` at `pose` and fold the result into `state`.
    ///
    /// On error `state` is left exactly as it was.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame, state), fields(yaw = pose.yaw))
    )]
    pub fn step(
        &self,
        frame: &RgbImageView<'_>,
        pose: &RoverPose,
        state: &mut RoverState,
    ) -> Result<StepReport, PerceptionError> {
        self.check_state(state)?;
        let analysis = self.analyze(frame, pose)?;
        self.commit(analysis, state)
    }
}
