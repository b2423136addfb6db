//! Fixed camera-to-ground calibration.
//!
//! The source quad is a flat ground patch seen ahead of the camera; it is
//! mapped onto a small square anchored at the bottom centre of the frame, so
//! one rectified pixel corresponds to a fixed ground distance.

use nalgebra::Point2;
use rover_vision_core::{homography_from_4pt, GeometryError, Homography};
use serde::{Deserialize, Serialize};

/// Ground-patch trapezoid in the raw camera frame, `[x, y]` pixels.
pub const SOURCE_QUAD: [[f64; 2]; 4] = [
    [14.0, 140.0],
    [301.0, 140.0],
    [200.0, 96.0],
    [118.0, 96.0],
];
/// Half side of the destination square, in rectified pixels.
pub const DST_SIZE: f64 = 5.0;
/// Distance from the bottom edge to the near side of the destination square.
pub const BOTTOM_OFFSET: f64 = 6.0;
/// Side of the square world map, in cells.
pub const WORLD_SIZE: usize = 200;
/// Rover-space units per map cell for terrain (navigable and obstacle).
pub const TERRAIN_SCALE: f64 = 10.0;
/// Rover-space units per map cell for target samples.
pub const TARGET_SCALE: f64 = 15.0;
/// Evidence added to a map channel per projected pixel.
pub const MAP_WEIGHT: u64 = 255;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(
        "frame {width}x{height} cannot hold the calibration quads (need at least {min_width}x{min_height})"
    )]
    FrameTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },
    #[error("world map size must be positive")]
    EmptyWorld,
    #[error("map scale must be finite and positive (got {scale})")]
    InvalidScale { scale: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Source quad corners, `[x, y]`, in the same order as [`Calibration::destination_for`].
    pub source: [[f64; 2]; 4],
    pub dst_size: f64,
    pub bottom_offset: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            source: SOURCE_QUAD,
            dst_size: DST_SIZE,
            bottom_offset: BOTTOM_OFFSET,
        }
    }
}

impl Calibration {
    pub fn source_points(&self) -> [Point2<f64>; 4] {
        self.source.map(|[x, y]| Point2::new(x, y))
    }

    /// Destination square for a `width x height` frame: bottom-left,
    /// bottom-right, top-right, top-left.
    pub fn destination_for(&self, width: usize, height: usize) -> [Point2<f64>; 4] {
        let cx = width as f64 / 2.0;
        let bottom = height as f64 - self.bottom_offset;
        let top = height as f64 - 2.0 * self.dst_size - self.bottom_offset;
        [
            Point2::new(cx - self.dst_size, bottom),
            Point2::new(cx + self.dst_size, bottom),
            Point2::new(cx + self.dst_size, top),
            Point2::new(cx - self.dst_size, top),
        ]
    }

    /// Smallest frame that contains both quads.
    pub fn min_frame_size(&self) -> (usize, usize) {
        let mut max_x = 2.0 * self.dst_size;
        let mut max_y = 2.0 * self.dst_size + self.bottom_offset;
        for [x, y] in self.source {
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        (max_x.ceil() as usize + 1, max_y.ceil() as usize + 1)
    }

    fn check_frame(&self, width: usize, height: usize) -> Result<(), CalibrationError> {
        let (min_width, min_height) = self.min_frame_size();
        let source_inside = self
            .source
            .iter()
            .all(|&[x, y]| x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64);
        let dest_inside = self
            .destination_for(width, height)
            .iter()
            .all(|p| p.x >= 0.0 && p.y >= 0.0 && p.x < width as f64 && p.y < height as f64);

        if !source_inside || !dest_inside || width < min_width || height < min_height {
            return Err(CalibrationError::FrameTooSmall {
                width,
                height,
                min_width,
                min_height,
            });
        }
        Ok(())
    }

    /// Projective transform from the raw frame to the top-down view.
    pub fn homography_for(
        &self,
        width: usize,
        height: usize,
    ) -> Result<Homography, CalibrationError> {
        self.check_frame(width, height)?;
        let src = self.source_points();
        let dst = self.destination_for(width, height);
        Ok(homography_from_4pt(&src, &dst)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn destination_matches_reference_frame() {
        let dst = Calibration::default().destination_for(320, 160);
        let expected = [
            (155.0, 154.0),
            (165.0, 154.0),
            (165.0, 144.0),
            (155.0, 144.0),
        ];
        for (p, (x, y)) in dst.iter().zip(expected) {
            assert_abs_diff_eq!(p.x, x);
            assert_abs_diff_eq!(p.y, y);
        }
    }

    #[test]
    fn default_calibration_is_valid_for_reference_frame() {
        let h = Calibration::default()
            .homography_for(320, 160)
            .expect("reference calibration");
        let p = h.apply(Point2::new(14.0, 140.0));
        assert_abs_diff_eq!(p.x, 155.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 154.0, epsilon = 1e-6);
    }

    #[test]
    fn small_frame_is_rejected() {
        let err = Calibration::default().homography_for(200, 100).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::FrameTooSmall {
                width: 200,
                height: 100,
                min_width: 302,
                min_height: 141,
            }
        );
    }

    #[test]
    fn collinear_source_is_a_geometry_error() {
        let calib = Calibration {
            source: [[10.0, 100.0], [20.0, 100.0], [30.0, 100.0], [40.0, 100.0]],
            ..Calibration::default()
        };
        assert!(matches!(
            calib.homography_for(320, 160),
            Err(CalibrationError::Geometry(GeometryError::DegenerateQuad { .. }))
        ));
    }
}
