//! Image space to rover-centric Cartesian and polar coordinates.

use rover_vision_core::BinaryMask;
use serde::{Deserialize, Serialize};

/// Active mask pixels in the rover frame: `x` forward, `y` to the left.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoverPoints {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl RoverPoints {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Distance and bearing (radians, `atan2` range) of each rover-frame point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarPoints {
    pub dists: Vec<f64>,
    pub angles: Vec<f64>,
}

impl PolarPoints {
    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }
}

/// Rover-centric coordinates of every active pixel, in mask scan order.
///
/// The origin is `(row, col) = (height, height)`: the horizontal centre uses the
/// image height, not the width. The calibration and the world projection are
/// tuned against this, so it must not be "corrected" in isolation.
pub fn rover_coords(mask: &BinaryMask) -> RoverPoints {
    let h = mask.height as i64;
    let n = mask.count_active();
    let mut out = RoverPoints {
        xs: Vec::with_capacity(n),
        ys: Vec::with_capacity(n),
    };
    for (row, col) in mask.active_pixels() {
        out.xs.push((row as i64 - h).abs() as f64);
        out.ys.push(-(col as i64 - h) as f64);
    }
    out
}

pub fn to_polar_coords(points: &RoverPoints) -> PolarPoints {
    let (dists, angles) = points
        .xs
        .iter()
        .zip(&points.ys)
        .map(|(&x, &y)| (x.hypot(y), y.atan2(x)))
        .unzip();
    PolarPoints { dists, angles }
}
