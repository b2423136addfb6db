//! Rover frame to world grid projection.

use nalgebra::{Point2, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::coords::RoverPoints;

/// Integer world-grid cells, one per projected point, each axis in `[0, size - 1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldCells {
    pub xs: Vec<usize>,
    pub ys: Vec<usize>,
    /// Points that had at least one axis saturated at the map edge.
    pub clipped: usize,
}

impl WorldCells {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

/// Counter-clockwise rotation by `yaw_deg` degrees.
pub fn rotate_pix(points: &RoverPoints, yaw_deg: f64) -> RoverPoints {
    let rot = Rotation2::new(yaw_deg.to_radians());
    let (xs, ys) = points
        .xs
        .iter()
        .zip(&points.ys)
        .map(|(&x, &y)| {
            let v = rot * Vector2::new(x, y);
            (v.x, v.y)
        })
        .unzip();
    RoverPoints { xs, ys }
}

/// Scale down by `scale` then shift by the rover position.
pub fn translate_pix(points: &RoverPoints, pos: Point2<f64>, scale: f64) -> RoverPoints {
    RoverPoints {
        xs: points.xs.iter().map(|&x| x / scale + pos.x).collect(),
        ys: points.ys.iter().map(|&y| y / scale + pos.y).collect(),
    }
}

/// Truncate toward zero, then saturate into `[0, max]`.
#[inline]
fn clip_cell(v: f64, max: i64) -> (usize, bool) {
    let t = v as i64;
    let c = t.clamp(0, max);
    (c as usize, c != t || !v.is_finite())
}

/// Rotate, scale, translate and clip rover-frame points onto a
/// `world_size x world_size` grid. Order matters: rotation happens in rover
/// units, before scaling.
pub fn pix_to_world(
    points: &RoverPoints,
    pos: Point2<f64>,
    yaw_deg: f64,
    world_size: usize,
    scale: f64,
) -> WorldCells {
    let rotated = rotate_pix(points, yaw_deg);
    let translated = translate_pix(&rotated, pos, scale);

    let max = world_size.saturating_sub(1) as i64;
    let mut out = WorldCells {
        xs: Vec::with_capacity(points.len()),
        ys: Vec::with_capacity(points.len()),
        clipped: 0,
    };
    for (&x, &y) in translated.xs.iter().zip(&translated.ys) {
        let (cx, x_clipped) = clip_cell(x, max);
        let (cy, y_clipped) = clip_cell(y, max);
        out.xs.push(cx);
        out.ys.push(cy);
        if x_clipped || y_clipped {
            out.clipped += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pts(xs: &[f64], ys: &[f64]) -> RoverPoints {
        RoverPoints {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        }
    }

    #[test]
    fn zero_yaw_is_identity() {
        let p = pts(&[1.5, -3.0, 40.0], &[2.0, 7.25, -1.0]);
        assert_eq!(rotate_pix(&p, 0.0), p);
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let r = rotate_pix(&pts(&[10.0], &[0.0]), 90.0);
        assert_abs_diff_eq!(r.xs[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.ys[0], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn translation_scales_before_shifting() {
        let t = translate_pix(&pts(&[20.0], &[-30.0]), Point2::new(100.0, 50.0), 10.0);
        assert_eq!(t.xs, vec![102.0]);
        assert_eq!(t.ys, vec![47.0]);
    }

    #[test]
    fn origin_lands_on_rover_cell() {
        let origin = pts(&[0.0], &[0.0]);
        let cells = pix_to_world(&origin, Point2::new(100.0, 100.0), 0.0, 200, 10.0);
        assert_eq!(cells.xs, vec![100]);
        assert_eq!(cells.ys, vec![100]);
        assert_eq!(cells.clipped, 0);
    }

    #[test]
    fn truncation_is_toward_zero() {
        let cells = pix_to_world(
            &pts(&[5.0, 9.0], &[0.0, 0.0]),
            Point2::new(99.9, 10.55),
            0.0,
            200,
            10.0,
        );
        // 100.4 -> 100, 100.8 -> 100; 10.55 -> 10
        assert_eq!(cells.xs, vec![100, 100]);
        assert_eq!(cells.ys, vec![10, 10]);
    }

    #[test]
    fn out_of_range_points_saturate() {
        let cells = pix_to_world(
            &pts(&[1e6, -1e6, 0.0], &[0.0, 0.0, f64::NAN]),
            Point2::new(5.0, 5.0),
            0.0,
            200,
            10.0,
        );
        assert_eq!(cells.xs, vec![199, 0, 5]);
        assert_eq!(cells.ys, vec![5, 5, 0]);
        assert_eq!(cells.clipped, 3);
    }
}
