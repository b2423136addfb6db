use crate::{sample_bilinear_rgb_u8, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors raised while building a projective transform from point correspondences.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("quadrilateral is degenerate: points around index {index} are collinear")]
    DegenerateQuad { index: usize },
    #[error("linear system for the projective transform is singular")]
    Singular,
    #[error("homography not invertible")]
    NonInvertible,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    pub fn inverse(&self) -> Result<Self, GeometryError> {
        self.h
            .try_inverse()
            .map(Self::new)
            .ok_or(GeometryError::NonInvertible)
    }
}

/// Twice the signed area of the triangle `a b c`.
#[inline]
fn cross(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Reject quads where any three corners are collinear (or coincide).
///
/// `index` in the returned error is the corner left out of the offending triple.
pub fn check_quad(pts: &[Point2<f64>; 4]) -> Result<(), GeometryError> {
    let mut scale = 0.0_f64;
    for p in pts {
        scale = scale.max(p.x.abs()).max(p.y.abs());
    }
    let eps = 1e-9 * scale.max(1.0).powi(2);

    for skip in 0..4 {
        let tri: Vec<Point2<f64>> = (0..4).filter(|&i| i != skip).map(|i| pts[i]).collect();
        if cross(tri[0], tri[1], tri[2]).abs() <= eps {
            return Err(GeometryError::DegenerateQuad { index: skip });
        }
    }
    Ok(())
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let n = 4.0_f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });

    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Result<Matrix3<f64>, GeometryError> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return Err(GeometryError::Singular);
    }
    Ok(h / s)
}

/// Compute H such that: dst ~ H * src (projective), using 4 point correspondences.
/// - `src`: points in the input image plane
/// - `dst`: where those points should land in the output plane
///
/// Corner order must be consistent between `src` and `dst`.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, GeometryError> {
    check_quad(src)?;
    check_quad(dst)?;

    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(GeometryError::Singular)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // H = T_dst^{-1} * Hn * T_src
    let t_dst_inv = t_dst.try_inverse().ok_or(GeometryError::NonInvertible)?;
    let h = normalize_homography(t_dst_inv * hn * t_src)?;

    Ok(Homography::new(h))
}

/// Warp a full frame: every output pixel `(x, y)` is pulled from
/// `H_dst_from_src^{-1} * (x, y)` in the source with bilinear interpolation.
/// Samples landing outside the source read as black, including points near
/// the horizon line where the inverse transform diverges.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, h_dst_from_src), fields(width = src.width, height = src.height))
)]
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_dst_from_src: &Homography,
    out_w: usize,
    out_h: usize,
) -> Result<RgbImage, GeometryError> {
    let h_src_from_dst = h_dst_from_src.inverse()?;
    let mut out = RgbImage::new(out_w, out_h);
    let x_range = -1.0..=src.width as f64;
    let y_range = -1.0..=src.height as f64;

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = h_src_from_dst.apply(Point2::new(x as f64, y as f64));
            // Also rejects NaN.
            if !x_range.contains(&ps.x) || !y_range.contains(&ps.y) {
                continue;
            }
            let v = sample_bilinear_rgb_u8(src, ps.x as f32, ps.y as f32);
            out.put_pixel(x, y, v);
        }
    }

    Ok(out)
}
