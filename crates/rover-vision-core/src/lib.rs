//! Pixel containers and projective geometry for rover vision.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about rovers, maps or color classes; it provides RGB frames, binary masks,
//! 4-point projective transforms and a full-frame perspective warp.

mod homography;
mod image;

pub use homography::{
    check_quad, homography_from_4pt, warp_perspective_rgb, GeometryError, Homography,
};
pub use image::{sample_bilinear_rgb, sample_bilinear_rgb_u8, BinaryMask, RgbImage, RgbImageView};

pub use nalgebra::Point2;
