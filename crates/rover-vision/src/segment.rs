//! Per-channel range thresholding of the rectified frame.

use rover_vision_core::{BinaryMask, RgbImageView};
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` bound on each of the three channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorThreshold {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

/// Bright, unobstructed ground.
pub const NAVIGABLE: ColorThreshold = ColorThreshold {
    min: [150, 150, 150],
    max: [255, 255, 255],
};

/// Dark terrain and rock faces.
pub const OBSTACLE: ColorThreshold = ColorThreshold {
    min: [0, 0, 0],
    max: [90, 90, 90],
};

/// Yellow sample rocks.
pub const TARGET: ColorThreshold = ColorThreshold {
    min: [130, 110, 0],
    max: [255, 230, 60],
};

impl ColorThreshold {
    #[inline]
    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        (0..3).all(|c| rgb[c] >= self.min[c] && rgb[c] <= self.max[c])
    }
}

/// Mark every pixel whose three channels all fall inside `threshold`.
///
/// Presets are not required to partition the color space; a pixel may land in
/// zero, one or several masks.
pub fn color_thresh(img: &RgbImageView<'_>, threshold: &ColorThreshold) -> BinaryMask {
    let mut mask = BinaryMask::new(img.width, img.height);
    for (dst, px) in mask.data.iter_mut().zip(img.data.chunks_exact(3)) {
        *dst = u8::from(threshold.contains([px[0], px[1], px[2]]));
    }
    mask
}
