//! Glue between the `image` crate and the lightweight core types.

use std::path::Path;

use rover_vision_core::{RgbImage, RgbImageView};

use crate::PerceptionError;

/// Borrow an `image::RgbImage` as a core view.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Build a core frame from a raw interleaved RGB buffer.
pub fn rgb_image_from_slice(
    width: usize,
    height: usize,
    pixels: &[u8],
) -> Result<RgbImage, PerceptionError> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .ok_or(PerceptionError::InvalidRgbBuffer {
            expected: usize::MAX,
            got: pixels.len(),
        })?;
    if pixels.len() != expected {
        return Err(PerceptionError::InvalidRgbBuffer {
            expected,
            got: pixels.len(),
        });
    }
    Ok(RgbImage {
        width,
        height,
        data: pixels.to_vec(),
    })
}

/// Copy a core frame into an `image::RgbImage`.
pub fn to_image_rgb(img: &RgbImage) -> Result<::image::RgbImage, PerceptionError> {
    let invalid = PerceptionError::InvalidRgbBuffer {
        expected: img.width * img.height * 3,
        got: img.data.len(),
    };
    let (Ok(w), Ok(h)) = (u32::try_from(img.width), u32::try_from(img.height)) else {
        return Err(invalid);
    };
    ::image::RgbImage::from_raw(w, h, img.data.clone()).ok_or(invalid)
}

/// Load any format `image` can decode and convert it to RGB8.
pub fn load_rgb(path: &Path) -> ::image::ImageResult<::image::RgbImage> {
    Ok(::image::ImageReader::open(path)?.decode()?.to_rgb8())
}

/// Write a core frame as PNG.
pub fn save_png(img: &RgbImage, path: &Path) -> ::image::ImageResult<()> {
    ::image::save_buffer(
        path,
        &img.data,
        img.width as u32,
        img.height as u32,
        ::image::ExtendedColorType::Rgb8,
    )
}
