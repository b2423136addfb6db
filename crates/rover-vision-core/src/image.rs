/// Borrowed interleaved RGB frame.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major RGBRGB..., len = w*h*3
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// All-zero (black) image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 3],
        }
    }

    /// Image filled with a single color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.view().pixel(x, y)
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

impl<'a> RgbImageView<'a> {
    /// Expected buffer length for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width * self.height * 3
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Single-channel mask congruent to a frame; every cell is 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinaryMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, active: bool) {
        self.data[y * self.width + x] = u8::from(active);
    }

    pub fn count_active(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Active cells as `(row, col)` in row-major scan order.
    pub fn active_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(move |(i, _)| (i / w, i % w))
    }
}

#[inline]
fn get_rgb(src: &RgbImageView<'_>, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0.0; 3];
    }
    let p = src.pixel(x as usize, y as usize);
    [p[0] as f32, p[1] as f32, p[2] as f32]
}

/// Bilinear sample of all three channels; neighbours outside the frame read as zero.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImageView<'_>, x: f32, y: f32) -> [f32; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    // Far-away coordinates saturate at i32::MAX; keep the neighbour in range.
    let x1 = x0.saturating_add(1);
    let y1 = y0.saturating_add(1);

    let p10 = get_rgb(src, x1, y0);
    let p01 = get_rgb(src, x0, y1);
    let p11 = get_rgb(src, x1, y1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = a + fy * (b - a);
    }
    out
}

#[inline]
pub fn sample_bilinear_rgb_u8(src: &RgbImageView<'_>, x: f32, y: f32) -> [u8; 3] {
    sample_bilinear_rgb(src, x, y).map(|v| v.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_pixels_follow_scan_order() {
        let mut m = BinaryMask::new(4, 3);
        m.set(3, 0, true);
        m.set(1, 2, true);
        m.set(0, 1, true);
        let px: Vec<_> = m.active_pixels().collect();
        assert_eq!(px, vec![(0, 3), (1, 0), (2, 1)]);
        assert_eq!(m.count_active(), 3);
    }

    #[test]
    fn bilinear_is_exact_at_pixel_centres_and_zero_outside() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(1, 1, [10, 200, 30]);
        let v = img.view();
        assert_eq!(sample_bilinear_rgb_u8(&v, 1.0, 1.0), [10, 200, 30]);
        assert_eq!(sample_bilinear_rgb_u8(&v, -5.0, 1.0), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 0.5, 1.0), [5, 100, 15]);
    }

    #[test]
    fn huge_coordinates_read_as_zero() {
        let img = RgbImage::filled(3, 2, [50, 60, 70]);
        let v = img.view();
        assert_eq!(sample_bilinear_rgb_u8(&v, 1.6e18, 1.0), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 0.0, f32::MAX), [0, 0, 0]);
    }

    #[test]
    fn filled_image_has_expected_layout() {
        let img = RgbImage::filled(2, 2, [1, 2, 3]);
        assert_eq!(img.data, vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3]);
        assert_eq!(img.view().expected_len(), 12);
    }
}
