#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Rotate the image 90 degrees clockwise.
    ///
    /// Used for dictionary construction, where each reference marker is
    /// physically rotated and re-decoded rather than having its bit pattern
    /// permuted algebraically.
    pub fn rotate90_cw(&self) -> GrayImage {
        let (w, h) = (self.width, self.height);
        let (out_w, out_h) = (h, w);
        let mut out = vec![0u8; out_w * out_h];
        for y in 0..out_h {
            for x in 0..out_w {
                out[y * out_w + x] = self.data[(h - 1 - x) * w + y];
            }
        }
        GrayImage {
            width: out_w,
            height: out_h,
            data: out,
        }
    }
}

/// Convert an interleaved 1-, 3-, or 4-channel frame to a gray image.
///
/// Multi-channel input is reduced with integer BT.601 luma weights; a
/// fourth channel (alpha) is ignored. Channel order is assumed RGB(A).
pub fn gray_from_interleaved(width: usize, height: usize, channels: usize, data: &[u8]) -> GrayImage {
    assert!(
        matches!(channels, 1 | 3 | 4),
        "unsupported channel count {channels}"
    );
    assert_eq!(data.len(), width * height * channels);

    let mut out = Vec::with_capacity(width * height);
    match channels {
        1 => out.extend_from_slice(data),
        _ => {
            for px in data.chunks_exact(channels) {
                let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                out.push(((77 * r + 150 * g + 29 * b) >> 8) as u8);
            }
        }
    }

    GrayImage {
        width,
        height,
        data: out,
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate90_cw_two_by_two() {
        let img = GrayImage::new(2, 2, vec![1, 2, 3, 4]);
        let r = img.rotate90_cw();
        assert_eq!(r.width, 2);
        assert_eq!(r.height, 2);
        // [1 2]      [3 1]
        // [3 4]  ->  [4 2]
        assert_eq!(r.data, vec![3, 1, 4, 2]);
    }

    #[test]
    fn rotate90_four_times_is_identity() {
        let img = GrayImage::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        let r = img.rotate90_cw().rotate90_cw().rotate90_cw().rotate90_cw();
        assert_eq!(r.width, img.width);
        assert_eq!(r.height, img.height);
        assert_eq!(r.data, img.data);
    }

    #[test]
    fn luma_conversion_matches_single_channel_copy() {
        let rgb = vec![255, 255, 255, 0, 0, 0];
        let g = gray_from_interleaved(2, 1, 3, &rgb);
        assert!(g.data[0] >= 253);
        assert_eq!(g.data[1], 0);

        let mono = vec![7u8, 42];
        let g = gray_from_interleaved(2, 1, 1, &mono);
        assert_eq!(g.data, mono);
    }

    #[test]
    fn bilinear_interpolates_midpoint() {
        let img = GrayImage::new(2, 1, vec![0, 100]);
        let v = sample_bilinear(&img.view(), 0.5, 0.0);
        assert!((v - 50.0).abs() < 1e-4);
    }
}
