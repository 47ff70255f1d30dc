//! Bit-grid decoding: rectify a candidate quad into a canonical square and
//! sample its interior pattern.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::candidates::Quad;
use quadtag_core::{homography_from_4pt, warp_perspective_gray, GrayImage, GrayImageView};

/// A packed row-major bit pattern of `bits` cells.
///
/// Bit `row * side + col` is 1 when the sampled cell center is bright
/// (>= 128 after adaptive binarization).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitCode {
    pub code: u64,
    pub bits: usize,
}

impl BitCode {
    /// Hamming distance to another code of the same length.
    #[inline]
    pub fn hamming(&self, other: &BitCode) -> u32 {
        debug_assert_eq!(self.bits, other.bits);
        (self.code ^ other.code).count_ones()
    }

    #[inline]
    pub fn bit(&self, idx: usize) -> bool {
        (self.code >> idx) & 1 == 1
    }
}

/// Integer square root if `bits` is a perfect square, else `None`.
fn grid_side(bits: usize) -> Option<usize> {
    let side = (bits as f64).sqrt().round() as usize;
    (side * side == bits).then_some(side)
}

/// Otsu threshold over an 8-bit sample set.
///
/// A fixed threshold is unsuitable here because lighting varies per
/// marker; maximizing inter-class variance adapts to each patch.
fn otsu_threshold(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut min_v = 255u8;
    let mut max_v = 0u8;
    for &v in samples {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    // With one or two occupied bins the argmax below lands on the top of
    // the dark class itself; the midpoint separates the classes instead.
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total: f64 = samples.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// One erosion pass with a 3x3 structuring element.
///
/// Pixels outside the patch are treated as background, which suppresses
/// the edge ringing introduced by resampling.
fn erode_3x3(img: &GrayImage) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut m = 255u8;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    let v = if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        0
                    } else {
                        img.data[ny as usize * w + nx as usize]
                    };
                    m = m.min(v);
                }
            }
            out[y * w + x] = m;
        }
    }
    GrayImage::new(w, h, out)
}

/// Rectify one candidate quad and sample its `sqrt(bits) x sqrt(bits)`
/// pattern in row-major order.
///
/// `bits` must be a perfect square no larger than 64; violating that is a
/// caller contract error, reported with a `debug_assert!` and `None`.
/// Degenerate quads whose rectification homography cannot be built also
/// yield `None`. For the same frame and quad the result is deterministic.
pub fn decode_quad(gray: &GrayImageView<'_>, quad: &Quad, bits: usize) -> Option<BitCode> {
    let side = grid_side(bits);
    debug_assert!(
        side.is_some() && bits <= 64,
        "bit count {bits} must be a perfect square <= 64"
    );
    let side = side.filter(|_| bits <= 64)?;

    // Map the canonical square of side `bits` (TL, TR, BR, BL) onto the
    // quad, then warp back through the inverse direction per output pixel.
    let size = bits as f32;
    let square = [
        Point2::new(0.0f32, 0.0),
        Point2::new(size, 0.0),
        Point2::new(size, size),
        Point2::new(0.0, size),
    ];
    let h = homography_from_4pt(&square, &quad.corners)?;

    let patch = warp_perspective_gray(gray, h, bits, bits);

    let thr = otsu_threshold(&patch.data);
    let bin = GrayImage::new(
        patch.width,
        patch.height,
        patch
            .data
            .iter()
            .map(|&v| if v > thr { 255 } else { 0 })
            .collect(),
    );
    let bin = erode_3x3(&bin);

    // Cell centers: the patch is `side` cells of `bits / side` pixels each.
    let cell = bits / side;
    let mut code = 0u64;
    for row in 0..side {
        for col in 0..side {
            let x = col * cell + cell / 2;
            let y = row * cell + cell / 2;
            if bin.data[y * bin.width + x] >= 128 {
                code |= 1u64 << (row * side + col);
            }
        }
    }

    Some(BitCode { code, bits })
}
