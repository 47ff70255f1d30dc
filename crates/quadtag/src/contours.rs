//! Binary contour extraction (Suzuki-Abe border following).
//!
//! Operates on a binary mask where non-zero pixels are foreground. Outer
//! borders and hole borders are labeled separately so callers can keep
//! only the outermost contours.

use nalgebra::Point2;
use quadtag_core::GrayImageView;

/// One traced boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// Boundary pixel coordinates in trace order.
    pub points: Vec<Point2<i32>>,
    /// True when this contour bounds a hole inside another region.
    pub hole: bool,
}

/// 8-connected neighbor offsets (x, y), counter-clockwise from east.
const NEIGHBORS: [[i32; 2]; 8] = [
    [1, 0],
    [1, -1],
    [0, -1],
    [-1, -1],
    [-1, 0],
    [-1, 1],
    [0, 1],
    [1, 1],
];

/// Flattened index offsets for the 8 neighbors in a row-major buffer of
/// the given width, duplicated so a sweep can run past index 7 without
/// wrapping.
fn neighbor_deltas(width: i32) -> [i32; 16] {
    let mut deltas = [0i32; 16];
    for (i, n) in NEIGHBORS.iter().enumerate() {
        let delta = n[0] + n[1] * width;
        deltas[i] = delta;
        deltas[i + 8] = delta;
    }
    deltas
}

/// Copy the mask into an i32 scratch buffer with a one-pixel zero border,
/// compressing pixels to 0/1.
fn pad_binary(mask: &GrayImageView<'_>, dst: &mut [i32]) {
    let (w, h) = (mask.width, mask.height);
    let bw = w + 2;
    dst[..bw].fill(0);
    dst[(h + 1) * bw..].fill(0);
    for y in 0..h {
        let row = &mut dst[(y + 1) * bw..(y + 2) * bw];
        row[0] = 0;
        row[w + 1] = 0;
        for x in 0..w {
            row[x + 1] = i32::from(mask.data[y * w + x] != 0);
        }
    }
}

/// Trace a single border starting at `pos`, marking visited pixels with
/// `nbd` labels in the scratch buffer.
fn follow_border(
    buf: &mut [i32],
    pos: usize,
    nbd: i32,
    mut point: Point2<i32>,
    hole: bool,
    deltas: &[i32; 16],
) -> Contour {
    let mut contour = Contour {
        points: Vec::new(),
        hole,
    };

    // Initial probe direction: west for outer borders, east for holes.
    let mut s: usize = if hole { 0 } else { 4 };
    let mut s_end = s;
    let pos1;

    loop {
        s = s.wrapping_sub(1) & 7;
        let probe = (pos as isize + deltas[s] as isize) as usize;
        if buf[probe] != 0 {
            pos1 = probe;
            break;
        }
        if s == s_end {
            // Isolated pixel.
            buf[pos] = -nbd;
            contour.points.push(point);
            return contour;
        }
    }

    let mut pos3 = pos;
    loop {
        s_end = s;

        let mut pos4;
        loop {
            s = (s + 1) & 15;
            pos4 = (pos3 as isize + deltas[s] as isize) as usize;
            if buf[pos4] != 0 {
                break;
            }
        }
        s &= 7;

        // Right-side-exposed pixels get a negative label; the wrapping
        // comparison mirrors the examined-directions test of the original
        // algorithm.
        if (s.wrapping_sub(1) as u32) < s_end as u32 {
            buf[pos3] = -nbd;
        } else if buf[pos3] == 1 {
            buf[pos3] = nbd;
        }

        contour.points.push(point);
        point.x += NEIGHBORS[s][0];
        point.y += NEIGHBORS[s][1];

        if pos4 == pos && pos3 == pos1 {
            break;
        }
        pos3 = pos4;
        s = (s + 4) & 7;
    }

    contour
}

/// Extract all region borders from a binary mask.
///
/// Returns outer contours and hole contours in scan order; check
/// [`Contour::hole`] to distinguish them.
pub fn find_contours(mask: &GrayImageView<'_>) -> Vec<Contour> {
    let (w, h) = (mask.width, mask.height);
    let bw = w + 2;
    let mut buf = vec![0i32; bw * (h + 2)];
    pad_binary(mask, &mut buf);

    let deltas = neighbor_deltas(bw as i32);
    let mut contours = Vec::new();

    let mut pos = bw + 1; // first interior pixel
    let mut nbd = 1;

    for y in 0..h {
        for x in 0..w {
            let pix = buf[pos];

            if pix != 0 {
                let outer = pix == 1 && buf[pos - 1] == 0;
                let hole = !outer && pix >= 1 && buf[pos + 1] == 0;

                if outer || hole {
                    nbd += 1;
                    let start = Point2::new(x as i32, y as i32);
                    contours.push(follow_border(&mut buf, pos, nbd, start, hole, &deltas));
                }
            }

            pos += 1;
        }
        pos += 2; // skip right border and next row's left border
    }

    contours
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadtag_core::GrayImage;

    fn mask(w: usize, h: usize, fill: &[(usize, usize)]) -> GrayImage {
        let mut data = vec![0u8; w * h];
        for &(x, y) in fill {
            data[y * w + x] = 255;
        }
        GrayImage::new(w, h, data)
    }

    #[test]
    fn ring_yields_outer_and_hole_borders() {
        // 3x3 ring of foreground with an empty center.
        let mut fill = Vec::new();
        for y in 1..4 {
            for x in 1..4 {
                if !(x == 2 && y == 2) {
                    fill.push((x, y));
                }
            }
        }
        let img = mask(5, 5, &fill);
        let contours = find_contours(&img.view());

        assert_eq!(contours.len(), 2);
        assert!(!contours[0].hole);
        assert!(contours[1].hole);
    }

    #[test]
    fn solid_square_yields_single_outer_border() {
        let mut fill = Vec::new();
        for y in 2..7 {
            for x in 2..7 {
                fill.push((x, y));
            }
        }
        let img = mask(10, 10, &fill);
        let contours = find_contours(&img.view());

        assert_eq!(contours.len(), 1);
        assert!(!contours[0].hole);

        // Every traced point lies on the square's boundary.
        for p in &contours[0].points {
            let on_x = p.x == 2 || p.x == 6;
            let on_y = p.y == 2 || p.y == 6;
            assert!(on_x || on_y, "interior point {p:?} in border trace");
        }
        // All four corners are visited.
        for corner in [(2, 2), (6, 2), (6, 6), (2, 6)] {
            assert!(contours[0]
                .points
                .iter()
                .any(|p| (p.x, p.y) == (corner.0, corner.1)));
        }
    }

    #[test]
    fn isolated_pixel_is_a_one_point_contour() {
        let img = mask(4, 4, &[(2, 1)]);
        let contours = find_contours(&img.view());
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 1);
        assert_eq!(contours[0].points[0], Point2::new(2, 1));
    }

    #[test]
    fn empty_mask_yields_no_contours() {
        let img = GrayImage::new(6, 4, vec![0; 24]);
        assert!(find_contours(&img.view()).is_empty());
    }
}
