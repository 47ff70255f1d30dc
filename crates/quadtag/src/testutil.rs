//! Synthetic marker rendering shared by unit tests.

use crate::candidates::Quad;
use quadtag_core::GrayImage;

/// Cells per marker side: a 1-cell dark border around a 4x4 payload.
pub const GRID_SIDE: usize = 6;

/// Render a reference marker image: a 6x6 cell grid whose outer ring is
/// dark and whose 4x4 interior encodes `pattern` row-major (bit
/// `(row-1)*4 + (col-1)`; 1 = bright cell). Each cell is `cell_px` pixels.
pub fn build_marker_image(pattern: u16, cell_px: usize) -> GrayImage {
    let side = GRID_SIDE * cell_px;
    let mut data = vec![0u8; side * side];

    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            let on_border = row == 0 || col == 0 || row == GRID_SIDE - 1 || col == GRID_SIDE - 1;
            let bright = if on_border {
                false
            } else {
                let p = (row - 1) * 4 + (col - 1);
                (pattern >> p) & 1 == 1
            };
            let value = if bright { 255 } else { 0 };
            for dy in 0..cell_px {
                for dx in 0..cell_px {
                    let x = col * cell_px + dx;
                    let y = row * cell_px + dy;
                    data[y * side + x] = value;
                }
            }
        }
    }

    GrayImage::new(side, side, data)
}

/// The quad covering an entire image, corner order TL, TR, BR, BL.
pub fn full_image_quad(img: &GrayImage) -> Quad {
    Quad::covering(img.width, img.height)
}
