//! Synthetic scene helpers for the pipeline tests.

use quadtag_core::GrayImage;

/// Cells per marker side: a 1-cell dark border around a 4x4 payload.
pub const GRID_SIDE: usize = 6;

/// Render a reference marker: 6x6 cells, dark outer ring, 4x4 interior
/// encoding `pattern` row-major (bit `(row-1)*4 + (col-1)`; 1 = bright).
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
                    data[(row * cell_px + dy) * side + col * cell_px + dx] = value;
                }
            }
        }
    }

    GrayImage::new(side, side, data)
}

/// Paste `marker` into `frame` with its top-left corner at `(x0, y0)`.
pub fn paste(frame: &mut GrayImage, marker: &GrayImage, x0: usize, y0: usize) {
    for y in 0..marker.height {
        for x in 0..marker.width {
            frame.data[(y0 + y) * frame.width + x0 + x] = marker.data[y * marker.width + x];
        }
    }
}

/// A white frame of the given size.
pub fn white_frame(width: usize, height: usize) -> GrayImage {
    GrayImage::new(width, height, vec![255; width * height])
}
