//! Quadrilateral candidate extraction.
//!
//! Binarizes a frame, traces the outer contours, and filters them down to
//! convex 4-corner candidates in canonical order. Rejection here is a
//! normal filtering outcome, never an error.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::contours::find_contours;
use crate::polygon::{
    approx_poly_dp, bounding_box, is_convex, perimeter, point_in_polygon, polygon_area,
};
use quadtag_core::{GrayImage, GrayImageView};

/// A marker candidate: four corners in clockwise order, starting at the
/// corner nearest the quad's own top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Point2<f32>; 4],
}

impl Quad {
    /// The quad spanning an entire `width x height` image, corner order
    /// TL, TR, BR, BL. Used when decoding a whole reference image as if it
    /// were a detected candidate.
    pub fn covering(width: usize, height: usize) -> Self {
        let w = (width - 1) as f32;
        let h = (height - 1) as f32;
        Self {
            corners: [
                Point2::new(0.0, 0.0),
                Point2::new(w, 0.0),
                Point2::new(w, h),
                Point2::new(0.0, h),
            ],
        }
    }
}

/// Candidate finder configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FinderParams {
    /// Global binarization threshold; pixels darker than this become
    /// foreground (marker borders are dark).
    pub threshold: u8,
    /// Minimum enclosed area in pixels^2.
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_eps_frac: f64,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            threshold: 85,
            min_area: 400.0,
            approx_eps_frac: 0.02,
        }
    }
}

/// Binarize and invert: dark pixels (below `threshold`) become white
/// foreground so dark-bordered markers turn into fillable blobs.
fn threshold_inverted(gray: &GrayImageView<'_>, threshold: u8) -> GrayImage {
    let data = gray
        .data
        .iter()
        .map(|&v| if v < threshold { 255 } else { 0 })
        .collect();
    GrayImage::new(gray.width, gray.height, data)
}

/// Reorder four corners into canonical form: clockwise in image
/// coordinates (y down), starting at the corner nearest the quad's own
/// top-left.
///
/// Sorting by angle about the centroid makes the result independent of the
/// winding produced by contour tracing, so any input ordering of the same
/// four points canonicalizes identically.
fn canonicalize(mut corners: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;

    // With y pointing down, ascending atan2 sweeps clockwise on screen.
    corners.sort_by(|a, b| {
        let aa = (a.y - cy).atan2(a.x - cx);
        let ab = (b.y - cy).atan2(b.x - cx);
        aa.partial_cmp(&ab).unwrap_or(std::cmp::Ordering::Equal)
    });

    let start = corners
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let sa = (a.x - cx) + (a.y - cy);
            let sb = (b.x - cx) + (b.y - cy);
            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    [
        corners[start],
        corners[(start + 1) % 4],
        corners[(start + 2) % 4],
        corners[(start + 3) % 4],
    ]
}

/// Find quadrilateral marker candidates in a gray frame.
///
/// A contour survives only if its polygon approximation has exactly four
/// vertices, is convex, encloses at least `min_area` pixels, and its
/// bounding box stays strictly inside the frame. Frames with no valid
/// quads yield an empty list.
pub fn find_candidates(gray: &GrayImageView<'_>, params: &FinderParams) -> Vec<Quad> {
    let mask = threshold_inverted(gray, params.threshold);
    let contours = find_contours(&mask.view());

    let mut quads = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        // Only outermost borders can be marker outlines. Hole borders are
        // flagged by the tracer; an outer border nested inside another
        // component (a blob floating in a marker's interior) is not, so
        // it is rejected by containment against the other outer borders.
        if contour.hole {
            continue;
        }
        let nested = contours.iter().enumerate().any(|(j, other)| {
            j != i && !other.hole && point_in_polygon(contour.points[0], &other.points)
        });
        if nested {
            continue;
        }

        let eps = params.approx_eps_frac * perimeter(&contour.points);
        let poly = approx_poly_dp(&contour.points, eps);

        if poly.len() != 4 || !is_convex(&poly) {
            continue;
        }
        if polygon_area(&poly) < params.min_area {
            continue;
        }

        let (min, max) = bounding_box(&poly);
        let inside = min.x > 0
            && min.y > 0
            && max.x < gray.width as i32 - 1
            && max.y < gray.height as i32 - 1;
        if !inside {
            continue;
        }

        let corners = [
            Point2::new(poly[0].x as f32, poly[0].y as f32),
            Point2::new(poly[1].x as f32, poly[1].y as f32),
            Point2::new(poly[2].x as f32, poly[2].y as f32),
            Point2::new(poly[3].x as f32, poly[3].y as f32),
        ];
        quads.push(Quad {
            corners: canonicalize(corners),
        });
    }

    log::debug!(
        "candidate finder: {} contours -> {} quads",
        contours.len(),
        quads.len()
    );
    quads
}
