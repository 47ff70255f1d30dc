//! Square fiducial marker detection and camera-relative pose recovery.
//!
//! Given a single gray frame, the pipeline:
//! - extracts convex quadrilateral candidates from the binarized frame,
//! - rectifies each candidate and samples its bit-grid pattern,
//! - matches the pattern against a dictionary built from reference marker
//!   images (four rotation entries per marker, bounded Hamming error),
//! - and, per matched marker, solves a planar perspective-n-point problem
//!   to project auxiliary 3D geometry back into the frame.
//!
//! Rendering, capture, and file I/O are deliberately out of scope: the
//! caller supplies frames and reference images and consumes
//! [`MarkerResult`]s and projected points.

mod candidates;
mod contours;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod polygon;
mod pose;

#[cfg(test)]
pub(crate) mod testutil;

pub use candidates::{find_candidates, FinderParams, Quad};
pub use contours::{find_contours, Contour};
pub use decode::{decode_quad, BitCode};
pub use polygon::{
    approx_poly_dp, bounding_box, is_convex, perimeter, point_in_polygon, polygon_area,
};
pub use detector::{Detector, DetectorParams, AXIS_POINTS};
pub use dictionary::{build_dictionary, Dictionary, DictionaryEntry, DictionaryError};
pub use matcher::{match_candidates, MarkerResult};
pub use pose::{estimate_pose, project_points, Pose, PoseError};
