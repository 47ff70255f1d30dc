//! End-to-end per-frame pipeline: find candidates, decode, match, and
//! (on request) recover pose.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::candidates::{find_candidates, FinderParams};
use crate::dictionary::Dictionary;
use crate::matcher::{match_candidates, MarkerResult};
use crate::pose::{estimate_pose, project_points, Pose, PoseError};
use quadtag_core::{CameraIntrinsics, Distortion, GrayImageView};

/// Default auxiliary geometry for overlay rendering: the marker-local
/// coordinate axis (origin, +X, +Y, -Z).
pub const AXIS_POINTS: [Point3<f64>; 4] = [
    Point3::new(0.0, 0.0, 0.0),
    Point3::new(1.0, 0.0, 0.0),
    Point3::new(0.0, 1.0, 0.0),
    Point3::new(0.0, 0.0, -1.0),
];

/// Pipeline configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    pub finder: FinderParams,
    /// Bit count of the sampled grid; must equal the dictionary's.
    pub bits: usize,
    /// Maximum Hamming distance accepted by the matcher.
    pub error_threshold: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            finder: FinderParams::default(),
            bits: 36,
            error_threshold: 2,
        }
    }
}

/// Frame-by-frame marker detector.
///
/// The dictionary is immutable after construction, so a `Detector` can be
/// shared read-only across threads; each frame is processed synchronously
/// and independently, with no state carried between frames.
pub struct Detector {
    dictionary: Dictionary,
    params: DetectorParams,
}

impl Detector {
    /// Create a detector over a prebuilt dictionary.
    ///
    /// # Panics
    /// Panics when the configured bit count disagrees with the
    /// dictionary's; mixing them would make every match fail silently.
    pub fn new(dictionary: Dictionary, params: DetectorParams) -> Self {
        assert_eq!(
            params.bits, dictionary.bits,
            "detector bit count {} does not match dictionary bit count {}",
            params.bits, dictionary.bits
        );
        Self { dictionary, params }
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Process one frame: candidates -> bit patterns -> matches.
    ///
    /// A frame with no markers yields an empty list, never an error.
    pub fn detect(&self, frame: &GrayImageView<'_>) -> Vec<MarkerResult> {
        let candidates = find_candidates(frame, &self.params.finder);
        match_candidates(
            frame,
            &candidates,
            &self.dictionary,
            self.params.error_threshold,
        )
    }

    /// Recover the pose of a matched marker and project auxiliary
    /// object-space points into the frame.
    ///
    /// The matched entry's 3D corner layout supplies the object-space
    /// correspondences; pass [`AXIS_POINTS`] for the standard overlay axis.
    pub fn project_marker_points(
        &self,
        result: &MarkerResult,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
        points: &[Point3<f64>],
    ) -> Result<Vec<Point2<f64>>, PoseError> {
        let pose = self.marker_pose(result, intrinsics, distortion)?;
        Ok(project_points(&pose, points, intrinsics, distortion))
    }

    /// Recover only the pose of a matched marker.
    pub fn marker_pose(
        &self,
        result: &MarkerResult,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
    ) -> Result<Pose, PoseError> {
        let entry = &self.dictionary.entries[result.entry];
        estimate_pose(&entry.corners3d, &result.corners, intrinsics, distortion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::build_dictionary;
    use crate::testutil::build_marker_image;

    #[test]
    #[should_panic(expected = "does not match dictionary bit count")]
    fn mismatched_bit_counts_panic() {
        let dict = build_dictionary(&[build_marker_image(0b1010, 10)], 16).expect("build");
        let params = DetectorParams {
            bits: 36,
            ..DetectorParams::default()
        };
        let _ = Detector::new(dict, params);
    }

    #[test]
    fn empty_frame_detects_nothing() {
        let dict = build_dictionary(&[build_marker_image(0b1010_0101, 10)], 36).expect("build");
        let detector = Detector::new(dict, DetectorParams::default());

        let frame = quadtag_core::GrayImage::new(64, 64, vec![255; 64 * 64]);
        assert!(detector.detect(&frame.view()).is_empty());
    }
}
