//! Dictionary matching by bounded Hamming distance.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::candidates::Quad;
use crate::decode::decode_quad;
use crate::dictionary::Dictionary;
use quadtag_core::GrayImageView;

/// One identified marker in a frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerResult {
    /// Marker identity (the matched reference image's index).
    pub id: u32,
    /// The observed corners of the candidate, canonical clockwise order.
    pub corners: [Point2<f32>; 4],
    /// Hamming distance between the decoded pattern and the matched entry.
    pub hamming: u32,
    /// Index of the matched entry in the dictionary, giving the rotation's
    /// 3D corner layout for pose estimation.
    pub entry: usize,
}

/// Match candidate quads against the dictionary.
///
/// Every dictionary entry within `error_threshold` produces its own
/// result, so a candidate may legitimately yield several results,
/// including several rotations of the same marker when noise aligns.
/// Callers must tolerate duplicate identities.
///
/// This is an exhaustive scan over candidates x entries; dictionaries hold
/// tens of entries, so nothing cleverer is warranted.
pub fn match_candidates(
    gray: &GrayImageView<'_>,
    candidates: &[Quad],
    dictionary: &Dictionary,
    error_threshold: u32,
) -> Vec<MarkerResult> {
    let mut results = Vec::new();

    for quad in candidates {
        let Some(code) = decode_quad(gray, quad, dictionary.bits) else {
            continue;
        };

        for (entry_idx, entry) in dictionary.entries.iter().enumerate() {
            let hamming = code.hamming(&entry.code);
            if hamming <= error_threshold {
                results.push(MarkerResult {
                    id: entry.id,
                    corners: quad.corners,
                    hamming,
                    entry: entry_idx,
                });
            }
        }
    }

    log::debug!(
        "matcher: {} candidates -> {} results (threshold {})",
        candidates.len(),
        results.len(),
        error_threshold
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::BitCode;
    use crate::dictionary::DictionaryEntry;
    use crate::testutil::{build_marker_image, full_image_quad};
    use nalgebra::Point3;

    fn entry(id: u32, code: u64) -> DictionaryEntry {
        DictionaryEntry {
            id,
            code: BitCode { code, bits: 36 },
            corners3d: [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        }
    }

    /// Flip `k` distinct bits of `code`.
    fn corrupt(code: u64, k: u32) -> u64 {
        let mut out = code;
        for i in 0..k {
            out ^= 1u64 << (i * 5);
        }
        out
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let img = build_marker_image(0b1010_0110_0101_1001, 10);
        let quad = full_image_quad(&img);
        let observed = decode_quad(&img.view(), &quad, 36).expect("decode");

        for k in 0..4u32 {
            let dict = Dictionary {
                entries: vec![entry(7, corrupt(observed.code, k))],
                bits: 36,
            };
            for threshold in 0..4u32 {
                let results = match_candidates(&img.view(), &[quad], &dict, threshold);
                if k <= threshold {
                    assert_eq!(results.len(), 1, "k={k} threshold={threshold}");
                    assert_eq!(results[0].id, 7);
                    assert_eq!(results[0].hamming, k);
                } else {
                    assert!(results.is_empty(), "k={k} threshold={threshold}");
                }
            }
        }
    }

    #[test]
    fn multiple_entries_within_tolerance_all_reported() {
        let img = build_marker_image(0b1010_0110_0101_1001, 10);
        let quad = full_image_quad(&img);
        let observed = decode_quad(&img.view(), &quad, 36).expect("decode");

        let dict = Dictionary {
            entries: vec![
                entry(0, observed.code),
                entry(0, corrupt(observed.code, 1)),
                entry(1, corrupt(observed.code, 2)),
                entry(2, corrupt(observed.code, 9)),
            ],
            bits: 36,
        };

        let results = match_candidates(&img.view(), &[quad], &dict, 2);
        assert_eq!(results.len(), 3);
        // No dedup: both entries of marker 0 are present.
        assert_eq!(results.iter().filter(|r| r.id == 0).count(), 2);
        assert_eq!(results.iter().filter(|r| r.id == 1).count(), 1);
        assert_eq!(results[0].entry, 0);
        assert_eq!(results[1].entry, 1);
    }

    #[test]
    fn no_match_yields_empty_result_not_error() {
        let img = build_marker_image(0b1111_1111_0000_0000, 10);
        let quad = full_image_quad(&img);
        let dict = Dictionary {
            entries: vec![entry(0, 0x0123_4567_8u64)],
            bits: 36,
        };
        let results = match_candidates(&img.view(), &[quad], &dict, 0);
        assert!(results.is_empty());
    }
}
