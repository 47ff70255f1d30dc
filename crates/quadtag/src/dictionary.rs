//! Marker dictionary construction.
//!
//! A dictionary holds four entries per reference marker, one per 90-degree
//! rotation. Each rotation is produced by physically rotating the
//! reference image and decoding it again, so the stored pattern matches
//! exactly what a rotated real-world marker yields under the same
//! resampling and thresholding, including its artifacts. The paired 3D
//! corner layout is rotated cyclically in step.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::candidates::Quad;
use crate::decode::{decode_quad, BitCode};
use quadtag_core::GrayImage;

/// One (bit pattern, 3D corner layout) pair for a single rotation of a
/// reference marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Marker identity: the index of the reference image this entry was
    /// built from. Shared by all four rotations.
    pub id: u32,
    pub code: BitCode,
    /// Object-space corner layout matching this rotation, in the same
    /// order as observed quad corners.
    pub corners3d: [Point3<f32>; 4],
}

/// Immutable lookup table built once at startup and shared read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub entries: Vec<DictionaryEntry>,
    /// Bit count every entry was decoded with.
    pub bits: usize,
}

/// Errors from dictionary construction.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("reference image {index} is not square ({width}x{height})")]
    NotSquare {
        index: usize,
        width: usize,
        height: usize,
    },
    #[error("reference image {index} failed to decode")]
    DecodeFailed { index: usize },
}

/// Base object-space corner layout of an unrotated marker.
const BASE_CORNERS3D: [Point3<f32>; 4] = [
    Point3::new(0.0, 0.0, 0.0),
    Point3::new(1.0, 0.0, 0.0),
    Point3::new(1.0, 1.0, 0.0),
    Point3::new(0.0, 1.0, 0.0),
];

impl Dictionary {
    /// Number of distinct marker identities (entries / 4).
    pub fn marker_count(&self) -> usize {
        self.entries.len() / 4
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Build a dictionary from reference marker images.
///
/// The identity of each marker is its position in `reference_images`. This
/// is a pure function: it owns no state and can be called from any thread.
pub fn build_dictionary(
    reference_images: &[GrayImage],
    bits: usize,
) -> Result<Dictionary, DictionaryError> {
    let mut entries = Vec::with_capacity(reference_images.len() * 4);

    for (index, reference) in reference_images.iter().enumerate() {
        if reference.width != reference.height {
            return Err(DictionaryError::NotSquare {
                index,
                width: reference.width,
                height: reference.height,
            });
        }

        let mut img = reference.clone();
        let mut corners3d = BASE_CORNERS3D;

        for rotation in 0..4 {
            if rotation > 0 {
                img = img.rotate90_cw();
                corners3d.rotate_right(1);
            }

            let quad = Quad::covering(img.width, img.height);
            let code = decode_quad(&img.view(), &quad, bits)
                .ok_or(DictionaryError::DecodeFailed { index })?;

            entries.push(DictionaryEntry {
                id: index as u32,
                code,
                corners3d,
            });
        }
    }

    log::debug!(
        "dictionary: {} reference images -> {} entries",
        reference_images.len(),
        entries.len()
    );
    Ok(Dictionary { entries, bits })
}
