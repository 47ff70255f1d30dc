//! Core types and utilities for square fiducial marker detection.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about contours, dictionaries, or pose recovery; it provides the gray
//! image representation, the 4-point homography used for rectification, and
//! the pinhole camera model shared by the detection pipeline.

mod camera;
mod homography;
mod image;
mod logger;

pub use camera::{CameraIntrinsics, Distortion};
pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{
    gray_from_interleaved, sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView,
};
pub use logger::init_with_level;
