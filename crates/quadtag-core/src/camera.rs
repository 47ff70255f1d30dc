//! Pinhole camera model: intrinsics and Brown-Conrady distortion.
//!
//! The intrinsics are supplied by the caller (typically from an offline
//! calibration) and passed by reference into pose estimation. No global
//! camera state exists anywhere in the pipeline.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Camera intrinsic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Extract intrinsics from a 3x3 projection matrix (skew is ignored).
    pub fn from_matrix(k: &Matrix3<f64>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
        }
    }

    pub fn as_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }

    pub fn inv_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            1.0 / self.fx,
            0.0,
            -self.cx / self.fx,
            0.0,
            1.0 / self.fy,
            -self.cy / self.fy,
            0.0,
            0.0,
            1.0,
        )
    }
}

/// Brown-Conrady lens distortion coefficients `[k1, k2, p1, p2, k3]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    /// The zero coefficient vector (ideal pinhole).
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0 && self.k3 == 0.0
    }

    /// Apply distortion to a normalized image point.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        (x * radial + dx, y * radial + dy)
    }

    /// Invert the distortion model by fixed-point iteration.
    ///
    /// Converges quickly for the moderate coefficients typical of calibrated
    /// cameras; for the zero vector this is the identity.
    pub fn undistort(&self, xd: f64, yd: f64) -> (f64, f64) {
        if self.is_zero() {
            return (xd, yd);
        }
        let (mut x, mut y) = (xd, yd);
        for _ in 0..8 {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
            let dx = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
            x = (xd - dx) / radial;
            y = (yd - dy) / radial;
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn intrinsics_matrix_round_trip() {
        let k = CameraIntrinsics::new(800.0, 780.0, 320.0, 240.0);
        let m = k.as_matrix();
        let back = CameraIntrinsics::from_matrix(&m);
        assert_eq!(k, back);

        let id = m * k.inv_matrix();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(id[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn undistort_inverts_distort() {
        let d = Distortion {
            k1: -0.28,
            k2: 0.07,
            p1: 0.001,
            p2: -0.0005,
            k3: 0.0,
        };
        for &(x, y) in &[(0.0, 0.0), (0.1, -0.2), (-0.3, 0.25)] {
            let (xd, yd) = d.distort(x, y);
            let (xu, yu) = d.undistort(xd, yd);
            assert_relative_eq!(xu, x, epsilon = 1e-8);
            assert_relative_eq!(yu, y, epsilon = 1e-8);
        }
    }

    #[test]
    fn zero_distortion_is_identity() {
        let d = Distortion::none();
        assert!(d.is_zero());
        assert_eq!(d.distort(0.4, -0.7), (0.4, -0.7));
        assert_eq!(d.undistort(0.4, -0.7), (0.4, -0.7));
    }
}
