//! Camera-relative marker pose recovery.
//!
//! The marker corners are coplanar (z = 0 in object space), so the
//! perspective-n-point problem reduces to a homography decomposition
//! seeding an orthogonal-iteration refinement. Degenerate geometry is
//! surfaced as an explicit error: a renderer must skip drawing rather
//! than draw a garbage transform.

use nalgebra::{Matrix3, Point2, Point3, Vector3};

use quadtag_core::{homography_from_4pt, CameraIntrinsics, Distortion};

/// Rotation and translation of a marker relative to the camera.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Pose estimation failures.
#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    #[error("degenerate correspondences (collinear or repeated points)")]
    DegenerateCorrespondences,
    #[error("singular geometry in pose refinement")]
    SingularGeometry,
    #[error("recovered pose places the marker behind the camera")]
    BehindCamera,
}

impl Pose {
    /// Project an object-space point into pixel coordinates through this
    /// pose, the intrinsics, and the distortion model.
    pub fn project(
        &self,
        point: &Point3<f64>,
        intrinsics: &CameraIntrinsics,
        distortion: &Distortion,
    ) -> Point2<f64> {
        let p_cam = self.rotation * point.coords + self.translation;
        let x = p_cam.x / p_cam.z;
        let y = p_cam.y / p_cam.z;
        let (xd, yd) = distortion.distort(x, y);
        Point2::new(
            xd * intrinsics.fx + intrinsics.cx,
            yd * intrinsics.fy + intrinsics.cy,
        )
    }
}

const OI_ITERATIONS: usize = 25;

/// Recover the marker pose from 4 object-space corners and their observed
/// pixel positions.
///
/// The observations are first normalized through the inverse intrinsics
/// and undistorted; the homography from the planar object corners to the
/// normalized plane is then decomposed into an initial `[R | t]`, which
/// orthogonal iteration refines to the maximum-likelihood pose.
pub fn estimate_pose(
    corners3d: &[Point3<f32>; 4],
    corners2d: &[Point2<f32>; 4],
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> Result<Pose, PoseError> {
    let k_inv = intrinsics.inv_matrix();

    // Normalized, undistorted observations (f64 for refinement, f32 for
    // the homography seed).
    let mut norm64 = [(0.0f64, 0.0f64); 4];
    let mut norm = [Point2::new(0.0f32, 0.0); 4];
    for (i, p) in corners2d.iter().enumerate() {
        let v = k_inv * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let (x, y) = distortion.undistort(v.x, v.y);
        norm64[i] = (x, y);
        norm[i] = Point2::new(x as f32, y as f32);
    }

    // Planar object points: drop z (identically zero by construction).
    let object = [
        Point2::new(corners3d[0].x, corners3d[0].y),
        Point2::new(corners3d[1].x, corners3d[1].y),
        Point2::new(corners3d[2].x, corners3d[2].y),
        Point2::new(corners3d[3].x, corners3d[3].y),
    ];

    let h = homography_from_4pt(&object, &norm).ok_or(PoseError::DegenerateCorrespondences)?;

    // H ~ [r1 r2 t] in the normalized camera; recover scale from the
    // rotation columns' unit-norm constraint.
    let m = h.h;
    let mut r1 = m.column(0).into_owned();
    let mut r2 = m.column(1).into_owned();
    let mut t = m.column(2).into_owned();

    let norm_product = r1.norm() * r2.norm();
    if norm_product < 1e-12 {
        return Err(PoseError::DegenerateCorrespondences);
    }
    let scale = 1.0 / norm_product.sqrt();
    r1 *= scale;
    r2 *= scale;
    t *= scale;

    // The homography scale sign is ambiguous; pick the solution with the
    // marker in front of the camera.
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    if t.z.abs() < 1e-9 {
        return Err(PoseError::BehindCamera);
    }

    let r3 = r1.cross(&r2);
    let rotation = nearest_rotation(Matrix3::from_columns(&[r1, r2, r3]))?;

    let object3: Vec<Vector3<f64>> = corners3d
        .iter()
        .map(|p| Vector3::new(p.x as f64, p.y as f64, p.z as f64))
        .collect();
    let rays: Vec<Vector3<f64>> = norm64
        .iter()
        .map(|&(x, y)| Vector3::new(x, y, 1.0).normalize())
        .collect();

    refine_orthogonal_iteration(&object3, &rays, Pose { rotation, translation: t })
}

/// Project each auxiliary object-space point through the recovered pose.
pub fn project_points(
    pose: &Pose,
    points: &[Point3<f64>],
    intrinsics: &CameraIntrinsics,
    distortion: &Distortion,
) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| pose.project(p, intrinsics, distortion))
        .collect()
}

/// Closest rotation matrix in Frobenius norm (SVD polar factor, det +1).
fn nearest_rotation(m: Matrix3<f64>) -> Result<Matrix3<f64>, PoseError> {
    let svd = m.svd(true, true);
    let u = svd.u.ok_or(PoseError::SingularGeometry)?;
    let v_t = svd.v_t.ok_or(PoseError::SingularGeometry)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        r = u * Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0) * v_t;
    }
    Ok(r)
}

/// Orthogonal-iteration pose refinement (Lu, Hager, Mjolsness).
///
/// Alternates the closed-form optimal translation for a fixed rotation
/// with the Procrustes-optimal rotation for the line-of-sight projections.
fn refine_orthogonal_iteration(
    object: &[Vector3<f64>],
    rays: &[Vector3<f64>],
    initial: Pose,
) -> Result<Pose, PoseError> {
    let n = object.len() as f64;

    // Line-of-sight projectors V_i = v v^T for unit rays.
    let projectors: Vec<Matrix3<f64>> = rays.iter().map(|v| v * v.transpose()).collect();

    let centroid = object.iter().sum::<Vector3<f64>>() / n;
    let sum_proj = projectors.iter().sum::<Matrix3<f64>>();
    let t_solver = (Matrix3::identity() - sum_proj / n)
        .try_inverse()
        .ok_or(PoseError::SingularGeometry)?;

    let mut r = initial.rotation;
    let mut t = initial.translation;

    for _ in 0..OI_ITERATIONS {
        // Optimal t for fixed R.
        let mut acc = Vector3::zeros();
        for (p, proj) in object.iter().zip(&projectors) {
            acc += (proj - Matrix3::identity()) * (r * p);
        }
        t = t_solver * (acc / n);

        // Optimal R for the projected space points (Procrustes).
        let mut cross_cov = Matrix3::zeros();
        for (p, proj) in object.iter().zip(&projectors) {
            let q = proj * (r * p + t);
            cross_cov += q * (p - centroid).transpose();
        }
        r = nearest_rotation(cross_cov)?;
    }

    // Recompute the final translation for the refined rotation.
    let mut acc = Vector3::zeros();
    for (p, proj) in object.iter().zip(&projectors) {
        acc += (proj - Matrix3::identity()) * (r * p);
    }
    t = t_solver * (acc / n);

    if t.z <= 0.0 {
        return Err(PoseError::BehindCamera);
    }
    Ok(Pose { rotation: r, translation: t })
}
