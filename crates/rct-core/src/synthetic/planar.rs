//! Synthetic target helpers.
//!
//! Build calibration-target point grids in the target frame and project them
//! through an ideal pinhole camera to produce [`CorrespondenceSet`] instances.

use crate::{CameraIntrinsics, CorrespondenceSet, Iso3, Pt3, Real};
use anyhow::{bail, Result};

/// Generate a planar grid of 3D points (Z=0) with `nx * ny` points.
///
/// Points are ordered deterministically in row-major order (Y major).
pub fn grid_points(nx: usize, ny: usize, spacing: Real) -> Vec<Pt3> {
    grid_points_with_relief(nx, ny, spacing, 0.0)
}

/// Generate a grid of 3D points whose Z alternates between `0` and `relief`
/// in a checkerboard pattern, so that the target is not coplanar.
pub fn grid_points_with_relief(nx: usize, ny: usize, spacing: Real, relief: Real) -> Vec<Pt3> {
    let mut points = Vec::with_capacity(nx.saturating_mul(ny));
    for j in 0..ny {
        for i in 0..nx {
            let z = if (i + j) % 2 == 1 { relief } else { 0.0 };
            points.push(Pt3::new(i as Real * spacing, j as Real * spacing, z));
        }
    }
    points
}

/// Project target points into a camera, requiring every point to lie in front of it.
///
/// `camera_to_target` must map target-frame points into the camera frame.
pub fn project_set(
    intrinsics: &CameraIntrinsics,
    camera_to_target: &Iso3,
    target_points: &[Pt3],
) -> Result<CorrespondenceSet> {
    let mut pixels = Vec::with_capacity(target_points.len());
    for (idx, pt) in target_points.iter().enumerate() {
        let pc = camera_to_target.transform_point(pt);
        if pc.z <= 0.0 {
            bail!("point {idx} is not in front of the camera (z={:.6})", pc.z);
        }
        pixels.push(intrinsics.project(&pc));
    }

    CorrespondenceSet::new(target_points.to_vec(), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn grid_points_order_is_stable() {
        let pts = grid_points(2, 3, 0.5);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], Pt3::new(0.0, 0.0, 0.0));
        assert_eq!(pts[1], Pt3::new(0.5, 0.0, 0.0));
        assert_eq!(pts[2], Pt3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn relief_alternates_depth() {
        let pts = grid_points_with_relief(3, 2, 0.1, 0.02);
        assert_eq!(pts[0].z, 0.0);
        assert_eq!(pts[1].z, 0.02);
        assert_eq!(pts[3].z, 0.02);
        assert_eq!(pts[4].z, 0.0);
    }

    #[test]
    fn project_set_produces_matching_correspondences() {
        let k = CameraIntrinsics::new(800.0, 800.0, 640.0, 360.0);
        let board = grid_points(3, 2, 0.05);
        let pose = Iso3::from_parts(Translation3::new(0.0, 0.0, 1.0), UnitQuaternion::identity());

        let set = project_set(&k, &pose, &board).unwrap();
        assert_eq!(set.points_3d.len(), board.len());
        assert_eq!(set.points_2d[0], k.project(&Pt3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn project_set_rejects_points_behind_camera() {
        let k = CameraIntrinsics::new(800.0, 800.0, 640.0, 360.0);
        let board = grid_points(2, 2, 0.05);
        let pose = Iso3::from_parts(Translation3::new(0.0, 0.0, -1.0), UnitQuaternion::identity());

        assert!(project_set(&k, &pose, &board).is_err());
    }
}
