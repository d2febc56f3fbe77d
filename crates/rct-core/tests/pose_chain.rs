//! The generic pose helpers reproduce `Isometry3` chains used to synthesize data.

use nalgebra::{DVector, Rotation3, Translation3};
use rct_core::synthetic::{planar, poses};
use rct_core::{
    inverse_transform_point, pose_from_params, project_pinhole, transform_point, CameraIntrinsics,
    Iso3, Pose6d, Pt3, Vec3,
};

fn params(pose: &Iso3) -> DVector<f64> {
    DVector::from_row_slice(&Pose6d::from_iso3(pose).to_array())
}

#[test]
fn parameter_chain_matches_synthetic_projection() {
    let k = CameraIntrinsics::new(610.0, 605.0, 330.0, 245.0);
    let base_to_target = Iso3::from_parts(
        Translation3::new(0.4, 0.1, 0.02),
        Rotation3::from_euler_angles(0.05, -0.1, 1.1).into(),
    );
    let center = base_to_target * Pt3::new(0.1, 0.08, 0.0);
    let base_to_camera = poses::look_at(&(center + Vec3::new(0.2, -0.3, 0.7)), &center, &Vec3::x());

    let board = planar::grid_points_with_relief(6, 5, 0.04, 0.015);
    let expected =
        planar::project_set(&k, &(base_to_camera.inverse() * base_to_target), &board).unwrap();

    let target = params(&base_to_target);
    let camera = params(&base_to_camera);
    let (target_rot, target_trans) = pose_from_params(target.as_view());
    let (camera_rot, camera_trans) = pose_from_params(camera.as_view());

    for (pw, uv) in expected.iter() {
        let p_base = transform_point(&target_rot, &target_trans, &pw.coords);
        let p_camera = inverse_transform_point(&camera_rot, &camera_trans, &p_base);
        let predicted = project_pinhole(k.fx, k.fy, k.cx, k.cy, &p_camera);
        assert!((predicted - uv.coords).norm() < 1e-9, "{predicted:?} vs {uv:?}");
    }
}
