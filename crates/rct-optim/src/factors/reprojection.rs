//! Reprojection residuals for the extrinsic calibration problems.
//!
//! Each residual carries a target point into the camera frame through a chain
//! of poses, projects it with the camera's pinhole intrinsics and returns
//! `predicted - observed` in pixels.

use nalgebra::{DVector, DVectorView, RealField, SVector, Vector3};
use rct_core::{inverse_transform_point, pose_from_params, project_pinhole, transform_point};
use tiny_solver::factors::Factor;

/// Fixed data of a single observed target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationData {
    /// Target point in the target frame.
    pub pw: [f64; 3],
    /// Observed pixel.
    pub uv: [f64; 2],
    /// Intrinsics `[fx, fy, cx, cy]`.
    pub intr: [f64; 4],
}

fn constant<T: RealField>(v: f64) -> T {
    T::from_f64(v).unwrap()
}

fn lift3<T: RealField>(v: &[f64]) -> Vector3<T> {
    Vector3::new(constant(v[0]), constant(v[1]), constant(v[2]))
}

impl ObservationData {
    fn target_point<T: RealField>(&self) -> Vector3<T> {
        lift3(&self.pw)
    }

    /// Project a camera-frame point and compare with the observed pixel.
    fn residual<T: RealField>(&self, p_camera: &Vector3<T>) -> SVector<T, 2> {
        let proj = project_pinhole(
            constant::<T>(self.intr[0]),
            constant(self.intr[1]),
            constant(self.intr[2]),
            constant(self.intr[3]),
            p_camera,
        );
        SVector::<T, 2>::new(
            proj.x.clone() - constant(self.uv[0]),
            proj.y.clone() - constant(self.uv[1]),
        )
    }
}

/// Camera on a moving wrist looking at a static target.
///
/// Parameters: `[camera_to_wrist, base_to_target]`. The wrist pose at capture
/// time is known data, stored already inverted as `wrist_to_base`.
#[derive(Debug, Clone)]
pub struct CameraOnWristFactor {
    pub obs: ObservationData,
    pub wrist_to_base: [f64; 6],
}

impl CameraOnWristFactor {
    pub fn residual<T: RealField>(
        &self,
        camera_to_wrist: DVectorView<'_, T>,
        base_to_target: DVectorView<'_, T>,
    ) -> SVector<T, 2> {
        let (target_rot, target_trans) = pose_from_params(base_to_target);
        let (camera_rot, camera_trans) = pose_from_params(camera_to_wrist);
        let wrist_rot = lift3::<T>(&self.wrist_to_base[..3]);
        let wrist_trans = lift3::<T>(&self.wrist_to_base[3..]);

        let p_base = transform_point(&target_rot, &target_trans, &self.obs.target_point());
        let p_wrist = transform_point(&wrist_rot, &wrist_trans, &p_base);
        let p_camera = transform_point(&camera_rot, &camera_trans, &p_wrist);
        self.obs.residual(&p_camera)
    }
}

impl<T: RealField> Factor<T> for CameraOnWristFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        debug_assert_eq!(
            params.len(),
            2,
            "expected [camera_to_wrist, base_to_target] parameter blocks"
        );
        let r = self.residual(params[0].as_view(), params[1].as_view());
        DVector::from_row_slice(r.as_slice())
    }
}

/// Static camera looking at a target carried by the wrist.
///
/// Parameters: `[base_to_camera, wrist_to_target]`. The wrist pose
/// `base_to_wrist` at capture time is known data.
#[derive(Debug, Clone)]
pub struct StaticCameraMovingTargetFactor {
    pub obs: ObservationData,
    pub base_to_wrist: [f64; 6],
}

impl StaticCameraMovingTargetFactor {
    pub fn residual<T: RealField>(
        &self,
        base_to_camera: DVectorView<'_, T>,
        wrist_to_target: DVectorView<'_, T>,
    ) -> SVector<T, 2> {
        let (target_rot, target_trans) = pose_from_params(wrist_to_target);
        let (camera_rot, camera_trans) = pose_from_params(base_to_camera);
        let wrist_rot = lift3::<T>(&self.base_to_wrist[..3]);
        let wrist_trans = lift3::<T>(&self.base_to_wrist[3..]);

        let p_wrist = transform_point(&target_rot, &target_trans, &self.obs.target_point());
        let p_base = transform_point(&wrist_rot, &wrist_trans, &p_wrist);
        let p_camera = inverse_transform_point(&camera_rot, &camera_trans, &p_base);
        self.obs.residual(&p_camera)
    }
}

impl<T: RealField> Factor<T> for StaticCameraMovingTargetFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        debug_assert_eq!(
            params.len(),
            2,
            "expected [base_to_camera, wrist_to_target] parameter blocks"
        );
        let r = self.residual(params[0].as_view(), params[1].as_view());
        DVector::from_row_slice(r.as_slice())
    }
}

/// One of several static cameras looking at a shared static target.
///
/// Parameters: `[base_to_target, base_to_camera]`.
#[derive(Debug, Clone)]
pub struct MultiStaticCameraFactor {
    pub obs: ObservationData,
}

impl MultiStaticCameraFactor {
    pub fn residual<T: RealField>(
        &self,
        base_to_target: DVectorView<'_, T>,
        base_to_camera: DVectorView<'_, T>,
    ) -> SVector<T, 2> {
        let (target_rot, target_trans) = pose_from_params(base_to_target);
        let (camera_rot, camera_trans) = pose_from_params(base_to_camera);

        let p_base = transform_point(&target_rot, &target_trans, &self.obs.target_point());
        let p_camera = inverse_transform_point(&camera_rot, &camera_trans, &p_base);
        self.obs.residual(&p_camera)
    }
}

impl<T: RealField> Factor<T> for MultiStaticCameraFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        debug_assert_eq!(
            params.len(),
            2,
            "expected [base_to_target, base_to_camera] parameter blocks"
        );
        let r = self.residual(params[0].as_view(), params[1].as_view());
        DVector::from_row_slice(r.as_slice())
    }
}
