//! Several static cameras jointly localizing one static target.
//!
//! The target pose is a single parameter block shared by every residual, so
//! each camera's observations pull on the same `base_to_target`. Camera poses
//! (`base_to_camera`) are free unless listed in
//! [`MultiStaticCameraSolveOptions::fixed_cameras`].
//!
//! Poses are only defined up to a common rigid motion when every block is
//! free; fixing one camera (camera 0 by default) removes that gauge freedom.
//! With a single, fixed camera the problem reduces to PnP of the target.

use super::{
    optimize, validate_correspondences, validate_intrinsics, validate_pose, CalibrationProblem,
    SolveSummary,
};
use crate::backend::BackendSolveOptions;
use crate::error::{ensure_input, CalibrationError};
use crate::ir::{FactorKind, FixedMask, ProblemIR, ResidualBlock, RobustLoss, POSE_DIM};
use crate::params::pose6::iso3_to_pose6_dvec;
use log::debug;
use nalgebra::DVector;
use rct_core::{CameraIntrinsics, CorrespondenceSet, Iso3, ReprojectionStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_TO_TARGET: &str = "base_to_target";

fn camera_key(idx: usize) -> String {
    format!("base_to_camera/{}", idx)
}

/// Solve options for the multi-camera problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiStaticCameraSolveOptions {
    pub robust_loss: RobustLoss,
    /// Cameras whose pose is held at its guess.
    pub fixed_cameras: Vec<usize>,
    pub fix_base_to_target: bool,
}

impl Default for MultiStaticCameraSolveOptions {
    fn default() -> Self {
        Self {
            robust_loss: RobustLoss::None,
            fixed_cameras: vec![0],
            fix_base_to_target: false,
        }
    }
}

/// Calibration input for N static cameras observing one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStaticCameraPnPProblem {
    /// Intrinsics per camera.
    pub intr: Vec<CameraIntrinsics>,
    pub base_to_target_guess: Iso3,
    /// Correspondence sets indexed `[camera][image]`.
    pub image_observations: Vec<Vec<CorrespondenceSet>>,
    /// Pose guess per camera.
    pub base_to_camera: Vec<Iso3>,
    #[serde(default)]
    pub options: MultiStaticCameraSolveOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStaticCameraPnPResult {
    pub converged: bool,
    pub initial_cost_per_obs: f64,
    pub final_cost_per_obs: f64,
    pub reprojection: ReprojectionStats,
    pub base_to_target: Iso3,
    /// Fitted pose per camera; fixed cameras keep their guess.
    pub base_to_camera: Vec<Iso3>,
}

/// Build IR for the multi-camera problem.
pub fn build_multi_static_camera_ir(
    problem: &MultiStaticCameraPnPProblem,
) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
    let num_cameras = problem.intr.len();
    ensure_input!(num_cameras > 0, "need at least one camera");
    ensure_input!(
        problem.image_observations.len() == num_cameras,
        "image_observations has {} cameras, intr has {}",
        problem.image_observations.len(),
        num_cameras
    );
    ensure_input!(
        problem.base_to_camera.len() == num_cameras,
        "base_to_camera has {} poses, intr has {}",
        problem.base_to_camera.len(),
        num_cameras
    );
    for &idx in &problem.options.fixed_cameras {
        ensure_input!(
            idx < num_cameras,
            "fixed camera index {} out of range for {} cameras",
            idx,
            num_cameras
        );
    }
    validate_pose(&problem.base_to_target_guess, "base_to_target_guess")?;
    for (cam_idx, (intr, images)) in problem
        .intr
        .iter()
        .zip(&problem.image_observations)
        .enumerate()
    {
        validate_intrinsics(intr, &format!("camera {}", cam_idx))?;
        validate_pose(
            &problem.base_to_camera[cam_idx],
            &format!("base_to_camera[{}]", cam_idx),
        )?;
        ensure_input!(!images.is_empty(), "camera {} has no images", cam_idx);
        for (img_idx, obs) in images.iter().enumerate() {
            validate_correspondences(obs, &format!("camera {} image {}", cam_idx, img_idx))?;
        }
    }

    let opts = &problem.options;
    let mut ir = ProblemIR::new();
    let mut initial_map = HashMap::new();

    let target_id = ir.add_param_block(
        BASE_TO_TARGET,
        POSE_DIM,
        FixedMask::pose(opts.fix_base_to_target),
    );
    initial_map.insert(
        BASE_TO_TARGET.to_string(),
        iso3_to_pose6_dvec(&problem.base_to_target_guess),
    );

    for (cam_idx, ((intr, images), guess)) in problem
        .intr
        .iter()
        .zip(&problem.image_observations)
        .zip(&problem.base_to_camera)
        .enumerate()
    {
        let key = camera_key(cam_idx);
        let camera_id = ir.add_param_block(
            &key,
            POSE_DIM,
            FixedMask::pose(opts.fixed_cameras.contains(&cam_idx)),
        );
        initial_map.insert(key, iso3_to_pose6_dvec(guess));

        let intr = intr.to_array();
        for obs in images {
            for (pw, uv) in obs.iter() {
                ir.add_residual_block(ResidualBlock::new(
                    vec![target_id, camera_id],
                    opts.robust_loss,
                    FactorKind::ReprojMultiStaticCamera {
                        pw: [pw.x, pw.y, pw.z],
                        uv: [uv.x, uv.y],
                        intr,
                    },
                ));
            }
        }
    }

    debug!(
        "multi-static-camera IR: {} cameras ({} fixed), {} residual blocks",
        num_cameras,
        opts.fixed_cameras.len(),
        ir.residuals.len()
    );
    ir.validate()?;
    Ok((ir, initial_map))
}

impl CalibrationProblem for MultiStaticCameraPnPProblem {
    type Output = MultiStaticCameraPnPResult;

    fn build_ir(&self) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
        build_multi_static_camera_ir(self)
    }

    fn extract(&self, summary: SolveSummary) -> Result<Self::Output, CalibrationError> {
        let base_to_camera = (0..self.intr.len())
            .map(|idx| summary.pose(&camera_key(idx)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(MultiStaticCameraPnPResult {
            base_to_target: summary.pose(BASE_TO_TARGET)?,
            base_to_camera,
            converged: summary.converged,
            initial_cost_per_obs: summary.initial_cost_per_obs,
            final_cost_per_obs: summary.final_cost_per_obs,
            reprojection: summary.reprojection,
        })
    }
}

/// Optimize the shared target pose and the camera poses.
pub fn optimize_multi_static_camera(
    problem: &MultiStaticCameraPnPProblem,
    backend_opts: &BackendSolveOptions,
) -> Result<MultiStaticCameraPnPResult, CalibrationError> {
    optimize(problem, backend_opts)
}
