//! Static camera observing a target carried by the robot wrist.
//!
//! Unknowns are the camera location (`base_to_camera`) and the target mount
//! (`wrist_to_target`); the wrist pose of every image is fixed data.

use super::{
    optimize, validate_correspondences, validate_intrinsics, validate_pose, CalibrationProblem,
    SolveSummary,
};
use crate::backend::BackendSolveOptions;
use crate::error::{ensure_input, CalibrationError};
use crate::ir::{FactorKind, FixedMask, ProblemIR, ResidualBlock, RobustLoss, POSE_DIM};
use crate::params::pose6::{iso3_to_pose6_array, iso3_to_pose6_dvec};
use log::debug;
use nalgebra::DVector;
use rct_core::{CameraIntrinsics, CorrespondenceSet, Iso3, ReprojectionStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BASE_TO_CAMERA: &str = "base_to_camera";
const WRIST_TO_TARGET: &str = "wrist_to_target";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticCameraSolveOptions {
    pub robust_loss: RobustLoss,
    pub fix_base_to_camera: bool,
    pub fix_wrist_to_target: bool,
}

/// Calibration input for a static camera and a target on the wrist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrinsicStaticCameraMovingTargetProblem {
    pub intr: CameraIntrinsics,
    /// Wrist pose in the base frame at each capture.
    pub base_to_wrist: Vec<Iso3>,
    /// Correspondences per capture, parallel to `base_to_wrist`.
    pub image_observations: Vec<CorrespondenceSet>,
    pub base_to_camera_guess: Iso3,
    pub wrist_to_target_guess: Iso3,
    #[serde(default)]
    pub options: StaticCameraSolveOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrinsicStaticCameraMovingTargetResult {
    pub converged: bool,
    pub initial_cost_per_obs: f64,
    pub final_cost_per_obs: f64,
    pub reprojection: ReprojectionStats,
    pub base_to_camera: Iso3,
    pub wrist_to_target: Iso3,
}

/// Build IR for the static-camera, moving-target problem.
pub fn build_static_camera_ir(
    problem: &ExtrinsicStaticCameraMovingTargetProblem,
) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
    validate_intrinsics(&problem.intr, "camera")?;
    ensure_input!(
        !problem.image_observations.is_empty(),
        "need at least one image"
    );
    ensure_input!(
        problem.base_to_wrist.len() == problem.image_observations.len(),
        "base_to_wrist count {} != image count {}",
        problem.base_to_wrist.len(),
        problem.image_observations.len()
    );
    validate_pose(&problem.base_to_camera_guess, "base_to_camera_guess")?;
    validate_pose(&problem.wrist_to_target_guess, "wrist_to_target_guess")?;
    for (idx, (wrist, obs)) in problem
        .base_to_wrist
        .iter()
        .zip(&problem.image_observations)
        .enumerate()
    {
        validate_pose(wrist, &format!("base_to_wrist[{}]", idx))?;
        validate_correspondences(obs, &format!("image {}", idx))?;
    }

    let opts = &problem.options;
    let mut ir = ProblemIR::new();
    let mut initial_map = HashMap::new();

    let camera_id = ir.add_param_block(
        BASE_TO_CAMERA,
        POSE_DIM,
        FixedMask::pose(opts.fix_base_to_camera),
    );
    initial_map.insert(
        BASE_TO_CAMERA.to_string(),
        iso3_to_pose6_dvec(&problem.base_to_camera_guess),
    );
    let target_id = ir.add_param_block(
        WRIST_TO_TARGET,
        POSE_DIM,
        FixedMask::pose(opts.fix_wrist_to_target),
    );
    initial_map.insert(
        WRIST_TO_TARGET.to_string(),
        iso3_to_pose6_dvec(&problem.wrist_to_target_guess),
    );

    let intr = problem.intr.to_array();
    for (wrist, obs) in problem.base_to_wrist.iter().zip(&problem.image_observations) {
        let base_to_wrist = iso3_to_pose6_array(wrist);
        for (pw, uv) in obs.iter() {
            ir.add_residual_block(ResidualBlock::new(
                vec![camera_id, target_id],
                opts.robust_loss,
                FactorKind::ReprojStaticCameraMovingTarget {
                    pw: [pw.x, pw.y, pw.z],
                    uv: [uv.x, uv.y],
                    intr,
                    base_to_wrist,
                },
            ));
        }
    }

    debug!(
        "static-camera IR: {} images, {} residual blocks",
        problem.image_observations.len(),
        ir.residuals.len()
    );
    ir.validate()?;
    Ok((ir, initial_map))
}

impl CalibrationProblem for ExtrinsicStaticCameraMovingTargetProblem {
    type Output = ExtrinsicStaticCameraMovingTargetResult;

    fn build_ir(&self) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
        build_static_camera_ir(self)
    }

    fn extract(&self, summary: SolveSummary) -> Result<Self::Output, CalibrationError> {
        Ok(ExtrinsicStaticCameraMovingTargetResult {
            base_to_camera: summary.pose(BASE_TO_CAMERA)?,
            wrist_to_target: summary.pose(WRIST_TO_TARGET)?,
            converged: summary.converged,
            initial_cost_per_obs: summary.initial_cost_per_obs,
            final_cost_per_obs: summary.final_cost_per_obs,
            reprojection: summary.reprojection,
        })
    }
}

/// Optimize the camera location and target mount.
pub fn optimize_static_camera(
    problem: &ExtrinsicStaticCameraMovingTargetProblem,
    backend_opts: &BackendSolveOptions,
) -> Result<ExtrinsicStaticCameraMovingTargetResult, CalibrationError> {
    optimize(problem, backend_opts)
}
