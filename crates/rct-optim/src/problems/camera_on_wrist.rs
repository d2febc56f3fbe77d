//! Camera rigidly mounted on a robot wrist, observing a static target.
//!
//! Unknowns are the camera mount (`camera_to_wrist`) and the target location
//! (`base_to_target`). The wrist pose of every image comes from the robot and
//! is held fixed inside the residuals.

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

const CAMERA_TO_WRIST: &str = "camera_to_wrist";
const BASE_TO_TARGET: &str = "base_to_target";

/// Solve options for the camera-on-wrist problem.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOnWristSolveOptions {
    pub robust_loss: RobustLoss,
    /// Hold the camera mount at its guess.
    pub fix_camera_to_wrist: bool,
    /// Hold the target at its guess, e.g. when its location was surveyed.
    pub fix_base_to_target: bool,
}

/// Calibration input for a camera on a moving wrist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrinsicCameraOnWristProblem {
    pub intr: CameraIntrinsics,
    /// Wrist pose in the base frame at each capture.
    pub base_to_wrist: Vec<Iso3>,
    /// Correspondences per capture, parallel to `base_to_wrist`.
    pub image_observations: Vec<CorrespondenceSet>,
    pub camera_to_wrist_guess: Iso3,
    pub base_to_target_guess: Iso3,
    #[serde(default)]
    pub options: CameraOnWristSolveOptions,
}

/// Result of the camera-on-wrist calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrinsicCameraOnWristResult {
    pub converged: bool,
    pub initial_cost_per_obs: f64,
    pub final_cost_per_obs: f64,
    pub reprojection: ReprojectionStats,
    pub camera_to_wrist: Iso3,
    pub base_to_target: Iso3,
}

impl ExtrinsicCameraOnWristResult {
    /// Camera pose expressed in the wrist frame.
    pub fn wrist_to_camera(&self) -> Iso3 {
        self.camera_to_wrist.inverse()
    }
}

/// Build IR for the camera-on-wrist problem.
pub fn build_camera_on_wrist_ir(
    problem: &ExtrinsicCameraOnWristProblem,
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
    validate_pose(&problem.camera_to_wrist_guess, "camera_to_wrist_guess")?;
    validate_pose(&problem.base_to_target_guess, "base_to_target_guess")?;
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
        CAMERA_TO_WRIST,
        POSE_DIM,
        FixedMask::pose(opts.fix_camera_to_wrist),
    );
    initial_map.insert(
        CAMERA_TO_WRIST.to_string(),
        iso3_to_pose6_dvec(&problem.camera_to_wrist_guess),
    );

    let target_id = ir.add_param_block(
        BASE_TO_TARGET,
        POSE_DIM,
        FixedMask::pose(opts.fix_base_to_target),
    );
    initial_map.insert(
        BASE_TO_TARGET.to_string(),
        iso3_to_pose6_dvec(&problem.base_to_target_guess),
    );

    let intr = problem.intr.to_array();
    for (wrist, obs) in problem.base_to_wrist.iter().zip(&problem.image_observations) {
        let wrist_to_base = iso3_to_pose6_array(&wrist.inverse());
        for (pw, uv) in obs.iter() {
            ir.add_residual_block(ResidualBlock::new(
                vec![camera_id, target_id],
                opts.robust_loss,
                FactorKind::ReprojCameraOnWrist {
                    pw: [pw.x, pw.y, pw.z],
                    uv: [uv.x, uv.y],
                    intr,
                    wrist_to_base,
                },
            ));
        }
    }

    debug!(
        "camera-on-wrist IR: {} images, {} residual blocks",
        problem.image_observations.len(),
        ir.residuals.len()
    );
    ir.validate()?;
    Ok((ir, initial_map))
}

impl CalibrationProblem for ExtrinsicCameraOnWristProblem {
    type Output = ExtrinsicCameraOnWristResult;

    fn build_ir(&self) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
        build_camera_on_wrist_ir(self)
    }

    fn extract(&self, summary: SolveSummary) -> Result<Self::Output, CalibrationError> {
        Ok(ExtrinsicCameraOnWristResult {
            camera_to_wrist: summary.pose(CAMERA_TO_WRIST)?,
            base_to_target: summary.pose(BASE_TO_TARGET)?,
            converged: summary.converged,
            initial_cost_per_obs: summary.initial_cost_per_obs,
            final_cost_per_obs: summary.final_cost_per_obs,
            reprojection: summary.reprojection,
        })
    }
}

/// Optimize the camera mount and target location.
pub fn optimize_camera_on_wrist(
    problem: &ExtrinsicCameraOnWristProblem,
    backend_opts: &BackendSolveOptions,
) -> Result<ExtrinsicCameraOnWristResult, CalibrationError> {
    optimize(problem, backend_opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rct_core::{Pt2, Pt3};

    fn one_point_problem(images: usize, wrists: usize) -> ExtrinsicCameraOnWristProblem {
        let obs = CorrespondenceSet::from_pairs([(Pt3::new(0.0, 0.0, 0.0), Pt2::new(320.0, 240.0))]);
        ExtrinsicCameraOnWristProblem {
            intr: CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0),
            base_to_wrist: vec![Iso3::identity(); wrists],
            image_observations: vec![obs; images],
            camera_to_wrist_guess: Iso3::identity(),
            base_to_target_guess: Iso3::translation(0.0, 0.0, 1.0),
            options: CameraOnWristSolveOptions::default(),
        }
    }

    #[test]
    fn builder_shares_both_pose_blocks() {
        let (ir, initial) = build_camera_on_wrist_ir(&one_point_problem(3, 3)).unwrap();
        assert_eq!(ir.params.len(), 2);
        assert_eq!(ir.residuals.len(), 3);
        assert_eq!(initial.len(), 2);
        let camera = ir.param_by_name(CAMERA_TO_WRIST).unwrap();
        let target = ir.param_by_name(BASE_TO_TARGET).unwrap();
        assert!(ir.residuals.iter().all(|r| r.params == vec![camera, target]));
    }

    #[test]
    fn builder_rejects_mismatched_wrist_poses() {
        let err = build_camera_on_wrist_ir(&one_point_problem(3, 2)).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput(_)));
    }

    #[test]
    fn builder_rejects_no_images() {
        let err = build_camera_on_wrist_ir(&one_point_problem(0, 0)).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput(_)));
    }

    #[test]
    fn fix_flags_become_fixed_masks() {
        let mut problem = one_point_problem(1, 1);
        problem.options.fix_base_to_target = true;
        let (ir, _) = build_camera_on_wrist_ir(&problem).unwrap();
        let target = ir.param_by_name(BASE_TO_TARGET).unwrap();
        let camera = ir.param_by_name(CAMERA_TO_WRIST).unwrap();
        assert!(ir.params[target.0].fixed.is_all_fixed(POSE_DIM));
        assert!(ir.params[camera.0].fixed.is_empty());
    }
}
