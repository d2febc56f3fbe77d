//! Calibration problems and the shared solve driver.
//!
//! Each problem builds a [`ProblemIR`] with named pose blocks and one residual
//! block per observed target point, then [`optimize`] solves it with the
//! tiny-solver backend and reports cost per observation before and after.
//!
//! - [`camera_on_wrist`] - camera on the wrist, static target
//! - [`static_camera`] - static camera, target on the wrist
//! - [`multi_static_camera`] - several static cameras, one static target

pub mod camera_on_wrist;
pub mod multi_static_camera;
pub mod static_camera;

use crate::backend::{solve_with_backend, BackendSolveOptions};
use crate::error::{ensure_input, CalibrationError};
use crate::factors::evaluate_residuals;
use crate::ir::ProblemIR;
use crate::params::pose6::pose6_dvec_to_iso3;
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use nalgebra::DVector;
use rct_core::{CameraIntrinsics, CorrespondenceSet, Iso3, Pose6d, ReprojectionStats};
use std::collections::HashMap;

/// Cost per observation, in pixels, that counts as an exact fit.
const NEGLIGIBLE_COST_PX: f64 = 1e-6;
/// Smallest cost decrease, in pixels, that a further step must not beat.
const STATIONARY_ABS_TOL_PX: f64 = 1e-9;
/// Relative counterpart of [`STATIONARY_ABS_TOL_PX`].
const STATIONARY_REL_TOL: f64 = 1e-6;

/// A calibration problem that can be lowered to IR and read back from a solution.
pub trait CalibrationProblem {
    type Output;

    /// Build the IR and the initial value of every parameter block.
    fn build_ir(&self) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError>;

    /// Assemble the problem's result from a finished solve.
    fn extract(&self, summary: SolveSummary) -> Result<Self::Output, CalibrationError>;
}

/// Outcome of a solve shared by every problem.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub converged: bool,
    /// RMS residual component, in pixels, at the initial guesses.
    pub initial_cost_per_obs: f64,
    /// RMS residual component, in pixels, at the solution.
    pub final_cost_per_obs: f64,
    /// Per-point pixel error statistics at the solution.
    pub reprojection: ReprojectionStats,
    /// Final value of every parameter block, keyed by block name.
    pub params: HashMap<String, DVector<f64>>,
}

impl SolveSummary {
    /// Final pose of the block `name`.
    ///
    /// Fails only when the block is missing or is not six-dimensional.
    pub fn pose(&self, name: &str) -> Result<Iso3> {
        let v = self
            .params
            .get(name)
            .ok_or_else(|| anyhow!("solution is missing parameter block {}", name))?;
        pose6_dvec_to_iso3(v.as_view())
    }
}

/// Solve a calibration problem.
///
/// A solver failure is not an error: the result carries the initial guesses
/// with `converged == false`. Errors are reserved for invalid input and for
/// internal failures while building or reading back the problem.
pub fn optimize<P: CalibrationProblem>(
    problem: &P,
    backend_opts: &BackendSolveOptions,
) -> Result<P::Output, CalibrationError> {
    let (ir, initial) = problem.build_ir()?;
    ensure_input!(
        ir.has_free_params(),
        "every parameter block is fixed, nothing to optimize"
    );

    let initial_cost = cost_per_observation(&ir, &initial)?;
    let mut solution = solve_with_backend(&ir, &initial, backend_opts)?;
    if solution
        .params
        .values()
        .any(|v| v.iter().any(|x| !x.is_finite()))
    {
        warn!("solver produced non-finite parameters, keeping initial values");
        solution.params = initial.clone();
        solution.solver_succeeded = false;
    }
    let final_cost = cost_per_observation(&ir, &solution.params)?;

    let converged = solution.solver_succeeded
        && final_cost.is_finite()
        && (final_cost < initial_cost || initial_cost <= NEGLIGIBLE_COST_PX)
        && is_stationary(&ir, &solution.params, final_cost, backend_opts)?;
    if converged {
        info!(
            "solve converged: cost per observation {:.6} -> {:.6} px over {} residuals",
            initial_cost,
            final_cost,
            ir.residuals.len()
        );
    } else {
        warn!(
            "solve did not converge: cost per observation {:.6} -> {:.6} px",
            initial_cost, final_cost
        );
    }

    let reprojection = reprojection_stats(&ir, &solution.params)?;
    debug!(
        "reprojection at solution: mean {:.4} px, max {:.4} px",
        reprojection.mean, reprojection.max
    );

    problem.extract(SolveSummary {
        converged,
        initial_cost_per_obs: initial_cost,
        final_cost_per_obs: final_cost,
        reprojection,
        params: solution.params,
    })
}

/// Whether one more solver iteration from `values` would still lower the cost.
///
/// A solve that stopped on its iteration budget far from a minimum fails this
/// check; one that stopped on a decrease threshold passes it.
fn is_stationary(
    ir: &ProblemIR,
    values: &HashMap<String, DVector<f64>>,
    cost: f64,
    opts: &BackendSolveOptions,
) -> Result<bool> {
    if cost <= NEGLIGIBLE_COST_PX {
        return Ok(true);
    }
    let step_opts = BackendSolveOptions {
        max_iters: 1,
        ..opts.clone()
    };
    let step = solve_with_backend(ir, values, &step_opts)?;
    if !step.solver_succeeded {
        return Ok(false);
    }
    let next = cost_per_observation(ir, &step.params)?;
    let tol = STATIONARY_ABS_TOL_PX.max(
        opts.min_rel_decrease
            .unwrap_or(0.0)
            .max(STATIONARY_REL_TOL)
            * cost,
    );
    debug!(
        "stationarity check: cost {:.9} -> {:.9} px after one more step",
        cost, next
    );
    Ok(next.is_finite() && cost - next <= tol)
}

/// Root mean square over all scalar residual components (u and v counted separately).
pub fn cost_per_observation(
    ir: &ProblemIR,
    values: &HashMap<String, DVector<f64>>,
) -> Result<f64> {
    let residuals = evaluate_residuals(ir, values)?;
    let count = ir.num_residual_components();
    if count == 0 {
        return Ok(0.0);
    }
    let sum_sq: f64 = residuals.iter().map(|r| r.norm_squared()).sum();
    Ok((sum_sq / count as f64).sqrt())
}

/// Pixel distance between predicted and observed point, per residual block.
pub fn reprojection_stats(
    ir: &ProblemIR,
    values: &HashMap<String, DVector<f64>>,
) -> Result<ReprojectionStats> {
    let errors: Vec<f64> = evaluate_residuals(ir, values)?
        .iter()
        .map(|r| r.norm())
        .collect();
    Ok(ReprojectionStats::from_errors(&errors))
}

pub(crate) fn validate_intrinsics(
    intr: &CameraIntrinsics,
    label: &str,
) -> Result<(), CalibrationError> {
    ensure_input!(
        intr.is_valid(),
        "{} intrinsics must be finite with non-zero focal lengths: {:?}",
        label,
        intr
    );
    Ok(())
}

pub(crate) fn validate_pose(pose: &Iso3, label: &str) -> Result<(), CalibrationError> {
    ensure_input!(
        Pose6d::from_iso3(pose).is_finite(),
        "{} must be a finite pose",
        label
    );
    Ok(())
}

pub(crate) fn validate_correspondences(
    set: &CorrespondenceSet,
    label: &str,
) -> Result<(), CalibrationError> {
    ensure_input!(
        set.is_consistent(),
        "{} has {} target points but {} pixels",
        label,
        set.points_3d.len(),
        set.points_2d.len()
    );
    ensure_input!(!set.is_empty(), "{} has no correspondences", label);
    ensure_input!(
        set.iter()
            .all(|(p, uv)| p.coords.iter().chain(uv.coords.iter()).all(|v| v.is_finite())),
        "{} contains non-finite coordinates",
        label
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FactorKind, FixedMask, ResidualBlock, RobustLoss, POSE_DIM};
    use rct_core::{Pt2, Pt3};

    /// One camera, one target point, observed pixel given by `uv`.
    struct SinglePoint {
        uv: [f64; 2],
    }

    impl CalibrationProblem for SinglePoint {
        type Output = SolveSummary;

        fn build_ir(
            &self,
        ) -> Result<(ProblemIR, HashMap<String, DVector<f64>>), CalibrationError> {
            let mut ir = ProblemIR::new();
            let target = ir.add_param_block("base_to_target", POSE_DIM, FixedMask::all_free());
            let camera = ir.add_param_block("base_to_camera/0", POSE_DIM, FixedMask::pose(true));
            ir.add_residual_block(ResidualBlock::new(
                vec![target, camera],
                RobustLoss::None,
                FactorKind::ReprojMultiStaticCamera {
                    pw: [0.0, 0.0, 1.0],
                    uv: self.uv,
                    intr: [500.0, 500.0, 320.0, 240.0],
                },
            ));
            let mut initial = HashMap::new();
            initial.insert("base_to_target".to_string(), DVector::zeros(POSE_DIM));
            initial.insert("base_to_camera/0".to_string(), DVector::zeros(POSE_DIM));
            Ok((ir, initial))
        }

        fn extract(&self, summary: SolveSummary) -> Result<Self::Output, CalibrationError> {
            Ok(summary)
        }
    }

    #[test]
    fn nan_observation_yields_unconverged_initial_guess() {
        let problem = SinglePoint {
            uv: [f64::NAN, 240.0],
        };
        let summary = optimize(&problem, &BackendSolveOptions::default()).unwrap();

        assert!(!summary.converged);
        assert!(summary.initial_cost_per_obs.is_nan());
        assert_eq!(summary.params["base_to_target"], DVector::zeros(POSE_DIM));
        assert!(summary.pose("base_to_target").is_ok());
    }

    #[test]
    fn exact_initial_guess_counts_as_converged() {
        let problem = SinglePoint { uv: [320.0, 240.0] };
        let summary = optimize(&problem, &BackendSolveOptions::default()).unwrap();

        assert!(summary.converged);
        assert!(summary.final_cost_per_obs <= NEGLIGIBLE_COST_PX);
    }

    #[test]
    fn summary_pose_keeps_non_finite_entries() {
        let mut params = HashMap::new();
        let mut v = DVector::zeros(POSE_DIM);
        v[5] = f64::INFINITY;
        params.insert("base_to_camera".to_string(), v);
        let summary = SolveSummary {
            converged: false,
            initial_cost_per_obs: 1.0,
            final_cost_per_obs: 1.0,
            reprojection: ReprojectionStats::from_errors(&[]),
            params,
        };

        let pose = summary.pose("base_to_camera").unwrap();
        assert!(pose.translation.vector.z.is_infinite());
        assert!(summary.pose("missing").is_err());
    }

    #[test]
    fn correspondence_validation_reports_the_image() {
        let empty = CorrespondenceSet::default();
        let err = validate_correspondences(&empty, "image 3").unwrap_err();
        assert!(err.to_string().contains("image 3"));

        let bad = CorrespondenceSet {
            points_3d: vec![Pt3::new(0.0, 0.0, 0.0)],
            points_2d: vec![],
        };
        assert!(validate_correspondences(&bad, "image 0").is_err());

        let nan = CorrespondenceSet::from_pairs([(Pt3::new(0.0, f64::NAN, 0.0), Pt2::new(1.0, 2.0))]);
        assert!(validate_correspondences(&nan, "image 0").is_err());
    }

    #[test]
    fn pose_validation_rejects_nan() {
        let mut pose = Iso3::identity();
        assert!(validate_pose(&pose, "guess").is_ok());
        pose.translation.vector.x = f64::NAN;
        assert!(matches!(
            validate_pose(&pose, "guess"),
            Err(CalibrationError::InvalidInput(_))
        ));
    }
}
