use crate::backend::{BackendSolution, BackendSolveOptions, LinearSolverKind, OptimBackend};
use crate::factors::ReprojectionFactor;
use crate::ir::{ProblemIR, RobustLoss};
use anyhow::{anyhow, ensure, Result};
use log::{debug, warn};
use nalgebra::DVector;
use std::collections::HashMap;
use tiny_solver::loss_functions::{ArctanLoss, CauchyLoss, HuberLoss, Loss};
use tiny_solver::optimizer::{Optimizer, OptimizerOptions};
use tiny_solver::problem::Problem;
use tiny_solver::{linear::sparse::LinearSolverType, LevenbergMarquardtOptimizer};

/// tiny-solver backend adapter.
#[derive(Debug, Clone, Copy)]
pub struct TinySolverBackend;

impl TinySolverBackend {
    fn compile(&self, ir: &ProblemIR, initial: &HashMap<String, DVector<f64>>) -> Result<Problem> {
        ir.validate()?;

        let mut problem = Problem::new();

        for param in &ir.params {
            let init = initial.get(&param.name).ok_or_else(|| {
                anyhow!(
                    "initial values missing parameter {} (id {:?})",
                    param.name,
                    param.id
                )
            })?;
            ensure!(
                init.len() == param.dim,
                "initial dimension mismatch for {}: expected {}, got {}",
                param.name,
                param.dim,
                init.len()
            );
            ensure!(
                init.iter().all(|v| v.is_finite()),
                "initial value of {} is not finite",
                param.name
            );

            for idx in param.fixed.iter() {
                problem.fix_variable(&param.name, idx);
            }
        }

        for residual in &ir.residuals {
            let loss = compile_loss(residual.loss)?;
            let factor = ReprojectionFactor::from(&residual.factor);
            let param_refs = residual
                .params
                .iter()
                .map(|id| ir.param_name(*id))
                .collect::<Result<Vec<&str>>>()?;
            problem.add_residual_block(residual.residual_dim, &param_refs, Box::new(factor), loss);
        }

        Ok(problem)
    }
}

impl OptimBackend for TinySolverBackend {
    fn solve(
        &self,
        ir: &ProblemIR,
        initial: &HashMap<String, DVector<f64>>,
        opts: &BackendSolveOptions,
    ) -> Result<BackendSolution> {
        let problem = self.compile(ir, initial)?;
        debug!(
            "tiny-solver: {} param blocks, {} residual blocks, max {} iterations",
            ir.params.len(),
            ir.residuals.len(),
            opts.max_iters
        );

        let optimizer = LevenbergMarquardtOptimizer::default();
        let options = opts.to_tiny_solver();
        let mut params = initial.clone();
        match optimizer.optimize(&problem, initial, Some(options)) {
            Some(solution) => {
                params.extend(solution);
                Ok(BackendSolution {
                    params,
                    solver_succeeded: true,
                })
            }
            None => {
                warn!("tiny-solver returned no solution, keeping initial values");
                Ok(BackendSolution {
                    params,
                    solver_succeeded: false,
                })
            }
        }
    }
}

impl From<LinearSolverKind> for LinearSolverType {
    fn from(kind: LinearSolverKind) -> Self {
        match kind {
            LinearSolverKind::SparseCholesky => LinearSolverType::SparseCholesky,
            LinearSolverKind::SparseQR => LinearSolverType::SparseQR,
        }
    }
}

impl BackendSolveOptions {
    /// Map onto tiny-solver's options; `None` fields keep tiny-solver's defaults.
    fn to_tiny_solver(&self) -> OptimizerOptions {
        let mut options = OptimizerOptions {
            max_iteration: self.max_iters,
            verbosity_level: self.verbosity,
            ..OptimizerOptions::default()
        };
        if let Some(kind) = self.linear_solver {
            options.linear_solver_type = kind.into();
        }
        options.min_abs_error_decrease_threshold = self
            .min_abs_decrease
            .unwrap_or(options.min_abs_error_decrease_threshold);
        options.min_rel_error_decrease_threshold = self
            .min_rel_decrease
            .unwrap_or(options.min_rel_error_decrease_threshold);
        options.min_error_threshold = self.min_error.unwrap_or(options.min_error_threshold);
        options
    }
}

fn compile_loss(loss: RobustLoss) -> Result<Option<Box<dyn Loss + Send>>> {
    if let Some(scale) = loss.scale() {
        ensure!(
            scale.is_finite() && scale > 0.0,
            "robust loss {:?} needs a positive, finite scale",
            loss
        );
    }
    Ok(match loss {
        RobustLoss::None => None,
        RobustLoss::Huber { scale } => Some(Box::new(HuberLoss::new(scale))),
        RobustLoss::Cauchy { scale } => Some(Box::new(CauchyLoss::new(scale))),
        RobustLoss::Arctan { scale } => Some(Box::new(ArctanLoss::new(scale))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FactorKind, FixedMask, ResidualBlock, POSE_DIM};

    fn single_residual_ir(loss: RobustLoss) -> (ProblemIR, HashMap<String, DVector<f64>>) {
        let mut ir = ProblemIR::new();
        let target = ir.add_param_block("base_to_target", POSE_DIM, FixedMask::all_free());
        let camera = ir.add_param_block("base_to_camera/0", POSE_DIM, FixedMask::pose(true));
        ir.add_residual_block(ResidualBlock::new(
            vec![target, camera],
            loss,
            FactorKind::ReprojMultiStaticCamera {
                pw: [0.0, 0.0, 1.0],
                uv: [320.0, 240.0],
                intr: [500.0, 500.0, 320.0, 240.0],
            },
        ));
        let mut initial = HashMap::new();
        initial.insert("base_to_target".to_string(), DVector::zeros(POSE_DIM));
        initial.insert("base_to_camera/0".to_string(), DVector::zeros(POSE_DIM));
        (ir, initial)
    }

    #[test]
    fn compile_rejects_missing_initial_value() {
        let (ir, mut initial) = single_residual_ir(RobustLoss::None);
        initial.remove("base_to_camera/0");
        let err = TinySolverBackend
            .compile(&ir, &initial)
            .err()
            .expect("missing initial value must fail");
        assert!(err.to_string().contains("base_to_camera/0"));
    }

    #[test]
    fn compile_rejects_non_positive_loss_scale() {
        let (ir, initial) = single_residual_ir(RobustLoss::Cauchy { scale: 0.0 });
        assert!(TinySolverBackend.compile(&ir, &initial).is_err());
    }

    #[test]
    fn options_map_onto_tiny_solver() {
        let opts = BackendSolveOptions {
            max_iters: 12,
            min_error: Some(1e-3),
            linear_solver: Some(LinearSolverKind::SparseQR),
            ..BackendSolveOptions::default()
        };
        let options = opts.to_tiny_solver();
        assert_eq!(options.max_iteration, 12);
        assert_eq!(options.min_error_threshold, 1e-3);
        assert!(matches!(options.linear_solver_type, LinearSolverType::SparseQR));
    }
}
