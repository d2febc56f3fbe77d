//! Residual factors with automatic differentiation support.
//!
//! All factors are generic over [`nalgebra::RealField`] so tiny-solver can
//! evaluate them with dual numbers for Jacobians and with `f64` for costs.
//!
//! Constants are lifted with `T::from_f64(..).unwrap()`; the rotation path
//! goes through `rct_core::angle_axis_rotate_point`, which stays smooth at
//! zero rotation.

pub mod reprojection;

use crate::ir::{FactorKind, ProblemIR};
use anyhow::{anyhow, Result};
use nalgebra::{DVector, RealField};
use reprojection::{
    CameraOnWristFactor, MultiStaticCameraFactor, ObservationData,
    StaticCameraMovingTargetFactor,
};
use std::collections::HashMap;
use tiny_solver::factors::Factor;

/// Concrete factor compiled from an IR [`FactorKind`].
#[derive(Debug, Clone)]
pub enum ReprojectionFactor {
    CameraOnWrist(CameraOnWristFactor),
    StaticCameraMovingTarget(StaticCameraMovingTargetFactor),
    MultiStaticCamera(MultiStaticCameraFactor),
}

impl From<&FactorKind> for ReprojectionFactor {
    fn from(kind: &FactorKind) -> Self {
        match kind {
            FactorKind::ReprojCameraOnWrist {
                pw,
                uv,
                intr,
                wrist_to_base,
            } => ReprojectionFactor::CameraOnWrist(CameraOnWristFactor {
                obs: ObservationData {
                    pw: *pw,
                    uv: *uv,
                    intr: *intr,
                },
                wrist_to_base: *wrist_to_base,
            }),
            FactorKind::ReprojStaticCameraMovingTarget {
                pw,
                uv,
                intr,
                base_to_wrist,
            } => ReprojectionFactor::StaticCameraMovingTarget(StaticCameraMovingTargetFactor {
                obs: ObservationData {
                    pw: *pw,
                    uv: *uv,
                    intr: *intr,
                },
                base_to_wrist: *base_to_wrist,
            }),
            FactorKind::ReprojMultiStaticCamera { pw, uv, intr } => {
                ReprojectionFactor::MultiStaticCamera(MultiStaticCameraFactor {
                    obs: ObservationData {
                        pw: *pw,
                        uv: *uv,
                        intr: *intr,
                    },
                })
            }
        }
    }
}

impl<T: RealField> Factor<T> for ReprojectionFactor {
    fn residual_func(&self, params: &[DVector<T>]) -> DVector<T> {
        match self {
            ReprojectionFactor::CameraOnWrist(f) => Factor::<T>::residual_func(f, params),
            ReprojectionFactor::StaticCameraMovingTarget(f) => Factor::<T>::residual_func(f, params),
            ReprojectionFactor::MultiStaticCamera(f) => Factor::<T>::residual_func(f, params),
        }
    }
}

/// Evaluate every residual block of `ir` at `values` with plain `f64`.
///
/// Losses are not applied; the returned vectors are raw pixel residuals in
/// IR order.
pub fn evaluate_residuals(
    ir: &ProblemIR,
    values: &HashMap<String, DVector<f64>>,
) -> Result<Vec<DVector<f64>>> {
    ir.residuals
        .iter()
        .map(|residual| {
            let blocks = residual
                .params
                .iter()
                .map(|id| {
                    let name = ir.param_name(*id)?;
                    values
                        .get(name)
                        .cloned()
                        .ok_or_else(|| anyhow!("no value for parameter block {}", name))
                })
                .collect::<Result<Vec<_>>>()?;
            let factor = ReprojectionFactor::from(&residual.factor);
            Ok(Factor::<f64>::residual_func(&factor, &blocks))
        })
        .collect()
}
