use anyhow::{anyhow, ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Dimension of every pose block: `[rx, ry, rz, tx, ty, tz]`.
pub const POSE_DIM: usize = 6;

/// Identifier for a parameter block in the IR.
///
/// This is stable within a `ProblemIR` instance and is used by residual blocks
/// to reference their parameter dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub usize);

/// Fixed parameter mask for a block.
///
/// Backends interpret this as per-index fixing; a pose is held constant by
/// fixing all six indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedMask {
    fixed_indices: HashSet<usize>,
}

impl FixedMask {
    /// Creates a mask with no fixed indices.
    pub fn all_free() -> Self {
        Self {
            fixed_indices: HashSet::new(),
        }
    }

    /// Creates a mask with all indices fixed.
    pub fn all_fixed(dim: usize) -> Self {
        Self {
            fixed_indices: (0..dim).collect(),
        }
    }

    /// `all_fixed(dim)` when `fixed` is set, otherwise `all_free()`.
    pub fn pose(fixed: bool) -> Self {
        if fixed {
            Self::all_fixed(POSE_DIM)
        } else {
            Self::all_free()
        }
    }

    pub fn is_fixed(&self, idx: usize) -> bool {
        self.fixed_indices.contains(&idx)
    }

    /// Returns `true` if all indices `[0, dim)` are fixed.
    pub fn is_all_fixed(&self, dim: usize) -> bool {
        (0..dim).all(|idx| self.is_fixed(idx))
    }

    /// Iterates over fixed indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.fixed_indices.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fixed_indices.is_empty()
    }
}

/// Robust loss applied to a residual block.
///
/// Each observed point is its own residual block, so the loss acts per point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RobustLoss {
    #[default]
    None,
    Huber {
        scale: f64,
    },
    Cauchy {
        scale: f64,
    },
    Arctan {
        scale: f64,
    },
}

impl RobustLoss {
    /// Scale parameter in pixels, `None` for the plain quadratic loss.
    pub fn scale(&self) -> Option<f64> {
        match *self {
            RobustLoss::None => None,
            RobustLoss::Huber { scale }
            | RobustLoss::Cauchy { scale }
            | RobustLoss::Arctan { scale } => Some(scale),
        }
    }
}

/// Backend-agnostic factor kinds.
///
/// Every kind is a pinhole reprojection of one target point with fixed
/// intrinsics `[fx, fy, cx, cy]` and two free pose blocks. They differ in the
/// transform chain that carries the target point into the camera frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorKind {
    /// Camera rigidly mounted on a moving wrist.
    ///
    /// Parameters: `[camera_to_wrist, base_to_target]`.
    /// Chain: `p_cam = camera_to_wrist * wrist_to_base * base_to_target * p_target`.
    ReprojCameraOnWrist {
        pw: [f64; 3],
        uv: [f64; 2],
        intr: [f64; 4],
        wrist_to_base: [f64; 6],
    },
    /// Static camera observing a target carried by the wrist.
    ///
    /// Parameters: `[base_to_camera, wrist_to_target]`.
    /// Chain: `p_cam = base_to_camera^-1 * base_to_wrist * wrist_to_target * p_target`.
    ReprojStaticCameraMovingTarget {
        pw: [f64; 3],
        uv: [f64; 2],
        intr: [f64; 4],
        base_to_wrist: [f64; 6],
    },
    /// One of several static cameras observing a static target.
    ///
    /// Parameters: `[base_to_target, base_to_camera]`.
    /// Chain: `p_cam = base_to_camera^-1 * base_to_target * p_target`.
    ReprojMultiStaticCamera {
        pw: [f64; 3],
        uv: [f64; 2],
        intr: [f64; 4],
    },
}

impl FactorKind {
    /// Residual dimension implied by the factor.
    pub fn residual_dim(&self) -> usize {
        2
    }

    /// Number of parameter blocks the factor consumes.
    pub fn num_params(&self) -> usize {
        2
    }

}

/// Parameter block definition in the IR.
#[derive(Debug, Clone)]
pub struct ParamBlock {
    pub id: ParamId,
    pub name: String,
    pub dim: usize,
    pub fixed: FixedMask,
}

/// Residual block definition in the IR.
///
/// The order of `params` must match the factor's expected parameter order.
#[derive(Debug, Clone)]
pub struct ResidualBlock {
    pub params: Vec<ParamId>,
    pub loss: RobustLoss,
    pub factor: FactorKind,
    pub residual_dim: usize,
}

impl ResidualBlock {
    /// Residual block with the dimension implied by `factor`.
    pub fn new(params: Vec<ParamId>, loss: RobustLoss, factor: FactorKind) -> Self {
        let residual_dim = factor.residual_dim();
        Self {
            params,
            loss,
            factor,
            residual_dim,
        }
    }
}

/// Backend-agnostic optimization problem representation.
///
/// Backends compile this IR into solver-specific problems.
#[derive(Debug, Default, Clone)]
pub struct ProblemIR {
    pub params: Vec<ParamBlock>,
    pub residuals: Vec<ResidualBlock>,
}

impl ProblemIR {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter block and returns its `ParamId`.
    pub fn add_param_block(
        &mut self,
        name: impl Into<String>,
        dim: usize,
        fixed: FixedMask,
    ) -> ParamId {
        let id = ParamId(self.params.len());
        self.params.push(ParamBlock {
            id,
            name: name.into(),
            dim,
            fixed,
        });
        id
    }

    pub fn add_residual_block(&mut self, residual: ResidualBlock) {
        self.residuals.push(residual);
    }

    /// Finds a parameter by name.
    pub fn param_by_name(&self, name: &str) -> Option<ParamId> {
        self.params.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// Name of the block behind `id`.
    pub fn param_name(&self, id: ParamId) -> Result<&str> {
        self.params
            .get(id.0)
            .map(|p| p.name.as_str())
            .ok_or_else(|| anyhow!("unknown param {:?}", id))
    }

    /// Total number of scalar residual components.
    pub fn num_residual_components(&self) -> usize {
        self.residuals.iter().map(|r| r.residual_dim).sum()
    }

    /// `true` if at least one parameter index is left free.
    pub fn has_free_params(&self) -> bool {
        self.params.iter().any(|p| !p.fixed.is_all_fixed(p.dim))
    }

    /// Validates internal consistency and factor expectations.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (idx, param) in self.params.iter().enumerate() {
            ensure!(
                param.id.0 == idx,
                "param id mismatch: expected {}, got {:?}",
                idx,
                param.id
            );
            ensure!(
                names.insert(param.name.as_str()),
                "duplicate param name {}",
                param.name
            );
            for fixed_idx in param.fixed.iter() {
                ensure!(
                    fixed_idx < param.dim,
                    "param {} fixed index {} out of range",
                    param.name,
                    fixed_idx
                );
            }
        }

        for (r_idx, residual) in self.residuals.iter().enumerate() {
            ensure!(
                residual.residual_dim == residual.factor.residual_dim(),
                "residual {} dim {} does not match factor expectation {}",
                r_idx,
                residual.residual_dim,
                residual.factor.residual_dim()
            );
            ensure!(
                residual.params.len() == residual.factor.num_params(),
                "residual {} has {} params, factor expects {}",
                r_idx,
                residual.params.len(),
                residual.factor.num_params()
            );
            for (slot, param) in residual.params.iter().enumerate() {
                let block = self.params.get(param.0).ok_or_else(|| {
                    anyhow!("residual {} references missing param {:?}", r_idx, param)
                })?;
                ensure!(
                    block.dim == POSE_DIM,
                    "residual {} expects a {}D pose in slot {}, got {} with dim {}",
                    r_idx,
                    POSE_DIM,
                    slot,
                    block.name,
                    block.dim
                );
            }
            ensure!(
                residual.params[0] != residual.params[1],
                "residual {} uses {:?} for both pose slots",
                r_idx,
                residual.params[0]
            );
        }

        Ok(())
    }
}
