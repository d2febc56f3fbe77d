//! 6D axis-angle pose conversions for tiny-solver.

use anyhow::{ensure, Result};
use nalgebra::{DVector, DVectorView};
use rct_core::{Iso3, Pose6d};

/// Convert an `Iso3` into a 6D parameter vector `[rx, ry, rz, tx, ty, tz]`.
pub fn iso3_to_pose6_dvec(pose: &Iso3) -> DVector<f64> {
    DVector::from_row_slice(&iso3_to_pose6_array(pose))
}

/// Same layout as [`iso3_to_pose6_dvec`], as a plain array.
pub fn iso3_to_pose6_array(pose: &Iso3) -> [f64; 6] {
    Pose6d::from_iso3(pose).to_array()
}

/// Convert a 6D vector `[rx, ry, rz, tx, ty, tz]` into an `Iso3`.
///
/// Only the length is checked; non-finite entries carry through to the pose.
pub fn pose6_dvec_to_iso3(v: DVectorView<'_, f64>) -> Result<Iso3> {
    ensure!(
        v.len() == Pose6d::DIM,
        "expected pose vector of length {}, got {}",
        Pose6d::DIM,
        v.len()
    );
    let values: Vec<f64> = v.iter().copied().collect();
    Ok(Pose6d::from_slice(&values)?.to_iso3())
}
