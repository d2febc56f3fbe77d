//! Pose helpers for synthetic scenes.

use crate::{Iso3, Pt3, Vec3};
use nalgebra::{Translation3, UnitQuaternion};

/// Pose of a camera placed at `eye` and looking at `target`, expressed in the
/// frame the two points are given in (camera +Z points at `target`).
///
/// `up` must not be parallel to `target - eye`.
pub fn look_at(eye: &Pt3, target: &Pt3, up: &Vec3) -> Iso3 {
    Iso3::face_towards(eye, target, up)
}

/// Right-multiply `pose` by a small axis-angle rotation and translation.
pub fn perturb(pose: &Iso3, rotation: Vec3, translation: Vec3) -> Iso3 {
    let delta = Iso3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_scaled_axis(rotation),
    );
    pose * delta
}
