use crate::{Iso3, Pt3, Real, Vec3};
use anyhow::{ensure, Result};
use nalgebra::{DVectorView, RealField, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Rigid transform stored as axis-angle rotation plus translation.
///
/// The rotation vector's direction is the rotation axis and its norm is the
/// angle in radians. `Pose6d` applies the rotation first, then the translation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose6d {
    /// Axis-angle rotation `[rx, ry, rz]`.
    pub rotation: Vec3,
    /// Translation `[tx, ty, tz]`.
    pub translation: Vec3,
}

impl Default for Pose6d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose6d {
    pub const DIM: usize = 6;

    pub fn new(rotation: Vec3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }

    pub fn from_iso3(pose: &Iso3) -> Self {
        Self::new(pose.rotation.scaled_axis(), pose.translation.vector)
    }

    pub fn to_iso3(&self) -> Iso3 {
        Iso3::new(self.translation, self.rotation)
    }

    /// Parameters in solver order `[rx, ry, rz, tx, ty, tz]`.
    pub fn to_array(&self) -> [Real; 6] {
        [
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.translation.x,
            self.translation.y,
            self.translation.z,
        ]
    }

    /// Build from `[rx, ry, rz, tx, ty, tz]`.
    pub fn from_slice(values: &[Real]) -> Result<Self> {
        ensure!(
            values.len() == Self::DIM,
            "expected pose vector of length {}, got {}",
            Self::DIM,
            values.len()
        );
        Ok(Self::new(
            Vec3::new(values[0], values[1], values[2]),
            Vec3::new(values[3], values[4], values[5]),
        ))
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    pub fn inverse(&self) -> Self {
        Self::from_iso3(&self.to_iso3().inverse())
    }

    /// Apply the pose to a point: `R * p + t`.
    pub fn transform_point(&self, point: &Pt3) -> Pt3 {
        Pt3::from(transform_point(
            &self.rotation,
            &self.translation,
            &point.coords,
        ))
    }

    /// Apply the inverse pose to a point: `R^T * (p - t)`.
    pub fn inverse_transform_point(&self, point: &Pt3) -> Pt3 {
        Pt3::from(inverse_transform_point(
            &self.rotation,
            &self.translation,
            &point.coords,
        ))
    }
}

impl Mul for Pose6d {
    type Output = Pose6d;

    /// `(a * b).transform_point(p) == a.transform_point(b.transform_point(p))`.
    fn mul(self, rhs: Pose6d) -> Pose6d {
        Pose6d::from_iso3(&(self.to_iso3() * rhs.to_iso3()))
    }
}

/// Rotate a point by an axis-angle vector (Rodrigues' formula).
///
/// Near zero rotation the first-order form `p + w x p` is used so that the
/// derivative never passes through `sqrt(0)`.
pub fn angle_axis_rotate_point<T: RealField>(angle_axis: &Vector3<T>, pt: &Vector3<T>) -> Vector3<T> {
    let theta2 = angle_axis.norm_squared();
    if theta2 > T::from_f64(f64::EPSILON).unwrap() {
        let theta = theta2.sqrt();
        let cos_theta = theta.clone().cos();
        let sin_theta = theta.clone().sin();
        let w = angle_axis.unscale(theta);
        let w_cross_pt = w.cross(pt);
        let tmp = w.dot(pt) * (T::one() - cos_theta.clone());
        pt * cos_theta + w_cross_pt * sin_theta + w * tmp
    } else {
        pt + angle_axis.cross(pt)
    }
}

/// Apply a pose given as axis-angle rotation and translation to a point.
pub fn transform_point<T: RealField>(
    rotation: &Vector3<T>,
    translation: &Vector3<T>,
    pt: &Vector3<T>,
) -> Vector3<T> {
    angle_axis_rotate_point(rotation, pt) + translation
}

/// Apply the inverse of a pose given as axis-angle rotation and translation.
pub fn inverse_transform_point<T: RealField>(
    rotation: &Vector3<T>,
    translation: &Vector3<T>,
    pt: &Vector3<T>,
) -> Vector3<T> {
    let inv_rotation = -rotation.clone();
    angle_axis_rotate_point(&inv_rotation, &(pt - translation))
}

/// Split a 6-parameter pose block `[rx, ry, rz, tx, ty, tz]` into rotation and translation.
pub fn pose_from_params<T: RealField>(pose: DVectorView<'_, T>) -> (Vector3<T>, Vector3<T>) {
    debug_assert_eq!(pose.len(), Pose6d::DIM, "pose must have 6 params");
    (
        Vector3::new(pose[0].clone(), pose[1].clone(), pose[2].clone()),
        Vector3::new(pose[3].clone(), pose[4].clone(), pose[5].clone()),
    )
}
