//! Core math and geometry primitives for `rct`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Pt3`, `Iso3`, ...),
//! - the ideal pinhole camera ([`CameraIntrinsics`]) and its generic projection,
//! - 6-parameter axis-angle poses ([`Pose6d`]) with rotation/transform helpers
//!   that are generic over [`nalgebra::RealField`] so they can be evaluated with
//!   dual numbers,
//! - 2D-3D correspondence containers ([`CorrespondenceSet`]),
//! - deterministic synthetic data helpers ([`synthetic`]).
//!
//! Frame naming: `a_to_b` is the pose of frame `b` expressed in frame `a`, so
//! applying it to a point expressed in `b` yields that point in `a`.

/// Linear algebra type aliases.
pub mod math;
/// Camera intrinsics and rigid pose models.
pub mod models;
/// Deterministic synthetic calibration data.
pub mod synthetic;
/// Observation containers.
pub mod types;

pub use math::*;
pub use models::*;
pub use types::*;
