//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing synthetic calibration problems used
//! in tests and examples:
//! - target point grids (planar or with out-of-plane relief),
//! - pose helpers (look-at cameras, small perturbations),
//! - projection helpers producing [`crate::CorrespondenceSet`],
//! - deterministic pseudo-random pixel noise.
//!
//! # Example
//!
//! ```
//! use rct_core::{synthetic::{planar, poses}, CameraIntrinsics, Pt3, Vec3};
//!
//! let k = CameraIntrinsics::new(550.0, 550.0, 320.0, 240.0);
//! let board = planar::grid_points(5, 4, 0.05);
//! let base_to_camera = poses::look_at(&Pt3::new(0.1, 0.0, 1.0), &Pt3::origin(), &Vec3::x());
//! let set = planar::project_set(&k, &base_to_camera.inverse(), &board).unwrap();
//! assert_eq!(set.len(), 20);
//! ```

pub mod noise;
pub mod planar;
pub mod poses;
