//! Reprojection-error extrinsic calibration on top of tiny-solver.
//!
//! Problems are lowered to a small backend-independent IR (named 6D pose
//! blocks plus one reprojection residual per observed target point), solved
//! with tiny-solver's Levenberg-Marquardt, and read back into result structs
//! that report the cost per observation before and after the solve.
//!
//! # Problems
//!
//! - [`problems::camera_on_wrist`]: camera on a robot wrist, static target
//! - [`problems::static_camera`]: static camera, target on the wrist
//! - [`problems::multi_static_camera`]: N static cameras, one shared target
//!
//! # Example
//!
//! ```no_run
//! use rct_core::{CameraIntrinsics, CorrespondenceSet, Iso3};
//! use rct_optim::backend::BackendSolveOptions;
//! use rct_optim::problems::multi_static_camera::{
//!     MultiStaticCameraPnPProblem, MultiStaticCameraSolveOptions,
//! };
//! use rct_optim::optimize;
//!
//! # fn observations() -> Vec<Vec<CorrespondenceSet>> { unimplemented!() }
//! let problem = MultiStaticCameraPnPProblem {
//!     intr: vec![CameraIntrinsics::new(550.0, 550.0, 320.0, 240.0)],
//!     base_to_target_guess: Iso3::translation(0.0, 0.0, 1.0),
//!     image_observations: observations(),
//!     base_to_camera: vec![Iso3::identity()],
//!     options: MultiStaticCameraSolveOptions::default(),
//! };
//! let result = optimize(&problem, &BackendSolveOptions::default())?;
//! if result.converged {
//!     println!("target at {}", result.base_to_target.translation.vector);
//! }
//! # Ok::<(), rct_optim::CalibrationError>(())
//! ```

pub mod backend;
pub mod error;
pub mod factors;
pub mod ir;
pub mod params;
pub mod problems;

pub use error::CalibrationError;
pub use problems::camera_on_wrist::{
    optimize_camera_on_wrist, ExtrinsicCameraOnWristProblem, ExtrinsicCameraOnWristResult,
};
pub use problems::multi_static_camera::{
    optimize_multi_static_camera, MultiStaticCameraPnPProblem, MultiStaticCameraPnPResult,
};
pub use problems::static_camera::{
    optimize_static_camera, ExtrinsicStaticCameraMovingTargetProblem,
    ExtrinsicStaticCameraMovingTargetResult,
};
pub use problems::{optimize, CalibrationProblem, SolveSummary};
