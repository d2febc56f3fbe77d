//! Camera and pose models.
//!
//! The camera is an ideal pinhole (`fx, fy, cx, cy`, no distortion). Poses are
//! stored as 6 scalars, axis-angle rotation followed by translation, which is
//! the layout every residual in `rct-optim` consumes:
//!
//! `[rx, ry, rz, tx, ty, tz]`
//!
//! All functions on the residual path are generic over [`nalgebra::RealField`].

mod intrinsics;
mod pose;

pub use intrinsics::*;
pub use pose::*;
