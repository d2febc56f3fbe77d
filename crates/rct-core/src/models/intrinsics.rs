use crate::{Pt2, Pt3, Real};
use nalgebra::{RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Ideal pinhole intrinsics: focal lengths and principal point, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
}

impl CameraIntrinsics {
    pub fn new(fx: Real, fy: Real, cx: Real, cy: Real) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Parameters as `[fx, fy, cx, cy]`.
    pub fn to_array(&self) -> [Real; 4] {
        [self.fx, self.fy, self.cx, self.cy]
    }

    /// Returns `true` if all parameters are finite and both focal lengths are non-zero.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite()) && self.fx != 0.0 && self.fy != 0.0
    }

    /// Project a point expressed in the camera frame into pixel coordinates.
    pub fn project(&self, point_in_camera: &Pt3) -> Pt2 {
        let uv = project_pinhole(self.fx, self.fy, self.cx, self.cy, &point_in_camera.coords);
        Pt2::new(uv.x, uv.y)
    }
}

/// Project a 3D point in camera coordinates using a pinhole model.
///
/// The point is scaled onto the image plane by its depth `z`. A point with
/// `z == 0` exactly skips the division and uses `(x, y)` as-is; the result is
/// not a physical projection but stays finite.
pub fn project_pinhole<T: RealField>(fx: T, fy: T, cx: T, cy: T, pc: &Vector3<T>) -> Vector2<T> {
    let z = pc.z.clone();
    let (xp, yp) = if z == T::zero() {
        (pc.x.clone(), pc.y.clone())
    } else {
        (pc.x.clone() / z.clone(), pc.y.clone() / z)
    };
    Vector2::new(fx * xp + cx, fy * yp + cy)
}
