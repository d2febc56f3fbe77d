//! Deterministic noise helpers for synthetic datasets.
//!
//! The functions here avoid any RNG crate so that synthetic datasets stay
//! stable across versions and platforms.

use crate::{CorrespondenceSet, Pt2, Real, Vec2};

/// Deterministic uniform pixel noise in `[-max_abs_px, +max_abs_px]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformPixelNoise {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis noise (pixels).
    pub max_abs_px: Real,
}

impl UniformPixelNoise {
    /// Sample a deterministic 2D noise vector for a given `(image_idx, point_idx)` key.
    #[inline]
    pub fn sample(&self, image_idx: usize, point_idx: usize) -> Vec2 {
        let max_abs = self.max_abs_px.abs();
        if max_abs == 0.0 {
            return Vec2::zeros();
        }

        let key = mix_key(self.seed, image_idx, point_idx);
        let u = u64_to_unit_f64(splitmix64(key));
        let v = u64_to_unit_f64(splitmix64(key ^ 0x94D0_49BB_1331_11EB));

        Vec2::new((u - 0.5) * 2.0 * max_abs, (v - 0.5) * 2.0 * max_abs)
    }

    /// Return a copy of `set` with noise added to every pixel.
    pub fn apply(&self, image_idx: usize, set: &CorrespondenceSet) -> CorrespondenceSet {
        let points_2d = set
            .points_2d
            .iter()
            .enumerate()
            .map(|(point_idx, uv)| Pt2::from(uv.coords + self.sample(image_idx, point_idx)))
            .collect();
        CorrespondenceSet {
            points_3d: set.points_3d.clone(),
            points_2d,
        }
    }
}

#[inline]
fn mix_key(seed: u64, image_idx: usize, point_idx: usize) -> u64 {
    seed ^ (image_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (point_idx as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    // top 53 bits -> [0, 1)
    let mantissa = x >> 11;
    (mantissa as Real) * (1.0 / ((1u64 << 53) as Real))
}
