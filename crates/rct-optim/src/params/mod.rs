//! Parameter block conversions between `rct-core` types and solver vectors.
//!
//! - [`pose6::iso3_to_pose6_dvec`] / [`pose6::pose6_dvec_to_iso3`] - pose blocks
//! - [`pose6::iso3_to_pose6_array`] - fixed poses stored inside factors

pub mod pose6;
