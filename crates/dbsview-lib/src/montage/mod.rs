//! Referential 10-20 recording to the pruned longitudinal bipolar montage.

pub mod builder;
pub mod channel_map;
pub mod interpolate;
pub mod quality;

pub use builder::{build_montage, Montage, MontageConfig, MontageReport};
pub use channel_map::{BipolarPair, Region};
pub use interpolate::{InverseDistanceInterpolator, Interpolator};
