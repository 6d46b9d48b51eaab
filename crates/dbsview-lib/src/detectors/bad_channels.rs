use crate::signal::{mean, std_dev, ElectrodeStream};
use serde::{Deserialize, Serialize};

pub const DEFAULT_Z_THRESHOLD: f64 = 3.5;

/// Outcome of the amplitude-variability outlier test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadChannelReport {
    /// Per-channel population standard deviation, in stream order.
    pub channel_stds: Vec<(String, f64)>,
    pub mean_std: f64,
    pub std_of_stds: f64,
    /// `mean_std + z_threshold * std_of_stds`
    pub cutoff: f64,
    pub bad: Vec<String>,
}

/// Flag channels whose standard deviation exceeds `mean + z_threshold * std` of the
/// per-channel standard deviations. The cutoff adapts to each recording.
pub fn detect_bad_channels(stream: &ElectrodeStream, z_threshold: f64) -> BadChannelReport {
    let channel_stds: Vec<(String, f64)> = stream
        .channels()
        .iter()
        .map(|ch| (ch.name.clone(), std_dev(&ch.data)))
        .collect();
    let stds: Vec<f64> = channel_stds.iter().map(|(_, sd)| *sd).collect();
    let mean_std = mean(&stds);
    let std_of_stds = std_dev(&stds);
    let cutoff = mean_std + z_threshold * std_of_stds;
    let bad = channel_stds
        .iter()
        .filter(|(_, sd)| *sd > cutoff)
        .map(|(name, _)| name.clone())
        .collect();
    BadChannelReport {
        channel_stds,
        mean_std,
        std_of_stds,
        cutoff,
        bad,
    }
}
