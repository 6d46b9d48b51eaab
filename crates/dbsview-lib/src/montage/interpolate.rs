use crate::error::Result;
use crate::signal::{Channel, ElectrodeStream};
use log::{debug, warn};

/// Spatial repair of channels flagged bad.
///
/// Implementations return a stream with the same channel set, order and length, with every
/// channel in `bad` replaced by an estimate from its good neighbours.
pub trait Interpolator {
    fn interpolate(&self, stream: &ElectrodeStream, bad: &[String]) -> Result<ElectrodeStream>;
}

/// Approximate 10-10 positions on a unit-radius azimuthal projection (x to the right ear,
/// y to the nose).
const POSITIONS: &[(&str, f64, f64)] = &[
    ("Fp1", -0.31, 0.95),
    ("Fpz", 0.0, 1.0),
    ("Fp2", 0.31, 0.95),
    ("AF3", -0.33, 0.74),
    ("AFz", 0.0, 0.75),
    ("AF4", 0.33, 0.74),
    ("F9", -0.95, 0.69),
    ("F7", -0.81, 0.59),
    ("F5", -0.62, 0.54),
    ("F3", -0.42, 0.52),
    ("F1", -0.21, 0.5),
    ("Fz", 0.0, 0.5),
    ("F2", 0.21, 0.5),
    ("F4", 0.42, 0.52),
    ("F6", 0.62, 0.54),
    ("F8", 0.81, 0.59),
    ("F10", 0.95, 0.69),
    ("FT7", -0.95, 0.31),
    ("FC5", -0.7, 0.27),
    ("FC3", -0.46, 0.26),
    ("FC1", -0.22, 0.25),
    ("FCz", 0.0, 0.25),
    ("FC2", 0.22, 0.25),
    ("FC4", 0.46, 0.26),
    ("FC6", 0.7, 0.27),
    ("FT8", 0.95, 0.31),
    ("T9", -1.2, 0.0),
    ("T7", -1.0, 0.0),
    ("C5", -0.75, 0.0),
    ("C3", -0.5, 0.0),
    ("C1", -0.25, 0.0),
    ("Cz", 0.0, 0.0),
    ("C2", 0.25, 0.0),
    ("C4", 0.5, 0.0),
    ("C6", 0.75, 0.0),
    ("T8", 1.0, 0.0),
    ("T10", 1.2, 0.0),
    ("TP7", -0.95, -0.31),
    ("CP5", -0.7, -0.27),
    ("CP1", -0.22, -0.25),
    ("CP2", 0.22, -0.25),
    ("CP6", 0.7, -0.27),
    ("TP8", 0.95, -0.31),
    ("P7", -0.81, -0.59),
    ("P3", -0.42, -0.52),
    ("Pz", 0.0, -0.5),
    ("P4", 0.42, -0.52),
    ("P8", 0.81, -0.59),
    ("Oz", 0.0, -1.0),
    ("TP9", -1.1, -0.36),
    ("TP10", 1.1, -0.36),
    ("P9", -0.95, -0.69),
    ("P5", -0.62, -0.54),
    ("P1", -0.21, -0.5),
    ("P2", 0.21, -0.5),
    ("P6", 0.62, -0.54),
    ("P10", 0.95, -0.69),
    ("PO3", -0.33, -0.74),
    ("POz", 0.0, -0.75),
    ("PO4", 0.33, -0.74),
    ("O1", -0.31, -0.95),
    ("O2", 0.31, -0.95),
];

pub fn electrode_position(label: &str) -> Option<(f64, f64)> {
    POSITIONS
        .iter()
        .find(|(name, _, _)| *name == label)
        .map(|&(_, x, y)| (x, y))
}

/// Inverse-square-distance weighting over the nearest good electrodes.
#[derive(Debug, Clone, Copy)]
pub struct InverseDistanceInterpolator {
    pub neighbours: usize,
}

impl Default for InverseDistanceInterpolator {
    fn default() -> Self {
        Self { neighbours: 4 }
    }
}

impl InverseDistanceInterpolator {
    /// Donor channels and weights (normalised to 1) for one bad channel.
    fn weights<'a>(&self, target: &str, good: &[&'a Channel]) -> Vec<(&'a Channel, f64)> {
        if good.is_empty() {
            return Vec::new();
        }
        let Some((tx, ty)) = electrode_position(target) else {
            let w = 1.0 / good.len() as f64;
            return good.iter().map(|ch| (*ch, w)).collect();
        };
        let mut located: Vec<(&Channel, f64)> = good
            .iter()
            .filter_map(|ch| {
                electrode_position(&ch.name)
                    .map(|(x, y)| (*ch, ((x - tx).powi(2) + (y - ty).powi(2)).sqrt()))
            })
            .collect();
        if located.is_empty() {
            let w = 1.0 / good.len() as f64;
            return good.iter().map(|ch| (*ch, w)).collect();
        }
        located.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.name.cmp(&b.0.name)));
        located.truncate(self.neighbours.max(1));
        let raw: Vec<f64> = located
            .iter()
            .map(|(_, d)| 1.0 / d.max(1e-6).powi(2))
            .collect();
        let total: f64 = raw.iter().sum();
        located
            .into_iter()
            .zip(raw)
            .map(|((ch, _), w)| (ch, w / total))
            .collect()
    }
}

impl Interpolator for InverseDistanceInterpolator {
    fn interpolate(&self, stream: &ElectrodeStream, bad: &[String]) -> Result<ElectrodeStream> {
        if bad.is_empty() {
            return Ok(stream.clone());
        }
        let good: Vec<&Channel> = stream
            .channels()
            .iter()
            .filter(|ch| !bad.contains(&ch.name))
            .collect();
        if good.is_empty() {
            warn!("every channel is flagged bad; leaving the recording uninterpolated");
            return Ok(stream.clone());
        }
        let len = stream.len();
        let channels = stream
            .channels()
            .iter()
            .map(|ch| {
                if !bad.contains(&ch.name) {
                    return ch.clone();
                }
                let donors = self.weights(&ch.name, &good);
                debug!(
                    "interpolating {} from {:?}",
                    ch.name,
                    donors.iter().map(|(d, _)| d.name.as_str()).collect::<Vec<_>>()
                );
                let mut data = vec![0.0; len];
                for (donor, w) in donors {
                    for (out, x) in data.iter_mut().zip(&donor.data) {
                        *out += w * x;
                    }
                }
                Channel::new(ch.name.clone(), data)
            })
            .collect();
        ElectrodeStream::new(stream.fs(), channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_bad_channel_from_neighbours() {
        let stream = ElectrodeStream::new(
            100.0,
            vec![
                Channel::new("C3", vec![1.0, 1.0, 1.0]),
                Channel::new("Cz", vec![900.0, -900.0, 900.0]),
                Channel::new("C4", vec![1.0, 1.0, 1.0]),
            ],
        )
        .unwrap();
        let repaired = InverseDistanceInterpolator::default()
            .interpolate(&stream, &["Cz".to_string()])
            .unwrap();
        assert_eq!(
            repaired.names().collect::<Vec<_>>(),
            vec!["C3", "Cz", "C4"]
        );
        for x in repaired.data("Cz").unwrap() {
            assert!((x - 1.0).abs() < 1e-12);
        }
        assert_eq!(repaired.data("C3"), stream.data("C3"));
    }

    #[test]
    fn unknown_position_uses_plain_mean() {
        let stream = ElectrodeStream::new(
            100.0,
            vec![
                Channel::new("E61", vec![10.0, 10.0]),
                Channel::new("Fz", vec![2.0, 4.0]),
                Channel::new("Pz", vec![4.0, 6.0]),
            ],
        )
        .unwrap();
        let repaired = InverseDistanceInterpolator::default()
            .interpolate(&stream, &["E61".to_string()])
            .unwrap();
        assert_eq!(repaired.data("E61"), Some(&[3.0, 5.0][..]));
    }

    #[test]
    fn canonical_channels_have_positions() {
        for label in crate::montage::channel_map::CANONICAL_CHANNELS {
            assert!(electrode_position(label).is_some(), "{label}");
        }
    }
}
