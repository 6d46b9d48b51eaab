use crate::error::{Error, Result};
use crate::montage::channel_map::BipolarPair;
use crate::signal::{std_dev, Channel, ElectrodeStream};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_MIN_BIPOLAR_STD: f64 = 1e-6;

/// Anode-minus-cathode channel for every pair, named `"{anode}-{cathode}"`.
pub fn bipolar_stream(
    referential: &ElectrodeStream,
    pairs: &[BipolarPair],
) -> Result<ElectrodeStream> {
    let missing: Vec<String> = pairs
        .iter()
        .flat_map(|p| [p.anode.as_str(), p.cathode.as_str()])
        .filter(|label| !referential.contains(label))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingChannel(missing));
    }
    let channels = pairs
        .iter()
        .filter_map(|pair| {
            let anode = referential.data(&pair.anode)?;
            let cathode = referential.data(&pair.cathode)?;
            let diff = anode.iter().zip(cathode).map(|(a, c)| a - c).collect();
            Some(Channel::new(pair.name(), diff))
        })
        .collect();
    ElectrodeStream::new(referential.fs(), channels)
}

/// Result of the near-zero-variance check on bipolar channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneOutcome {
    /// Bipolar channels whose standard deviation fell below the threshold.
    pub bad_channels: Vec<String>,
    /// Electrodes taking part in any bad channel, sorted.
    pub omitted_electrodes: Vec<String>,
    /// Candidate pairs that reference none of the omitted electrodes, in input order.
    pub surviving: Vec<BipolarPair>,
}

impl PruneOutcome {
    pub fn pruned_any(&self, candidates: usize) -> bool {
        self.surviving.len() < candidates
    }
}

/// Drop every pair that shares an electrode with a degenerate bipolar channel.
///
/// A flat `A-B` invalidates `B-C` as well: the electrode, not the pair, is considered
/// unreliable.
pub fn prune_bipolar(
    pairs: &[BipolarPair],
    bipolar: &ElectrodeStream,
    min_std: f64,
) -> PruneOutcome {
    let bad: Vec<&BipolarPair> = pairs
        .iter()
        .filter(|pair| {
            bipolar
                .data(&pair.name())
                .map(|data| std_dev(data) < min_std)
                .unwrap_or(false)
        })
        .collect();
    let omitted: BTreeSet<&str> = bad
        .iter()
        .flat_map(|pair| [pair.anode.as_str(), pair.cathode.as_str()])
        .collect();
    let surviving = pairs
        .iter()
        .filter(|pair| !omitted.iter().any(|e| pair.references(e)))
        .cloned()
        .collect();
    PruneOutcome {
        bad_channels: bad.iter().map(|pair| pair.name()).collect(),
        omitted_electrodes: omitted.into_iter().map(str::to_string).collect(),
        surviving,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(scale: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| scale * i as f64).collect()
    }

    fn referential() -> ElectrodeStream {
        // A and B move together so A-B is flat; C and D are independent.
        ElectrodeStream::new(
            250.0,
            vec![
                Channel::new("A", ramp(1.0, 16)),
                Channel::new("B", ramp(1.0, 16)),
                Channel::new("C", ramp(-2.0, 16)),
                Channel::new("D", ramp(3.0, 16)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn flat_pair_removes_every_pair_sharing_its_electrodes() {
        let pairs = vec![
            BipolarPair::new("A", "B"),
            BipolarPair::new("B", "C"),
            BipolarPair::new("C", "D"),
        ];
        let stream = referential();
        let bipolar = bipolar_stream(&stream, &pairs).unwrap();
        let outcome = prune_bipolar(&pairs, &bipolar, DEFAULT_MIN_BIPOLAR_STD);
        assert_eq!(outcome.bad_channels, vec!["A-B".to_string()]);
        assert_eq!(outcome.omitted_electrodes, vec!["A", "B"]);
        assert_eq!(outcome.surviving, vec![BipolarPair::new("C", "D")]);
        assert!(outcome.pruned_any(pairs.len()));
    }

    #[test]
    fn bipolar_channel_is_anode_minus_cathode() {
        let stream = referential();
        let bipolar = bipolar_stream(&stream, &[BipolarPair::new("D", "C")]).unwrap();
        assert_eq!(bipolar.data("D-C").unwrap()[2], 10.0);
    }

    #[test]
    fn missing_electrode_is_reported() {
        let err = bipolar_stream(&referential(), &[BipolarPair::new("A", "Z")]).unwrap_err();
        assert!(matches!(err, Error::MissingChannel(ref m) if m == &vec!["Z".to_string()]));
    }
}
