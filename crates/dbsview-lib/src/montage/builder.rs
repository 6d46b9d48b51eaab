use crate::detectors::bad_channels::{detect_bad_channels, DEFAULT_Z_THRESHOLD};
use crate::error::{Error, Result};
use crate::montage::channel_map::{
    canonical_pairs, standard_label, BipolarPair, Region, CANONICAL_CHANNELS,
};
use crate::montage::interpolate::Interpolator;
use crate::montage::quality::{bipolar_stream, prune_bipolar, DEFAULT_MIN_BIPOLAR_STD};
use crate::signal::{Channel, ElectrodeStream};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Thresholds for the montage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MontageConfig {
    /// Outlier cutoff in standard deviations of the per-channel std.
    pub z_threshold: f64,
    /// Bipolar channels below this standard deviation are treated as flat.
    pub min_bipolar_std: f64,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            min_bipolar_std: DEFAULT_MIN_BIPOLAR_STD,
        }
    }
}

/// What the pipeline discarded or repaired along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MontageReport {
    pub interpolated: Vec<String>,
    pub candidate_pairs: usize,
    pub flat_bipolar_channels: Vec<String>,
    pub omitted_electrodes: Vec<String>,
}

/// Validated bipolar pairs and their derived stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Montage {
    pairs: Vec<BipolarPair>,
    stream: ElectrodeStream,
    report: MontageReport,
}

impl Montage {
    pub fn pairs(&self) -> &[BipolarPair] {
        &self.pairs
    }

    pub fn stream(&self) -> &ElectrodeStream {
        &self.stream
    }

    pub fn report(&self) -> &MontageReport {
        &self.report
    }

    /// Bipolar channel names of a region that survived pruning, in canonical order.
    pub fn region_channels(&self, region: Region) -> Vec<String> {
        region
            .pairs()
            .filter(|pair| self.pairs.contains(pair))
            .map(|pair| pair.name())
            .collect()
    }

    pub fn into_stream(self) -> ElectrodeStream {
        self.stream
    }
}

/// Replace raw cap labels by their standard names.
pub fn rename_channels(stream: &ElectrodeStream) -> Result<ElectrodeStream> {
    let channels = stream
        .channels()
        .iter()
        .map(|ch| Channel::new(standard_label(&ch.name), ch.data.clone()))
        .collect();
    ElectrodeStream::new(stream.fs(), channels)
}

/// Pick the canonical 10-20 subset, failing with every label that is absent.
pub fn select_canonical(stream: &ElectrodeStream) -> Result<ElectrodeStream> {
    let missing: Vec<String> = CANONICAL_CHANNELS
        .iter()
        .filter(|label| !stream.contains(label))
        .map(|label| label.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingChannel(missing));
    }
    Ok(stream.pick(&CANONICAL_CHANNELS))
}

/// Turn a raw referential recording into the pruned bipolar montage.
///
/// Pure function of its inputs: identical recordings and thresholds give identical pairs
/// and samples.
pub fn build_montage(
    raw: &ElectrodeStream,
    cfg: &MontageConfig,
    interpolator: &dyn Interpolator,
) -> Result<Montage> {
    let renamed = rename_channels(raw)?;

    let detection = detect_bad_channels(&renamed, cfg.z_threshold);
    debug!(
        "channel std cutoff {:.3e} (mean {:.3e}, sd {:.3e})",
        detection.cutoff, detection.mean_std, detection.std_of_stds
    );
    if !detection.bad.is_empty() {
        info!("interpolating bad channels: {:?}", detection.bad);
    }
    let repaired = interpolator.interpolate(&renamed, &detection.bad)?;

    let referential = select_canonical(&repaired)?;

    let candidates: Vec<BipolarPair> = canonical_pairs()
        .into_iter()
        .filter(|pair| {
            referential.contains(&pair.anode) && referential.contains(&pair.cathode)
        })
        .collect();
    let mut bipolar = bipolar_stream(&referential, &candidates)?;

    let outcome = prune_bipolar(&candidates, &bipolar, cfg.min_bipolar_std);
    if outcome.pruned_any(candidates.len()) {
        info!(
            "flat bipolar channels {:?}; dropping pairs with electrodes {:?}",
            outcome.bad_channels, outcome.omitted_electrodes
        );
        bipolar = bipolar_stream(&referential, &outcome.surviving)?;
    }

    info!(
        "bipolar montage: {} of {} pairs at {} Hz",
        outcome.surviving.len(),
        candidates.len(),
        bipolar.fs()
    );
    Ok(Montage {
        pairs: outcome.surviving,
        stream: bipolar,
        report: MontageReport {
            interpolated: detection.bad,
            candidate_pairs: candidates.len(),
            flat_bipolar_channels: outcome.bad_channels,
            omitted_electrodes: outcome.omitted_electrodes,
        },
    })
}
