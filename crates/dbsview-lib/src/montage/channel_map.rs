//! Static electrode tables: raw EGI labels to 10-10 names, the 10-20 subset the bipolar
//! montage is built from, and the ordered anode/cathode pairs grouped into regions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw 64-channel cap label to standard label. `VREF` is the recording reference.
pub const CHANNEL_MAPPING: [(&str, &str); 65] = [
    ("E1", "F10"),
    ("E2", "AF4"),
    ("E3", "F2"),
    ("E4", "FCz"),
    ("E5", "Fp2"),
    ("E6", "Fz"),
    ("E7", "FC1"),
    ("E8", "AFz"),
    ("E9", "F1"),
    ("E10", "Fp1"),
    ("E11", "AF3"),
    ("E12", "F3"),
    ("E13", "F5"),
    ("E14", "FC5"),
    ("E15", "FC3"),
    ("E16", "C1"),
    ("E17", "F9"),
    ("E18", "F7"),
    ("E19", "FT7"),
    ("E20", "C3"),
    ("E21", "CP1"),
    ("E22", "C5"),
    ("E23", "T9"),
    ("E24", "T7"),
    ("E25", "TP7"),
    ("E26", "CP5"),
    ("E27", "P5"),
    ("E28", "P3"),
    ("E29", "TP9"),
    ("E30", "P7"),
    ("E31", "P1"),
    ("E32", "P9"),
    ("E33", "PO3"),
    ("E34", "Pz"),
    ("E35", "O1"),
    ("E36", "POz"),
    ("E37", "Oz"),
    ("E38", "PO4"),
    ("E39", "O2"),
    ("E40", "P2"),
    ("E41", "CP2"),
    ("E42", "P4"),
    ("E43", "P10"),
    ("E44", "P8"),
    ("E45", "P6"),
    ("E46", "CP6"),
    ("E47", "TP10"),
    ("E48", "TP8"),
    ("E49", "C6"),
    ("E50", "C4"),
    ("E51", "C2"),
    ("E52", "T8"),
    ("E53", "FC4"),
    ("E54", "FC2"),
    ("E55", "T10"),
    ("E56", "FT8"),
    ("E57", "FC6"),
    ("E58", "F8"),
    ("E59", "F6"),
    ("E60", "F4"),
    ("E61", "E61"),
    ("E62", "E62"),
    ("E63", "E63"),
    ("E64", "E64"),
    ("VREF", "Cz"),
];

/// The 10-20 channels every recording must provide after interpolation.
pub const CANONICAL_CHANNELS: [&str; 19] = [
    "Fp1", "Fp2", "F3", "F4", "C3", "C4", "P3", "P4", "O1", "O2", "F7", "F8", "P7", "P8", "Fz",
    "Cz", "Pz", "T7", "T8",
];

/// Ordered anode/cathode pairs. Region membership is by index, see [`Region::range`].
pub const BIPOLAR_PAIRS: [(&str, &str); 18] = [
    ("Fp1", "F7"),
    ("F7", "T7"),
    ("T7", "P7"),
    ("P7", "O1"),
    ("Fp1", "F3"),
    ("F3", "C3"),
    ("C3", "P3"),
    ("P3", "O1"),
    ("Fz", "Cz"),
    ("Cz", "Pz"),
    ("Fp2", "F4"),
    ("F4", "C4"),
    ("C4", "P4"),
    ("P4", "O2"),
    ("Fp2", "F8"),
    ("F8", "T8"),
    ("T8", "P8"),
    ("P8", "O2"),
];

/// Standard label for a raw label; labels outside the table pass through unchanged.
pub fn standard_label(raw: &str) -> &str {
    CHANNEL_MAPPING
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw)
}

/// Anatomical chain a bipolar pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    LeftTemporal,
    CentralChain,
    RightTemporal,
}

impl Region {
    pub const ALL: [Region; 3] = [
        Region::LeftTemporal,
        Region::CentralChain,
        Region::RightTemporal,
    ];

    /// Index range into [`BIPOLAR_PAIRS`].
    pub fn range(self) -> std::ops::Range<usize> {
        match self {
            Region::LeftTemporal => 0..8,
            Region::CentralChain => 8..10,
            Region::RightTemporal => 10..BIPOLAR_PAIRS.len(),
        }
    }

    pub fn of_index(index: usize) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|region| region.range().contains(&index))
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::LeftTemporal => "Left Temporal",
            Region::CentralChain => "Central Chain",
            Region::RightTemporal => "Right Temporal",
        }
    }

    /// Canonical pairs of this region, in list order.
    pub fn pairs(self) -> impl Iterator<Item = BipolarPair> {
        BIPOLAR_PAIRS[self.range()]
            .iter()
            .map(|&(anode, cathode)| BipolarPair::new(anode, cathode))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BipolarPair {
    pub anode: String,
    pub cathode: String,
}

impl BipolarPair {
    pub fn new(anode: impl Into<String>, cathode: impl Into<String>) -> Self {
        Self {
            anode: anode.into(),
            cathode: cathode.into(),
        }
    }

    /// Channel name of the derived bipolar signal.
    pub fn name(&self) -> String {
        format!("{}-{}", self.anode, self.cathode)
    }

    pub fn references(&self, electrode: &str) -> bool {
        self.anode == electrode || self.cathode == electrode
    }

    /// Region by position in [`BIPOLAR_PAIRS`]; `None` for pairs outside the canonical list.
    pub fn region(&self) -> Option<Region> {
        BIPOLAR_PAIRS
            .iter()
            .position(|&(a, c)| a == self.anode && c == self.cathode)
            .and_then(Region::of_index)
    }
}

impl fmt::Display for BipolarPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.anode, self.cathode)
    }
}

pub fn canonical_pairs() -> Vec<BipolarPair> {
    BIPOLAR_PAIRS
        .iter()
        .map(|&(anode, cathode)| BipolarPair::new(anode, cathode))
        .collect()
}
