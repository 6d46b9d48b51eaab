//! Named channel groups offered for each recording.

use crate::dbs::{DbsRecording, Hemisphere};
use crate::error::{Error, Result};
use crate::montage::builder::Montage;
use crate::montage::channel_map::Region;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EegSelection {
    #[default]
    All,
    Region(Region),
}

impl EegSelection {
    pub const ALL: [EegSelection; 4] = [
        EegSelection::All,
        EegSelection::Region(Region::LeftTemporal),
        EegSelection::Region(Region::CentralChain),
        EegSelection::Region(Region::RightTemporal),
    ];

    pub fn label(self) -> &'static str {
        match self {
            EegSelection::All => "All signals",
            EegSelection::Region(region) => region.label(),
        }
    }

    /// Bipolar channel names to draw, in montage order.
    pub fn resolve(self, montage: &Montage) -> Result<Vec<String>> {
        let names: Vec<String> = match self {
            EegSelection::All => montage.pairs().iter().map(|p| p.name()).collect(),
            EegSelection::Region(region) => montage.region_channels(region),
        };
        if names.is_empty() {
            return Err(Error::EmptyResult(format!(
                "no EEG channels survive in '{}'",
                self.label()
            )));
        }
        Ok(names)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbsSelection {
    #[default]
    Original,
    Montage,
    Side(Hemisphere),
    OriginalOnly(Hemisphere),
    MontageOnly(Hemisphere),
}

impl DbsSelection {
    pub const ALL: [DbsSelection; 8] = [
        DbsSelection::Original,
        DbsSelection::Montage,
        DbsSelection::Side(Hemisphere::Right),
        DbsSelection::Side(Hemisphere::Left),
        DbsSelection::OriginalOnly(Hemisphere::Right),
        DbsSelection::OriginalOnly(Hemisphere::Left),
        DbsSelection::MontageOnly(Hemisphere::Right),
        DbsSelection::MontageOnly(Hemisphere::Left),
    ];

    pub fn label(self) -> String {
        match self {
            DbsSelection::Original => "Original Channels".to_string(),
            DbsSelection::Montage => "Montage Channels".to_string(),
            DbsSelection::Side(h) => format!("{h} Side (Original and Montage)"),
            DbsSelection::OriginalOnly(h) => format!("{h} Side (Original Only)"),
            DbsSelection::MontageOnly(h) => format!("{h} Side (Montage Only)"),
        }
    }

    /// Channel names to draw. Leads of a side that are absent are skipped.
    pub fn resolve(self, recording: &DbsRecording) -> Result<Vec<String>> {
        let raw = |h: Hemisphere| present(h.raw_leads(), recording.raw_names());
        let derived = |h: Hemisphere| present(h.montage_leads(), recording.montage_names());
        let names = match self {
            DbsSelection::Original => recording.raw_names().to_vec(),
            DbsSelection::Montage => recording.montage_names().to_vec(),
            DbsSelection::Side(h) => {
                let mut names = raw(h);
                names.extend(derived(h));
                names
            }
            DbsSelection::OriginalOnly(h) => raw(h),
            DbsSelection::MontageOnly(h) => derived(h),
        };
        if names.is_empty() {
            return Err(Error::EmptyResult(format!(
                "no DBS channels available for '{}'",
                self.label()
            )));
        }
        Ok(names)
    }
}

fn present(wanted: [String; 3], available: &[String]) -> Vec<String> {
    wanted
        .into_iter()
        .filter(|name| {
            let found = available.contains(name);
            if !found {
                debug!("{name} not in recording, skipped");
            }
            found
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Channel, ElectrodeStream};

    fn recording(names: &[&str]) -> DbsRecording {
        let channels = names
            .iter()
            .enumerate()
            .map(|(i, name)| Channel::new(*name, vec![i as f64; 4]))
            .collect();
        DbsRecording::from_raw(ElectrodeStream::new(250.0, channels).unwrap()).unwrap()
    }

    #[test]
    fn side_lists_original_then_montage() {
        let rec = recording(&["ZERO_TWO_RIGHT", "ZERO_THREE_RIGHT", "ONE_THREE_RIGHT"]);
        let names = DbsSelection::Side(Hemisphere::Right).resolve(&rec).unwrap();
        assert_eq!(
            names,
            vec![
                "ZERO_THREE_RIGHT",
                "ONE_THREE_RIGHT",
                "ZERO_TWO_RIGHT",
                "ZERO_ONE_RIGHT",
                "ONE_TWO_RIGHT",
                "TWO_THREE_RIGHT"
            ]
        );
    }

    #[test]
    fn missing_side_is_empty_result() {
        let rec = recording(&["ZERO_TWO_RIGHT", "ZERO_THREE_RIGHT"]);
        let err = DbsSelection::OriginalOnly(Hemisphere::Left)
            .resolve(&rec)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
        assert_eq!(
            DbsSelection::MontageOnly(Hemisphere::Right)
                .resolve(&rec)
                .unwrap(),
            vec!["TWO_THREE_RIGHT"]
        );
    }

    #[test]
    fn original_keeps_file_order() {
        let rec = recording(&["ONE_THREE_LEFT", "ZERO_THREE_LEFT", "EXTRA"]);
        assert_eq!(
            DbsSelection::Original.resolve(&rec).unwrap(),
            vec!["ONE_THREE_LEFT", "ZERO_THREE_LEFT", "EXTRA"]
        );
        assert_eq!(
            DbsSelection::Montage.resolve(&rec).unwrap(),
            vec!["ZERO_ONE_LEFT"]
        );
    }

    #[test]
    fn labels_match_the_viewer_menus() {
        let labels: Vec<String> = DbsSelection::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels[2], "Right Side (Original and Montage)");
        assert_eq!(labels[7], "Left Side (Montage Only)");
        assert_eq!(
            EegSelection::Region(Region::CentralChain).label(),
            "Central Chain"
        );
    }
}
