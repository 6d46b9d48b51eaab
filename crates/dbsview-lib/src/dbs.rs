//! Bipolar re-referencing of the implanted DBS leads.
//!
//! Each hemisphere records three contact pairs, `ZERO_TWO`, `ZERO_THREE` and `ONE_THREE`.
//! The adjacent-contact channels are linear combinations of them:
//!
//! ```text
//! ZERO_ONE  = ZERO_THREE - ONE_THREE
//! ONE_TWO   = (ONE_THREE + ZERO_TWO) - ZERO_THREE
//! TWO_THREE = ZERO_THREE - ZERO_TWO
//! ```

use crate::error::Result;
use crate::signal::{Channel, ElectrodeStream};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    Right,
    Left,
}

impl Hemisphere {
    /// Derivation and display order.
    pub const ALL: [Hemisphere; 2] = [Hemisphere::Right, Hemisphere::Left];

    pub fn suffix(self) -> &'static str {
        match self {
            Hemisphere::Right => "RIGHT",
            Hemisphere::Left => "LEFT",
        }
    }

    fn lead(self, contacts: &str) -> String {
        format!("{contacts}_{}", self.suffix())
    }

    /// Recorded leads in display order.
    pub fn raw_leads(self) -> [String; 3] {
        [
            self.lead("ZERO_THREE"),
            self.lead("ONE_THREE"),
            self.lead("ZERO_TWO"),
        ]
    }

    /// Derived leads in display order.
    pub fn montage_leads(self) -> [String; 3] {
        [
            self.lead("ZERO_ONE"),
            self.lead("ONE_TWO"),
            self.lead("TWO_THREE"),
        ]
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::Right => f.write_str("Right"),
            Hemisphere::Left => f.write_str("Left"),
        }
    }
}

/// Signed sum of raw leads. `None` when any input is missing.
fn combine(raw: &ElectrodeStream, terms: &[(f64, &str)]) -> Option<Vec<f64>> {
    let inputs = terms
        .iter()
        .map(|&(sign, name)| raw.data(name).map(|data| (sign, data)))
        .collect::<Option<Vec<_>>>()?;
    let out = (0..raw.len())
        .map(|i| inputs.iter().map(|(sign, data)| sign * data[i]).sum())
        .collect();
    Some(out)
}

/// Montage channels for every hemisphere whose inputs are present, right before left.
pub fn derive_dbs_montage(raw: &ElectrodeStream) -> Vec<Channel> {
    let mut out = Vec::new();
    for hemi in Hemisphere::ALL {
        let zero_two = hemi.lead("ZERO_TWO");
        let zero_three = hemi.lead("ZERO_THREE");
        let one_three = hemi.lead("ONE_THREE");
        let [zero_one, one_two, two_three] = hemi.montage_leads();
        let formulas = [
            (
                zero_one,
                vec![(1.0, zero_three.as_str()), (-1.0, one_three.as_str())],
            ),
            (
                one_two,
                vec![
                    (1.0, one_three.as_str()),
                    (1.0, zero_two.as_str()),
                    (-1.0, zero_three.as_str()),
                ],
            ),
            (
                two_three,
                vec![(1.0, zero_three.as_str()), (-1.0, zero_two.as_str())],
            ),
        ];
        for (name, terms) in formulas {
            match combine(raw, &terms) {
                Some(data) => out.push(Channel::new(name, data)),
                None => debug!("{name}: inputs missing, not derived"),
            }
        }
    }
    out
}

/// Raw DBS leads together with their derived montage, as one stream group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbsRecording {
    raw_names: Vec<String>,
    montage_names: Vec<String>,
    stream: ElectrodeStream,
}

impl DbsRecording {
    pub fn from_raw(raw: ElectrodeStream) -> Result<Self> {
        let derived: Vec<Channel> = derive_dbs_montage(&raw)
            .into_iter()
            .filter(|ch| {
                let clash = raw.contains(&ch.name);
                if clash {
                    warn!("{} is already recorded; not deriving it", ch.name);
                }
                !clash
            })
            .collect();
        let raw_names: Vec<String> = raw.names().map(str::to_string).collect();
        let montage_names: Vec<String> = derived.iter().map(|ch| ch.name.clone()).collect();
        info!(
            "DBS: {} recorded leads, {} derived ({})",
            raw_names.len(),
            montage_names.len(),
            montage_names.join(", ")
        );
        let fs = raw.fs();
        let mut channels = raw.into_channels();
        channels.extend(derived);
        Ok(Self {
            raw_names,
            montage_names,
            stream: ElectrodeStream::new(fs, channels)?,
        })
    }

    pub fn raw_names(&self) -> &[String] {
        &self.raw_names
    }

    pub fn montage_names(&self) -> &[String] {
        &self.montage_names
    }

    /// Recorded leads followed by the derived ones.
    pub fn stream(&self) -> &ElectrodeStream {
        &self.stream
    }

    pub fn into_stream(self) -> ElectrodeStream {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_leads() -> ElectrodeStream {
        ElectrodeStream::new(
            256.0,
            vec![
                Channel::new("ZERO_TWO_RIGHT", vec![1.0, 1.0, 1.0]),
                Channel::new("ZERO_THREE_RIGHT", vec![3.0, 3.0, 3.0]),
                Channel::new("ONE_THREE_RIGHT", vec![2.0, 2.0, 2.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn right_hemisphere_formulas() {
        let montage = derive_dbs_montage(&right_leads());
        let names: Vec<&str> = montage.iter().map(|ch| ch.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ZERO_ONE_RIGHT", "ONE_TWO_RIGHT", "TWO_THREE_RIGHT"]
        );
        assert_eq!(montage[0].data, vec![1.0, 1.0, 1.0]);
        assert_eq!(montage[1].data, vec![0.0, 0.0, 0.0]);
        assert_eq!(montage[2].data, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn left_uses_the_same_sign_convention() {
        let raw = ElectrodeStream::new(
            250.0,
            vec![
                Channel::new("ZERO_TWO_LEFT", vec![1.0, 2.0]),
                Channel::new("ZERO_THREE_LEFT", vec![5.0, 7.0]),
            ],
        )
        .unwrap();
        let montage = derive_dbs_montage(&raw);
        assert_eq!(montage.len(), 1);
        assert_eq!(montage[0].name, "TWO_THREE_LEFT");
        assert_eq!(montage[0].data, vec![4.0, 5.0]);
    }

    #[test]
    fn missing_inputs_omit_only_their_formula() {
        let raw = ElectrodeStream::new(
            250.0,
            vec![
                Channel::new("ZERO_THREE_RIGHT", vec![3.0]),
                Channel::new("ONE_THREE_RIGHT", vec![1.0]),
            ],
        )
        .unwrap();
        let montage = derive_dbs_montage(&raw);
        assert_eq!(montage.len(), 1);
        assert_eq!(montage[0].name, "ZERO_ONE_RIGHT");
        assert_eq!(montage[0].data, vec![2.0]);
    }

    #[test]
    fn recording_keeps_raw_then_montage() {
        let rec = DbsRecording::from_raw(right_leads()).unwrap();
        assert_eq!(
            rec.raw_names(),
            &["ZERO_TWO_RIGHT", "ZERO_THREE_RIGHT", "ONE_THREE_RIGHT"]
        );
        assert_eq!(rec.montage_names().len(), 3);
        assert_eq!(rec.stream().channel_count(), 6);
        assert_eq!(rec.stream().fs(), 256.0);
        assert_eq!(
            rec.stream().data("TWO_THREE_RIGHT"),
            Some(&[2.0, 2.0, 2.0][..])
        );
    }

    #[test]
    fn recorded_montage_lead_wins_over_derived() {
        let mut channels = right_leads().into_channels();
        channels.push(Channel::new("ZERO_ONE_RIGHT", vec![9.0, 9.0, 9.0]));
        let rec = DbsRecording::from_raw(ElectrodeStream::new(256.0, channels).unwrap()).unwrap();
        assert_eq!(rec.montage_names(), &["ONE_TWO_RIGHT", "TWO_THREE_RIGHT"]);
        assert_eq!(
            rec.stream().data("ZERO_ONE_RIGHT"),
            Some(&[9.0, 9.0, 9.0][..])
        );
    }

    #[test]
    fn lead_names() {
        assert_eq!(
            Hemisphere::Left.raw_leads(),
            ["ZERO_THREE_LEFT", "ONE_THREE_LEFT", "ZERO_TWO_LEFT"]
        );
        assert_eq!(Hemisphere::Right.montage_leads()[2], "TWO_THREE_RIGHT");
    }
}
