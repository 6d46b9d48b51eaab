use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two independent recordings the viewer displays side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Eeg,
    Dbs,
}

impl StreamKind {
    pub const ALL: [StreamKind; 2] = [StreamKind::Eeg, StreamKind::Dbs];
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Eeg => f.write_str("EEG"),
            StreamKind::Dbs => f.write_str("DBS"),
        }
    }
}

/// One named sequence of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub data: Vec<f64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Named set of equally long channels sampled at one uniform rate.
///
/// The invariants (unique names, identical lengths, positive finite rate) are checked
/// once in [`ElectrodeStream::new`]; the stream is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectrodeStream {
    fs: f64,
    channels: Vec<Channel>,
}

impl ElectrodeStream {
    pub fn new(fs: f64, channels: Vec<Channel>) -> Result<Self> {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(Error::malformed(
                "electrode stream",
                format!("sample rate must be positive, got {fs}"),
            ));
        }
        if let Some(name) = first_duplicate(&channels) {
            return Err(Error::DuplicateChannel(name));
        }
        if let Some(first) = channels.first() {
            let expected = first.data.len();
            if let Some(bad) = channels.iter().find(|ch| ch.data.len() != expected) {
                return Err(Error::malformed(
                    "electrode stream",
                    format!(
                        "channel '{}' has {} samples, expected {}",
                        bad.name,
                        bad.data.len(),
                        expected
                    ),
                ));
            }
        }
        Ok(Self { fs, channels })
    }

    /// Uniform sampling frequency in Hz
    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn nyquist(&self) -> f64 {
        self.fs * 0.5
    }

    /// Samples per channel (zero for a stream without channels).
    pub fn len(&self) -> usize {
        self.channels.first().map(|ch| ch.data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.fs
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|ch| ch.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channel(name).is_some()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|ch| ch.name == name)
    }

    pub fn data(&self, name: &str) -> Option<&[f64]> {
        self.channel(name).map(|ch| ch.data.as_slice())
    }

    /// New stream holding only `names`, in the order given. Unknown names are skipped.
    pub fn pick<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let channels = names
            .iter()
            .filter_map(|name| self.channel(name.as_ref()).cloned())
            .collect();
        Self {
            fs: self.fs,
            channels,
        }
    }

    /// Same rate, new channels. Callers guarantee the length and name invariants.
    pub(crate) fn with_channels(&self, channels: Vec<Channel>) -> Self {
        Self {
            fs: self.fs,
            channels,
        }
    }

    pub fn into_channels(self) -> Vec<Channel> {
        self.channels
    }
}

fn first_duplicate(channels: &[Channel]) -> Option<String> {
    let mut seen = std::collections::BTreeSet::new();
    channels
        .iter()
        .find(|ch| !seen.insert(ch.name.as_str()))
        .map(|ch| ch.name.clone())
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by N); zero for an empty slice.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    (data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64).sqrt()
}
