//! Per-group trim and band-pass state, and the active view derived from it.

use crate::error::{Error, Result};
use crate::filters::{validate_band, BandPassFilter, ButterworthBandPass};
use crate::signal::{Channel, ElectrodeStream, StreamKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterBand {
    pub lowcut: f64,
    pub highcut: f64,
}

/// The whole transform applied to one group. Replaced as a unit, never patched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub trim_offset: Option<usize>,
    pub filter_enabled: bool,
    pub filter_band: Option<FilterBand>,
}

impl TransformState {
    pub fn offset(&self) -> usize {
        self.trim_offset.unwrap_or(0)
    }

    /// Band to apply, if filtering is switched on.
    pub fn active_band(&self) -> Option<FilterBand> {
        self.filter_band.filter(|_| self.filter_enabled)
    }
}

/// Visible samples of a group. Sample `i` of `stream` is raw sample `offset + i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveView {
    pub offset: usize,
    pub stream: ElectrodeStream,
}

struct DerivedStream {
    raw: Arc<ElectrodeStream>,
    state: TransformState,
}

/// Holds the raw stream of each loaded group and recomputes its active view on request.
pub struct SignalEngine {
    groups: BTreeMap<StreamKind, DerivedStream>,
    filter: Box<dyn BandPassFilter>,
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(Box::new(ButterworthBandPass::default()))
    }
}

impl SignalEngine {
    pub fn new(filter: Box<dyn BandPassFilter>) -> Self {
        Self {
            groups: BTreeMap::new(),
            filter,
        }
    }

    /// Install a freshly loaded stream; its transform state starts with everything off.
    pub fn load(&mut self, kind: StreamKind, raw: Arc<ElectrodeStream>) {
        info!(
            "{kind}: {} channels, {} samples at {} Hz",
            raw.channel_count(),
            raw.len(),
            raw.fs()
        );
        self.groups.insert(
            kind,
            DerivedStream {
                raw,
                state: TransformState::default(),
            },
        );
    }

    pub fn is_loaded(&self, kind: StreamKind) -> bool {
        self.groups.contains_key(&kind)
    }

    fn group(&self, kind: StreamKind) -> Result<&DerivedStream> {
        self.groups.get(&kind).ok_or(Error::NotLoaded(kind))
    }

    fn group_mut(&mut self, kind: StreamKind) -> Result<&mut DerivedStream> {
        self.groups.get_mut(&kind).ok_or(Error::NotLoaded(kind))
    }

    pub fn raw(&self, kind: StreamKind) -> Result<&Arc<ElectrodeStream>> {
        Ok(&self.group(kind)?.raw)
    }

    pub fn state(&self, kind: StreamKind) -> Result<TransformState> {
        Ok(self.group(kind)?.state)
    }

    /// Store the band and the on/off flag. The band is validated even when switching off.
    pub fn set_filter(
        &mut self,
        kind: StreamKind,
        enabled: bool,
        lowcut: f64,
        highcut: f64,
    ) -> Result<()> {
        let group = self.group_mut(kind)?;
        validate_band(lowcut, highcut, group.raw.fs())?;
        group.state = TransformState {
            filter_enabled: enabled,
            filter_band: Some(FilterBand { lowcut, highcut }),
            ..group.state
        };
        debug!("{kind}: filter {enabled} {lowcut}-{highcut} Hz");
        Ok(())
    }

    pub fn clear_filter(&mut self, kind: StreamKind) -> Result<()> {
        let group = self.group_mut(kind)?;
        group.state = TransformState {
            filter_enabled: false,
            filter_band: None,
            ..group.state
        };
        Ok(())
    }

    /// Hide every sample before `start_sample`, which must lie inside the raw stream.
    pub fn set_trim(&mut self, kind: StreamKind, start_sample: usize) -> Result<()> {
        let group = self.group_mut(kind)?;
        let available = group.raw.len();
        if start_sample >= available {
            return Err(Error::OutOfRange {
                requested: start_sample,
                available,
            });
        }
        group.state = TransformState {
            trim_offset: Some(start_sample),
            ..group.state
        };
        debug!("{kind}: trimmed at sample {start_sample}");
        Ok(())
    }

    pub fn clear_trim(&mut self, kind: StreamKind) -> Result<()> {
        let group = self.group_mut(kind)?;
        group.state = TransformState {
            trim_offset: None,
            ..group.state
        };
        Ok(())
    }

    /// Number of samples in the active view.
    pub fn active_len(&self, kind: StreamKind) -> Result<usize> {
        let group = self.group(kind)?;
        Ok(group.raw.len().saturating_sub(group.state.offset()))
    }

    pub fn active_view(&self, kind: StreamKind) -> Result<ActiveView> {
        let group = self.group(kind)?;
        Ok(self.derive(group, group.raw.channels().iter()))
    }

    /// Active view restricted to `names`, in the order given. Unknown names are skipped.
    pub fn active_view_of<S: AsRef<str>>(
        &self,
        kind: StreamKind,
        names: &[S],
    ) -> Result<ActiveView> {
        let group = self.group(kind)?;
        let picked = names
            .iter()
            .filter_map(|name| group.raw.channel(name.as_ref()));
        Ok(self.derive(group, picked))
    }

    /// Filter over the full raw channel, then slice at the trim offset.
    fn derive<'a>(
        &self,
        group: &DerivedStream,
        channels: impl Iterator<Item = &'a Channel>,
    ) -> ActiveView {
        let offset = group.state.offset();
        let band = group.state.active_band();
        let fs = group.raw.fs();
        let channels = channels
            .map(|ch| {
                let data = match band {
                    Some(FilterBand { lowcut, highcut }) => {
                        let mut filtered = self.filter.filter(&ch.data, lowcut, highcut, fs);
                        filtered.drain(..offset.min(filtered.len()));
                        filtered
                    }
                    None => ch.data[offset.min(ch.data.len())..].to_vec(),
                };
                Channel::new(ch.name.clone(), data)
            })
            .collect();
        ActiveView {
            offset,
            stream: group.raw.with_channels(channels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Running sum: any trim-before-filter would change every output sample.
    struct CumulativeSum;

    impl BandPassFilter for CumulativeSum {
        fn filter(&self, signal: &[f64], _lowcut: f64, _highcut: f64, _fs: f64) -> Vec<f64> {
            signal
                .iter()
                .scan(0.0, |acc, x| {
                    *acc += x;
                    Some(*acc)
                })
                .collect()
        }
    }

    fn stream() -> Arc<ElectrodeStream> {
        Arc::new(
            ElectrodeStream::new(
                100.0,
                vec![
                    Channel::new("A", (0..10).map(|i| i as f64).collect()),
                    Channel::new("B", (0..10).map(|i| -(i as f64)).collect()),
                ],
            )
            .unwrap(),
        )
    }

    fn engine() -> SignalEngine {
        let mut engine = SignalEngine::new(Box::new(CumulativeSum));
        engine.load(StreamKind::Eeg, stream());
        engine
    }

    #[test]
    fn unfiltered_untrimmed_view_is_raw() {
        let engine = engine();
        let view = engine.active_view(StreamKind::Eeg).unwrap();
        assert_eq!(view.offset, 0);
        assert_eq!(&view.stream, engine.raw(StreamKind::Eeg).unwrap().as_ref());
    }

    #[test]
    fn filter_round_trip_under_any_trim() {
        for trim in [None, Some(0), Some(3), Some(9)] {
            let mut engine = engine();
            if let Some(t) = trim {
                engine.set_trim(StreamKind::Eeg, t).unwrap();
            }
            let before = engine.active_view(StreamKind::Eeg).unwrap();
            engine.set_filter(StreamKind::Eeg, true, 1.0, 20.0).unwrap();
            assert_ne!(engine.active_view(StreamKind::Eeg).unwrap(), before);
            engine.set_filter(StreamKind::Eeg, false, 1.0, 20.0).unwrap();
            assert_eq!(engine.active_view(StreamKind::Eeg).unwrap(), before);
        }
    }

    #[test]
    fn filter_runs_on_untrimmed_data() {
        let mut engine = engine();
        engine.set_filter(StreamKind::Eeg, true, 1.0, 20.0).unwrap();
        engine.set_trim(StreamKind::Eeg, 4).unwrap();
        let view = engine.active_view(StreamKind::Eeg).unwrap();
        // cumulative sums of 0..10 from index 4
        assert_eq!(
            view.stream.data("A").unwrap(),
            &[10.0, 15.0, 21.0, 28.0, 36.0, 45.0]
        );
        assert_eq!(view.offset, 4);
    }

    #[test]
    fn trim_must_stay_inside_the_recording() {
        let mut engine = engine();
        engine.set_trim(StreamKind::Eeg, 9).unwrap();
        assert_eq!(engine.active_len(StreamKind::Eeg).unwrap(), 1);
        let err = engine.set_trim(StreamKind::Eeg, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                requested: 10,
                available: 10
            }
        ));
        assert_eq!(
            engine.state(StreamKind::Eeg).unwrap().trim_offset,
            Some(9)
        );
        engine.clear_trim(StreamKind::Eeg).unwrap();
        assert_eq!(engine.active_len(StreamKind::Eeg).unwrap(), 10);
    }

    #[test]
    fn rejected_filter_leaves_view_untouched() {
        let mut engine = engine();
        engine.set_trim(StreamKind::Eeg, 2).unwrap();
        let before = engine.active_view(StreamKind::Eeg).unwrap();
        let state = engine.state(StreamKind::Eeg).unwrap();
        for (low, high) in [(0.0, 20.0), (20.0, 10.0), (1.0, 50.0), (f64::NAN, 20.0)] {
            let err = engine
                .set_filter(StreamKind::Eeg, true, low, high)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidFilterParameter { .. }));
        }
        assert_eq!(engine.state(StreamKind::Eeg).unwrap(), state);
        assert_eq!(engine.active_view(StreamKind::Eeg).unwrap(), before);
    }

    #[test]
    fn clear_filter_drops_band() {
        let mut engine = engine();
        engine.set_filter(StreamKind::Eeg, true, 1.0, 20.0).unwrap();
        engine.clear_filter(StreamKind::Eeg).unwrap();
        let state = engine.state(StreamKind::Eeg).unwrap();
        assert!(!state.filter_enabled);
        assert_eq!(state.filter_band, None);
    }

    #[test]
    fn reload_resets_state() {
        let mut engine = engine();
        engine.set_trim(StreamKind::Eeg, 5).unwrap();
        engine.set_filter(StreamKind::Eeg, true, 1.0, 20.0).unwrap();
        engine.load(StreamKind::Eeg, stream());
        assert_eq!(
            engine.state(StreamKind::Eeg).unwrap(),
            TransformState::default()
        );
    }

    #[test]
    fn groups_are_independent() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_trim(StreamKind::Dbs, 0),
            Err(Error::NotLoaded(StreamKind::Dbs))
        ));
        engine.load(StreamKind::Dbs, stream());
        engine.set_trim(StreamKind::Dbs, 3).unwrap();
        assert_eq!(engine.state(StreamKind::Eeg).unwrap().trim_offset, None);
    }

    #[test]
    fn selected_view_keeps_requested_order() {
        let mut engine = engine();
        engine.set_trim(StreamKind::Eeg, 8).unwrap();
        let view = engine
            .active_view_of(StreamKind::Eeg, &["B", "nope", "A"])
            .unwrap();
        assert_eq!(view.stream.names().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(view.stream.data("B").unwrap(), &[-8.0, -9.0]);
    }

    #[test]
    fn butterworth_engine_round_trip() {
        let mut engine = SignalEngine::default();
        let raw = Arc::new(
            ElectrodeStream::new(
                250.0,
                vec![Channel::new(
                    "X",
                    (0..1000).map(|i| ((i * 7919) % 13) as f64).collect(),
                )],
            )
            .unwrap(),
        );
        engine.load(StreamKind::Dbs, raw.clone());
        engine.set_trim(StreamKind::Dbs, 250).unwrap();
        engine.set_filter(StreamKind::Dbs, true, 1.0, 50.0).unwrap();
        engine.set_filter(StreamKind::Dbs, false, 1.0, 50.0).unwrap();
        let view = engine.active_view(StreamKind::Dbs).unwrap();
        assert_eq!(view.stream.data("X").unwrap(), &raw.data("X").unwrap()[250..]);
    }
}
