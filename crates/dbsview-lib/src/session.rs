//! Everything one viewer window holds: both recordings, their transforms, the navigation
//! position and the shared marker list.
//!
//! Every fallible operation validates before it touches state, so an error leaves the
//! session exactly as it was.

use crate::config::ViewerConfig;
use crate::dbs::DbsRecording;
use crate::engine::{SignalEngine, TransformState};
use crate::error::{Error, Result};
use crate::filters::{BandPassFilter, ButterworthBandPass};
use crate::io;
use crate::markers::{MarkedInterval, MarkerList, MarkingSession};
use crate::montage::builder::{build_montage, Montage};
use crate::montage::interpolate::{InverseDistanceInterpolator, Interpolator};
use crate::selection::{DbsSelection, EegSelection};
use crate::signal::{ElectrodeStream, StreamKind};
use crate::view::{Navigator, ViewFrame, WindowLength, Zoom};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub struct Session {
    config: ViewerConfig,
    interpolator: Box<dyn Interpolator>,
    engine: SignalEngine,
    montage: Option<Montage>,
    dbs: Option<DbsRecording>,
    navigator: Navigator,
    zoom: BTreeMap<StreamKind, Zoom>,
    markers: MarkerList,
    marking: MarkingSession,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        let filter = ButterworthBandPass::new(config.filter.order);
        Self::with_collaborators(
            config,
            Box::new(InverseDistanceInterpolator::default()),
            Box::new(filter),
        )
    }

    pub fn with_collaborators(
        config: ViewerConfig,
        interpolator: Box<dyn Interpolator>,
        filter: Box<dyn BandPassFilter>,
    ) -> Self {
        let navigator = Navigator::new(config.view.window_length_s, config.view.shift_step_s);
        Self {
            config,
            interpolator,
            engine: SignalEngine::new(filter),
            montage: None,
            dbs: None,
            navigator,
            zoom: BTreeMap::new(),
            markers: MarkerList::default(),
            marking: MarkingSession::default(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Build the bipolar montage from a raw referential recording and show it.
    pub fn load_eeg(&mut self, raw: &ElectrodeStream) -> Result<&Montage> {
        let montage = build_montage(raw, &self.config.montage, self.interpolator.as_ref())?;
        let report = montage.report();
        info!(
            "EEG loaded: {} bipolar channels, interpolated {:?}, pruned {:?}",
            montage.pairs().len(),
            report.interpolated,
            report.flat_bipolar_channels
        );
        self.engine
            .load(StreamKind::Eeg, Arc::new(montage.stream().clone()));
        self.reset_view(StreamKind::Eeg);
        Ok(self.montage.insert(montage))
    }

    pub fn load_eeg_csv(&mut self, path: &Path, fs: f64) -> Result<&Montage> {
        let raw = io::eeg::read_electrode_csv(path, fs)?;
        self.load_eeg(&raw)
    }

    pub fn load_eeg_edf(&mut self, path: &Path) -> Result<&Montage> {
        let raw = io::eeg::load_edf_stream(path)?;
        self.load_eeg(&raw)
    }

    /// Derive the DBS montage and show raw and derived leads as one group.
    pub fn load_dbs(&mut self, raw: ElectrodeStream) -> Result<&DbsRecording> {
        let recording = DbsRecording::from_raw(raw)?;
        self.engine
            .load(StreamKind::Dbs, Arc::new(recording.stream().clone()));
        self.reset_view(StreamKind::Dbs);
        Ok(self.dbs.insert(recording))
    }

    pub fn load_dbs_json(&mut self, path: &Path) -> Result<&DbsRecording> {
        let raw = io::dbs::read_dbs_json(path, self.config.dbs.default_sampling_rate)?;
        self.load_dbs(raw)
    }

    fn reset_view(&mut self, kind: StreamKind) {
        self.navigator.reset(kind);
        self.zoom.remove(&kind);
    }

    pub fn montage(&self) -> Option<&Montage> {
        self.montage.as_ref()
    }

    pub fn dbs(&self) -> Option<&DbsRecording> {
        self.dbs.as_ref()
    }

    pub fn is_loaded(&self, kind: StreamKind) -> bool {
        self.engine.is_loaded(kind)
    }

    pub fn state(&self, kind: StreamKind) -> Result<TransformState> {
        self.engine.state(kind)
    }

    pub fn set_filter(
        &mut self,
        kind: StreamKind,
        enabled: bool,
        lowcut: f64,
        highcut: f64,
    ) -> Result<()> {
        self.engine.set_filter(kind, enabled, lowcut, highcut)
    }

    /// Switch filtering on with the configured band.
    pub fn enable_filter(&mut self, kind: StreamKind) -> Result<()> {
        let band = self.config.filter;
        self.engine
            .set_filter(kind, true, band.lowcut_hz, band.highcut_hz)
    }

    pub fn clear_filter(&mut self, kind: StreamKind) -> Result<()> {
        self.engine.clear_filter(kind)
    }

    pub fn set_trim(&mut self, kind: StreamKind, start_sample: usize) -> Result<()> {
        self.engine.set_trim(kind, start_sample)?;
        self.clamp_start(kind)
    }

    pub fn clear_trim(&mut self, kind: StreamKind) -> Result<()> {
        self.engine.clear_trim(kind)
    }

    /// Keep the start time inside a view that just got shorter.
    fn clamp_start(&mut self, kind: StreamKind) -> Result<()> {
        let duration = self.duration(kind)?;
        self.navigator.shift(0.0, [(kind, duration)]);
        Ok(())
    }

    fn duration(&self, kind: StreamKind) -> Result<f64> {
        let fs = self.engine.raw(kind)?.fs();
        Ok(self.engine.active_len(kind)? as f64 / fs)
    }

    fn durations(&self) -> Vec<(StreamKind, f64)> {
        StreamKind::ALL
            .into_iter()
            .filter_map(|kind| self.duration(kind).ok().map(|d| (kind, d)))
            .collect()
    }

    pub fn window(&self) -> WindowLength {
        self.navigator.window()
    }

    pub fn set_window_length(&mut self, window: WindowLength) {
        self.navigator.set_window(window);
    }

    pub fn start_time(&self, kind: StreamKind) -> f64 {
        self.navigator.start_time(kind)
    }

    pub fn set_start_time(&mut self, kind: StreamKind, seconds: f64) {
        self.navigator.set_start_time(kind, seconds);
    }

    /// Move every loaded group by the same number of seconds.
    pub fn shift(&mut self, delta: f64) {
        let durations = self.durations();
        self.navigator.shift(delta, durations);
    }

    pub fn forward(&mut self) {
        self.shift(self.navigator.step());
    }

    pub fn back(&mut self) {
        self.shift(-self.navigator.step());
    }

    pub fn zoom(&self, kind: StreamKind) -> Zoom {
        self.zoom.get(&kind).copied().unwrap_or_default()
    }

    pub fn zoom_in(&mut self, kind: StreamKind) -> Zoom {
        self.set_zoom(kind, self.zoom(kind).zoom_in())
    }

    pub fn zoom_out(&mut self, kind: StreamKind) -> Zoom {
        self.set_zoom(kind, self.zoom(kind).zoom_out())
    }

    pub fn set_zoom(&mut self, kind: StreamKind, zoom: Zoom) -> Zoom {
        self.zoom.insert(kind, zoom);
        zoom
    }

    pub fn frame_eeg(&self, selection: EegSelection) -> Result<ViewFrame> {
        let montage = self
            .montage
            .as_ref()
            .ok_or(Error::NotLoaded(StreamKind::Eeg))?;
        let names = selection.resolve(montage)?;
        self.frame(StreamKind::Eeg, selection.label(), &names)
    }

    pub fn frame_dbs(&self, selection: DbsSelection) -> Result<ViewFrame> {
        let recording = self
            .dbs
            .as_ref()
            .ok_or(Error::NotLoaded(StreamKind::Dbs))?;
        let names = selection.resolve(recording)?;
        self.frame(StreamKind::Dbs, &selection.label(), &names)
    }

    fn frame(&self, kind: StreamKind, group: &str, names: &[String]) -> Result<ViewFrame> {
        let view = self.engine.active_view_of(kind, names)?;
        Ok(ViewFrame::build(
            kind,
            group,
            &view,
            self.navigator.start_time(kind),
            self.navigator.window(),
            self.zoom(kind),
            &self.markers,
        ))
    }

    pub fn markers(&self) -> &MarkerList {
        &self.markers
    }

    pub fn arm_marking(&mut self) {
        self.marking.arm();
    }

    pub fn disarm_marking(&mut self) {
        self.marking.disarm();
    }

    pub fn is_marking(&self) -> bool {
        self.marking.is_armed()
    }

    pub fn pointer_down(&mut self, x: Option<f64>) {
        self.marking.pointer_down(x);
    }

    /// Completes a drag; the new interval is appended to the shared list.
    pub fn pointer_up(&mut self, x: Option<f64>) -> Option<MarkedInterval> {
        let interval = self.marking.pointer_up(x)?;
        self.markers.push(interval);
        Some(interval)
    }

    pub fn add_marker(&mut self, interval: MarkedInterval) {
        self.markers.push(interval);
    }

    pub fn undo_marker(&mut self) -> Option<MarkedInterval> {
        self.markers.pop_last()
    }

    pub fn save_markers(&self, path: &Path) -> Result<()> {
        io::markers::save_markers(path, &self.markers)
    }

    /// Replace the shared list with the file's intervals. On error the list is unchanged.
    pub fn load_markers(&mut self, path: &Path) -> Result<&MarkerList> {
        self.markers = io::markers::load_markers(path)?;
        Ok(&self.markers)
    }
}
