//! Time-window selection, synchronized navigation and vertical zoom.

use crate::engine::ActiveView;
use crate::error::{Error, Result};
use crate::markers::{MarkedInterval, MarkerList};
use crate::signal::StreamKind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW_S: f64 = 20.0;
pub const DEFAULT_SHIFT_STEP_S: f64 = 2.0;

/// Visible span in seconds, always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct WindowLength(f64);

impl WindowLength {
    pub fn new(seconds: f64) -> Result<Self> {
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Self(seconds))
        } else {
            Err(Error::InvalidWindowLength(seconds))
        }
    }

    /// Parse user text, falling back to the default for anything unusable.
    pub fn parse_or_default(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .ok()
            .and_then(|s| Self::new(s).ok())
            .unwrap_or_default()
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn samples(self, fs: f64) -> usize {
        (self.0 * fs).round() as usize
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_S)
    }
}

impl TryFrom<f64> for WindowLength {
    type Error = Error;

    fn try_from(seconds: f64) -> Result<Self> {
        Self::new(seconds)
    }
}

impl From<WindowLength> for f64 {
    fn from(window: WindowLength) -> f64 {
        window.0
    }
}

/// Half-open sample range `[start, end)` into an active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn start_time(&self, fs: f64) -> f64 {
        self.start as f64 / fs
    }

    pub fn end_time(&self, fs: f64) -> f64 {
        self.end as f64 / fs
    }
}

/// Samples to draw for a window starting at `start_time` seconds.
///
/// The range never leaves `0..active_len`; near the end it slides back so a full window is
/// shown whenever the view is long enough.
pub fn select_window(
    start_time: f64,
    window: WindowLength,
    fs: f64,
    active_len: usize,
) -> SampleRange {
    let win = window.samples(fs);
    let start = (start_time.max(0.0) * fs).round() as usize;
    let end = start.saturating_add(win).min(active_len);
    SampleRange {
        start: end.saturating_sub(win),
        end,
    }
}

/// Start time of each loaded group, moved together by the navigation controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigator {
    window: WindowLength,
    step_s: f64,
    start_times: BTreeMap<StreamKind, f64>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(WindowLength::default(), DEFAULT_SHIFT_STEP_S)
    }
}

impl Navigator {
    pub fn new(window: WindowLength, step_s: f64) -> Self {
        Self {
            window,
            step_s,
            start_times: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> WindowLength {
        self.window
    }

    pub fn set_window(&mut self, window: WindowLength) {
        self.window = window;
    }

    pub fn step(&self) -> f64 {
        self.step_s
    }

    pub fn start_time(&self, kind: StreamKind) -> f64 {
        self.start_times.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn set_start_time(&mut self, kind: StreamKind, seconds: f64) {
        self.start_times.insert(kind, seconds.max(0.0));
    }

    /// Back to the beginning, used when a group is reloaded.
    pub fn reset(&mut self, kind: StreamKind) {
        self.start_times.remove(&kind);
    }

    /// Move every group in `durations` by `delta` seconds, clamped to
    /// `[0, max(0, duration - window)]`. Groups not listed stay put.
    pub fn shift<I>(&mut self, delta: f64, durations: I)
    where
        I: IntoIterator<Item = (StreamKind, f64)>,
    {
        for (kind, duration) in durations {
            let latest = (duration - self.window.seconds()).max(0.0);
            let t = (self.start_time(kind) + delta).min(latest).max(0.0);
            debug!("{kind}: view start {t:.3} s");
            self.start_times.insert(kind, t);
        }
    }

    pub fn forward<I>(&mut self, durations: I)
    where
        I: IntoIterator<Item = (StreamKind, f64)>,
    {
        self.shift(self.step_s, durations);
    }

    pub fn back<I>(&mut self, durations: I)
    where
        I: IntoIterator<Item = (StreamKind, f64)>,
    {
        self.shift(-self.step_s, durations);
    }
}

pub const ZOOM_IN: f64 = 1.2;
pub const ZOOM_OUT: f64 = 0.8;
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;

/// Vertical zoom of one plot group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom(f64);

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Zoom {
    pub fn factor(self) -> f64 {
        self.0
    }

    pub fn scaled(self, by: f64) -> Self {
        Self((self.0 * by).clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn zoom_in(self) -> Self {
        self.scaled(ZOOM_IN)
    }

    pub fn zoom_out(self) -> Self {
        self.scaled(ZOOM_OUT)
    }

    /// Apply `steps` clicks: positive zooms in, negative zooms out.
    pub fn stepped(self, steps: i32) -> Self {
        let click = if steps >= 0 { ZOOM_IN } else { ZOOM_OUT };
        (0..steps.unsigned_abs()).fold(self, |z, _| z.scaled(click))
    }

    /// Y-axis limits for `samples`. Factors above 1 tighten the range around the data.
    pub fn y_limits(self, samples: &[f64]) -> Option<(f64, f64)> {
        let (min, max) = samples
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })?;
        let range = (max - min).max(1e-6);
        let pad = range * (1.0 - self.0) / 2.0;
        Some((min - pad, max + pad))
    }
}

/// One plotted channel inside a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameChannel {
    pub label: String,
    pub samples: Vec<f64>,
    pub y_limits: Option<(f64, f64)>,
}

/// Everything a renderer needs to draw one group at its current position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewFrame {
    pub kind: StreamKind,
    pub group: String,
    pub fs: f64,
    pub trim_offset: usize,
    pub range: SampleRange,
    pub start_time: f64,
    pub end_time: f64,
    pub zoom: f64,
    pub channels: Vec<FrameChannel>,
    pub markers: Vec<MarkedInterval>,
}

impl ViewFrame {
    /// Cut the window out of `view` and attach the markers that start inside it.
    pub fn build(
        kind: StreamKind,
        group: impl Into<String>,
        view: &ActiveView,
        start_time: f64,
        window: WindowLength,
        zoom: Zoom,
        markers: &MarkerList,
    ) -> Self {
        let fs = view.stream.fs();
        let range = select_window(start_time, window, fs, view.stream.len());
        let (t0, t1) = (range.start_time(fs), range.end_time(fs));
        let channels = view
            .stream
            .channels()
            .iter()
            .map(|ch| {
                let samples = ch.data[range.start..range.end].to_vec();
                FrameChannel {
                    label: ch.name.clone(),
                    y_limits: zoom.y_limits(&samples),
                    samples,
                }
            })
            .collect();
        Self {
            kind,
            group: group.into(),
            fs,
            trim_offset: view.offset,
            range,
            start_time: t0,
            end_time: t1,
            zoom: zoom.factor(),
            channels,
            markers: markers.visible_between(t0, t1).copied().collect(),
        }
    }
}
