//! Zero-phase Butterworth band-pass built from cascaded second-order sections.

use crate::error::{Error, Result};
use log::warn;
use std::f64::consts::PI;

pub const DEFAULT_ORDER: usize = 4;

/// Check `0 < lowcut < highcut < fs / 2`. NaN never passes.
pub fn validate_band(lowcut: f64, highcut: f64, fs: f64) -> Result<()> {
    let nyquist = fs * 0.5;
    if lowcut > 0.0 && lowcut < highcut && highcut < nyquist {
        Ok(())
    } else {
        Err(Error::InvalidFilterParameter {
            lowcut,
            highcut,
            nyquist,
        })
    }
}

/// Band-pass over one channel. Output has the input's length.
pub trait BandPassFilter {
    fn filter(&self, signal: &[f64], lowcut: f64, highcut: f64, fs: f64) -> Vec<f64>;
}

/// Butterworth high-pass at `lowcut` followed by a low-pass at `highcut`, each of `order`,
/// run forward and backward.
#[derive(Debug, Clone, Copy)]
pub struct ButterworthBandPass {
    pub order: usize,
}

impl Default for ButterworthBandPass {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
        }
    }
}

impl ButterworthBandPass {
    pub fn new(order: usize) -> Self {
        Self {
            order: order.max(1),
        }
    }

    fn sections(&self, lowcut: f64, highcut: f64, fs: f64) -> Vec<Biquad> {
        let mut sections = butterworth(Pass::High, lowcut, fs, self.order);
        sections.extend(butterworth(Pass::Low, highcut, fs, self.order));
        sections
    }
}

impl BandPassFilter for ButterworthBandPass {
    fn filter(&self, signal: &[f64], lowcut: f64, highcut: f64, fs: f64) -> Vec<f64> {
        if let Err(err) = validate_band(lowcut, highcut, fs) {
            warn!("band-pass skipped: {err}");
            return signal.to_vec();
        }
        filtfilt(&self.sections(lowcut, highcut, fs), signal)
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Low,
    High,
}

/// One section, `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Direct form II transposed state that makes a constant input `x0` pass without a
    /// transient. Returns the state and the settled output.
    fn steady_state(&self, x0: f64) -> ([f64; 2], f64) {
        let y = self.dc_gain() * x0;
        let z2 = self.b2 * x0 - self.a2 * y;
        let z1 = self.b1 * x0 - self.a1 * y + z2;
        ([z1, z2], y)
    }

    #[inline]
    fn step(&self, x: f64, z: &mut [f64; 2]) -> f64 {
        let y = self.b0 * x + z[0];
        z[0] = self.b1 * x - self.a1 * y + z[1];
        z[1] = self.b2 * x - self.a2 * y;
        y
    }
}

/// Bilinear-transform Butterworth design with prewarped cutoff.
fn butterworth(pass: Pass, cutoff: f64, fs: f64, order: usize) -> Vec<Biquad> {
    let k = (PI * cutoff / fs).tan();
    let k2 = k * k;
    let mut sections: Vec<Biquad> = (0..order / 2)
        .map(|i| {
            let q = 2.0 * ((2 * i + 1) as f64 * PI / (2 * order) as f64).sin();
            let norm = 1.0 / (1.0 + q * k + k2);
            let a1 = 2.0 * (k2 - 1.0) * norm;
            let a2 = (1.0 - q * k + k2) * norm;
            match pass {
                Pass::Low => Biquad {
                    b0: k2 * norm,
                    b1: 2.0 * k2 * norm,
                    b2: k2 * norm,
                    a1,
                    a2,
                },
                Pass::High => Biquad {
                    b0: norm,
                    b1: -2.0 * norm,
                    b2: norm,
                    a1,
                    a2,
                },
            }
        })
        .collect();
    if order % 2 == 1 {
        let a1 = (k - 1.0) / (k + 1.0);
        let (b0, b1) = match pass {
            Pass::Low => (k / (1.0 + k), k / (1.0 + k)),
            Pass::High => (1.0 / (1.0 + k), -1.0 / (1.0 + k)),
        };
        sections.push(Biquad {
            b0,
            b1,
            b2: 0.0,
            a1,
            a2: 0.0,
        });
    }
    sections
}

/// Single causal pass, every section started at steady state for the first sample.
fn sosfilt(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let Some(&x0) = data.first() else {
        return Vec::new();
    };
    let mut level = x0;
    let mut states: Vec<[f64; 2]> = Vec::with_capacity(sections.len());
    for section in sections {
        let (z, y) = section.steady_state(level);
        states.push(z);
        level = y;
    }
    data.iter()
        .map(|&x| {
            sections
                .iter()
                .zip(states.iter_mut())
                .fold(x, |v, (section, z)| section.step(v, z))
        })
        .collect()
}

/// Forward-backward application with odd reflection padding at both ends.
fn filtfilt(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let padlen = (3 * (2 * sections.len() + 1)).min(n - 1);
    let first = data[0];
    let last = data[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * padlen);
    extended.extend((1..=padlen).rev().map(|i| 2.0 * first - data[i]));
    extended.extend_from_slice(data);
    extended.extend((1..=padlen).map(|i| 2.0 * last - data[n - 1 - i]));

    let mut y = sosfilt(sections, &extended);
    y.reverse();
    let mut y = sosfilt(sections, &y);
    y.reverse();
    y[padlen..padlen + n].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 250.0;

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn rms(data: &[f64]) -> f64 {
        (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
    }

    /// RMS ratio away from the edges.
    fn gain(input: &[f64], output: &[f64]) -> f64 {
        let mid = input.len() / 4..3 * input.len() / 4;
        rms(&output[mid.clone()]) / rms(&input[mid])
    }

    #[test]
    fn passes_in_band_tone() {
        let x = sine(10.0, 2500);
        let y = ButterworthBandPass::default().filter(&x, 1.0, 50.0, FS);
        assert_eq!(y.len(), x.len());
        assert!(gain(&x, &y) > 0.9);
    }

    #[test]
    fn rejects_out_of_band_tone() {
        let x = sine(100.0, 2500);
        let y = ButterworthBandPass::default().filter(&x, 1.0, 50.0, FS);
        assert!(gain(&x, &y) < 0.1);
    }

    #[test]
    fn removes_offset_without_start_transient() {
        let x = vec![3.0; 500];
        let y = ButterworthBandPass::default().filter(&x, 1.0, 50.0, FS);
        assert!(y.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn zero_phase_keeps_peak_position() {
        let x = sine(10.0, 2500);
        let y = ButterworthBandPass::default().filter(&x, 1.0, 50.0, FS);
        // Quarter period of 10 Hz at 250 Hz is sample 6.25; compare a peak well inside.
        let peak = 1250 + 6;
        assert!((y[peak] - x[peak]).abs() < 0.05);
    }

    #[test]
    fn invalid_band_returns_input() {
        let x = sine(10.0, 100);
        let filter = ButterworthBandPass::default();
        assert_eq!(filter.filter(&x, 50.0, 1.0, FS), x);
        assert_eq!(filter.filter(&x, 1.0, 125.0, FS), x);
        assert_eq!(filter.filter(&x, f64::NAN, 50.0, FS), x);
    }

    #[test]
    fn odd_order_is_supported() {
        let x = sine(10.0, 2000);
        let y = ButterworthBandPass::new(3).filter(&x, 1.0, 50.0, FS);
        assert!(gain(&x, &y) > 0.9);
    }

    #[test]
    fn short_signals_do_not_panic() {
        let filter = ButterworthBandPass::default();
        assert!(filter.filter(&[], 1.0, 50.0, FS).is_empty());
        assert_eq!(filter.filter(&[2.0], 1.0, 50.0, FS).len(), 1);
        assert_eq!(filter.filter(&[1.0, 2.0, 3.0], 1.0, 50.0, FS).len(), 3);
    }

    #[test]
    fn band_validation() {
        assert!(validate_band(1.0, 50.0, FS).is_ok());
        assert!(validate_band(0.0, 50.0, FS).is_err());
        assert!(validate_band(1.0, 125.0, FS).is_err());
        assert!(matches!(
            validate_band(10.0, 5.0, FS),
            Err(Error::InvalidFilterParameter { nyquist, .. }) if nyquist == 125.0
        ));
    }
}
