//! Spectrum probe for the live waterfall (spec §4.4): a Hann-windowed
//! 512-sample snapshot, FFT'd and converted to 256 dB-scale bins.

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

use crate::constants::{DB_CEIL, DB_FLOOR, FFT_SIZE, SPECTRUM_BINS};

/// Mutex-guarded latest spectrum snapshot (spec §3's `SpectrumState`):
/// single producer (the pipeline worker), multiple consumers (UI/telemetry
/// readers). The critical section is a `Copy` of 256 floats, never held
/// across device I/O.
#[derive(Default)]
pub struct SpectrumPublisher {
    latest: Mutex<Option<[f32; SPECTRUM_BINS]>>,
}

impl SpectrumPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, bins: [f32; SPECTRUM_BINS]) {
        *self.latest.lock().unwrap() = Some(bins);
    }

    pub fn latest(&self) -> Option<[f32; SPECTRUM_BINS]> {
        *self.latest.lock().unwrap()
    }
}

/// Computes dB-scale magnitude spectra from raw real samples.
pub struct SpectrumProbe {
    window: [f32; FFT_SIZE],
    fft: Arc<dyn Fft<f32>>,
}

impl SpectrumProbe {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            window: hann_window(),
            fft: planner.plan_fft_forward(FFT_SIZE),
        }
    }

    /// Take the most recent `FFT_SIZE` real samples (zero-padded if fewer
    /// are available) and return `SPECTRUM_BINS` dB values clamped to
    /// `[DB_FLOOR, DB_CEIL]`.
    pub fn compute(&self, samples: &[f32]) -> [f32; SPECTRUM_BINS] {
        let mut buf = [Complex32::new(0.0, 0.0); FFT_SIZE];
        let start = samples.len().saturating_sub(FFT_SIZE);
        let tail = &samples[start..];
        let offset = FFT_SIZE - tail.len();
        for (i, &s) in tail.iter().enumerate() {
            buf[offset + i] = Complex32::new(s * self.window[offset + i], 0.0);
        }

        self.fft.process(&mut buf);

        let mut bins = [DB_FLOOR; SPECTRUM_BINS];
        for (i, bin) in bins.iter_mut().enumerate() {
            let mag = buf[i].norm() / (FFT_SIZE as f32 / 2.0);
            let db = 20.0 * (mag.max(1e-9)).log10();
            *bin = db.clamp(DB_FLOOR, DB_CEIL);
        }
        bins
    }
}

impl Default for SpectrumProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn hann_window() -> [f32; FFT_SIZE] {
    let mut w = [0.0f32; FFT_SIZE];
    for (i, v) in w.iter_mut().enumerate() {
        *v = 0.5 - 0.5 * (2.0 * PI * i as f32 / (FFT_SIZE as f32 - 1.0)).cos();
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_sits_at_floor() {
        let probe = SpectrumProbe::new();
        let bins = probe.compute(&[0.0; FFT_SIZE]);
        for b in bins {
            assert!((b - DB_FLOOR).abs() < 1e-3);
        }
    }

    #[test]
    fn full_scale_tone_stays_within_ceiling() {
        let probe = SpectrumProbe::new();
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * PI * 0.1 * i as f32).sin())
            .collect();
        let bins = probe.compute(&samples);
        for b in bins {
            assert!(b <= DB_CEIL + 1e-3);
            assert!(b >= DB_FLOOR);
        }
    }

    #[test]
    fn tone_peaks_near_expected_bin() {
        let probe = SpectrumProbe::new();
        let bin_freq = 32;
        let freq = bin_freq as f32 / FFT_SIZE as f32;
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * PI * freq * i as f32).sin())
            .collect();
        let bins = probe.compute(&samples);
        let (peak_bin, _) = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!((peak_bin as i32 - bin_freq as i32).abs() <= 2);
    }

    #[test]
    fn short_input_is_zero_padded() {
        let probe = SpectrumProbe::new();
        let bins = probe.compute(&[0.5; 10]);
        assert_eq!(bins.len(), SPECTRUM_BINS);
    }

    #[test]
    fn publisher_starts_empty_then_reports_latest() {
        let publisher = SpectrumPublisher::new();
        assert!(publisher.latest().is_none());
        publisher.publish([DB_FLOOR; SPECTRUM_BINS]);
        assert_eq!(publisher.latest(), Some([DB_FLOOR; SPECTRUM_BINS]));
    }
}
