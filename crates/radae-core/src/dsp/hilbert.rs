//! 127-tap Hamming-windowed Hilbert transform (spec §4.3).
//!
//! Converts a stream of real samples into phase-aligned analytic (complex)
//! baseband: the imaginary branch is the Hilbert-filtered signal, and the
//! real branch is delayed by the filter's own group delay so both branches
//! describe the same instant.

use num_complex::Complex32;
use std::f32::consts::PI;

use crate::constants::{HILBERT_DELAY, HILBERT_NTAPS};

/// Streaming Hilbert transformer. Persists its input history across calls
/// so a stream can be fed in arbitrarily sized chunks.
pub struct Hilbert {
    taps: [f32; HILBERT_NTAPS],
    /// Most recent `HILBERT_NTAPS` real input samples, newest last.
    history: std::collections::VecDeque<f32>,
    /// Plain delay line for the real branch, matching the FIR's group delay.
    delay: std::collections::VecDeque<f32>,
}

impl Hilbert {
    pub fn new() -> Self {
        Self {
            taps: hilbert_taps(),
            history: std::collections::VecDeque::from(vec![0.0; HILBERT_NTAPS]),
            delay: std::collections::VecDeque::from(vec![0.0; HILBERT_DELAY]),
        }
    }

    /// Produce one analytic sample per input real sample.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<Complex32>) {
        output.reserve(input.len());
        for &x in input {
            self.history.push_back(x);
            self.history.pop_front();

            // taps[0] is the n=-63 coefficient and must multiply the newest
            // sample, taps[126] (n=+63) the oldest: zip against history in
            // reverse (newest first) rather than its natural oldest-first
            // order.
            let imag: f32 = self
                .taps
                .iter()
                .zip(self.history.iter().rev())
                .map(|(h, s)| s * h)
                .sum();

            self.delay.push_back(x);
            let real = self.delay.pop_front().unwrap_or(0.0);

            output.push(Complex32::new(real, imag));
        }
    }
}

impl Default for Hilbert {
    fn default() -> Self {
        Self::new()
    }
}

/// Hamming-windowed discrete Hilbert FIR coefficients (odd-length, linear
/// phase): zero at even offsets from center, `2 / (pi * m)` at odd offsets.
fn hilbert_taps() -> [f32; HILBERT_NTAPS] {
    let mut taps = [0.0f32; HILBERT_NTAPS];
    let center = (HILBERT_NTAPS as isize - 1) / 2;
    for (k, tap) in taps.iter_mut().enumerate() {
        let m = k as isize - center;
        let ideal = if m == 0 {
            0.0
        } else if m % 2 != 0 {
            2.0 / (PI * m as f32)
        } else {
            0.0
        };
        let window = 0.54 - 0.46 * (2.0 * PI * k as f32 / (HILBERT_NTAPS as f32 - 1.0)).cos();
        *tap = ideal * window;
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taps_are_antisymmetric() {
        let taps = hilbert_taps();
        let center = (HILBERT_NTAPS - 1) / 2;
        for k in 1..=center {
            assert!(
                (taps[center + k] + taps[center - k]).abs() < 1e-6,
                "taps[{}]={} taps[{}]={}",
                center + k,
                taps[center + k],
                center - k,
                taps[center - k]
            );
        }
        assert!(taps[center].abs() < 1e-9);
    }

    #[test]
    fn delay_matches_group_delay_of_fir() {
        // A single impulse through the real (delay) branch should appear
        // HILBERT_DELAY samples later, matching the FIR's own group delay
        // so the two branches stay phase-aligned.
        let mut h = Hilbert::new();
        let mut input = vec![0.0f32; HILBERT_DELAY + 5];
        input[0] = 1.0;
        let mut out = Vec::new();
        h.process(&input, &mut out);
        assert!((out[HILBERT_DELAY].re - 1.0).abs() < 1e-6);
        for (i, c) in out.iter().enumerate() {
            if i != HILBERT_DELAY {
                assert!(c.re.abs() < 1e-6, "unexpected real energy at {i}: {}", c.re);
            }
        }
    }

    #[test]
    fn imaginary_branch_has_correct_sign() {
        // The analytic signal of cos(wt) is cos(wt) + j*sin(wt): the
        // imaginary branch must track sin, not -sin, once the delay line and
        // FIR history have both filled. A sign flip here silently swaps
        // which sideband is produced.
        let mut h = Hilbert::new();
        let freq = 0.05f32;
        let n = HILBERT_DELAY + 200;
        let input: Vec<f32> = (0..n).map(|i| (2.0 * PI * freq * i as f32).cos()).collect();
        let mut out = Vec::new();
        h.process(&input, &mut out);

        for i in (HILBERT_DELAY + 100)..n {
            let expected_im = (2.0 * PI * freq * (i - HILBERT_DELAY) as f32).sin();
            assert!(
                (out[i].im - expected_im).abs() < 0.2,
                "at {i}: im={} expected={}",
                out[i].im,
                expected_im
            );
        }
    }

    #[test]
    fn sine_produces_quadrature_output() {
        // A slowly varying sine through the Hilbert branch should produce
        // energy roughly in quadrature with the (delayed) real branch once
        // the filter has filled its history.
        let mut h = Hilbert::new();
        let n = 400;
        let freq = 0.05;
        let input: Vec<f32> = (0..n).map(|i| (2.0 * PI * freq * i as f32).sin()).collect();
        let mut out = Vec::new();
        h.process(&input, &mut out);

        let tail = &out[200..];
        let energy: f32 = tail.iter().map(|c| c.norm_sqr()).sum::<f32>() / tail.len() as f32;
        assert!(energy > 0.1, "expected analytic signal energy, got {energy}");
    }
}
