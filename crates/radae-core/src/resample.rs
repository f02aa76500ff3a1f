//! Bit-exact streaming linear resampler (spec §4.2).
//!
//! Unlike an FFT-based resampler, this keeps a small amount of state — the
//! fractional read position and the last input sample — across calls, so a
//! stream can be fed in arbitrarily sized chunks and produce the same output
//! as if it had been resampled in one shot.

/// Persisted state for one direction of streaming linear resampling.
#[derive(Clone, Debug)]
pub struct Resampler {
    rate_in: u32,
    rate_out: u32,
    /// Position of the next output sample, in input-sample units, measured
    /// from the start of the current call's input. Always `>= 0`: index 0
    /// pairs with `prev` rather than needing a sample before the start.
    frac: f64,
    /// Last input sample carried over from the previous call.
    prev: f32,
}

impl Resampler {
    /// Create a resampler converting from `rate_in` Hz to `rate_out` Hz.
    pub fn new(rate_in: u32, rate_out: u32) -> Self {
        Self {
            rate_in,
            rate_out,
            frac: 0.0,
            prev: 0.0,
        }
    }

    /// Ratio of input samples consumed per output sample produced.
    fn step(&self) -> f64 {
        self.rate_in as f64 / self.rate_out as f64
    }

    /// Resample `input`, appending produced samples to `output`.
    ///
    /// Each output sample interpolates between `in[idx-1]` (or `prev` when
    /// `idx == 0`) and `in[idx]`, so the history sample is always one step
    /// behind the output position. Maintains `frac`/`prev` across calls so
    /// chunking the input differently does not change the output (see
    /// `tests::chunk_invariance`).
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        let step = self.step();
        let mut pos = self.frac;
        loop {
            let idx = pos.floor();
            let i = idx as isize;
            if i < 0 || (i as usize) >= input.len() {
                break;
            }
            let i = i as usize;
            let t = (pos - idx) as f32;

            let s0 = if i == 0 { self.prev } else { input[i - 1] };
            let s1 = input[i];

            output.push(s0 + t * (s1 - s0));
            pos += step;
        }

        self.frac = pos - input.len() as f64;
        if let Some(&last) = input.last() {
            self.prev = last;
        }
    }

    /// Reset persisted interpolation state (e.g. on device reopen).
    pub fn reset(&mut self) {
        self.frac = 0.0;
        self.prev = 0.0;
    }
}

/// One-shot resample of a complete buffer (used by the WAV file source,
/// §4.7, which has the whole file up front and no streaming state to
/// preserve across calls).
pub fn resample_batch(input: &[f32], rate_in: u32, rate_out: u32) -> Vec<f32> {
    if rate_in == rate_out {
        return input.to_vec();
    }
    let mut r = Resampler::new(rate_in, rate_out);
    let mut out = Vec::with_capacity(input.len() * rate_out as usize / rate_in.max(1) as usize);
    r.process(input, &mut out);
    out
}

/// Downmix interleaved multichannel samples to mono by averaging channels.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_rates_equal() {
        let mut r = Resampler::new(8000, 8000);
        let input = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert_eq!(out.len(), input.len());
        for (a, b) in out.iter().zip(input.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn upsample_doubles_rate() {
        let mut r = Resampler::new(8000, 16000);
        let input = vec![0.0f32; 800];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert!((out.len() as i64 - 1600).abs() <= 1);
    }

    #[test]
    fn downsample_halves_rate() {
        let mut r = Resampler::new(16000, 8000);
        let input = vec![0.0f32; 1600];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert!((out.len() as i64 - 800).abs() <= 1);
    }

    #[test]
    fn chunk_invariance() {
        let rate_in = 8000;
        let rate_out = 16000;
        let n = 2000;
        let full: Vec<f32> = (0..n).map(|i| (i as f32 * 0.01).sin()).collect();

        let mut whole = Vec::new();
        Resampler::new(rate_in, rate_out).process(&full, &mut whole);

        let mut chunked = Vec::new();
        let mut r = Resampler::new(rate_in, rate_out);
        for chunk in full.chunks(37) {
            r.process(chunk, &mut chunked);
        }

        assert_eq!(whole.len(), chunked.len());
        for (a, b) in whole.iter().zip(chunked.iter()) {
            assert!((a - b).abs() < 1e-5, "whole={a} chunked={b}");
        }
    }

    #[test]
    fn batch_matches_streaming() {
        let full: Vec<f32> = (0..500).map(|i| (i as f32 * 0.02).cos()).collect();
        let batch = resample_batch(&full, 44100, 8000);

        let mut streaming = Vec::new();
        Resampler::new(44100, 8000).process(&full, &mut streaming);

        assert_eq!(batch.len(), streaming.len());
    }

    #[test]
    fn downsample_pairs_each_index_with_its_predecessor() {
        // idx 0 pairs with `prev` (0.0 here), not with in[1]; every later
        // idx pairs with in[idx-1], not in[idx+1].
        let mut r = Resampler::new(16000, 8000);
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert_eq!(out, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn downmix_averages_channels() {
        let stereo = vec![1.0, 3.0, 2.0, -2.0];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![2.0, 0.0]);
    }
}
