//! Pure-Rust stand-ins for the opaque neural codec, used only by tests.
//!
//! These do not attempt to approximate RADAE/LPCNet/FARGAN's actual DSP —
//! they exist so the RX/TX pipeline *control flow* (sync tracking, warm-up,
//! continuation priming, EOO handling) can be exercised deterministically
//! without the real shared libraries being linkable in this environment.

use num_complex::Complex32;

use super::{BandPassFilter, FeatureEncoder, RxCodec, RxStatus, TxCodec, Vocoder};
use crate::constants::{MODEM_FRAME_SAMPLES, NB_TOTAL_FEATURES, SPEECH_FRAME};

/// Stub RX codec: reports sync once `frames_until_sync` frames have been
/// pushed, and "demodulates" by copying the real part of the IQ stream back
/// out as a deterministic feature pattern (enough for assertions about
/// frame counts and shapes, not about audio fidelity).
pub struct StubRxCodec {
    pub frames_until_sync: usize,
    frames_seen: usize,
    pub synced: bool,
}

impl StubRxCodec {
    pub fn new(frames_until_sync: usize) -> Self {
        Self {
            frames_until_sync,
            frames_seen: 0,
            synced: false,
        }
    }
}

impl RxCodec for StubRxCodec {
    fn nin(&self) -> usize {
        MODEM_FRAME_SAMPLES
    }

    fn rx_frame(&mut self, iq: &[Complex32], features_out: &mut [f32]) -> (usize, RxStatus) {
        self.frames_seen += 1;
        self.synced = self.frames_seen >= self.frames_until_sync;
        for (i, f) in features_out.iter_mut().enumerate() {
            *f = iq.get(i % iq.len()).map(|c| c.re).unwrap_or(0.0);
        }
        let status = RxStatus {
            synced: self.synced,
            snr_db: 0.0,
            freq_offset_hz: 0.0,
            eoo_detected: false,
            eoo_bits: Vec::new(),
        };
        (features_out.len(), status)
    }

    fn reset_sync(&mut self) {
        self.frames_seen = 0;
        self.synced = false;
    }
}

/// Stub vocoder: treats each feature vector's first sample as a DC level
/// and fills the output frame with it, tracking whether warm-up/
/// continuation were called so tests can assert on ordering.
#[derive(Default)]
pub struct StubVocoder {
    pub warmup_calls: usize,
    pub continuation_calls: usize,
    pub synthesize_calls: usize,
    pub reset_calls: usize,
}

impl Vocoder for StubVocoder {
    fn warmup(&mut self, _features: &[f32]) {
        self.warmup_calls += 1;
    }

    fn continuation(&mut self, _prior_samples: &[f32]) {
        self.continuation_calls += 1;
    }

    fn synthesize(&mut self, features: &[f32], pcm_out: &mut [f32]) {
        self.synthesize_calls += 1;
        let level = features.first().copied().unwrap_or(0.0);
        pcm_out.fill(level);
    }

    fn reset(&mut self) {
        self.reset_calls += 1;
    }
}

/// Stub TX codec: packs the mean of each feature frame into the IQ real
/// component and zeroes the imaginary component.
#[derive(Default)]
pub struct StubTxCodec {
    eoo_bits: Vec<f32>,
}

impl TxCodec for StubTxCodec {
    fn tx_frame(&mut self, features: &[f32], iq_out: &mut [Complex32]) {
        let mean = if features.is_empty() {
            0.0
        } else {
            features.iter().sum::<f32>() / features.len() as f32
        };
        for c in iq_out.iter_mut() {
            *c = Complex32::new(mean, 0.0);
        }
    }

    fn tx_eoo(&mut self, iq_out: &mut [Complex32]) {
        let level = self.eoo_bits.iter().sum::<f32>() / self.eoo_bits.len().max(1) as f32;
        for c in iq_out.iter_mut() {
            *c = Complex32::new(level, 0.0);
        }
    }

    fn set_eoo_bits(&mut self, bits: &[f32]) {
        self.eoo_bits = bits.to_vec();
    }

    fn n_eoo_bits(&self) -> usize {
        224
    }
}

/// Stub feature encoder: energy + zero-crossing rate in the first two
/// slots, zero elsewhere.
#[derive(Default)]
pub struct StubFeatureEncoder;

impl FeatureEncoder for StubFeatureEncoder {
    fn encode(&mut self, pcm: &[f32], features_out: &mut [f32; NB_TOTAL_FEATURES]) {
        debug_assert_eq!(pcm.len(), SPEECH_FRAME);
        features_out.fill(0.0);
        let energy = pcm.iter().map(|s| s * s).sum::<f32>() / pcm.len() as f32;
        features_out[0] = energy;
        let crossings = pcm
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        features_out[1] = crossings as f32 / pcm.len() as f32;
    }
}

/// Stub band-pass filter: no-op (pass-through), since tests only assert on
/// frame shapes/call ordering, not attenuation.
#[derive(Default)]
pub struct StubBandPassFilter;

impl BandPassFilter for StubBandPassFilter {
    fn process(&mut self, _iq: &mut [Complex32]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MODEM_FRAME_SAMPLES;

    #[test]
    fn rx_codec_reports_sync_after_threshold() {
        let mut codec = StubRxCodec::new(3);
        let iq = vec![Complex32::new(0.0, 0.0); MODEM_FRAME_SAMPLES];
        let mut features = vec![0.0; 12 * NB_TOTAL_FEATURES];

        assert!(!codec.rx_frame(&iq, &mut features).1.synced);
        assert!(!codec.rx_frame(&iq, &mut features).1.synced);
        assert!(codec.rx_frame(&iq, &mut features).1.synced);
    }

    #[test]
    fn vocoder_tracks_call_counts() {
        let mut v = StubVocoder::default();
        let features = vec![0.0; NB_TOTAL_FEATURES];
        let mut pcm = vec![0.0; SPEECH_FRAME];

        v.warmup(&features);
        v.continuation(&pcm);
        v.synthesize(&features, &mut pcm);

        assert_eq!(v.warmup_calls, 1);
        assert_eq!(v.continuation_calls, 1);
        assert_eq!(v.synthesize_calls, 1);
    }
}
