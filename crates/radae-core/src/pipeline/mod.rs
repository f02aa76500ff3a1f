//! The RX decoder and TX encoder streaming pipelines (spec §4.5, §4.6):
//! each owns one worker-thread's worth of state and runs to completion of
//! its outer loop when told to stop. Built from the building blocks in
//! [`crate::resample`], [`crate::dsp`], [`crate::codec`] and
//! [`crate::audio`] — this module is the glue, not new DSP.

pub mod rx;
pub mod tx;

pub use rx::{RecorderSlot, RxPipeline};
pub use tx::{CallsignSlot, TxPipeline};

use crate::constants::{S16_MAX, S16_MIN};

/// Convert a f32 sample to S16 with symmetric saturating clip, using
/// round-half-away-from-zero (`floor(0.5 + v)`) semantics per spec §4.5/§4.6.
pub(crate) fn f32_to_s16(v: f32) -> i16 {
    let scaled = (v * i16::MAX as f32).clamp(S16_MIN, S16_MAX);
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded.clamp(S16_MIN, S16_MAX) as i16
}

/// Convert a raw (pre-scaled) f32 sample already in S16 range to S16,
/// saturating. Used on the TX output path where scaling by `tx_scale` has
/// already happened. Unlike [`f32_to_s16`], this truncates rather than
/// rounds: spec §9 calls out that the TX converter truncates while the RX
/// converter rounds half-away-from-zero, and that asymmetry is faithful to
/// the source, not an oversight to reconcile.
pub(crate) fn scaled_f32_to_s16(v: f32) -> i16 {
    v.clamp(S16_MIN, S16_MAX) as i16
}

/// Root-mean-square level of a buffer.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_to_s16_clips_symmetrically() {
        assert_eq!(f32_to_s16(2.0), i16::MAX);
        assert_eq!(f32_to_s16(-2.0), i16::MIN);
        assert_eq!(f32_to_s16(0.0), 0);
    }

    #[test]
    fn scaled_f32_to_s16_truncates_towards_zero() {
        assert_eq!(scaled_f32_to_s16(1.9), 1);
        assert_eq!(scaled_f32_to_s16(-1.9), -1);
        assert_eq!(scaled_f32_to_s16(32767.4), 32767);
        assert_eq!(scaled_f32_to_s16(40000.0), i16::MAX);
    }

    #[test]
    fn rx_and_tx_converters_disagree_on_rounding() {
        // spec §9: RX rounds half-away-from-zero, TX truncates. Same
        // sub-integer input, different output — not a bug to reconcile.
        assert_eq!(f32_to_s16(0.5 / i16::MAX as f32), 1);
        assert_eq!(scaled_f32_to_s16(0.5), 0);
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 10]), 0.0);
    }
}
