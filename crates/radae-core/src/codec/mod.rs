//! Neural codec collaborator contract (spec §6.2).
//!
//! The RADAE OFDM modem and the FARGAN/LPCNet vocoder are not reimplemented
//! here — they are an opaque, pre-built C library linked in at build time.
//! This module declares the C ABI and wraps each opaque handle in a Rust
//! type that frees it on `Drop`, and exposes `RxCodec`/`TxCodec` traits so
//! the pipelines can run against either the real library or the in-process
//! [`test_stub`] used by unit tests (the real `librade`/`liblpcnet`/
//! `libfargan` shared objects aren't linkable in this environment).

mod error;
mod ffi;
pub mod test_stub;

pub use error::CodecError;
pub use ffi::{Fargan, LpcnetEncoder, RadeBpf, RadeRx, RadeTx};

use crate::constants::{FEATURES_SIZE, NB_TOTAL_FEATURES};

/// Per-frame status reported alongside demodulated features (spec §6.2's
/// `rade_rx` out-parameters and `rade_sync`/`rade_snrdB_3k_est`/
/// `rade_freq_offset`).
#[derive(Clone, Debug, Default)]
pub struct RxStatus {
    pub synced: bool,
    pub snr_db: f32,
    pub freq_offset_hz: f32,
    /// Set when this frame carried an End-Of-Over marker.
    pub eoo_detected: bool,
    /// Raw EOO bits (`2 * n_eoo_bits/2` interleaved I/Q floats), populated
    /// only when `eoo_detected`.
    pub eoo_bits: Vec<f32>,
}

/// Receive-side codec surface the RX pipeline drives each modem frame.
///
/// Implemented by [`ffi::RadeRx`] (wrapping `rade_rx`); the vocoder is a
/// separate [`Vocoder`] surface, mirroring the two separate shared
/// libraries (`librade`, `libfargan`) in the real collaborator.
pub trait RxCodec: Send {
    /// Number of input samples this call wants next (`rade_nin`); may vary
    /// call to call around `rade_nin_max`.
    fn nin(&self) -> usize;

    /// Demodulate `nin()` complex baseband samples into up to
    /// `FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES` LPCNet features,
    /// returning how many feature floats were produced plus frame status.
    fn rx_frame(
        &mut self,
        iq: &[num_complex::Complex32],
        features_out: &mut [f32],
    ) -> (usize, RxStatus);

    /// Reset internal demodulator sync state (called on a sync falling edge).
    fn reset_sync(&mut self);
}

/// Vocoder surface the RX pipeline drives to turn features into speech.
pub trait Vocoder: Send {
    /// Warm up FARGAN's recurrent state on one feature frame without
    /// producing audio (spec §4.5 step 9, the 5-frame warm-up window).
    fn warmup(&mut self, features: &[f32]);

    /// Continuation-prime FARGAN from the packed warm-up features plus
    /// `FARGAN_CONT_SAMPLES` zero samples (spec §4.5 step 9).
    fn continuation(&mut self, packed_warmup_features: &[f32]);

    /// Synthesize one 160-sample (10ms) speech frame from one feature frame.
    fn synthesize(&mut self, features: &[f32], pcm_out: &mut [f32]);

    /// Reinitialise the vocoder's recurrent state, discarding everything
    /// learned since the last sync (spec §4.5 step 8, sync-falling-edge).
    fn reset(&mut self);
}

/// Transmit-side codec surface the TX pipeline drives each modem frame.
pub trait TxCodec: Send {
    /// Encode `FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES` features into
    /// one 960-sample modem frame of complex baseband.
    fn tx_frame(&mut self, features: &[f32], iq_out: &mut [num_complex::Complex32]);

    /// Produce the 1152-sample End-Of-Over frame (`rade_tx_eoo`).
    fn tx_eoo(&mut self, iq_out: &mut [num_complex::Complex32]);

    /// Install the EOO bit payload (`rade_tx_set_eoo_bits`); takes effect on
    /// the next `tx_eoo` call.
    fn set_eoo_bits(&mut self, bits: &[f32]);

    /// Bit budget the callsign encoder must fill (`rade_n_eoo_bits`).
    fn n_eoo_bits(&self) -> usize;
}

/// LPCNet analysis surface the TX pipeline drives each speech frame.
pub trait FeatureEncoder: Send {
    /// Extract one `NB_TOTAL_FEATURES`-float feature vector from one
    /// 160-sample (10ms) speech frame.
    fn encode(&mut self, pcm: &[f32], features_out: &mut [f32; NB_TOTAL_FEATURES]);
}

/// TX output band-pass filter surface.
pub trait BandPassFilter: Send {
    /// Filter one frame of complex baseband in place (960 samples for a
    /// modem frame, 1152 for an EOO frame).
    fn process(&mut self, iq: &mut [num_complex::Complex32]);
}

/// A complete one-modem-frame feature buffer, sized per §3.
pub fn new_feature_buffer() -> Vec<f32> {
    vec![0.0; FEATURES_SIZE]
}
