//! Shared, lock-light telemetry snapshot published by a running pipeline
//! (spec §5 concurrency model): simple fields use relaxed atomics; the
//! latest decoded callsign is the one field that needs multi-byte
//! consistency, so it lives behind a small mutex.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Atomic telemetry published by the pipeline worker thread and read by the
/// controlling thread (e.g. a CLI polling loop) without blocking the worker.
#[derive(Default)]
pub struct Telemetry {
    running: AtomicBool,
    synced: AtomicBool,
    /// SNR estimate in dB, scaled by 100 and stored as bits of an i32 via
    /// AtomicU32 (f32 has no stable atomic type in std).
    snr_db_centi: AtomicU32,
    freq_offset_hz_centi: AtomicU32,
    input_level_centi: AtomicU32,
    output_level_centi: AtomicU32,
    tx_scale_centi: AtomicU32,
    mic_gain_centi: AtomicU32,
    bpf_enabled: AtomicBool,
    last_callsign: Mutex<Option<String>>,
}

fn to_centi(v: f32) -> u32 {
    ((v * 100.0) as i32) as u32
}

fn from_centi(bits: u32) -> f32 {
    (bits as i32) as f32 / 100.0
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, v: bool) {
        self.running.store(v, Ordering::Relaxed);
    }
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_synced(&self, v: bool) {
        self.synced.store(v, Ordering::Relaxed);
    }
    pub fn synced(&self) -> bool {
        self.synced.load(Ordering::Relaxed)
    }

    pub fn set_snr_db(&self, v: f32) {
        self.snr_db_centi.store(to_centi(v), Ordering::Relaxed);
    }
    pub fn snr_db(&self) -> f32 {
        from_centi(self.snr_db_centi.load(Ordering::Relaxed))
    }

    pub fn set_freq_offset_hz(&self, v: f32) {
        self.freq_offset_hz_centi
            .store(to_centi(v), Ordering::Relaxed);
    }
    pub fn freq_offset_hz(&self) -> f32 {
        from_centi(self.freq_offset_hz_centi.load(Ordering::Relaxed))
    }

    /// Input RMS level (spec §4.5/§4.6 "input RMS"), linear scale.
    pub fn set_input_level(&self, v: f32) {
        self.input_level_centi.store(to_centi(v), Ordering::Relaxed);
    }
    pub fn input_level(&self) -> f32 {
        from_centi(self.input_level_centi.load(Ordering::Relaxed))
    }

    /// Output RMS level, linear scale.
    pub fn set_output_level(&self, v: f32) {
        self.output_level_centi.store(to_centi(v), Ordering::Relaxed);
    }
    pub fn output_level(&self) -> f32 {
        from_centi(self.output_level_centi.load(Ordering::Relaxed))
    }

    pub fn set_tx_scale(&self, v: f32) {
        self.tx_scale_centi.store(to_centi(v), Ordering::Relaxed);
    }
    pub fn tx_scale(&self) -> f32 {
        from_centi(self.tx_scale_centi.load(Ordering::Relaxed))
    }

    pub fn set_mic_gain(&self, v: f32) {
        self.mic_gain_centi.store(to_centi(v), Ordering::Relaxed);
    }
    pub fn mic_gain(&self) -> f32 {
        from_centi(self.mic_gain_centi.load(Ordering::Relaxed))
    }

    pub fn set_bpf_enabled(&self, v: bool) {
        self.bpf_enabled.store(v, Ordering::Relaxed);
    }
    pub fn bpf_enabled(&self) -> bool {
        self.bpf_enabled.load(Ordering::Relaxed)
    }

    pub fn set_last_callsign(&self, callsign: String) {
        *self.last_callsign.lock().unwrap() = Some(callsign);
    }
    pub fn last_callsign(&self) -> Option<String> {
        self.last_callsign.lock().unwrap().clone()
    }

    /// Decay the output level meter by 0.9 when no speech frame was
    /// synthesized this iteration, so meters fall gracefully (spec §4.5
    /// step 10) instead of holding their last value.
    pub fn decay_output_level(&self) {
        let v = self.output_level();
        self.set_output_level(v * 0.9);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_centi_scaling() {
        let t = Telemetry::new();
        t.set_snr_db(-3.25);
        assert!((t.snr_db() - (-3.25)).abs() < 0.01);

        t.set_freq_offset_hz(12.5);
        assert!((t.freq_offset_hz() - 12.5).abs() < 0.01);
    }

    #[test]
    fn callsign_defaults_to_none() {
        let t = Telemetry::new();
        assert_eq!(t.last_callsign(), None);
        t.set_last_callsign("VK2ABC".to_string());
        assert_eq!(t.last_callsign().as_deref(), Some("VK2ABC"));
    }

    #[test]
    fn booleans_default_false() {
        let t = Telemetry::new();
        assert!(!t.running());
        assert!(!t.synced());
        assert!(!t.bpf_enabled());
    }

    #[test]
    fn decay_shrinks_output_level_by_tenth() {
        let t = Telemetry::new();
        t.set_output_level(1.0);
        t.decay_output_level();
        assert!((t.output_level() - 0.9).abs() < 0.01);
    }
}
