//! TX encoder pipeline (spec §4.6): microphone audio at an arbitrary rate
//! in, OFDM-modulated baseband (optionally band-limited) out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use num_complex::Complex32;

use crate::audio::{AudioError, AudioTransport, ReadStatus};
use crate::codec::{BandPassFilter, FeatureEncoder, TxCodec};
use crate::constants::{
    EOO_SAMPLES, FEATURES_PER_MODEM_FRAME, FS_MODEM, FS_SPEECH, MODEM_FRAME_SAMPLES,
    NB_TOTAL_FEATURES, SPEECH_FRAME, TX_READ_FRAMES,
};
use crate::dsp::{SpectrumProbe, SpectrumPublisher};
use crate::error::Result;
use crate::pipeline::{rms, scaled_f32_to_s16};
use crate::resample::Resampler;
use crate::telemetry::Telemetry;
use crate::warn;

/// Controller-owned slot holding a freshly-encoded callsign bit-vector
/// waiting to be installed via `TxCodec::set_eoo_bits`; the worker checks it
/// once per outer-loop iteration and installs+clears it (spec §4.10 "changes
/// take effect immediately when the pipeline is open").
pub type CallsignSlot = Arc<Mutex<Option<Vec<f32>>>>;

pub struct TxPipeline {
    transport: Arc<dyn AudioTransport>,
    codec: Box<dyn TxCodec>,
    feature_encoder: Box<dyn FeatureEncoder>,
    bpf: Option<Box<dyn BandPassFilter>>,
    pending_eoo_bits: CallsignSlot,
    input_resampler: Resampler,
    output_resampler: Resampler,
    spectrum_probe: SpectrumProbe,
    spectrum: Arc<SpectrumPublisher>,
    telemetry: Arc<Telemetry>,
    running: Arc<AtomicBool>,
    device_rate: u32,
    acc_16k: Vec<f32>,
    features: Vec<f32>,
    feat_count: usize,
}

impl TxPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: Arc<dyn AudioTransport>,
        codec: Box<dyn TxCodec>,
        feature_encoder: Box<dyn FeatureEncoder>,
        bpf: Option<Box<dyn BandPassFilter>>,
        pending_eoo_bits: CallsignSlot,
        device_rate: u32,
        telemetry: Arc<Telemetry>,
        spectrum: Arc<SpectrumPublisher>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            codec,
            feature_encoder,
            bpf,
            pending_eoo_bits,
            input_resampler: Resampler::new(device_rate, FS_SPEECH),
            output_resampler: Resampler::new(FS_MODEM, device_rate),
            spectrum_probe: SpectrumProbe::new(),
            spectrum,
            telemetry,
            running,
            device_rate,
            acc_16k: Vec::new(),
            features: vec![0.0; FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES],
            feat_count: 0,
        }
    }

    /// Run the outer loop until `running` is cleared, then flush an EOO
    /// frame and drain the output stream before returning (spec §4.6,
    /// termination).
    pub fn run(&mut self) -> Result<()> {
        self.pre_roll()?;

        let mut read_buf = vec![0.0f32; TX_READ_FRAMES];
        while self.running.load(Ordering::Relaxed) {
            self.install_pending_callsign();

            match self.transport.read(&mut read_buf) {
                Ok(ReadStatus::Ok) => {}
                Ok(ReadStatus::Overflow) => warn!("TX capture overflow, re-syncing"),
                Err(AudioError::Closed) => break,
                Err(e) => {
                    warn!("TX capture read failed: {e}, stopping");
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }
            }

            let mic_gain = self.telemetry.mic_gain();
            let scaled: Vec<f32> = read_buf.iter().map(|&s| s * mic_gain).collect();
            let mut resampled = Vec::new();
            self.input_resampler.process(&scaled, &mut resampled);
            self.acc_16k.extend(resampled);

            self.drain_speech_frames()?;
        }

        self.install_pending_callsign();
        self.flush_eoo()
    }

    /// Install a freshly-set callsign's EOO bits if the controller queued
    /// one since the last check.
    fn install_pending_callsign(&mut self) {
        if let Some(bits) = self.pending_eoo_bits.lock().unwrap().take() {
            self.codec.set_eoo_bits(&bits);
        }
    }

    fn pre_roll(&mut self) -> Result<()> {
        let silence_at_8k = 2 * MODEM_FRAME_SAMPLES;
        let n_device = silence_at_8k * self.device_rate as usize / FS_MODEM as usize;
        self.transport.write(&vec![0.0f32; n_device])?;
        Ok(())
    }

    /// Step 2: consume complete 160-sample @16kHz frames out of `acc_16k`,
    /// extract features, and flush a modem frame every 12 feature frames.
    fn drain_speech_frames(&mut self) -> Result<()> {
        while self.acc_16k.len() >= SPEECH_FRAME {
            let frame: Vec<f32> = self.acc_16k.drain(..SPEECH_FRAME).collect();

            self.telemetry.set_input_level(rms(&frame));

            let mut feat = [0.0f32; NB_TOTAL_FEATURES];
            self.feature_encoder.encode(&frame, &mut feat);

            let base = self.feat_count * NB_TOTAL_FEATURES;
            self.features[base..base + NB_TOTAL_FEATURES].copy_from_slice(&feat);
            self.feat_count += 1;

            if self.feat_count == FEATURES_PER_MODEM_FRAME {
                self.emit_modem_frame()?;
                self.feat_count = 0;
            }
        }
        Ok(())
    }

    fn emit_modem_frame(&mut self) -> Result<()> {
        let mut iq = vec![Complex32::new(0.0, 0.0); MODEM_FRAME_SAMPLES];
        self.codec.tx_frame(&self.features, &mut iq);
        self.emit_iq(&mut iq)
    }

    /// Shared BPF → spectrum → resample → scale → clip → write tail used by
    /// both modem frames and the EOO flush.
    fn emit_iq(&mut self, iq: &mut [Complex32]) -> Result<()> {
        if self.telemetry.bpf_enabled() {
            if let Some(bpf) = self.bpf.as_mut() {
                bpf.process(iq);
            }
        }

        let real: Vec<f32> = iq.iter().map(|c| c.re).collect();
        if real.len() >= crate::constants::FFT_SIZE {
            let bins = self.spectrum_probe.compute(&real);
            self.spectrum.publish(bins);
        }
        self.telemetry.set_output_level(rms(&real));

        let mut device_samples = Vec::new();
        self.output_resampler.process(&real, &mut device_samples);

        let tx_scale = self.telemetry.tx_scale();
        let out_s16: Vec<i16> = device_samples
            .iter()
            .map(|&s| scaled_f32_to_s16(s * tx_scale))
            .collect();
        let out_f32: Vec<f32> = out_s16.iter().map(|&s| s as f32 / 32768.0).collect();
        self.transport.write(&out_f32)?;
        Ok(())
    }

    fn flush_eoo(&mut self) -> Result<()> {
        let mut eoo = vec![Complex32::new(0.0, 0.0); EOO_SAMPLES];
        self.codec.tx_eoo(&mut eoo);
        self.emit_iq(&mut eoo)?;
        self.transport.drain()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryTransport;
    use crate::codec::test_stub::{StubBandPassFilter, StubFeatureEncoder, StubTxCodec};

    #[test]
    fn sine_wave_produces_modem_frames_and_flushes_eoo_on_stop() {
        let running = Arc::new(AtomicBool::new(true));
        let n = FS_SPEECH as usize * 2; // 2 seconds of mic input
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / FS_SPEECH as f32).sin())
            .collect();

        let mut mem = MemoryTransport::new(input);
        mem.open("mem", FS_SPEECH, 512).unwrap();
        mem.start().unwrap();
        let transport: Arc<dyn AudioTransport> = Arc::new(mem);
        let codec: Box<dyn TxCodec> = Box::new(StubTxCodec::default());
        let encoder: Box<dyn FeatureEncoder> = Box::new(StubFeatureEncoder);
        let bpf: Box<dyn BandPassFilter> = Box::new(StubBandPassFilter);
        let telemetry = Arc::new(Telemetry::new());
        telemetry.set_tx_scale(1.0);
        let spectrum = Arc::new(SpectrumPublisher::new());

        let mut pipeline = TxPipeline::new(
            transport,
            codec,
            encoder,
            Some(bpf),
            Arc::new(Mutex::new(None)),
            FS_SPEECH,
            telemetry.clone(),
            spectrum,
            running.clone(),
        );

        let handle = std::thread::spawn(move || pipeline.run());
        std::thread::sleep(std::time::Duration::from_millis(50));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn pending_callsign_is_installed_then_cleared() {
        let running = Arc::new(AtomicBool::new(true));
        let mut mem = MemoryTransport::new(vec![0.0f32; FS_SPEECH as usize]);
        mem.open("mem", FS_SPEECH, 512).unwrap();
        mem.start().unwrap();
        let transport: Arc<dyn AudioTransport> = Arc::new(mem);
        let codec: Box<dyn TxCodec> = Box::new(StubTxCodec::default());
        let encoder: Box<dyn FeatureEncoder> = Box::new(StubFeatureEncoder);
        let telemetry = Arc::new(Telemetry::new());
        telemetry.set_tx_scale(1.0);
        let spectrum = Arc::new(SpectrumPublisher::new());
        let pending: CallsignSlot = Arc::new(Mutex::new(Some(vec![1.0; 224])));

        let mut pipeline = TxPipeline::new(
            transport,
            codec,
            encoder,
            None,
            pending.clone(),
            FS_SPEECH,
            telemetry,
            spectrum,
            running,
        );

        pipeline.install_pending_callsign();
        assert!(pending.lock().unwrap().is_none());
    }
}
