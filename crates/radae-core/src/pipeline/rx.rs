//! RX decoder pipeline (spec §4.5): device/file samples at an arbitrary
//! rate in, demodulated and vocoded 16 kHz speech out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{AudioError, AudioTransport, ReadStatus};
use crate::callsign::CallsignDecoder;
use crate::codec::{new_feature_buffer, RxCodec, Vocoder};
use crate::constants::{
    FARGAN_WARMUP_FRAMES, FFT_SIZE, FS_MODEM, FS_SPEECH, MODEM_FRAME_SAMPLES, NB_FEATURES,
    NB_TOTAL_FEATURES, RX_READ_FRAMES, SPEECH_FRAME,
};
use crate::dsp::{Hilbert, SpectrumProbe, SpectrumPublisher};
use crate::error::Result;
use crate::resample::Resampler;
use crate::pipeline::{f32_to_s16, rms};
use crate::telemetry::Telemetry;
use crate::wav::WavRecorder;
use crate::{verbose, warn};

/// Controller-owned slot the pipeline borrows a recorder handle from; the
/// controller nulls it and takes the lock before destroying the recorder
/// (spec §4.8's attach/detach discipline).
pub type RecorderSlot = Arc<Mutex<Option<Arc<WavRecorder>>>>;

/// FARGAN warm-up/continuation state (spec §3's `FarganWarmup` entity).
struct FarganWarmup {
    ready: bool,
    count: usize,
    warmup_buf: Vec<f32>,
    output_primed: bool,
}

impl FarganWarmup {
    fn new() -> Self {
        Self {
            ready: false,
            count: 0,
            warmup_buf: vec![0.0; FARGAN_WARMUP_FRAMES * NB_TOTAL_FEATURES],
            output_primed: false,
        }
    }

    fn reset(&mut self) {
        self.ready = false;
        self.count = 0;
        self.output_primed = false;
    }
}

pub struct RxPipeline {
    transport: Arc<dyn AudioTransport>,
    codec: Box<dyn RxCodec>,
    vocoder: Box<dyn Vocoder>,
    callsign_decoder: Option<Box<dyn CallsignDecoder>>,
    hilbert: Hilbert,
    input_resampler: Resampler,
    output_resampler: Resampler,
    spectrum_probe: SpectrumProbe,
    spectrum: Arc<SpectrumPublisher>,
    telemetry: Arc<Telemetry>,
    recorder: RecorderSlot,
    running: Arc<AtomicBool>,
    device_rate: u32,
    acc_8k: Vec<f32>,
    warmup: FarganWarmup,
    was_synced: bool,
}

impl RxPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: Arc<dyn AudioTransport>,
        codec: Box<dyn RxCodec>,
        vocoder: Box<dyn Vocoder>,
        callsign_decoder: Option<Box<dyn CallsignDecoder>>,
        device_rate: u32,
        telemetry: Arc<Telemetry>,
        spectrum: Arc<SpectrumPublisher>,
        recorder: RecorderSlot,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            codec,
            vocoder,
            callsign_decoder,
            hilbert: Hilbert::new(),
            input_resampler: Resampler::new(device_rate, FS_MODEM),
            output_resampler: Resampler::new(FS_SPEECH, device_rate),
            spectrum_probe: SpectrumProbe::new(),
            spectrum,
            telemetry,
            recorder,
            running,
            device_rate,
            acc_8k: Vec::new(),
            warmup: FarganWarmup::new(),
            was_synced: false,
        }
    }

    /// Run the outer loop until `running` is cleared externally (or, in
    /// file-playback mode, until the transport reports the stream closed —
    /// `WavSource`-backed transports return `AudioError::Closed` once
    /// exhausted).
    pub fn run(&mut self) -> Result<()> {
        let mut read_buf = vec![0.0f32; RX_READ_FRAMES];

        while self.running.load(Ordering::Relaxed) {
            let nin = self.codec.nin();

            if !self.fill_accumulator(nin, &mut read_buf)? {
                break;
            }
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            if self.acc_8k.len() >= FFT_SIZE {
                let bins = self.spectrum_probe.compute(&self.acc_8k);
                self.spectrum.publish(bins);
            }

            let probe_len = nin.min(self.acc_8k.len());
            self.telemetry
                .set_input_level(rms(&self.acc_8k[..probe_len]));

            let frame: Vec<f32> = self.acc_8k.drain(..nin).collect();
            let mut iq = Vec::with_capacity(nin);
            self.hilbert.process(&frame, &mut iq);

            let mut features = new_feature_buffer();
            let (n_out, status) = self.codec.rx_frame(&iq, &mut features);

            self.telemetry.set_synced(status.synced);
            self.telemetry.set_snr_db(status.snr_db);
            self.telemetry.set_freq_offset_hz(status.freq_offset_hz);

            if self.was_synced && !status.synced {
                verbose!("RX sync lost, resetting FARGAN and warm-up");
                self.vocoder.reset();
                self.warmup.reset();
                self.codec.reset_sync();
            }
            self.was_synced = status.synced;

            if n_out > 0 {
                self.synthesize_frames(&features[..n_out])?;
            } else {
                self.telemetry.decay_output_level();
            }

            if status.eoo_detected {
                if let Some(decoder) = self.callsign_decoder.as_mut() {
                    if let Some(callsign) = decoder.decode(&status.eoo_bits) {
                        self.telemetry.set_last_callsign(callsign);
                    }
                }
            }
        }
        Ok(())
    }

    /// Step 2: read capture frames (resampling to `FS_MODEM`) until
    /// `acc_8k` holds at least `nin` samples. Returns `false` if the
    /// transport closed (file exhausted / controller stopped mid-read).
    fn fill_accumulator(&mut self, nin: usize, read_buf: &mut [f32]) -> Result<bool> {
        while self.acc_8k.len() < nin && self.running.load(Ordering::Relaxed) {
            match self.transport.read(read_buf) {
                Ok(ReadStatus::Ok) => {}
                Ok(ReadStatus::Overflow) => warn!("RX capture overflow, re-syncing"),
                Err(AudioError::Closed) => return Ok(false),
                Err(e) => {
                    warn!("RX capture read failed: {e}, continuing");
                    continue;
                }
            }
            let mut resampled = Vec::new();
            self.input_resampler.process(read_buf, &mut resampled);
            self.acc_8k.extend(resampled);
        }
        Ok(true)
    }

    /// Steps 9-10: iterate `n_out / NB_TOTAL_FEATURES` feature frames,
    /// warming FARGAN up for the first `FARGAN_WARMUP_FRAMES` after each
    /// sync-rising-edge, then synthesizing steady-state speech.
    fn synthesize_frames(&mut self, features: &[f32]) -> Result<()> {
        for frame in features.chunks(NB_TOTAL_FEATURES) {
            if !self.warmup.ready {
                let slot = self.warmup.count;
                self.warmup.warmup_buf[slot * NB_TOTAL_FEATURES..(slot + 1) * NB_TOTAL_FEATURES]
                    .copy_from_slice(frame);
                self.vocoder.warmup(frame);
                self.warmup.count += 1;

                if self.warmup.count == FARGAN_WARMUP_FRAMES {
                    let packed: Vec<f32> = (0..FARGAN_WARMUP_FRAMES)
                        .flat_map(|i| {
                            let base = i * NB_TOTAL_FEATURES;
                            self.warmup.warmup_buf[base..base + NB_FEATURES].to_vec()
                        })
                        .collect();
                    self.vocoder.continuation(&packed);
                    self.warmup.ready = true;

                    if !self.warmup.output_primed {
                        self.prime_output()?;
                        self.warmup.output_primed = true;
                    }
                }
                continue;
            }

            let mut pcm = vec![0.0f32; SPEECH_FRAME];
            self.vocoder.synthesize(frame, &mut pcm);

            self.telemetry
                .set_output_level(rms(&pcm));

            let mut device_samples = Vec::new();
            self.output_resampler.process(&pcm, &mut device_samples);

            let s16: Vec<i16> = device_samples.iter().map(|&s| f32_to_s16(s)).collect();
            if let Some(recorder) = self.recorder.lock().unwrap().as_ref() {
                let _ = recorder.append(&s16);
            }

            let out_f32: Vec<f32> = s16.iter().map(|&s| s as f32 / 32768.0).collect();
            self.transport.write(&out_f32)?;
        }
        Ok(())
    }

    /// Pre-fill the output device with silence once, right after the first
    /// continuation-primed FARGAN frame, to absorb the codec's inherent
    /// ~240ms burst latency (spec §1 Non-goals; §4.5 step 9). The literal
    /// spec formula is dimensionally inconsistent; this resolves to the
    /// ~240ms (`2 * MODEM_FRAME_SAMPLES` at `FS_MODEM`) pre-roll named
    /// elsewhere in the spec, converted to the device rate.
    fn prime_output(&mut self) -> Result<()> {
        let silence_at_8k = 2 * MODEM_FRAME_SAMPLES;
        let n_device = silence_at_8k * self.device_rate as usize / FS_MODEM as usize;
        self.transport.write(&vec![0.0f32; n_device])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryTransport;
    use crate::callsign::test_stub::StubCallsignCodec;
    use crate::codec::test_stub::{StubRxCodec, StubVocoder};

    fn running_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn silence_produces_no_callsign_and_drains_cleanly() {
        let running = running_flag();
        let input = vec![0.0f32; MODEM_FRAME_SAMPLES * 8];
        let mut mem = MemoryTransport::new(input);
        mem.open("mem", FS_MODEM, 512).unwrap();
        mem.start().unwrap();
        let transport: Arc<dyn AudioTransport> = Arc::new(mem);
        let codec: Box<dyn RxCodec> = Box::new(StubRxCodec::new(1));
        let vocoder: Box<dyn Vocoder> = Box::new(StubVocoder::default());
        let telemetry = Arc::new(Telemetry::new());
        let spectrum = Arc::new(SpectrumPublisher::new());
        let recorder: RecorderSlot = Arc::new(Mutex::new(None));

        let mut pipeline = RxPipeline::new(
            transport,
            codec,
            vocoder,
            Some(Box::new(StubCallsignCodec::default())),
            FS_MODEM,
            telemetry.clone(),
            spectrum,
            recorder,
            running.clone(),
        );

        let handle = std::thread::spawn(move || pipeline.run());
        std::thread::sleep(std::time::Duration::from_millis(20));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        assert_eq!(telemetry.last_callsign(), None);
    }

    #[test]
    fn sync_rising_then_falling_edge_resets_warmup() {
        let running = running_flag();
        let input = vec![0.1f32; MODEM_FRAME_SAMPLES * 20];
        let mut mem = MemoryTransport::new(input);
        mem.open("mem", FS_MODEM, 512).unwrap();
        mem.start().unwrap();
        let transport: Arc<dyn AudioTransport> = Arc::new(mem);
        let codec: Box<dyn RxCodec> = Box::new(StubRxCodec::new(1));
        let vocoder: Box<dyn Vocoder> = Box::new(StubVocoder::default());
        let telemetry = Arc::new(Telemetry::new());
        let spectrum = Arc::new(SpectrumPublisher::new());
        let recorder: RecorderSlot = Arc::new(Mutex::new(None));

        let mut pipeline = RxPipeline::new(
            transport,
            codec,
            vocoder,
            None,
            FS_MODEM,
            telemetry.clone(),
            spectrum,
            recorder,
            running.clone(),
        );

        let handle = std::thread::spawn(move || pipeline.run());
        std::thread::sleep(std::time::Duration::from_millis(30));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();
    }
}
