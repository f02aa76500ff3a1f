//! Controller state machine (spec §4.9): `Idle -> Opened -> Running -> Opened
//! -> Closed`, one instance per pipeline direction. Owns the audio transport,
//! the external codec/vocoder handles, and the worker thread; the caller
//! (e.g. a CLI's main loop) is expected to poll `telemetry()`/`spectrum()` at
//! a fixed cadence (~30 Hz per spec §5) and push control values through the
//! setters here.
//!
//! `open`/`start`/`stop`/`close` build on [`RxPipeline`]/[`TxPipeline`]
//! exactly as the concurrency model in spec §5 describes: the worker thread
//! owns the pipeline outright while running, `stop` gets it back by joining,
//! and codec/vocoder handles are only ever touched by the worker or by this
//! controller while the worker is known to be joined.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::audio::{AudioTransport, CpalTransport, DuplexTransport, WavFileTransport};
use crate::callsign::{CallsignDecoder, CallsignEncoder, RadeCallsignCodec};
use crate::codec::{Fargan, LpcnetEncoder, RadeBpf, RadeRx, RadeTx, RxCodec, TxCodec, Vocoder};
use crate::constants::{RX_READ_FRAMES, TX_READ_FRAMES};
use crate::dsp::SpectrumPublisher;
use crate::error::{RadaeError, Result};
use crate::pipeline::{CallsignSlot, RecorderSlot, RxPipeline, TxPipeline};
use crate::telemetry::Telemetry;
use crate::wav::WavRecorder;

/// Model weight files the external codec/vocoder load at `open`.
#[derive(Clone, Debug)]
pub struct ModelPaths {
    pub rade_rx: PathBuf,
    pub rade_tx: PathBuf,
    pub fargan: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Opened,
    Running,
    Closed,
}

/// Parameters for [`RxController::open`].
pub struct RxOpenParams {
    pub input_device: String,
    pub output_device: String,
    pub device_rate: u32,
    pub models: ModelPaths,
    /// When set, replay this WAV file as RX input instead of a live capture
    /// device (spec §4.7).
    pub input_file: Option<PathBuf>,
}

/// Receive-side controller: owns the capture/playback transport, the
/// `rade_rx`/FARGAN/callsign-decoder handles, and the RX worker thread.
pub struct RxController {
    state: State,
    transport: Option<Arc<dyn AudioTransport>>,
    pipeline: Option<RxPipeline>,
    telemetry: Arc<Telemetry>,
    spectrum: Arc<SpectrumPublisher>,
    recorder: RecorderSlot,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<(RxPipeline, Result<()>)>>,
}

impl Default for RxController {
    fn default() -> Self {
        Self::new()
    }
}

impl RxController {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            transport: None,
            pipeline: None,
            telemetry: Arc::new(Telemetry::new()),
            spectrum: Arc::new(SpectrumPublisher::new()),
            recorder: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Shared telemetry handle; safe to poll from another thread at any time,
    /// including before `open` (fields just read their zero defaults) and
    /// after `close` (frozen at whatever the last worker iteration wrote).
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    pub fn spectrum(&self) -> Arc<SpectrumPublisher> {
        self.spectrum.clone()
    }

    /// `Idle`/`Opened -> Opened`: build the audio transport, `rade_rx`,
    /// FARGAN and the callsign decoder against the real external
    /// collaborator, resetting all per-open pipeline state.
    pub fn open(&mut self, params: RxOpenParams) -> Result<()> {
        let transport: Arc<dyn AudioTransport> = if let Some(path) = params.input_file {
            let mut t = WavFileTransport::new(path);
            t.open(&params.output_device, params.device_rate, RX_READ_FRAMES)?;
            Arc::new(t)
        } else {
            let mut t = DuplexTransport::new(
                Box::new(CpalTransport::new_input()),
                Box::new(CpalTransport::new_output()),
            );
            t.open_separate(
                &params.input_device,
                &params.output_device,
                params.device_rate,
                RX_READ_FRAMES,
            )?;
            Arc::new(t)
        };
        let codec: Box<dyn RxCodec> = Box::new(RadeRx::open(&params.models.rade_rx)?);
        let vocoder: Box<dyn Vocoder> = Box::new(Fargan::open(&params.models.fargan)?);
        let callsign_decoder: Box<dyn CallsignDecoder> = Box::new(RadeCallsignCodec::open()?);

        self.open_with(
            transport,
            codec,
            vocoder,
            Some(callsign_decoder),
            params.device_rate,
        )
    }

    /// Lower-level entry point taking already-constructed transport/codec
    /// handles; `open` uses this against the real FFI collaborator, tests
    /// use it directly with [`crate::codec::test_stub`] doubles since the
    /// real `librade`/`libfargan` shared objects aren't linkable there.
    pub fn open_with(
        &mut self,
        transport: Arc<dyn AudioTransport>,
        codec: Box<dyn RxCodec>,
        vocoder: Box<dyn Vocoder>,
        callsign_decoder: Option<Box<dyn CallsignDecoder>>,
        device_rate: u32,
    ) -> Result<()> {
        if self.state == State::Running {
            return Err(RadaeError::other("RX controller is already running"));
        }
        self.pipeline = Some(RxPipeline::new(
            transport.clone(),
            codec,
            vocoder,
            callsign_decoder,
            device_rate,
            self.telemetry.clone(),
            self.spectrum.clone(),
            self.recorder.clone(),
            self.running.clone(),
        ));
        self.transport = Some(transport);
        self.state = State::Opened;
        Ok(())
    }

    /// `Opened -> Running`: set `running = true` and spawn the worker.
    pub fn start(&mut self) -> Result<()> {
        if self.state != State::Opened {
            return Err(RadaeError::other(
                "RX controller must be opened before start",
            ));
        }
        let mut pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| RadaeError::other("RX pipeline missing at start"))?;
        self.running.store(true, Ordering::Relaxed);
        self.telemetry.set_running(true);
        self.worker = Some(std::thread::spawn(move || {
            let result = pipeline.run();
            (pipeline, result)
        }));
        self.state = State::Running;
        Ok(())
    }

    /// `Running -> Opened`: clear `running`, abort the blocked transport to
    /// unblock a pending read/write, join the worker, and zero the level
    /// meters (spec §4.9). A no-op if not currently running.
    pub fn stop(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Ok(());
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(t) = &self.transport {
            t.abort();
        }
        if let Some(handle) = self.worker.take() {
            let (pipeline, result) = handle
                .join()
                .map_err(|_| RadaeError::other("RX worker thread panicked"))?;
            self.pipeline = Some(pipeline);
            result?;
        }
        self.telemetry.set_running(false);
        self.telemetry.set_input_level(0.0);
        self.telemetry.set_output_level(0.0);
        self.state = State::Opened;
        Ok(())
    }

    /// `Opened -> Closed`: stop if needed, then destroy the codec/vocoder
    /// handles and release the device. No telemetry field is updated after
    /// this returns.
    pub fn close(&mut self) -> Result<()> {
        self.stop()?;
        self.pipeline = None;
        if let Some(mut transport) = self.transport.take() {
            if let Some(t) = Arc::get_mut(&mut transport) {
                t.close()?;
            }
        }
        self.state = State::Closed;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Attach a recorder; the worker picks it up under the mutex on its next
    /// write (spec §4.8).
    pub fn attach_recorder(&self, recorder: Arc<WavRecorder>) {
        *self.recorder.lock().unwrap() = Some(recorder);
    }

    /// Detach and return the recorder, if any. Callers **must** do this
    /// before the worker is joined (`stop`/`close`) if they want the EOO
    /// flush / final frames still recorded, per spec §4.8's attach/detach
    /// discipline, then close the returned handle themselves once it's safe.
    pub fn detach_recorder(&self) -> Option<Arc<WavRecorder>> {
        self.recorder.lock().unwrap().take()
    }
}

/// Parameters for [`TxController::open`].
pub struct TxOpenParams {
    pub input_device: String,
    pub output_device: String,
    pub device_rate: u32,
    pub models: ModelPaths,
}

/// Transmit-side controller: owns the microphone/radio transport, the
/// `rade_tx`/LPCNet/BPF/callsign-encoder handles, and the TX worker thread.
pub struct TxController {
    state: State,
    transport: Option<Arc<dyn AudioTransport>>,
    pipeline: Option<TxPipeline>,
    telemetry: Arc<Telemetry>,
    spectrum: Arc<SpectrumPublisher>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<(TxPipeline, Result<()>)>>,
    callsign_encoder: Option<Box<dyn CallsignEncoder>>,
    pending_eoo_bits: CallsignSlot,
    n_eoo_bits: Option<usize>,
    pending_callsign: Option<String>,
}

impl Default for TxController {
    fn default() -> Self {
        Self::new()
    }
}

impl TxController {
    pub fn new() -> Self {
        let telemetry = Arc::new(Telemetry::new());
        telemetry.set_mic_gain(crate::constants::DEFAULT_MIC_GAIN);
        telemetry.set_tx_scale(crate::constants::DEFAULT_TX_SCALE);
        Self {
            state: State::Idle,
            transport: None,
            pipeline: None,
            telemetry,
            spectrum: Arc::new(SpectrumPublisher::new()),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            callsign_encoder: None,
            pending_eoo_bits: Arc::new(Mutex::new(None)),
            n_eoo_bits: None,
            pending_callsign: None,
        }
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    pub fn spectrum(&self) -> Arc<SpectrumPublisher> {
        self.spectrum.clone()
    }

    /// `Idle`/`Opened -> Opened`: build the audio transport, `rade_tx`,
    /// LPCNet, the BPF (always constructed; `bpf_enabled` just gates whether
    /// the pipeline applies it per frame) and the callsign encoder.
    pub fn open(&mut self, params: TxOpenParams) -> Result<()> {
        let mut t = DuplexTransport::new(
            Box::new(CpalTransport::new_input()),
            Box::new(CpalTransport::new_output()),
        );
        t.open_separate(
            &params.input_device,
            &params.output_device,
            params.device_rate,
            TX_READ_FRAMES,
        )?;
        let transport: Arc<dyn AudioTransport> = Arc::new(t);

        let codec: Box<dyn TxCodec> = Box::new(RadeTx::open(&params.models.rade_tx)?);
        let feature_encoder: Box<dyn crate::codec::FeatureEncoder> =
            Box::new(LpcnetEncoder::new()?);
        let bpf: Box<dyn crate::codec::BandPassFilter> = Box::new(RadeBpf::new(
            crate::constants::RADE_BPF_NTAP,
            crate::constants::FS_MODEM as f32,
            crate::constants::BPF_CENTRE_HZ,
            crate::constants::BPF_BANDWIDTH_HZ,
            crate::constants::MODEM_FRAME_SAMPLES,
        )?);
        let callsign_encoder: Box<dyn CallsignEncoder> = Box::new(RadeCallsignCodec::open()?);

        self.open_with(
            transport,
            codec,
            feature_encoder,
            Some(bpf),
            Some(callsign_encoder),
            params.device_rate,
        )
    }

    /// Lower-level entry point taking already-constructed handles; `open`
    /// uses this against the real FFI collaborator, tests use it directly
    /// with [`crate::codec::test_stub`] doubles.
    #[allow(clippy::too_many_arguments)]
    pub fn open_with(
        &mut self,
        transport: Arc<dyn AudioTransport>,
        codec: Box<dyn TxCodec>,
        feature_encoder: Box<dyn crate::codec::FeatureEncoder>,
        bpf: Option<Box<dyn crate::codec::BandPassFilter>>,
        callsign_encoder: Option<Box<dyn CallsignEncoder>>,
        device_rate: u32,
    ) -> Result<()> {
        if self.state == State::Running {
            return Err(RadaeError::other("TX controller is already running"));
        }
        self.n_eoo_bits = Some(codec.n_eoo_bits());
        if callsign_encoder.is_some() {
            self.callsign_encoder = callsign_encoder;
        }
        if let Some(cs) = self.pending_callsign.take() {
            self.set_callsign(&cs);
        }

        self.pipeline = Some(TxPipeline::new(
            transport.clone(),
            codec,
            feature_encoder,
            bpf,
            self.pending_eoo_bits.clone(),
            device_rate,
            self.telemetry.clone(),
            self.spectrum.clone(),
            self.running.clone(),
        ));
        self.transport = Some(transport);
        self.state = State::Opened;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state != State::Opened {
            return Err(RadaeError::other(
                "TX controller must be opened before start",
            ));
        }
        let mut pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| RadaeError::other("TX pipeline missing at start"))?;
        self.running.store(true, Ordering::Relaxed);
        self.telemetry.set_running(true);
        self.worker = Some(std::thread::spawn(move || {
            let result = pipeline.run();
            (pipeline, result)
        }));
        self.state = State::Running;
        Ok(())
    }

    /// Clears `running`, aborts the capture stream, and joins. The EOO flush
    /// runs inside the worker after its loop exits but before the thread
    /// returns (spec §5 "Cancellation"), so it's already on disk/device by
    /// the time `join` returns here.
    pub fn stop(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Ok(());
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(t) = &self.transport {
            t.abort();
        }
        if let Some(handle) = self.worker.take() {
            let (pipeline, result) = handle
                .join()
                .map_err(|_| RadaeError::other("TX worker thread panicked"))?;
            self.pipeline = Some(pipeline);
            result?;
        }
        self.telemetry.set_running(false);
        self.telemetry.set_input_level(0.0);
        self.telemetry.set_output_level(0.0);
        self.state = State::Opened;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.stop()?;
        self.pipeline = None;
        if let Some(mut transport) = self.transport.take() {
            if let Some(t) = Arc::get_mut(&mut transport) {
                t.close()?;
            }
        }
        self.state = State::Closed;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn set_mic_gain(&self, v: f32) {
        self.telemetry.set_mic_gain(v);
    }

    pub fn set_tx_scale(&self, v: f32) {
        self.telemetry.set_tx_scale(v);
    }

    pub fn set_bpf_enabled(&self, v: bool) {
        self.telemetry.set_bpf_enabled(v);
    }

    /// Encode and install a new callsign's EOO bits (spec §4.10). If the
    /// pipeline isn't open yet (`n_eoo_bits` unknown), the callsign is
    /// cached and encoded the next time `open`/`open_with` runs.
    pub fn set_callsign(&mut self, callsign: &str) {
        match (self.callsign_encoder.as_mut(), self.n_eoo_bits) {
            (Some(encoder), Some(n)) => {
                let bits = encoder.encode(callsign, n);
                *self.pending_eoo_bits.lock().unwrap() = Some(bits);
            }
            _ => {
                self.pending_callsign = Some(callsign.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryTransport;
    use crate::callsign::test_stub::StubCallsignCodec;
    use crate::codec::test_stub::{
        StubBandPassFilter, StubFeatureEncoder, StubRxCodec, StubTxCodec, StubVocoder,
    };
    use crate::constants::{FS_MODEM, FS_SPEECH, MODEM_FRAME_SAMPLES};

    fn rx_transport(samples: usize) -> Arc<dyn AudioTransport> {
        let mut mem = MemoryTransport::new(vec![0.0f32; samples]);
        mem.open("mem", FS_MODEM, 512).unwrap();
        mem.start().unwrap();
        Arc::new(mem)
    }

    #[test]
    fn rx_state_machine_runs_the_full_cycle() {
        let mut ctl = RxController::new();
        assert!(!ctl.is_running());

        ctl.open_with(
            rx_transport(MODEM_FRAME_SAMPLES * 8),
            Box::new(StubRxCodec::new(2)),
            Box::new(StubVocoder::default()),
            Some(Box::new(StubCallsignCodec::default())),
            FS_MODEM,
        )
        .unwrap();

        ctl.start().unwrap();
        assert!(ctl.is_running());
        assert!(ctl.telemetry().running());

        std::thread::sleep(std::time::Duration::from_millis(20));
        ctl.stop().unwrap();
        assert!(!ctl.is_running());
        assert!(!ctl.telemetry().running());

        // A stopped-but-opened controller can be started again.
        ctl.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        ctl.stop().unwrap();

        ctl.close().unwrap();
    }

    #[test]
    fn start_without_open_is_rejected() {
        let mut ctl = RxController::new();
        assert!(ctl.start().is_err());
    }

    #[test]
    fn stop_when_not_running_is_a_noop() {
        let mut ctl = RxController::new();
        ctl.stop().unwrap();
    }

    #[test]
    fn tx_controller_installs_callsign_set_before_open() {
        let mut ctl = TxController::new();
        ctl.set_callsign("VK2ABC");

        let mut mem = MemoryTransport::new(vec![0.0f32; FS_SPEECH as usize]);
        mem.open("mem", FS_SPEECH, 512).unwrap();
        mem.start().unwrap();

        ctl.open_with(
            Arc::new(mem),
            Box::new(StubTxCodec::default()),
            Box::new(StubFeatureEncoder),
            Some(Box::new(StubBandPassFilter)),
            Some(Box::new(StubCallsignCodec::default())),
            FS_SPEECH,
        )
        .unwrap();

        assert!(ctl.pending_eoo_bits.lock().unwrap().is_some());
    }

    #[test]
    fn tx_state_machine_runs_and_flushes_eoo() {
        let mut ctl = TxController::new();
        let mut mem = MemoryTransport::new(vec![0.1f32; FS_SPEECH as usize]);
        mem.open("mem", FS_SPEECH, 512).unwrap();
        mem.start().unwrap();

        ctl.open_with(
            Arc::new(mem),
            Box::new(StubTxCodec::default()),
            Box::new(StubFeatureEncoder),
            Some(Box::new(StubBandPassFilter)),
            None,
            FS_SPEECH,
        )
        .unwrap();

        ctl.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));
        ctl.stop().unwrap();
        ctl.close().unwrap();
    }
}
