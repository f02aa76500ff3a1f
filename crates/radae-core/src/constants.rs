//! Bit-exact constants shared by the RX and TX pipelines (spec §3).

/// Modem (OFDM baseband) sample rate in Hz.
pub const FS_MODEM: u32 = 8_000;
/// Vocoder speech sample rate in Hz.
pub const FS_SPEECH: u32 = 16_000;

/// Hilbert FIR tap count.
pub const HILBERT_NTAPS: usize = 127;
/// Hilbert FIR group delay in samples (matched by the real-branch delay line).
pub const HILBERT_DELAY: usize = 63;

/// Spectrum probe FFT size.
pub const FFT_SIZE: usize = 512;
/// Published spectrum magnitude bins (lower half of the FFT).
pub const SPECTRUM_BINS: usize = 256;
/// Spectrum display floor in dB.
pub const DB_FLOOR: f32 = -80.0;
/// Spectrum display ceiling in dB.
pub const DB_CEIL: f32 = 0.0;

/// Speech frame length: 10 ms at 16 kHz.
pub const SPEECH_FRAME: usize = 160;

/// LPCNet feature frames packed into one modem frame.
pub const FEATURES_PER_MODEM_FRAME: usize = 12;
/// Total LPCNet feature floats per frame (acoustic + pitch/voicing side info).
pub const NB_TOTAL_FEATURES: usize = 36;
/// Acoustic feature subset used by FARGAN's continuation primer (open question,
/// see DESIGN.md): smaller than `NB_TOTAL_FEATURES` because the continuation
/// primer doesn't need pitch/voicing side information.
pub const NB_FEATURES: usize = 20;
/// `rade_n_features_in_out`: `FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES`.
pub const FEATURES_SIZE: usize = FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES;

/// One modem frame: 120 ms at 8 kHz.
pub const MODEM_FRAME_SAMPLES: usize = 960;

/// FARGAN warm-up frames required before first synthesis after a sync-rising-edge.
pub const FARGAN_WARMUP_FRAMES: usize = 5;
/// Zero-sample continuation context length for `fargan_cont` (open question,
/// see DESIGN.md): two 160-sample frames.
pub const FARGAN_CONT_SAMPLES: usize = 2 * SPEECH_FRAME;

/// Capture read granularity for the RX pipeline (keeps spectrum updates lively).
pub const RX_READ_FRAMES: usize = 512;
/// Capture read granularity for the TX pipeline (one LPCNet frame).
pub const TX_READ_FRAMES: usize = SPEECH_FRAME;

/// Default TX output scale applied before clipping.
pub const DEFAULT_TX_SCALE: f32 = 16_384.0;
/// Default microphone gain multiplier.
pub const DEFAULT_MIC_GAIN: f32 = 1.0;

/// TX band-pass filter passband, in Hz.
pub const BPF_PASSBAND_LOW: f32 = 700.0;
pub const BPF_PASSBAND_HIGH: f32 = 2300.0;
/// TX band-pass filter centre frequency, in Hz.
pub const BPF_CENTRE_HZ: f32 = 1_600.0;
/// TX band-pass filter bandwidth, in Hz.
pub const BPF_BANDWIDTH_HZ: f32 = 1_500.0;
/// TX band-pass filter tap count.
pub const RADE_BPF_NTAP: usize = 101;

/// EOO frame length in complex I/Q samples.
pub const EOO_SAMPLES: usize = 1_152;

/// S16 saturation bound.
pub const S16_MAX: f32 = 32_767.0;
pub const S16_MIN: f32 = -32_768.0;
