//! Raw C-ABI declarations and safe owning wrappers for the RADAE/LPCNet/
//! FARGAN shared libraries (spec §6.2). None of the DSP here is
//! reimplemented in Rust: each wrapper owns one opaque pointer returned by
//! the library's `_open`/`_init`/`_create` function and releases it in
//! `Drop` via the matching `_close`/`_destroy` function, following the same
//! owning-handle shape the collaborator's C API expects.

use std::ffi::c_void;
use std::os::raw::{c_char, c_float, c_int};

use num_complex::Complex32;

use super::{BandPassFilter, CodecError, FeatureEncoder, RxCodec, RxStatus, TxCodec, Vocoder};
use crate::constants::{FEATURES_PER_MODEM_FRAME, MODEM_FRAME_SAMPLES, NB_TOTAL_FEATURES};

#[allow(non_camel_case_types)]
mod raw {
    use super::*;

    #[link(name = "rade")]
    extern "C" {
        pub fn rade_rx_open(model_path: *const c_char) -> *mut c_void;
        pub fn rade_rx_close(state: *mut c_void);
        pub fn rade_nin(state: *mut c_void) -> c_int;
        pub fn rade_n_eoo_bits(state: *mut c_void) -> c_int;
        /// Returns `n_features`; `eoo_flag_out` is set to 1 iff this frame
        /// carried an End-Of-Over marker, with `eoo_bits_out` then valid for
        /// `2 * (n_eoo_bits / 2)` floats.
        pub fn rade_rx(
            state: *mut c_void,
            features_out: *mut c_float,
            eoo_flag_out: *mut c_int,
            eoo_bits_out: *mut c_float,
            iq_in: *const c_float,
        ) -> c_int;
        pub fn rade_rx_sync_reset(state: *mut c_void);
        pub fn rade_sync(state: *mut c_void) -> c_int;
        pub fn rade_snrdb_3k_est(state: *mut c_void) -> c_float;
        pub fn rade_freq_offset(state: *mut c_void) -> c_float;

        pub fn rade_tx_open(model_path: *const c_char) -> *mut c_void;
        pub fn rade_tx_close(state: *mut c_void);
        pub fn rade_tx(state: *mut c_void, iq_out: *mut c_float, features_in: *const c_float);
        pub fn rade_tx_eoo(state: *mut c_void, iq_out: *mut c_float);
        pub fn rade_tx_set_eoo_bits(state: *mut c_void, bits: *const c_float);

        /// `bpf_out` receives the new handle; `ntap`/`fs` and the
        /// centre/bandwidth pair fully parameterize the filter (no model
        /// file, unlike the neural collaborators above).
        pub fn rade_bpf_init(
            bpf_out: *mut *mut c_void,
            ntap: c_int,
            fs: c_float,
            centre_hz: c_float,
            bandwidth_hz: c_float,
            n_iq: c_int,
        );
        pub fn rade_bpf_destroy(state: *mut c_void);
        pub fn rade_bpf_process(
            state: *mut c_void,
            in_iq: *const c_float,
            out_iq: *mut c_float,
            n_iq: c_int,
        );
    }

    #[link(name = "lpcnet")]
    extern "C" {
        pub fn lpcnet_encoder_create() -> *mut c_void;
        pub fn lpcnet_encoder_destroy(state: *mut c_void);
        pub fn lpcnet_compute_single_frame_features(
            state: *mut c_void,
            pcm: *const c_float,
            features_out: *mut c_float,
        );
    }

    #[link(name = "fargan")]
    extern "C" {
        pub fn fargan_init(model_path: *const c_char) -> *mut c_void;
        pub fn fargan_destroy(state: *mut c_void);
        pub fn fargan_cont(
            state: *mut c_void,
            zero_samples: *const c_float,
            packed_warmup_features: *const c_float,
        );
        pub fn fargan_synthesize(
            state: *mut c_void,
            pcm_out: *mut c_float,
            features_in: *const c_float,
        );
    }
}

fn open_or_err(ptr: *mut c_void, what: &str) -> Result<*mut c_void, CodecError> {
    if ptr.is_null() {
        Err(CodecError::InitFailed(what.to_string()))
    } else {
        Ok(ptr)
    }
}

/// Owning handle to `rade_rx_open`'s OFDM demodulator state.
pub struct RadeRx {
    state: *mut c_void,
    n_eoo_bits: usize,
}

unsafe impl Send for RadeRx {}

impl RadeRx {
    /// Open the RX demodulator, loading weights from `model_path`.
    pub fn open(model_path: &std::path::Path) -> Result<Self, CodecError> {
        let c_path = path_to_cstring(model_path)?;
        let state = unsafe { raw::rade_rx_open(c_path.as_ptr()) };
        let state = open_or_err(state, "rade_rx_open")?;
        let n_eoo_bits = unsafe { raw::rade_n_eoo_bits(state) } as usize;
        Ok(Self { state, n_eoo_bits })
    }
}

impl Drop for RadeRx {
    fn drop(&mut self) {
        unsafe { raw::rade_rx_close(self.state) }
    }
}

impl RxCodec for RadeRx {
    fn nin(&self) -> usize {
        unsafe { raw::rade_nin(self.state) as usize }
    }

    fn rx_frame(
        &mut self,
        iq: &[Complex32],
        features_out: &mut [f32],
    ) -> (usize, RxStatus) {
        debug_assert_eq!(iq.len(), self.nin());
        let mut eoo_flag: c_int = 0;
        let mut eoo_bits = vec![0.0f32; self.n_eoo_bits];
        let n_features = unsafe {
            raw::rade_rx(
                self.state,
                features_out.as_mut_ptr(),
                &mut eoo_flag,
                eoo_bits.as_mut_ptr(),
                iq.as_ptr() as *const c_float,
            )
        };
        let status = RxStatus {
            synced: unsafe { raw::rade_sync(self.state) } != 0,
            snr_db: unsafe { raw::rade_snrdb_3k_est(self.state) },
            freq_offset_hz: unsafe { raw::rade_freq_offset(self.state) },
            eoo_detected: eoo_flag != 0,
            eoo_bits: if eoo_flag != 0 { eoo_bits } else { Vec::new() },
        };
        (n_features.max(0) as usize, status)
    }

    fn reset_sync(&mut self) {
        unsafe { raw::rade_rx_sync_reset(self.state) }
    }
}

/// Owning handle to `rade_tx_open`'s OFDM modulator state.
pub struct RadeTx {
    state: *mut c_void,
    n_eoo_bits: usize,
}

unsafe impl Send for RadeTx {}

impl RadeTx {
    pub fn open(model_path: &std::path::Path) -> Result<Self, CodecError> {
        let c_path = path_to_cstring(model_path)?;
        let state = unsafe { raw::rade_tx_open(c_path.as_ptr()) };
        let state = open_or_err(state, "rade_tx_open")?;
        let n_eoo_bits = unsafe { raw::rade_n_eoo_bits(state) } as usize;
        Ok(Self { state, n_eoo_bits })
    }
}

impl Drop for RadeTx {
    fn drop(&mut self) {
        unsafe { raw::rade_tx_close(self.state) }
    }
}

impl TxCodec for RadeTx {
    fn tx_frame(&mut self, features: &[f32], iq_out: &mut [Complex32]) {
        debug_assert_eq!(
            features.len(),
            FEATURES_PER_MODEM_FRAME * NB_TOTAL_FEATURES
        );
        debug_assert_eq!(iq_out.len(), MODEM_FRAME_SAMPLES);
        unsafe {
            raw::rade_tx(
                self.state,
                iq_out.as_mut_ptr() as *mut c_float,
                features.as_ptr(),
            )
        }
    }

    fn tx_eoo(&mut self, iq_out: &mut [Complex32]) {
        unsafe { raw::rade_tx_eoo(self.state, iq_out.as_mut_ptr() as *mut c_float) }
    }

    fn set_eoo_bits(&mut self, bits: &[f32]) {
        unsafe { raw::rade_tx_set_eoo_bits(self.state, bits.as_ptr()) }
    }

    fn n_eoo_bits(&self) -> usize {
        self.n_eoo_bits
    }
}

/// Owning handle to an LPCNet analysis encoder.
pub struct LpcnetEncoder {
    state: *mut c_void,
}

unsafe impl Send for LpcnetEncoder {}

impl LpcnetEncoder {
    pub fn new() -> Result<Self, CodecError> {
        let state = unsafe { raw::lpcnet_encoder_create() };
        Ok(Self {
            state: open_or_err(state, "lpcnet_encoder_create")?,
        })
    }
}

impl Drop for LpcnetEncoder {
    fn drop(&mut self) {
        unsafe { raw::lpcnet_encoder_destroy(self.state) }
    }
}

impl FeatureEncoder for LpcnetEncoder {
    fn encode(&mut self, pcm: &[f32], features_out: &mut [f32; NB_TOTAL_FEATURES]) {
        unsafe {
            raw::lpcnet_compute_single_frame_features(
                self.state,
                pcm.as_ptr(),
                features_out.as_mut_ptr(),
            )
        }
    }
}

/// Owning handle to the FARGAN vocoder.
pub struct Fargan {
    state: *mut c_void,
    model_path: std::path::PathBuf,
}

unsafe impl Send for Fargan {}

impl Fargan {
    pub fn open(model_path: &std::path::Path) -> Result<Self, CodecError> {
        let c_path = path_to_cstring(model_path)?;
        let state = unsafe { raw::fargan_init(c_path.as_ptr()) };
        Ok(Self {
            state: open_or_err(state, "fargan_init")?,
            model_path: model_path.to_path_buf(),
        })
    }
}

impl Drop for Fargan {
    fn drop(&mut self) {
        unsafe { raw::fargan_destroy(self.state) }
    }
}

impl Vocoder for Fargan {
    fn warmup(&mut self, features: &[f32]) {
        // Warm-up frames run the same synthesis path but the caller
        // discards the produced PCM (spec §4.5 step 9).
        let mut scratch = vec![0.0f32; crate::constants::SPEECH_FRAME];
        self.synthesize(features, &mut scratch);
    }

    fn continuation(&mut self, packed_warmup_features: &[f32]) {
        let zeros = vec![0.0f32; crate::constants::FARGAN_CONT_SAMPLES];
        unsafe {
            raw::fargan_cont(
                self.state,
                zeros.as_ptr(),
                packed_warmup_features.as_ptr(),
            )
        }
    }

    fn synthesize(&mut self, features: &[f32], pcm_out: &mut [f32]) {
        debug_assert_eq!(pcm_out.len(), crate::constants::SPEECH_FRAME);
        unsafe { raw::fargan_synthesize(self.state, pcm_out.as_mut_ptr(), features.as_ptr()) }
    }

    fn reset(&mut self) {
        let c_path = path_to_cstring(&self.model_path).expect("model path already validated at open");
        unsafe {
            raw::fargan_destroy(self.state);
            self.state = raw::fargan_init(c_path.as_ptr());
        }
    }
}

/// Owning handle to the TX-side band-pass filter.
pub struct RadeBpf {
    state: *mut c_void,
}

unsafe impl Send for RadeBpf {}

impl RadeBpf {
    /// `ntap`/`fs`/`centre_hz`/`bandwidth_hz` fully parameterize the filter
    /// response; `n_iq` sizes the collaborator's internal scratch buffers
    /// for the largest block ever passed to `process` (a modem frame's
    /// worth of I/Q samples; the EOO flush reuses the same filter state at
    /// a larger block length, which `rade_bpf_process` handles per-call).
    pub fn new(
        ntap: usize,
        fs: f32,
        centre_hz: f32,
        bandwidth_hz: f32,
        n_iq: usize,
    ) -> Result<Self, CodecError> {
        let mut state: *mut c_void = std::ptr::null_mut();
        unsafe {
            raw::rade_bpf_init(
                &mut state,
                ntap as c_int,
                fs,
                centre_hz,
                bandwidth_hz,
                n_iq as c_int,
            );
        }
        Ok(Self {
            state: open_or_err(state, "rade_bpf_init")?,
        })
    }
}

impl Drop for RadeBpf {
    fn drop(&mut self) {
        unsafe { raw::rade_bpf_destroy(self.state) }
    }
}

impl BandPassFilter for RadeBpf {
    fn process(&mut self, iq: &mut [Complex32]) {
        let ptr = iq.as_mut_ptr() as *mut c_float;
        unsafe { raw::rade_bpf_process(self.state, ptr as *const c_float, ptr, iq.len() as c_int) }
    }
}

fn path_to_cstring(path: &std::path::Path) -> Result<std::ffi::CString, CodecError> {
    std::ffi::CString::new(path.to_string_lossy().as_bytes())
        .map_err(|e| CodecError::ModelLoadFailed(e.to_string()))
}
