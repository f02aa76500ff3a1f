//! `radae-core`: real-time RX/TX streaming pipelines for the RADAE
//! narrow-band digital voice mode.
//!
//! [`controller`] is the entry point most callers want — it owns the state
//! machine (`Idle -> Opened -> Running -> Opened -> Closed`) around one
//! [`pipeline::RxPipeline`] or [`pipeline::TxPipeline`], wiring together
//! [`audio`] transports, the external [`codec`] collaborator and [`dsp`]
//! building blocks. [`config`] persists the knobs a CLI front-end exposes
//! between runs.

pub mod audio;
pub mod callsign;
pub mod codec;
pub mod config;
pub mod constants;
pub mod controller;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod resample;
pub mod telemetry;
pub mod verbose;
pub mod wav;

pub use audio::list_devices;
pub use callsign::{sanitize_callsign, CallsignDecoder, CallsignEncoder, RadeCallsignCodec};
pub use codec::{
    BandPassFilter, CodecError, Fargan, FeatureEncoder, LpcnetEncoder, RadeBpf, RadeRx, RadeTx,
    RxCodec, RxStatus, TxCodec, Vocoder,
};
pub use config::Config;
pub use controller::{ModelPaths, RxController, RxOpenParams, TxController, TxOpenParams};
pub use error::{RadaeError, Result};
pub use pipeline::{CallsignSlot, RecorderSlot, RxPipeline, TxPipeline};
pub use telemetry::Telemetry;
pub use verbose::set_verbose;
pub use wav::{WavError, WavRecorder, WavSource};
