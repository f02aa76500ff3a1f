//! CLI error display: user-facing messages with actionable hints for the
//! error variants a controller can surface.

use radae_core::{AudioError, CodecError, RadaeError, WavError};

/// Display an error to stderr with a contextual hint.
pub fn display_error(err: &RadaeError) {
    match err {
        RadaeError::Audio(AudioError::DeviceNotFound(device)) => {
            eprintln!("Error: audio device not found: {device}");
            eprintln!();
            eprintln!("Hint: run `radae devices` to list available device names.");
        }

        RadaeError::Audio(AudioError::StreamFailed(msg)) => {
            eprintln!("Error: audio stream failed: {msg}");
            eprintln!();
            eprintln!("Hint: another application may be holding the device open, or the");
            eprintln!("requested --device-rate isn't supported by this device.");
        }

        RadaeError::Audio(AudioError::InvalidConfig(msg)) => {
            eprintln!("Error: invalid audio stream configuration: {msg}");
            eprintln!();
            eprintln!("Hint: try a different --device-rate (48000 and 44100 are safe bets).");
        }

        RadaeError::Codec(CodecError::ModelLoadFailed(msg)) => {
            eprintln!("Error: failed to load a model file: {msg}");
            eprintln!();
            eprintln!("Hint: check --rade-rx-model/--rade-tx-model/--fargan-model point at");
            eprintln!("existing weight files.");
        }

        RadaeError::Codec(CodecError::InitFailed(what)) => {
            eprintln!("Error: codec failed to initialize ({what})");
            eprintln!();
            eprintln!("Hint: this usually means a model file is corrupt or the wrong shape");
            eprintln!("for this build of librade/libfargan.");
        }

        RadaeError::Wav(WavError::NotWav | WavError::MissingFmtChunk | WavError::MissingDataChunk) => {
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Hint: --input-file must be a PCM WAV file (mono, 16-bit or float32).");
        }

        RadaeError::Config(msg) => {
            eprintln!("Error: configuration error: {msg}");
            eprintln!();
            eprintln!("Hint: run `radae config --path` to see where settings are stored.");
        }

        _ => {
            eprintln!("Error: {err}");
        }
    }
}

/// Convert an `anyhow::Error` to `RadaeError` if possible and display it;
/// otherwise fall back to the generic anyhow rendering.
pub fn display_anyhow_error(err: anyhow::Error) {
    if let Some(radae_err) = err.downcast_ref::<RadaeError>() {
        display_error(radae_err);
    } else {
        eprintln!("Error: {err:#}");
    }
}
