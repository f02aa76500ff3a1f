//! Unified error types for radae-core.
//!
//! `RadaeError` roots the hierarchy; domain-specific errors (`AudioError`,
//! `CodecError`, `WavError`) carry the detail and convert into it via
//! `#[from]`. Library functions return `Result<T, RadaeError>` (or a more
//! specific nested error where the call site benefits from matching on
//! it); `anyhow` is used at the CLI boundary and in tests.
//!
//! # Error Hierarchy
//!
//! ```text
//! RadaeError
//!   ├── Audio(AudioError)   - transport open/read/write failures
//!   ├── Codec(CodecError)   - neural codec collaborator failures
//!   ├── Wav(WavError)       - file source/recorder failures
//!   ├── Config(String)      - persisted-state I/O/parse failures
//!   └── Io(std::io::Error)  - generic I/O errors
//! ```

pub use crate::audio::AudioError;
pub use crate::codec::CodecError;
pub use crate::wav::WavError;

/// Top-level error type for radae-core operations.
#[derive(Debug, thiserror::Error)]
pub enum RadaeError {
    /// Audio transport errors (device open, read, write)
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// Neural codec collaborator errors
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// WAV file source/recorder errors
    #[error("wav error: {0}")]
    Wav(#[from] WavError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RadaeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Convenience result type using RadaeError
pub type Result<T> = std::result::Result<T, RadaeError>;

// Allow converting from anyhow::Error at the CLI boundary
impl From<anyhow::Error> for RadaeError {
    fn from(err: anyhow::Error) -> Self {
        RadaeError::Other(err.to_string())
    }
}
