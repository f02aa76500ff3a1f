//! Audio transport error types.

use std::fmt;

/// Errors that can occur while opening or driving an [`AudioTransport`](super::AudioTransport).
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Device not found or unavailable
    #[error("audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to build or start a capture/playback stream
    #[error("stream error: {0}")]
    StreamFailed(String),

    /// Invalid audio stream configuration
    #[error("invalid stream configuration: {0}")]
    InvalidConfig(String),

    /// The transport was used out of order (e.g. `read` before `start`)
    #[error("transport not started")]
    NotStarted,

    /// The transport was closed or aborted while a call was blocked
    #[error("transport closed")]
    Closed,

    /// I/O error during audio operations
    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic audio error
    #[error("{0}")]
    Other(String),
}

impl AudioError {
    /// Create a device not found error
    pub fn device_not_found(device: impl fmt::Display) -> Self {
        Self::DeviceNotFound(device.to_string())
    }

    /// Create a stream failed error
    pub fn stream_failed(msg: impl fmt::Display) -> Self {
        Self::StreamFailed(msg.to_string())
    }
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamFailed(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::StreamFailed(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::StreamFailed(err.to_string())
    }
}

impl From<cpal::DevicesError> for AudioError {
    fn from(err: cpal::DevicesError) -> Self {
        AudioError::DeviceNotFound(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::InvalidConfig(err.to_string())
    }
}
