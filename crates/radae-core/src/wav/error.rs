//! WAV file source/recorder error type.

/// Errors raised while parsing or writing a WAV file.
#[derive(Debug, thiserror::Error)]
pub enum WavError {
    /// The file didn't start with a RIFF/WAVE header.
    #[error("not a RIFF/WAVE file")]
    NotWav,

    /// No `fmt ` chunk was found before the `data` chunk.
    #[error("missing fmt chunk")]
    MissingFmtChunk,

    /// No `data` chunk was found.
    #[error("missing data chunk")]
    MissingDataChunk,

    /// The `fmt ` chunk described a format this decoder doesn't support.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Underlying I/O failure.
    #[error("WAV I/O error: {0}")]
    Io(#[from] std::io::Error),
}
