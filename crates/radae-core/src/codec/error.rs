//! Neural codec collaborator error type.

/// Errors surfaced by the opaque `rade`/`lpcnet`/`fargan` C-ABI collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The collaborator's `_open`/`_init` function returned a null handle.
    #[error("codec failed to initialize: {0}")]
    InitFailed(String),

    /// A model/weights file the collaborator needed could not be found or
    /// loaded.
    #[error("failed to load model: {0}")]
    ModelLoadFailed(String),

    /// Generic codec failure.
    #[error("{0}")]
    Other(String),
}
