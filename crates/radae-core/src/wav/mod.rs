//! WAV file source and recorder (spec §4.7, §4.8).

mod error;
mod recorder;
mod source;

pub use error::WavError;
pub use recorder::WavRecorder;
pub use source::WavSource;
