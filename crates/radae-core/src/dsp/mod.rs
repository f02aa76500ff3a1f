//! Signal-processing building blocks shared by both pipelines (spec §4.3,
//! §4.4): the Hilbert transform that turns real samples into analytic
//! (complex) baseband, and the spectrum probe used for the live waterfall.

pub mod hilbert;
pub mod spectrum;

pub use hilbert::Hilbert;
pub use spectrum::{SpectrumProbe, SpectrumPublisher};
