//! Ground-motion signal processing and response-spectrum computation.
//!
//! The crate parses raw strong-motion accelerograms (AT2, ASC), conditions
//! them with baseline correction and zero-phase Butterworth filtering,
//! computes linear-elastic SDOF response spectra through two numerically
//! distinct strategies selected by damping, derives Arias intensity and
//! Fourier amplitude spectra, and builds TBEC-2018 target design spectra by
//! scattered-data interpolation over a seismic hazard grid.
//!
//! Every operation is a pure function over in-memory arrays. The only shared
//! state is [`hazard::HazardGrid`], which is built once and then only read,
//! so requests can be processed on any number of worker threads without
//! synchronization. Numerical degeneracies (NaN, out-of-hull queries)
//! propagate through results instead of turning into errors; malformed input
//! and bad configuration fail fast with a categorized [`domain::EngineError`].

pub mod conditioning;
pub mod domain;
pub mod hazard;
pub mod numerics;
pub mod record;
pub mod spectra;

pub use domain::{
    AccelerationRecord, AccelerationUnit, EngineError, EngineErrorCategory, EngineResult,
};
