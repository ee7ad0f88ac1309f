//! Spectral products of a conditioned record: SDOF response spectra, the
//! Arias intensity build-up, and the one-sided Fourier amplitude spectrum.

mod fourier;
mod intensity;
mod response;

pub use fourier::{fourier_spectrum, FourierSpectrum};
pub use intensity::{arias_profile, AriasProfile, SignificantWindow};
pub use response::{
    fft_spectrum, nigam_jennings_spectrum, response_spectrum, ResponseSpectrum,
    FREQUENCY_DOMAIN_DAMPING_THRESHOLD,
};
