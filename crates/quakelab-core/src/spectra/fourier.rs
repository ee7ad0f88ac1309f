//! One-sided Fourier amplitude spectrum of an acceleration record.

use crate::domain::{AccelerationRecord, EngineError, EngineResult};
use realfft::RealFftPlanner;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FourierSpectrum {
    /// Evenly spaced frequencies from 0 to the Nyquist frequency inclusive,
    /// `floor(n / 2) + 1` points.
    pub frequencies: Vec<f64>,
    /// Unscaled transform magnitudes, one per frequency.
    pub amplitudes: Vec<f64>,
}

/// One-sided amplitude spectrum `|rfft(a)|` on a linear frequency axis
/// spanning `[0, 1 / (2 dt)]`.
pub fn fourier_spectrum(record: &AccelerationRecord) -> EngineResult<FourierSpectrum> {
    let n = record.len();
    if n == 0 {
        return Ok(FourierSpectrum {
            frequencies: Vec::new(),
            amplitudes: Vec::new(),
        });
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let transform = planner.plan_fft_forward(n);

    let mut input = record.samples().to_vec();
    let mut spectrum = transform.make_output_vec();
    transform
        .process(&mut input, &mut spectrum)
        .map_err(|source| {
            EngineError::internal(
                "INTERNAL.FFT",
                format!("real FFT of {n} samples failed: {source}"),
            )
        })?;

    let amplitudes: Vec<f64> = spectrum.iter().map(|bin| bin.norm()).collect();

    let bins = amplitudes.len();
    let nyquist = record.nyquist();
    let frequencies = if bins == 1 {
        vec![0.0]
    } else {
        (0..bins)
            .map(|index| nyquist * index as f64 / (bins - 1) as f64)
            .collect()
    };

    Ok(FourierSpectrum {
        frequencies,
        amplitudes,
    })
}
