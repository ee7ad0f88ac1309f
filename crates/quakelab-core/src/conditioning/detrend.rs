use crate::domain::{AccelerationRecord, EngineError, EngineResult};
use crate::numerics::{polyfit, polyval};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetrendMethod {
    /// Remove a least-squares straight line fitted over the whole series.
    Linear,
    /// Remove a least-squares polynomial of the given order.
    Polynomial,
}

impl DetrendMethod {
    /// Lookup from a configuration key such as `linear` or `polynomial`.
    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "polynomial" => Ok(Self::Polynomial),
            other => Err(EngineError::config(
                "CONFIG.DETREND_METHOD",
                format!("unknown detrend method '{other}', expected linear or polynomial"),
            )),
        }
    }
}

/// Remove a whole-series least-squares trend from the record.
///
/// `order` is ignored for [`DetrendMethod::Linear`], which always removes a
/// degree-1 fit. No windowing; the fit spans every sample.
pub fn detrend(
    record: &AccelerationRecord,
    method: DetrendMethod,
    order: usize,
) -> EngineResult<AccelerationRecord> {
    let degree = match method {
        DetrendMethod::Linear => 1,
        DetrendMethod::Polynomial => order,
    };

    let time = record.time_axis();
    let coefficients = polyfit(time.as_slice(), record.samples(), degree).map_err(|source| {
        EngineError::config(
            "CONFIG.DETREND_ORDER",
            format!("detrend fit of order {degree} failed: {source}"),
        )
    })?;

    let detrended = record
        .samples()
        .iter()
        .zip(&time)
        .map(|(&value, &t)| value - polyval(&coefficients, t))
        .collect();

    Ok(record.with_samples(detrended))
}
