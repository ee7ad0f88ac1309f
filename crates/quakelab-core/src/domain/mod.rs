pub mod errors;

pub use errors::{EngineError, EngineErrorCategory, EngineResult, ParserResult};

use serde::Serialize;
use std::collections::BTreeMap;

/// Unit tag carried by a parsed record. The engine never converts between
/// units; it only reports which one the source format declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccelerationUnit {
    /// Fraction of standard gravity (AT2 records).
    G,
    /// Centimetres per second squared (ASC records).
    CmPerS2,
}

impl AccelerationUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::CmPerS2 => "cm/s^2",
        }
    }
}

/// A uniformly sampled strong-motion accelerogram.
///
/// Immutable once constructed; conditioning operations return new records.
/// The time base is synthesized: `time(i) = i * dt`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccelerationRecord {
    dt: f64,
    unit: AccelerationUnit,
    samples: Vec<f64>,
    metadata: BTreeMap<String, String>,
}

impl AccelerationRecord {
    pub fn new(
        dt: f64,
        unit: AccelerationUnit,
        samples: Vec<f64>,
        metadata: BTreeMap<String, String>,
    ) -> EngineResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(EngineError::config(
                "CONFIG.SAMPLING_INTERVAL",
                format!("sampling interval must be finite and positive, got {dt}"),
            ));
        }

        Ok(Self {
            dt,
            unit,
            samples,
            metadata,
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn unit(&self) -> AccelerationUnit {
        self.unit
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn time(&self, index: usize) -> f64 {
        index as f64 * self.dt
    }

    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len()).map(|i| self.time(i)).collect()
    }

    /// Half the sampling rate, the alias-free upper bound for filter design.
    pub fn nyquist(&self) -> f64 {
        0.5 / self.dt
    }

    /// New record with the same time base, unit and metadata but different
    /// sample values. Used by the conditioning functions.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self {
            dt: self.dt,
            unit: self.unit,
            samples,
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccelerationRecord, AccelerationUnit};
    use std::collections::BTreeMap;

    #[test]
    fn time_axis_is_synthesized_from_dt() {
        let record = AccelerationRecord::new(
            0.02,
            AccelerationUnit::G,
            vec![0.0, 1.0, -1.0],
            BTreeMap::new(),
        )
        .expect("record should build");

        assert_eq!(record.time_axis(), vec![0.0, 0.02, 0.04]);
        assert!((record.nyquist() - 25.0).abs() < 1.0e-12);
    }

    #[test]
    fn non_positive_dt_is_rejected() {
        let error = AccelerationRecord::new(
            0.0,
            AccelerationUnit::G,
            vec![0.0],
            BTreeMap::new(),
        )
        .expect_err("zero dt should fail");
        assert_eq!(error.code(), "CONFIG.SAMPLING_INTERVAL");
    }
}
