//! Arias intensity build-up and the 5-95% significant-duration window.

use crate::domain::AccelerationRecord;
use serde::Serialize;

/// Fractions of the total intensity bounding the significant window.
const LOWER_FRACTION: f64 = 0.05;
const UPPER_FRACTION: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificantWindow {
    /// First instant at which the build-up strictly exceeds 5% of the total.
    pub start_time: f64,
    /// Last instant at which the build-up is strictly below 95% of the total.
    pub end_time: f64,
    /// `end_time - start_time`, the D5-95 significant duration.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AriasProfile {
    /// Cumulative trapezoidal integral of the squared acceleration, one value
    /// per sample, starting at zero. Unit conventions follow the input; the
    /// `pi / (2 g)` physical constant is deliberately not applied.
    pub cumulative: Vec<f64>,
    /// Final value of the build-up.
    pub total: f64,
    /// 5% threshold, `0.05 * total`.
    pub arias05: f64,
    /// 95% threshold, `0.95 * total`.
    pub arias95: f64,
    /// Absent when no sample lies strictly between the thresholds, which
    /// covers all-zero records and build-ups poisoned by NaN.
    pub window: Option<SignificantWindow>,
}

impl AriasProfile {
    /// D5-95 significant duration, zero when no window exists.
    pub fn significant_duration(&self) -> f64 {
        self.window.map_or(0.0, |window| window.duration)
    }
}

/// Cumulative Arias build-up and significant-duration window of a record.
///
/// Both window bounds use strict inequalities against the 5% and 95%
/// thresholds, so a record whose build-up jumps straight from 0 to the total
/// has no window at all rather than a zero-length one.
pub fn arias_profile(record: &AccelerationRecord) -> AriasProfile {
    let samples = record.samples();
    let dt = record.dt();

    let mut cumulative = Vec::with_capacity(samples.len());
    let mut running = 0.0_f64;
    for (index, &value) in samples.iter().enumerate() {
        if index > 0 {
            let previous = samples[index - 1];
            running += dt * (previous * previous + value * value) / 2.0;
        }
        cumulative.push(running);
    }

    let total = cumulative.last().copied().unwrap_or(0.0);
    let arias05 = LOWER_FRACTION * total;
    let arias95 = UPPER_FRACTION * total;

    let mut first_inside = None;
    let mut last_inside = None;
    for (index, &value) in cumulative.iter().enumerate() {
        if value > arias05 && value < arias95 {
            if first_inside.is_none() {
                first_inside = Some(index);
            }
            last_inside = Some(index);
        }
    }

    let window = match (first_inside, last_inside) {
        (Some(first), Some(last)) => {
            let start_time = record.time(first);
            let end_time = record.time(last);
            Some(SignificantWindow {
                start_time,
                end_time,
                duration: end_time - start_time,
            })
        }
        _ => None,
    };

    AriasProfile {
        cumulative,
        total,
        arias05,
        arias95,
        window,
    }
}
