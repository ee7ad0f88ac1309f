use crate::domain::{AccelerationRecord, EngineError, EngineResult};
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

impl FilterKind {
    /// Lookup from a configuration key such as `bandpass`.
    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "lowpass" => Ok(Self::Lowpass),
            "highpass" => Ok(Self::Highpass),
            "bandpass" => Ok(Self::Bandpass),
            other => Err(EngineError::config(
                "CONFIG.FILTER_KIND",
                format!("unknown filter kind '{other}', expected lowpass, highpass or bandpass"),
            )),
        }
    }
}

/// Digital Butterworth filter request: kind, corner frequencies in Hz and
/// design order. Corners are validated against the record's Nyquist
/// frequency at design time, never asserted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub corners: Vec<f64>,
    pub order: usize,
}

impl FilterSpec {
    pub fn lowpass(corner_hz: f64, order: usize) -> Self {
        Self {
            kind: FilterKind::Lowpass,
            corners: vec![corner_hz],
            order,
        }
    }

    pub fn highpass(corner_hz: f64, order: usize) -> Self {
        Self {
            kind: FilterKind::Highpass,
            corners: vec![corner_hz],
            order,
        }
    }

    pub fn bandpass(low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            kind: FilterKind::Bandpass,
            corners: vec![low_hz, high_hz],
            order,
        }
    }

    fn validate(&self, nyquist: f64) -> EngineResult<()> {
        if self.order == 0 {
            return Err(EngineError::config(
                "CONFIG.FILTER_ORDER",
                "filter order must be a positive integer",
            ));
        }

        let expected_corners = match self.kind {
            FilterKind::Bandpass => 2,
            FilterKind::Lowpass | FilterKind::Highpass => 1,
        };
        if self.corners.len() != expected_corners {
            return Err(EngineError::config(
                "CONFIG.FILTER_CORNER",
                format!(
                    "{:?} filter expects {expected_corners} corner frequency(ies), got {}",
                    self.kind,
                    self.corners.len()
                ),
            ));
        }

        for &corner in &self.corners {
            if !(corner > 0.0 && corner < nyquist) {
                return Err(EngineError::config(
                    "CONFIG.FILTER_CORNER",
                    format!(
                        "corner frequency {corner} Hz outside the open interval (0, {nyquist}) Hz"
                    ),
                ));
            }
        }

        if self.kind == FilterKind::Bandpass && self.corners[0] >= self.corners[1] {
            return Err(EngineError::config(
                "CONFIG.FILTER_CORNER",
                format!(
                    "bandpass corners must be strictly ordered, got {} >= {}",
                    self.corners[0], self.corners[1]
                ),
            ));
        }

        Ok(())
    }
}

/// One second-order (or degenerate first-order) section,
/// `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Section {
    b: [f64; 3],
    a: [f64; 2],
}

impl Section {
    /// Run the section over a block with Direct Form II Transposed state.
    fn run(&self, samples: &mut [f64]) {
        let mut state = [0.0_f64; 2];
        for value in samples.iter_mut() {
            let input = *value;
            let output = self.b[0] * input + state[0];
            state[0] = self.b[1] * input - self.a[0] * output + state[1];
            state[1] = self.b[2] * input - self.a[1] * output;
            *value = output;
        }
    }

    /// Poles inside the unit circle.
    fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// Cascaded-biquad Butterworth filter designed for one sampling interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    sections: Vec<Section>,
}

impl Butterworth {
    /// Design the digital filter for a record sampled at `dt` seconds.
    pub fn design(spec: &FilterSpec, dt: f64) -> EngineResult<Self> {
        let nyquist = 0.5 / dt;
        spec.validate(nyquist)?;
        let sample_rate = 1.0 / dt;

        let sections = match spec.kind {
            FilterKind::Lowpass => {
                design_sections(spec.order, spec.corners[0], sample_rate, Edge::Low)
            }
            FilterKind::Highpass => {
                design_sections(spec.order, spec.corners[0], sample_rate, Edge::High)
            }
            FilterKind::Bandpass => {
                let mut sections =
                    design_sections(spec.order, spec.corners[1], sample_rate, Edge::Low);
                sections.extend(design_sections(
                    spec.order,
                    spec.corners[0],
                    sample_rate,
                    Edge::High,
                ));
                sections
            }
        };

        Ok(Self { sections })
    }

    /// Single forward pass over a block.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let mut output = samples.to_vec();
        for section in &self.sections {
            section.run(&mut output);
        }
        output
    }

    /// Forward pass, then a time-reversed pass, cancelling the phase lag.
    pub fn apply_zero_phase(&self, samples: &[f64]) -> Vec<f64> {
        let mut output = self.apply(samples);
        output.reverse();
        for section in &self.sections {
            section.run(&mut output);
        }
        output.reverse();
        output
    }

    #[cfg(test)]
    fn is_stable(&self) -> bool {
        self.sections.iter().all(Section::is_stable)
    }
}

/// Zero-phase Butterworth filtering of a record. Output length and time
/// base are unchanged; the input record is untouched.
pub fn filter(record: &AccelerationRecord, spec: &FilterSpec) -> EngineResult<AccelerationRecord> {
    let designed = Butterworth::design(spec, record.dt())?;
    Ok(record.with_samples(designed.apply_zero_phase(record.samples())))
}

enum Edge {
    Low,
    High,
}

/// Analog prototype poles on the left-half s-plane unit circle.
fn prototype_poles(order: usize) -> Vec<Complex64> {
    (0..order)
        .map(|k| {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            Complex64::new(theta.cos(), theta.sin())
        })
        .collect()
}

fn design_sections(order: usize, corner_hz: f64, sample_rate: f64, edge: Edge) -> Vec<Section> {
    // Pre-warp so the bilinear transform lands the -3 dB point on target.
    let warped = 2.0 * sample_rate * (PI * corner_hz / sample_rate).tan();
    let k = 2.0 * sample_rate;

    let poles = prototype_poles(order);
    let mut sections = Vec::with_capacity(order.div_ceil(2));

    let mut index = 0;
    while index < poles.len() {
        let pole = poles[index] * warped;
        if pole.im.abs() < 1.0e-10 {
            sections.push(first_order_section(pole.re, k, &edge));
            index += 1;
        } else {
            sections.push(second_order_section(pole, k, &edge));
            // conjugate partner is implied
            index += 2;
        }
    }

    sections
}

fn first_order_section(pole: f64, k: f64, edge: &Edge) -> Section {
    let alpha = k - pole;
    let beta = k + pole;
    let a1 = -beta / alpha;

    match edge {
        // H(s) = -p / (s - p), unity gain at DC
        Edge::Low => Section {
            b: [-pole / alpha, -pole / alpha, 0.0],
            a: [a1, 0.0],
        },
        // H(s) = s / (s - p), unity gain at infinity
        Edge::High => Section {
            b: [k / alpha, -k / alpha, 0.0],
            a: [a1, 0.0],
        },
    }
}

fn second_order_section(pole: Complex64, k: f64, edge: &Edge) -> Section {
    let magnitude_sq = pole.norm_sqr();
    let k_sq = k * k;
    let denominator = k_sq - 2.0 * k * pole.re + magnitude_sq;
    let a = [
        2.0 * (magnitude_sq - k_sq) / denominator,
        (k_sq + 2.0 * k * pole.re + magnitude_sq) / denominator,
    ];

    match edge {
        // H(s) = |p|^2 / (s^2 - 2 Re(p) s + |p|^2)
        Edge::Low => Section {
            b: [
                magnitude_sq / denominator,
                2.0 * magnitude_sq / denominator,
                magnitude_sq / denominator,
            ],
            a,
        },
        // H(s) = s^2 / (s^2 - 2 Re(p) s + |p|^2)
        Edge::High => Section {
            b: [k_sq / denominator, -2.0 * k_sq / denominator, k_sq / denominator],
            a,
        },
    }
}
