//! TBEC-2018 design spectrum construction: soil amplification of the
//! interpolated site parameters, derived corner periods and design class,
//! and the piecewise horizontal/vertical spectral shapes on a fixed dense
//! period grid.

use super::grid::{HazardGrid, IntensityLevel, SiteParams};
use crate::domain::{EngineError, EngineResult};
use crate::numerics::linear_interp_clamped;
use serde::Serialize;
use tracing::debug;

/// Fixed long-period corner of the horizontal spectrum, seconds.
const LONG_PERIOD_S: f64 = 6.0;

/// Dense output grid: 1001 uniform points over 0 to 5 seconds.
const PERIOD_GRID_POINTS: usize = 1001;
const PERIOD_GRID_MAX_S: f64 = 5.0;

/// Short-period breakpoints of the Fs amplification table.
const SS_RANGE: [f64; 6] = [0.25, 0.50, 0.75, 1.00, 1.25, 1.50];
/// 1-second breakpoints of the F1 amplification table.
const S1_RANGE: [f64; 6] = [0.10, 0.20, 0.30, 0.40, 0.50, 0.60];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoilClass {
    Za,
    Zb,
    Zc,
    Zd,
    Ze,
}

impl SoilClass {
    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key.trim().to_ascii_uppercase().as_str() {
            "ZA" => Ok(Self::Za),
            "ZB" => Ok(Self::Zb),
            "ZC" => Ok(Self::Zc),
            "ZD" => Ok(Self::Zd),
            "ZE" => Ok(Self::Ze),
            other => Err(EngineError::config(
                "CONFIG.SOIL_CLASS",
                format!("unknown soil class '{other}', expected ZA..ZE"),
            )),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Za => "ZA",
            Self::Zb => "ZB",
            Self::Zc => "ZC",
            Self::Zd => "ZD",
            Self::Ze => "ZE",
        }
    }

    const fn fs_row(self) -> [f64; 6] {
        match self {
            Self::Za => [0.8, 0.8, 0.8, 0.8, 0.8, 0.8],
            Self::Zb => [0.9, 0.9, 0.9, 0.9, 0.9, 0.9],
            Self::Zc => [1.3, 1.3, 1.2, 1.2, 1.2, 1.2],
            Self::Zd => [1.6, 1.4, 1.2, 1.1, 1.0, 1.0],
            Self::Ze => [2.4, 1.7, 1.3, 1.1, 0.9, 0.8],
        }
    }

    const fn f1_row(self) -> [f64; 6] {
        match self {
            Self::Za => [0.8, 0.8, 0.8, 0.8, 0.8, 0.8],
            Self::Zb => [0.8, 0.8, 0.8, 0.8, 0.8, 0.8],
            Self::Zc => [1.5, 1.5, 1.5, 1.5, 1.5, 1.4],
            Self::Zd => [2.4, 2.2, 2.0, 1.9, 1.8, 1.7],
            Self::Ze => [4.2, 3.3, 2.8, 2.4, 2.2, 2.0],
        }
    }
}

/// Scalar design parameters backing a target spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignParams {
    pub ss: f64,
    pub s1: f64,
    pub pga: f64,
    pub pgv: f64,
    pub fs: f64,
    pub f1: f64,
    pub sds: f64,
    pub sd1: f64,
    pub ta: f64,
    pub tb: f64,
    pub tl: f64,
    /// Earthquake design class; absent when SDs is NaN because the site lies
    /// outside the hazard grid.
    pub dts: Option<u8>,
    pub soil_class: SoilClass,
    pub intensity: IntensityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSpectrum {
    pub periods: Vec<f64>,
    /// Horizontal design spectral acceleration.
    pub sa: Vec<f64>,
    /// Vertical design spectral acceleration, NaN above half the long
    /// period where the shape is undefined.
    pub sad: Vec<f64>,
    pub params: DesignParams,
}

/// Build the TBEC-2018 target spectrum for a site.
///
/// Sites outside the hazard grid's convex hull interpolate to NaN and the
/// NaN flows through every derived scalar and both spectral shapes rather
/// than erroring.
pub fn target_spectrum(
    grid: &HazardGrid,
    lat: f64,
    lon: f64,
    soil: SoilClass,
    intensity: IntensityLevel,
) -> TargetSpectrum {
    let site = grid.site_params(lat, lon, intensity);
    let params = design_params(site, soil, intensity);
    debug!(
        lat,
        lon,
        soil = params.soil_class.as_str(),
        intensity = params.intensity.as_str(),
        sds = params.sds,
        sd1 = params.sd1,
        "target spectrum parameters resolved"
    );

    let periods: Vec<f64> = (0..PERIOD_GRID_POINTS)
        .map(|i| PERIOD_GRID_MAX_S * i as f64 / (PERIOD_GRID_POINTS - 1) as f64)
        .collect();
    let sa = periods
        .iter()
        .map(|&period| horizontal_ordinate(period, &params))
        .collect();
    let sad = periods
        .iter()
        .map(|&period| vertical_ordinate(period, &params))
        .collect();

    TargetSpectrum {
        periods,
        sa,
        sad,
        params,
    }
}

fn design_params(site: SiteParams, soil: SoilClass, intensity: IntensityLevel) -> DesignParams {
    let fs = linear_interp_clamped(&SS_RANGE, &soil.fs_row(), site.ss);
    let f1 = linear_interp_clamped(&S1_RANGE, &soil.f1_row(), site.s1);
    let sds = site.ss * fs;
    let sd1 = site.s1 * f1;

    let dts = if sds < 0.33 {
        Some(4)
    } else if sds < 0.50 {
        Some(3)
    } else if sds < 0.75 {
        Some(2)
    } else if sds.is_finite() {
        Some(1)
    } else {
        None
    };

    DesignParams {
        ss: site.ss,
        s1: site.s1,
        pga: site.pga,
        pgv: site.pgv,
        fs,
        f1,
        sds,
        sd1,
        ta: 0.2 * sd1 / sds,
        tb: sd1 / sds,
        tl: LONG_PERIOD_S,
        dts,
        soil_class: soil,
        intensity,
    }
}

/// Horizontal shape: ramp below TA, plateau SDs to TB, SD1/T to TL, then
/// SD1*TL/T^2.
fn horizontal_ordinate(period: f64, params: &DesignParams) -> f64 {
    if period < params.ta {
        (0.4 + 0.6 * period / params.ta) * params.sds
    } else if period <= params.tb {
        params.sds
    } else if period <= params.tl {
        params.sd1 / period
    } else {
        params.sd1 * params.tl / (period * period)
    }
}

/// Vertical shape on compressed corner periods TA/3, TB/3, TL/2; undefined
/// (NaN) beyond TL/2.
fn vertical_ordinate(period: f64, params: &DesignParams) -> f64 {
    let tad = params.ta / 3.0;
    let tbd = params.tb / 3.0;
    let tld = params.tl / 2.0;
    if period < tad {
        (0.32 + 0.48 * period / tad) * params.sds
    } else if period <= tbd {
        0.8 * params.sds
    } else if period <= tld {
        0.8 * params.sds * tbd / period
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::{design_params, target_spectrum, SoilClass};
    use crate::hazard::grid::tests::fixture_csv;
    use crate::hazard::grid::{HazardGrid, IntensityLevel, SiteParams};

    fn site(ss: f64, s1: f64) -> SiteParams {
        SiteParams {
            ss,
            s1,
            pga: 0.4,
            pgv: 30.0,
        }
    }

    #[test]
    fn amplification_at_a_table_breakpoint_is_the_table_entry_exactly() {
        let params = design_params(site(0.50, 0.20), SoilClass::Zd, IntensityLevel::Dd2);
        assert_eq!(params.fs, 1.4);
        assert_eq!(params.f1, 2.2);
    }

    #[test]
    fn amplification_clamps_beyond_the_table_range() {
        let low = design_params(site(0.10, 0.05), SoilClass::Ze, IntensityLevel::Dd2);
        assert_eq!(low.fs, 2.4);
        assert_eq!(low.f1, 4.2);

        let high = design_params(site(2.00, 0.90), SoilClass::Ze, IntensityLevel::Dd2);
        assert_eq!(high.fs, 0.8);
        assert_eq!(high.f1, 2.0);
    }

    #[test]
    fn design_class_follows_the_sds_breakpoints() {
        // ZA keeps Fs at 0.8 everywhere, so SDs = 0.8 * Ss.
        let cases = [(0.30, 4), (0.45, 3), (0.80, 2), (1.20, 1)];
        for (ss, expected) in cases {
            let params = design_params(site(ss, 0.20), SoilClass::Za, IntensityLevel::Dd1);
            assert_eq!(params.dts, Some(expected), "Ss = {ss}");
        }
    }

    #[test]
    fn horizontal_spectrum_has_ramp_plateau_and_decay() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");
        let spectrum = target_spectrum(&grid, 40.0, 30.0, SoilClass::Zc, IntensityLevel::Dd1);
        let params = spectrum.params;

        assert_eq!(spectrum.periods.len(), 1001);
        assert_eq!(spectrum.periods[0], 0.0);
        assert!((spectrum.periods[1000] - 5.0).abs() < 1.0e-12);

        // Zero period sits on the ramp at 0.4 * SDs.
        assert!((spectrum.sa[0] - 0.4 * params.sds).abs() < 1.0e-12);

        // A point inside [TA, TB] sits on the plateau.
        let mid = (params.ta + params.tb) / 2.0;
        let plateau = spectrum
            .periods
            .iter()
            .position(|&t| t >= params.ta && t <= params.tb && (t - mid).abs() < 0.01)
            .or_else(|| spectrum.periods.iter().position(|&t| t >= params.ta && t <= params.tb));
        if let Some(index) = plateau {
            assert!((spectrum.sa[index] - params.sds).abs() < 1.0e-12);
        }

        // Well past TB the ordinate decays as SD1 / T.
        let index = spectrum.periods.iter().position(|&t| t > 2.0).expect("grid spans 5 s");
        let period = spectrum.periods[index];
        assert!((spectrum.sa[index] - params.sd1 / period).abs() < 1.0e-12);
    }

    #[test]
    fn vertical_spectrum_is_undefined_above_half_the_long_period() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");
        let spectrum = target_spectrum(&grid, 40.0, 30.0, SoilClass::Zd, IntensityLevel::Dd2);

        for (index, &period) in spectrum.periods.iter().enumerate() {
            if period > 3.0 {
                assert!(spectrum.sad[index].is_nan(), "T = {period}");
            } else if period > spectrum.params.tb / 3.0 {
                assert!(spectrum.sad[index].is_finite(), "T = {period}");
            }
        }

        // Plateau at 0.8 * SDs between the compressed corner periods.
        let tad = spectrum.params.ta / 3.0;
        let tbd = spectrum.params.tb / 3.0;
        if let Some(index) = spectrum
            .periods
            .iter()
            .position(|&t| t >= tad && t <= tbd)
        {
            assert!((spectrum.sad[index] - 0.8 * spectrum.params.sds).abs() < 1.0e-12);
        }
    }

    #[test]
    fn sites_outside_the_grid_produce_nan_spectra_not_errors() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");
        let spectrum = target_spectrum(&grid, 10.0, 10.0, SoilClass::Zc, IntensityLevel::Dd3);

        assert!(spectrum.params.ss.is_nan());
        assert!(spectrum.params.sds.is_nan());
        assert_eq!(spectrum.params.dts, None);
        assert!(spectrum.sa.iter().all(|sa| sa.is_nan()));
        assert!(spectrum.sad.iter().all(|sad| sad.is_nan()));
    }

    #[test]
    fn soil_class_keys_resolve_case_insensitively() {
        assert_eq!(SoilClass::from_key("zc").unwrap(), SoilClass::Zc);
        assert_eq!(
            SoilClass::from_key("Z9").expect_err("bad key").code(),
            "CONFIG.SOIL_CLASS"
        );
    }
}
