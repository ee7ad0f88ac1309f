//! Seismic hazard parameter grid: tabulated {Ss, S1, PGA, PGV} per
//! intensity level at discrete (lat, lon) points, loaded once from CSV and
//! immutable afterwards. Interpolators for all sixteen columns are fitted at
//! load time so concurrent site queries share the structure read-only.

use super::interpolate::{Field, Triangulation};
use crate::domain::{EngineError, EngineResult};
use serde::Serialize;
use std::path::Path;
use tracing::info;

const COLUMN_LAT: &str = "LAT";
const COLUMN_LON: &str = "LON";

/// Return-period intensity levels of the hazard model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntensityLevel {
    Dd1,
    Dd2,
    Dd3,
    Dd4,
}

impl IntensityLevel {
    pub const ALL: [Self; 4] = [Self::Dd1, Self::Dd2, Self::Dd3, Self::Dd4];

    pub fn from_key(key: &str) -> EngineResult<Self> {
        match key.trim().to_ascii_uppercase().as_str() {
            "DD1" => Ok(Self::Dd1),
            "DD2" => Ok(Self::Dd2),
            "DD3" => Ok(Self::Dd3),
            "DD4" => Ok(Self::Dd4),
            other => Err(EngineError::config(
                "CONFIG.INTENSITY_LEVEL",
                format!("unknown intensity level '{other}', expected DD1..DD4"),
            )),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dd1 => "DD1",
            Self::Dd2 => "DD2",
            Self::Dd3 => "DD3",
            Self::Dd4 => "DD4",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Dd1 => 0,
            Self::Dd2 => 1,
            Self::Dd3 => 2,
            Self::Dd4 => 3,
        }
    }
}

/// Hazard parameters tabulated per grid point and intensity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HazardParameter {
    Ss,
    S1,
    Pga,
    Pgv,
}

impl HazardParameter {
    pub const ALL: [Self; 4] = [Self::Ss, Self::S1, Self::Pga, Self::Pgv];

    const fn column_prefix(self) -> &'static str {
        match self {
            Self::Ss => "Ss",
            Self::S1 => "S1",
            Self::Pga => "PGA",
            Self::Pgv => "PGV",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Ss => 0,
            Self::S1 => 1,
            Self::Pga => 2,
            Self::Pgv => 3,
        }
    }
}

/// Interpolated hazard parameters at a query site. Every value is NaN when
/// the site lies outside the grid's convex hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteParams {
    pub ss: f64,
    pub s1: f64,
    pub pga: f64,
    pub pgv: f64,
}

#[derive(Debug)]
pub struct HazardGrid {
    triangulation: Triangulation,
    // Indexed [intensity level][parameter].
    fields: Vec<Vec<Field>>,
}

impl HazardGrid {
    /// Load the grid from a CSV file.
    pub fn from_path(path: &Path) -> EngineResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            EngineError::io_system(
                "IO.GRID_READ",
                format!("cannot read hazard grid '{}': {source}", path.display()),
            )
        })?;
        let grid = Self::from_csv(&source)?;
        info!(
            path = %path.display(),
            points = grid.triangulation.point_count(),
            "hazard grid loaded"
        );
        Ok(grid)
    }

    /// Parse the grid from CSV text. Columns are located by header name, so
    /// column order is free; the required headers are LAT, LON and
    /// `<param>-<level>` for every parameter/level combination.
    pub fn from_csv(source: &str) -> EngineResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source.as_bytes());

        let headers = reader
            .headers()
            .map_err(|source| {
                EngineError::format("FORMAT.GRID_HEADER", format!("unreadable CSV header: {source}"))
            })?
            .clone();
        let column = |name: &str| -> EngineResult<usize> {
            headers.iter().position(|header| header == name).ok_or_else(|| {
                EngineError::format(
                    "FORMAT.GRID_HEADER",
                    format!("hazard grid is missing column '{name}'"),
                )
            })
        };

        let lat_column = column(COLUMN_LAT)?;
        let lon_column = column(COLUMN_LON)?;
        let mut value_columns = [[0usize; 4]; 4];
        for level in IntensityLevel::ALL {
            for parameter in HazardParameter::ALL {
                let name = format!("{}-{}", parameter.column_prefix(), level.as_str());
                value_columns[level.index()][parameter.index()] = column(&name)?;
            }
        }

        let mut points: Vec<[f64; 2]> = Vec::new();
        let mut values: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); 4]; 4];

        for (row_number, row) in reader.records().enumerate() {
            let row = row.map_err(|source| {
                EngineError::format(
                    "FORMAT.GRID_ROW",
                    format!("unreadable hazard grid row {}: {source}", row_number + 2),
                )
            })?;
            let cell = |index: usize| -> EngineResult<f64> {
                row.get(index)
                    .and_then(|raw| raw.parse::<f64>().ok())
                    .ok_or_else(|| {
                        EngineError::format(
                            "FORMAT.GRID_ROW",
                            format!(
                                "hazard grid row {} has a missing or non-numeric field",
                                row_number + 2
                            ),
                        )
                    })
            };

            points.push([cell(lat_column)?, cell(lon_column)?]);
            for level in IntensityLevel::ALL {
                for parameter in HazardParameter::ALL {
                    values[level.index()][parameter.index()]
                        .push(cell(value_columns[level.index()][parameter.index()])?);
                }
            }
        }

        let triangulation = Triangulation::delaunay(&points).map_err(|source| {
            EngineError::format(
                "FORMAT.GRID_GEOMETRY",
                format!("hazard grid cannot be triangulated: {source}"),
            )
        })?;

        let fields = values
            .into_iter()
            .map(|per_level| {
                per_level
                    .into_iter()
                    .map(|column| Field::fit(&triangulation, column))
                    .collect()
            })
            .collect();

        Ok(Self {
            triangulation,
            fields,
        })
    }

    pub fn point_count(&self) -> usize {
        self.triangulation.point_count()
    }

    /// Interpolate one parameter at a site.
    pub fn interpolate(
        &self,
        parameter: HazardParameter,
        level: IntensityLevel,
        lat: f64,
        lon: f64,
    ) -> f64 {
        self.triangulation
            .evaluate(&self.fields[level.index()][parameter.index()], lat, lon)
    }

    /// All four parameters at a site, sharing a single point location.
    pub fn site_params(&self, lat: f64, lon: f64, level: IntensityLevel) -> SiteParams {
        let located = self.triangulation.locate(lat, lon);
        let value = |parameter: HazardParameter| -> f64 {
            match located {
                Some((triangle, barycentric)) => self.triangulation.evaluate_in(
                    &self.fields[level.index()][parameter.index()],
                    triangle,
                    barycentric,
                ),
                None => f64::NAN,
            }
        };
        SiteParams {
            ss: value(HazardParameter::Ss),
            s1: value(HazardParameter::S1),
            pga: value(HazardParameter::Pga),
            pgv: value(HazardParameter::Pgv),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{HazardGrid, HazardParameter, IntensityLevel};

    /// Five-point grid around (40, 30) with distinct per-level values.
    pub(crate) fn fixture_csv() -> String {
        let mut csv = String::from("LAT,LON");
        for level in IntensityLevel::ALL {
            for parameter in ["Ss", "S1", "PGA", "PGV"] {
                csv.push_str(&format!(",{parameter}-{}", level.as_str()));
            }
        }
        csv.push('\n');

        let sites = [
            (39.0, 29.0),
            (41.0, 29.0),
            (41.0, 31.0),
            (39.0, 31.0),
            (40.0, 30.0),
        ];
        for (lat, lon) in sites {
            csv.push_str(&format!("{lat},{lon}"));
            for level_index in 0..4 {
                let scale = 1.0 - 0.2 * level_index as f64;
                // Linear fields so interpolated values are predictable.
                let ss = scale * (0.2 + 0.05 * (lat - 39.0) + 0.02 * (lon - 29.0));
                let s1 = scale * (0.1 + 0.02 * (lat - 39.0));
                let pga = scale * 0.4;
                let pgv = scale * 30.0;
                csv.push_str(&format!(",{ss},{s1},{pga},{pgv}"));
            }
            csv.push('\n');
        }
        csv
    }

    #[test]
    fn loads_and_interpolates_a_linear_field_exactly() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");
        assert_eq!(grid.point_count(), 5);

        let expected = 0.2 + 0.05 * (40.2 - 39.0) + 0.02 * (30.3 - 29.0);
        let actual = grid.interpolate(HazardParameter::Ss, IntensityLevel::Dd1, 40.2, 30.3);
        assert!(
            (actual - expected).abs() < 1.0e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn intensity_levels_select_different_columns() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");

        let dd1 = grid.site_params(40.0, 30.0, IntensityLevel::Dd1);
        let dd4 = grid.site_params(40.0, 30.0, IntensityLevel::Dd4);

        assert!((dd1.pga - 0.4).abs() < 1.0e-9);
        assert!((dd4.pga - 0.4 * 0.4).abs() < 1.0e-9);
        assert!(dd4.ss < dd1.ss);
    }

    #[test]
    fn sites_outside_the_hull_give_nan_params() {
        let grid = HazardGrid::from_csv(&fixture_csv()).expect("grid");
        let params = grid.site_params(50.0, 30.0, IntensityLevel::Dd2);

        assert!(params.ss.is_nan());
        assert!(params.s1.is_nan());
        assert!(params.pga.is_nan());
        assert!(params.pgv.is_nan());
    }

    #[test]
    fn missing_column_is_a_format_error() {
        let source = "LAT,LON,Ss-DD1\n39.0,29.0,0.5\n";
        let error = HazardGrid::from_csv(source).expect_err("incomplete header");
        assert_eq!(error.code(), "FORMAT.GRID_HEADER");
    }

    #[test]
    fn non_numeric_field_is_a_format_error() {
        let mut source = fixture_csv();
        source = source.replacen("0.4", "n/a", 1);
        let error = HazardGrid::from_csv(&source).expect_err("bad cell");
        assert_eq!(error.code(), "FORMAT.GRID_ROW");
    }

    #[test]
    fn unknown_intensity_key_is_a_config_error() {
        assert_eq!(
            IntensityLevel::from_key("DD5").expect_err("bad key").code(),
            "CONFIG.INTENSITY_LEVEL"
        );
        assert_eq!(IntensityLevel::from_key("dd2").unwrap(), IntensityLevel::Dd2);
    }
}
