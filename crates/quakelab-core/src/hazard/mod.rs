//! Seismic hazard model: the immutable parameter grid, scattered-data
//! interpolation over it, and TBEC-2018 target-spectrum construction.

pub mod grid;
pub mod interpolate;
pub mod tbec;

pub use grid::{HazardGrid, HazardParameter, IntensityLevel, SiteParams};
pub use interpolate::{Field, Triangulation, TriangulationError};
pub use tbec::{target_spectrum, DesignParams, SoilClass, TargetSpectrum};
