use anyhow::Result;
use quakelab_core::conditioning::{detrend, filter, DetrendMethod, FilterKind, FilterSpec};
use quakelab_core::domain::{AccelerationRecord, EngineError};
use quakelab_core::hazard::{target_spectrum, HazardGrid, IntensityLevel, SoilClass};
use quakelab_core::record::{parse_record_file, RecordFormat};
use quakelab_core::spectra::{
    arias_profile, fourier_spectrum, response_spectrum, AriasProfile, FourierSpectrum,
    ResponseSpectrum,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default response-spectrum period grid: 0.01 s to 4 s in 0.01 s steps.
fn default_periods() -> Vec<f64> {
    (1..=400).map(|i| i as f64 * 0.01).collect()
}

#[derive(clap::Subcommand)]
pub(super) enum Command {
    /// Parse, condition and analyze a strong-motion record
    Process(ProcessArgs),
    /// Build a TBEC-2018 target design spectrum for a site
    TargetSpectrum(TargetSpectrumArgs),
}

#[derive(clap::Args)]
pub(super) struct ProcessArgs {
    /// Input accelerogram path
    record: PathBuf,

    /// Record format (at2 or asc); inferred from the extension when absent
    #[arg(long)]
    format: Option<String>,

    /// Detrend method applied first: linear or polynomial
    #[arg(long)]
    detrend: Option<String>,

    /// Polynomial detrend order
    #[arg(long, default_value_t = 2)]
    detrend_order: usize,

    /// Zero-phase Butterworth filter kind: lowpass, highpass or bandpass
    #[arg(long)]
    filter: Option<String>,

    /// Corner frequency list in Hz, comma separated (two for bandpass)
    #[arg(long)]
    corners: Option<String>,

    /// Butterworth filter order
    #[arg(long, default_value_t = 4)]
    filter_order: usize,

    /// SDOF damping ratio for the response spectrum
    #[arg(long, default_value_t = 0.05)]
    damping: f64,

    /// Comma-separated period grid in seconds; a dense default otherwise
    #[arg(long)]
    periods: Option<String>,

    /// JSON report path; stdout when absent
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct TargetSpectrumArgs {
    /// Hazard grid CSV path
    #[arg(long)]
    grid: PathBuf,

    /// Site latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Site longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Soil class ZA..ZE
    #[arg(long)]
    soil: String,

    /// Intensity level DD1..DD4
    #[arg(long)]
    intensity: String,

    /// JSON report path; stdout when absent
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Command {
    pub(super) fn execute(self) -> Result<()> {
        match self {
            Self::Process(args) => run_process(args),
            Self::TargetSpectrum(args) => run_target_spectrum(args),
        }
    }
}

#[derive(Serialize)]
struct RecordSummary {
    path: String,
    format_unit: &'static str,
    dt: f64,
    samples: usize,
    duration: f64,
    metadata: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ProcessReport {
    record: RecordSummary,
    response: ResponseSpectrum,
    arias: AriasProfile,
    fourier: FourierSpectrum,
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let format = args
        .format
        .as_deref()
        .map(RecordFormat::from_extension)
        .transpose()?;
    let mut record = parse_record_file(&args.record, format)?;
    info!(
        path = %args.record.display(),
        samples = record.len(),
        dt = record.dt(),
        "record parsed"
    );

    if let Some(method) = args.detrend.as_deref() {
        let method = DetrendMethod::from_key(method)?;
        record = detrend(&record, method, args.detrend_order)?;
    }

    if let Some(kind) = args.filter.as_deref() {
        let kind = FilterKind::from_key(kind)?;
        let corners = match args.corners.as_deref() {
            Some(raw) => parse_float_list(raw, "CONFIG.FILTER_CORNER")?,
            None => {
                return Err(EngineError::config(
                    "CONFIG.FILTER_CORNER",
                    "--filter requires --corners",
                )
                .into());
            }
        };
        let spec = FilterSpec {
            kind,
            corners,
            order: args.filter_order,
        };
        record = filter(&record, &spec)?;
    }

    let periods = match args.periods.as_deref() {
        Some(raw) => parse_float_list(raw, "CONFIG.PERIOD_GRID")?,
        None => default_periods(),
    };

    let response = response_spectrum(&periods, record.samples(), args.damping, record.dt())?;
    let arias = arias_profile(&record);
    let fourier = fourier_spectrum(&record)?;

    let report = ProcessReport {
        record: summarize(&args.record, &record),
        response,
        arias,
        fourier,
    };
    emit_json(&report, args.out.as_deref())
}

fn run_target_spectrum(args: TargetSpectrumArgs) -> Result<()> {
    let soil = SoilClass::from_key(&args.soil)?;
    let intensity = IntensityLevel::from_key(&args.intensity)?;
    let grid = HazardGrid::from_path(&args.grid)?;

    let spectrum = target_spectrum(&grid, args.lat, args.lon, soil, intensity);
    emit_json(&spectrum, args.out.as_deref())
}

fn summarize(path: &Path, record: &AccelerationRecord) -> RecordSummary {
    RecordSummary {
        path: path.display().to_string(),
        format_unit: record.unit().as_str(),
        dt: record.dt(),
        samples: record.len(),
        duration: record.len().saturating_sub(1) as f64 * record.dt(),
        metadata: record.metadata().clone(),
    }
}

fn parse_float_list(raw: &str, code: &'static str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>().map_err(|_| {
                EngineError::config(code, format!("'{token}' is not a number")).into()
            })
        })
        .collect()
}

fn emit_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|source| {
        EngineError::internal("INTERNAL.SERIALIZE", format!("report serialization failed: {source}"))
    })?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered).map_err(|source| {
                EngineError::io_system(
                    "IO.REPORT_WRITE",
                    format!("cannot write report '{}': {source}", path.display()),
                )
            })?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
