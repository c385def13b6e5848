//! Shared "fit pipeline" logic used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> validation -> bounded fit -> dense curve
//!
//! The CLI can then focus on presentation (printing, plotting, exports).

use std::path::{Path, PathBuf};

use crate::domain::{
    FitMode, FitSettings, GainFit, GainMeasurement, Instrument, Measurement, NoiseFit,
};
use crate::error::AppError;
use crate::fit::{fit_gain, fit_noise};
use crate::io::ingest::{read_gain_csv, read_noise_csv};

/// A noise-fit run's configuration as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct NoiseRunConfig {
    pub csv_path: PathBuf,
    pub phase_noise: bool,
    pub detection_frequency: f64,
    pub cavity_hwhm: f64,
    pub fixed_threshold: Option<f64>,
}

/// All computed outputs of a single `sq fit` run.
#[derive(Debug, Clone)]
pub struct NoiseRunOutput {
    pub measurement: Measurement,
    pub instrument: Instrument,
    pub fit: NoiseFit,
}

/// Execute the full noise-fit pipeline.
pub fn run_noise_fit(config: &NoiseRunConfig) -> Result<NoiseRunOutput, AppError> {
    let instrument = Instrument::new(config.detection_frequency, config.cavity_hwhm)?;
    let settings = FitSettings::new(
        FitMode::from_phase_noise_flag(config.phase_noise),
        instrument,
        config.fixed_threshold,
    )?;

    let measurement = read_noise_csv(&config.csv_path)?;
    let fit = fit_noise(&measurement, &settings)?;

    Ok(NoiseRunOutput {
        measurement,
        instrument,
        fit,
    })
}

/// Execute the gain-fit pipeline.
pub fn run_gain_fit(csv_path: &Path) -> Result<(GainMeasurement, GainFit), AppError> {
    let measurement = read_gain_csv(csv_path)?;
    let fit = fit_gain(&measurement)?;
    Ok((measurement, fit))
}
