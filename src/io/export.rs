//! Export fitted results to JSON/CSV.
//!
//! JSON is the "portable" representation of a fit (parameters + quality +
//! dense curve + the observed points), re-plottable later via `sq plot`.
//! CSV exports are meant for spreadsheets and downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{FitFile, GainFit, Instrument, Measurement, NoiseFit};
use crate::error::AppError;

/// Write a noise fit (with its observed points) to a JSON file.
pub fn write_fit_json(
    path: &Path,
    fit: &NoiseFit,
    instrument: &Instrument,
    measurement: &Measurement,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create fit JSON '{}': {e}", path.display()))
    })?;

    let out = FitFile {
        tool: "sq".to_string(),
        exported: chrono::Local::now().date_naive(),
        instrument: *instrument,
        fit: fit.clone(),
        observed_power: measurement.power().to_vec(),
        observed_sq_db: measurement.sq_db().to_vec(),
        observed_asq_db: measurement.asq_db().to_vec(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::io(format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file back.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

/// Write the dense noise curve to CSV (`power,sq_db,asq_db`).
///
/// Non-finite samples (the unguarded threshold endpoint) are written as-is;
/// `f64` formatting produces `inf`/`NaN` tokens that downstream tools must
/// filter, matching the propagate-don't-clamp policy.
pub fn write_curve_csv(path: &Path, fit: &NoiseFit) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create curve CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "power,sq_db,asq_db")
        .map_err(|e| AppError::io(format!("Failed to write curve CSV header: {e}")))?;
    let curve = &fit.curve;
    for i in 0..curve.power.len() {
        writeln!(
            file,
            "{:.6},{:.6},{:.6}",
            curve.power[i], curve.sq_db[i], curve.asq_db[i]
        )
        .map_err(|e| AppError::io(format!("Failed to write curve CSV row: {e}")))?;
    }
    Ok(())
}

/// Write a gain fit to a JSON file.
pub fn write_gain_json(path: &Path, fit: &GainFit) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create gain JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::io(format!("Failed to write gain JSON: {e}")))?;
    Ok(())
}

/// Write a generated sample dataset as a noise CSV, with the generation spec
/// in a comment header so the "right answer" travels with the file.
pub fn write_sample_csv(
    path: &Path,
    data: &crate::data::SampleData,
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create sample CSV '{}': {e}", path.display()))
    })?;

    let spec = &data.spec;
    writeln!(
        file,
        "# sq sample | {} | eta={} p_th={} epsilon={} noise_db={} seed={}",
        chrono::Local::now().date_naive(),
        spec.eta,
        spec.p_th,
        spec.epsilon,
        spec.noise_db,
        spec.seed,
    )
    .map_err(|e| AppError::io(format!("Failed to write sample CSV header: {e}")))?;
    writeln!(file, "power,sq_db,asq_db")
        .map_err(|e| AppError::io(format!("Failed to write sample CSV header: {e}")))?;

    let m = &data.measurement;
    for i in 0..m.len() {
        writeln!(
            file,
            "{:.6},{:.6},{:.6}",
            m.power()[i],
            m.sq_db()[i],
            m.asq_db()[i]
        )
        .map_err(|e| AppError::io(format!("Failed to write sample CSV row: {e}")))?;
    }
    Ok(())
}
