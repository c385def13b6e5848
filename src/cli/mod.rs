//! Command-line parsing for the squeezing-curve analysis toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sq", version, about = "Squeezing-curve analysis toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the squeezing/antisqueezing noise model to a measurement CSV.
    Fit(FitArgs),
    /// Fit the threshold power from parametric-gain data.
    Gain(GainArgs),
    /// Generate a synthetic noisy measurement CSV from known parameters.
    Sample(SampleArgs),
    /// Compute the intracavity loss from a reflection measurement.
    Loss(LossArgs),
    /// Compute the homodyne visibility from interference extrema.
    Visibility(VisibilityArgs),
    /// Remove the electronic-noise floor from a measured variance.
    Clearance(ClearanceArgs),
    /// Re-plot a previously exported fit JSON.
    Plot(PlotArgs),
}

/// Options for the noise fit.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Measurement CSV with columns `power,sq_db,asq_db`.
    pub csv: PathBuf,

    /// Model residual phase noise (fits a third parameter epsilon).
    #[arg(long)]
    pub phase_noise: bool,

    /// Detection frequency (MHz).
    #[arg(long, default_value_t = 5.0)]
    pub detection_frequency: f64,

    /// Cavity decay rate, HWHM (MHz).
    #[arg(long, default_value_t = 20.3)]
    pub cavity_hwhm: f64,

    /// Pin the threshold power to this value (mW) instead of fitting it.
    #[arg(long = "p-th")]
    pub fixed_threshold: Option<f64>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the fit (parameters + curve + observations) to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the dense model curve to CSV.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for the gain-threshold fit.
#[derive(Debug, Parser, Clone)]
pub struct GainArgs {
    /// Gain CSV with columns `power,v,v0`.
    pub csv: PathBuf,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the fit to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long)]
    pub out: PathBuf,

    /// True detection efficiency.
    #[arg(long, default_value_t = 0.75)]
    pub eta: f64,

    /// True threshold power (mW).
    #[arg(long = "p-th", default_value_t = 40.0)]
    pub p_th: f64,

    /// True phase-noise angle (rad); 0 generates two-parameter data.
    #[arg(long, default_value_t = 0.0)]
    pub epsilon: f64,

    /// Number of measurement points.
    #[arg(long, default_value_t = 8)]
    pub points: usize,

    /// Largest pump power as a fraction of the threshold.
    #[arg(long, default_value_t = 0.5)]
    pub max_power_frac: f64,

    /// Gaussian noise level (dB).
    #[arg(long, default_value_t = 0.1)]
    pub noise_db: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Detection frequency (MHz).
    #[arg(long, default_value_t = 5.0)]
    pub detection_frequency: f64,

    /// Cavity decay rate, HWHM (MHz).
    #[arg(long, default_value_t = 20.3)]
    pub cavity_hwhm: f64,
}

/// Inputs for the intracavity-loss calculator.
#[derive(Debug, Parser, Clone)]
pub struct LossArgs {
    /// Cavity mirror transmission, in [0, 1].
    #[arg(long)]
    pub transmission: f64,

    /// Reflected power at resonance.
    #[arg(long)]
    pub p_refl: f64,

    /// Input power.
    #[arg(long)]
    pub p_in: f64,

    /// Mode matching, in (0, 1].
    #[arg(long, default_value_t = 1.0)]
    pub mode_matching: f64,
}

/// Inputs for the visibility calculator.
#[derive(Debug, Parser, Clone)]
pub struct VisibilityArgs {
    /// Intensity of the first field.
    #[arg(long)]
    pub i1: f64,

    /// Intensity of the second field.
    #[arg(long)]
    pub i2: f64,

    /// Maximum interference intensity.
    #[arg(long)]
    pub i_max: f64,

    /// Minimum interference intensity.
    #[arg(long)]
    pub i_min: f64,

    /// Detector floor level subtracted from all four intensities.
    #[arg(long, default_value_t = 0.0)]
    pub floor: f64,
}

/// Inputs for the clearance correction.
#[derive(Debug, Parser, Clone)]
pub struct ClearanceArgs {
    /// Measured variance relative to vacuum (dB).
    #[arg(long)]
    pub variance: f64,

    /// Dark-noise clearance of the detector (dB, > 0).
    #[arg(long)]
    pub clearance: f64,
}

/// Options for re-plotting a saved fit.
#[derive(Debug, Parser, Clone)]
pub struct PlotArgs {
    /// Fit JSON file produced by `sq fit --export`.
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
