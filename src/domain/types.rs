//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons
//!
//! Invariants are enforced **once** in constructors; downstream code (models,
//! residuals, optimizer) can assume they hold and stay branch-free.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A validated squeezing measurement set.
///
/// Three parallel sequences: pump power (mW), squeezing variance (dB) and
/// antisqueezing variance (dB). Equal length and finiteness are structural
/// invariants; the fields are private so they cannot be broken after
/// construction.
#[derive(Debug, Clone)]
pub struct Measurement {
    power: Vec<f64>,
    sq_db: Vec<f64>,
    asq_db: Vec<f64>,
}

impl Measurement {
    /// Build a measurement set, validating shape and values.
    ///
    /// Length mismatches are configuration errors (the user paired the wrong
    /// columns); non-finite or negative power values are validation errors.
    pub fn new(power: Vec<f64>, sq_db: Vec<f64>, asq_db: Vec<f64>) -> Result<Self, AppError> {
        if power.len() != sq_db.len() || power.len() != asq_db.len() {
            return Err(AppError::configuration(format!(
                "Pump power, squeezing and antisqueezing must have the same number of points \
                 (got {} / {} / {}).",
                power.len(),
                sq_db.len(),
                asq_db.len()
            )));
        }
        for (i, &p) in power.iter().enumerate() {
            if !p.is_finite() || p < 0.0 {
                return Err(AppError::validation(format!(
                    "Pump power must be finite and >= 0 mW (point {i}: {p})."
                )));
            }
        }
        for (i, &v) in sq_db.iter().chain(asq_db.iter()).enumerate() {
            if !v.is_finite() {
                return Err(AppError::validation(format!(
                    "Variance data must be finite dB values (flat index {i}: {v})."
                )));
            }
        }
        Ok(Self { power, sq_db, asq_db })
    }

    /// Number of (power, sq, asq) triples.
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Combined count of squeezing + antisqueezing observations (`2N`).
    ///
    /// The minimum-points rule of the three-parameter model is phrased in
    /// terms of this combined count, not in pairs.
    pub fn combined_points(&self) -> usize {
        self.sq_db.len() + self.asq_db.len()
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    pub fn sq_db(&self) -> &[f64] {
        &self.sq_db
    }

    pub fn asq_db(&self) -> &[f64] {
        &self.asq_db
    }

    /// Largest observed pump power (0 for an empty set).
    pub fn max_power(&self) -> f64 {
        self.power.iter().copied().fold(0.0, f64::max)
    }
}

/// A validated parametric-gain measurement set.
///
/// `v` is the amplified quadrature variance, `v0` the unamplified reference;
/// the gain is `v / v0` point-by-point.
#[derive(Debug, Clone)]
pub struct GainMeasurement {
    power: Vec<f64>,
    gain: Vec<f64>,
}

impl GainMeasurement {
    pub fn new(power: Vec<f64>, v: Vec<f64>, v0: Vec<f64>) -> Result<Self, AppError> {
        if power.len() != v.len() || power.len() != v0.len() {
            return Err(AppError::configuration(format!(
                "Pump power, amplified and reference variance must have the same number of \
                 points (got {} / {} / {}).",
                power.len(),
                v.len(),
                v0.len()
            )));
        }
        if power.is_empty() {
            return Err(AppError::configuration(
                "At least one gain point is required to fit the threshold power.",
            ));
        }
        for (i, &p) in power.iter().enumerate() {
            if !p.is_finite() || p < 0.0 {
                return Err(AppError::validation(format!(
                    "Pump power must be finite and >= 0 mW (point {i}: {p})."
                )));
            }
        }
        let mut gain = Vec::with_capacity(power.len());
        for (i, (&a, &b)) in v.iter().zip(v0.iter()).enumerate() {
            if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
                return Err(AppError::validation(format!(
                    "Variances must be finite and > 0 to form a gain ratio (point {i}: {a} / {b})."
                )));
            }
            gain.push(a / b);
        }
        Ok(Self { power, gain })
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    pub fn gain(&self) -> &[f64] {
        &self.gain
    }
}

/// Fixed instrument parameters entering the coupling denominator.
///
/// Neither is fitted; both are in MHz. The model only ever sees the squared
/// detuning ratio `(f / f_HWHM)^2`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Instrument {
    detection_frequency: f64,
    cavity_hwhm: f64,
}

impl Instrument {
    pub fn new(detection_frequency: f64, cavity_hwhm: f64) -> Result<Self, AppError> {
        if !(detection_frequency.is_finite() && detection_frequency > 0.0) {
            return Err(AppError::domain(format!(
                "Detection frequency must be finite and > 0 MHz (got {detection_frequency})."
            )));
        }
        if !(cavity_hwhm.is_finite() && cavity_hwhm > 0.0) {
            return Err(AppError::domain(format!(
                "Cavity decay rate (HWHM) must be finite and > 0 MHz (got {cavity_hwhm})."
            )));
        }
        Ok(Self {
            detection_frequency,
            cavity_hwhm,
        })
    }

    pub fn detection_frequency(&self) -> f64 {
        self.detection_frequency
    }

    pub fn cavity_hwhm(&self) -> f64 {
        self.cavity_hwhm
    }

    /// `(f / f_HWHM)^2`, the only combination the forward model uses.
    pub fn detuning_ratio_sq(&self) -> f64 {
        let r = self.detection_frequency / self.cavity_hwhm;
        r * r
    }
}

/// Which noise-model variant to fit.
///
/// The variant is resolved **once** at configuration time; the residual
/// evaluation path never re-checks a flag. `TwoParameter` hard-fixes the
/// phase-noise angle at 0, `ThreeParameter` fits it in `[0, π/4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    TwoParameter,
    ThreeParameter,
}

impl FitMode {
    pub fn from_phase_noise_flag(phase_noise: bool) -> Self {
        if phase_noise {
            FitMode::ThreeParameter
        } else {
            FitMode::TwoParameter
        }
    }

    /// Number of free parameters.
    pub fn param_count(self) -> usize {
        match self {
            FitMode::TwoParameter => 2,
            FitMode::ThreeParameter => 3,
        }
    }

    /// Whether the phase-noise mixing term is part of the model.
    pub fn models_phase_noise(self) -> bool {
        self == FitMode::ThreeParameter
    }

    /// Minimum *combined* squeezing + antisqueezing observation count.
    ///
    /// Deliberately asymmetric: the three-parameter model requires at least 3
    /// combined points (so at least 2 pairs), while the two-parameter model
    /// permits a degenerate single-pair fit.
    pub fn min_combined_points(self) -> usize {
        match self {
            FitMode::TwoParameter => 1,
            FitMode::ThreeParameter => 3,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            FitMode::TwoParameter => "2-parameter (eta, P_th)",
            FitMode::ThreeParameter => "3-parameter (eta, P_th, epsilon)",
        }
    }
}

/// Scalar configuration of a noise fit.
#[derive(Debug, Clone, Copy)]
pub struct FitSettings {
    pub mode: FitMode,
    pub instrument: Instrument,
    /// When set, the threshold power is pinned to a `±1e-3 mW` box around
    /// this value instead of being fitted freely.
    pub fixed_threshold: Option<f64>,
}

impl FitSettings {
    pub fn new(
        mode: FitMode,
        instrument: Instrument,
        fixed_threshold: Option<f64>,
    ) -> Result<Self, AppError> {
        if let Some(t) = fixed_threshold {
            if !(t.is_finite() && t > 0.0) {
                return Err(AppError::domain(format!(
                    "Fixed threshold power must be finite and > 0 mW (got {t})."
                )));
            }
        }
        Ok(Self {
            mode,
            instrument,
            fixed_threshold,
        })
    }
}

/// Fitted noise-model parameters.
///
/// Only ever created by the fitter; `epsilon` is exactly 0 in two-parameter
/// mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Detection efficiency, in `[0, 1]`.
    pub eta: f64,
    /// Threshold pump power (mW).
    pub p_th: f64,
    /// Phase-noise angle (rad), in `[0, π/4]`.
    pub epsilon: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitQuality {
    /// Sum of squared residuals at the returned parameters.
    pub sse: f64,
    /// `sqrt(sse / n_residuals)`.
    pub rmse: f64,
    /// Length of the residual vector.
    pub n_residuals: usize,
    /// Accepted optimizer iterations.
    pub iterations: usize,
}

/// Dense model curve for overlay plotting.
///
/// The grid runs from 0 to the fitted threshold inclusive. The threshold
/// endpoint is evaluated unguarded; at zero detuning the antisqueezing value
/// there is `+inf`, so consumers must tolerate a non-finite tail sample
/// (propagate, never clamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub power: Vec<f64>,
    pub sq_db: Vec<f64>,
    pub asq_db: Vec<f64>,
}

/// Complete output of a noise fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseFit {
    pub mode: FitMode,
    pub params: NoiseParams,
    pub quality: FitQuality,
    pub curve: CurveGrid,
}

/// Dense parametric-gain curve for overlay plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainCurve {
    pub power: Vec<f64>,
    pub gain: Vec<f64>,
}

/// Output of the single-parameter gain-threshold fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainFit {
    /// Fitted threshold pump power (mW).
    pub p_th: f64,
    pub quality: FitQuality,
    pub curve: GainCurve,
}

/// A saved noise-fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub exported: NaiveDate,
    pub instrument: Instrument,
    pub fit: NoiseFit,
    /// Observed points, kept alongside the curve so a saved file can be
    /// re-plotted without the original CSV.
    pub observed_power: Vec<f64>,
    pub observed_sq_db: Vec<f64>,
    pub observed_asq_db: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn measurement_rejects_length_mismatch() {
        let err = Measurement::new(vec![1.0, 2.0], vec![-1.0], vec![3.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = Measurement::new(vec![1.0], vec![-1.0], vec![3.0, 4.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn measurement_rejects_bad_values() {
        let err = Measurement::new(vec![-1.0], vec![-1.0], vec![3.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Measurement::new(vec![1.0], vec![f64::NAN], vec![3.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn instrument_rejects_nonpositive_scalars() {
        assert!(Instrument::new(0.0, 20.3).is_err());
        assert!(Instrument::new(5.0, -1.0).is_err());
        let inst = Instrument::new(5.0, 20.3).unwrap();
        let r = 5.0 / 20.3;
        assert!((inst.detuning_ratio_sq() - r * r).abs() < 1e-15);
    }

    #[test]
    fn settings_reject_nonpositive_fixed_threshold() {
        let inst = Instrument::new(5.0, 20.3).unwrap();
        let err = FitSettings::new(FitMode::TwoParameter, inst, Some(0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(FitSettings::new(FitMode::TwoParameter, inst, Some(40.0)).is_ok());
    }

    #[test]
    fn gain_measurement_forms_ratio() {
        let g = GainMeasurement::new(vec![5.0, 10.0], vec![2.0, 4.0], vec![1.0, 2.0]).unwrap();
        assert_eq!(g.gain(), &[2.0, 2.0]);
    }

    #[test]
    fn min_combined_points_is_asymmetric() {
        assert_eq!(FitMode::TwoParameter.min_combined_points(), 1);
        assert_eq!(FitMode::ThreeParameter.min_combined_points(), 3);
    }
}
