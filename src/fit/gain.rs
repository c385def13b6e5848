//! Single-parameter gain-threshold fit.
//!
//! The parametric gain below threshold follows
//! `G(P) = 1 / (1 - sqrt(P / P_th))^2`; the only unknown is `P_th`. We fit
//! in log space so near-threshold points (where the gain explodes) do not
//! dominate the objective, matching the reference analysis.

use nalgebra::DVector;

use crate::domain::{FitQuality, GainCurve, GainFit, GainMeasurement};
use crate::error::AppError;
use crate::math::{LmOptions, lin_space, solve_bounded};
use crate::models::{log_parametric_gain, parametric_gain};

/// Reference grid density for the gain overlay curve.
pub const GAIN_CURVE_POINTS: usize = 500;

/// Reference initial guess for the threshold power (mW).
const P_TH_GUESS: f64 = 40.0;

/// Fit the threshold power from parametric-gain data.
pub fn fit_gain(measurement: &GainMeasurement) -> Result<GainFit, AppError> {
    let power = measurement.power();
    let log_gain: Vec<f64> = measurement.gain().iter().map(|g| g.ln()).collect();

    let residual = |x: &DVector<f64>| {
        DVector::from_iterator(
            power.len(),
            power
                .iter()
                .zip(log_gain.iter())
                .map(|(&p, &lg)| log_parametric_gain(p, x[0]) - lg),
        )
    };

    // Below threshold the gain is finite only for P_th above every observed
    // power, so the guess must start past the data or the model diverges at
    // the first evaluation.
    let max_power = power.iter().cloned().fold(0.0f64, f64::max);
    let p_th0 = P_TH_GUESS.max(1.05 * max_power);

    let solution = solve_bounded(
        residual,
        &DVector::from_row_slice(&[p_th0]),
        &DVector::from_row_slice(&[0.0]),
        &DVector::from_row_slice(&[f64::INFINITY]),
        &LmOptions::default(),
    )?;

    let p_th = solution.x[0];
    let n_residuals = measurement.len();
    let quality = FitQuality {
        sse: solution.sse,
        rmse: (solution.sse / n_residuals as f64).sqrt(),
        n_residuals,
        iterations: solution.iterations,
    };

    let grid = lin_space(0.0, p_th, GAIN_CURVE_POINTS);
    let gain = grid.iter().map(|&p| parametric_gain(p, p_th)).collect();

    Ok(GainFit {
        p_th,
        quality,
        curve: GainCurve { power: grid, gain },
    })
}
