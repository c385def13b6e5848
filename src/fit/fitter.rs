//! The bounded noise-model fit.
//!
//! Given a validated [`Measurement`] and [`FitSettings`], we:
//!
//! - enforce the mode-dependent minimum-points rule
//! - build the initial guess and bound box for the chosen variant
//! - drive the bounded Levenberg–Marquardt solve over the combined
//!   squeezing + antisqueezing residual vector
//! - evaluate the dense overlay curve at the fitted parameters
//!
//! Initial guesses follow the reference tool: `eta = 0.8`, `P_th = 50` (or
//! the supplied fixed value), `epsilon = 0.2` when phase noise is modeled.
//! A fixed threshold is a *soft pin*: the box collapses to
//! `[T - 1e-3, T + 1e-3]` rather than an equality constraint, so
//! `|P_th_fit - T| <= 1e-3` holds by construction.

use nalgebra::DVector;
use std::f64::consts::FRAC_PI_4;

use crate::domain::{FitMode, FitQuality, FitSettings, Measurement, NoiseFit, NoiseParams};
use crate::error::AppError;
use crate::fit::curve::{NOISE_CURVE_POINTS, dense_noise_curve};
use crate::fit::residual::NoiseResidual;
use crate::math::{LmOptions, solve_bounded};

/// Half-width of the threshold pin box (mW).
const THRESHOLD_PIN: f64 = 1e-3;

/// Default free-fit initial guesses.
const ETA_GUESS: f64 = 0.8;
const P_TH_GUESS: f64 = 50.0;
const EPSILON_GUESS: f64 = 0.2;

/// Fit the noise model to a measurement set.
pub fn fit_noise(measurement: &Measurement, settings: &FitSettings) -> Result<NoiseFit, AppError> {
    let combined = measurement.combined_points();
    if combined < settings.mode.min_combined_points() {
        return Err(match settings.mode {
            FitMode::ThreeParameter => AppError::configuration(format!(
                "At least 2 combined squeezing and antisqueezing points are required to fit \
                 3 parameters (got {combined}).",
            )),
            FitMode::TwoParameter => AppError::configuration(
                "At least 1 squeezing or antisqueezing point is required.",
            ),
        });
    }

    let residual = NoiseResidual::new(measurement, settings);
    let (x0, lo, hi) = initial_box(settings);

    let solution = solve_bounded(
        |x| residual.eval(x),
        &x0,
        &lo,
        &hi,
        &LmOptions::default(),
    )?;

    let params = NoiseParams {
        eta: solution.x[0],
        p_th: solution.x[1],
        epsilon: match settings.mode {
            FitMode::TwoParameter => 0.0,
            FitMode::ThreeParameter => solution.x[2],
        },
    };

    let n_residuals = residual.len();
    let quality = FitQuality {
        sse: solution.sse,
        rmse: (solution.sse / n_residuals as f64).sqrt(),
        n_residuals,
        iterations: solution.iterations,
    };

    let curve = dense_noise_curve(
        &params,
        settings.mode,
        settings.instrument.detuning_ratio_sq(),
        NOISE_CURVE_POINTS,
    );

    Ok(NoiseFit {
        mode: settings.mode,
        params,
        quality,
        curve,
    })
}

/// Initial guess and bound box for the chosen model variant.
fn initial_box(settings: &FitSettings) -> (DVector<f64>, DVector<f64>, DVector<f64>) {
    let p_th_guess = settings.fixed_threshold.unwrap_or(P_TH_GUESS);
    let (p_lo, p_hi) = match settings.fixed_threshold {
        Some(t) => (t - THRESHOLD_PIN, t + THRESHOLD_PIN),
        None => (0.0, f64::INFINITY),
    };

    match settings.mode {
        FitMode::TwoParameter => (
            DVector::from_row_slice(&[ETA_GUESS, p_th_guess]),
            DVector::from_row_slice(&[0.0, p_lo]),
            DVector::from_row_slice(&[1.0, p_hi]),
        ),
        FitMode::ThreeParameter => (
            DVector::from_row_slice(&[ETA_GUESS, p_th_guess, EPSILON_GUESS]),
            DVector::from_row_slice(&[0.0, p_lo, 0.0]),
            DVector::from_row_slice(&[1.0, p_hi, FRAC_PI_4]),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Instrument;
    use crate::error::ErrorKind;
    use crate::models::quadrature_db;

    fn instrument() -> Instrument {
        Instrument::new(5.0, 20.3).unwrap()
    }

    fn synthetic(power: &[f64], eta: f64, p_th: f64) -> Measurement {
        let ratio = instrument().detuning_ratio_sq();
        let (mut sq, mut asq) = (Vec::new(), Vec::new());
        for &p in power {
            let (s, a) = quadrature_db(FitMode::TwoParameter, p, eta, p_th, 0.0, ratio);
            sq.push(s);
            asq.push(a);
        }
        Measurement::new(power.to_vec(), sq, asq).unwrap()
    }

    #[test]
    fn three_parameter_mode_needs_three_combined_points() {
        let m = Measurement::new(vec![5.0], vec![-1.0], vec![3.0]).unwrap();
        let settings =
            FitSettings::new(FitMode::ThreeParameter, instrument(), None).unwrap();
        let err = fit_noise(&m, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn two_parameter_mode_rejects_empty_data() {
        let m = Measurement::new(vec![], vec![], vec![]).unwrap();
        let settings = FitSettings::new(FitMode::TwoParameter, instrument(), None).unwrap();
        let err = fit_noise(&m, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn noiseless_round_trip_recovers_parameters() {
        let m = synthetic(&[5.0, 10.0, 15.0, 20.0], 0.75, 40.0);
        let settings = FitSettings::new(FitMode::TwoParameter, instrument(), None).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();

        assert!((fit.params.eta - 0.75).abs() < 1e-3);
        assert!((fit.params.p_th - 40.0).abs() < 1e-3);
        assert_eq!(fit.params.epsilon, 0.0);
    }

    #[test]
    fn pinned_threshold_stays_within_tolerance() {
        let m = synthetic(&[5.0, 10.0, 15.0, 20.0], 0.75, 40.0);
        // Pin to a value away from the true threshold; the pin must win.
        let settings =
            FitSettings::new(FitMode::TwoParameter, instrument(), Some(45.0)).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();
        assert!((fit.params.p_th - 45.0).abs() <= 1e-3);
    }

    #[test]
    fn pinned_threshold_holds_at_large_pin_values() {
        // The pin half-width is absolute, so at this scale it is far below
        // the parameter's own resolution; the fit must still honor it.
        let m = synthetic(&[5.0, 10.0, 15.0, 20.0], 0.75, 40.0);
        let settings =
            FitSettings::new(FitMode::TwoParameter, instrument(), Some(1.0e5)).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();

        assert!((fit.params.p_th - 1.0e5).abs() <= 1e-3);
        assert!(fit.params.eta >= 0.0 && fit.params.eta <= 1.0);
    }

    #[test]
    fn fit_never_worsens_the_initial_guess() {
        let m = Measurement::new(
            vec![4.0, 8.0, 12.0, 16.0],
            vec![-1.2, -1.9, -2.4, -2.6],
            vec![2.1, 3.8, 5.4, 7.0],
        )
        .unwrap();
        let settings = FitSettings::new(FitMode::TwoParameter, instrument(), None).unwrap();

        let residual = NoiseResidual::new(&m, &settings);
        let guess_sse = residual
            .eval(&DVector::from_row_slice(&[ETA_GUESS, P_TH_GUESS]))
            .norm_squared();

        let fit = fit_noise(&m, &settings).unwrap();
        assert!(fit.quality.sse <= guess_sse);
    }

    #[test]
    fn two_point_scenario_converges_past_observed_power() {
        let m = Measurement::new(vec![6.0, 10.0], vec![-1.5, -2.0], vec![4.0, 6.0]).unwrap();
        let settings = FitSettings::new(FitMode::TwoParameter, instrument(), None).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();

        assert!(fit.params.eta >= 0.0 && fit.params.eta <= 1.0);
        // The threshold must land beyond the largest observed pump power.
        assert!(fit.params.p_th > 10.0);
        for w in fit.curve.power.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn three_parameter_round_trip_with_phase_noise() {
        let ratio = instrument().detuning_ratio_sq();
        let power = vec![5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
        let (mut sq, mut asq) = (Vec::new(), Vec::new());
        for &p in &power {
            let (s, a) = quadrature_db(FitMode::ThreeParameter, p, 0.85, 40.0, 0.1, ratio);
            sq.push(s);
            asq.push(a);
        }
        let m = Measurement::new(power, sq, asq).unwrap();
        let settings =
            FitSettings::new(FitMode::ThreeParameter, instrument(), None).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();

        assert!((fit.params.eta - 0.85).abs() < 1e-2);
        assert!((fit.params.p_th - 40.0).abs() < 1e-1);
        assert!((fit.params.epsilon - 0.1).abs() < 1e-2);
    }
}
