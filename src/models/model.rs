//! Forward models: squeezing/antisqueezing variances and parametric gain.
//!
//! The noise model maps pump power to the two quadrature variances of a
//! below-threshold optical parametric oscillator:
//!
//! ```text
//! c    = sqrt(P / P_th)                       (coupling parameter, c ∈ [0,1))
//! sq   = 1 - eta * 4c / ((1 + c)^2 + (f/f_HWHM)^2)
//! asq  = 1 + eta * 4c / ((1 - c)^2 + (f/f_HWHM)^2)
//! ```
//!
//! In three-parameter mode a residual phase jitter `epsilon` mixes the two
//! quadratures before the dB conversion.
//!
//! Singularity policy: the model is only physical for `power < P_th`. We
//! deliberately do **not** guard the `c >= 1` region: at zero detuning the
//! antisqueezing denominator vanishes at `power = P_th` (giving `+inf` dB),
//! and `power > P_th` can drive the linear squeezing variance negative,
//! making its log NaN. The optimizer treats non-finite residuals as a
//! rejected step, and curve consumers tolerate non-finite tail values.

use crate::domain::FitMode;

/// Linear (pre-dB) squeezing and antisqueezing variances, relative to vacuum.
pub fn quadrature_linear(power: f64, eta: f64, p_th: f64, detuning_ratio_sq: f64) -> (f64, f64) {
    let c = (power / p_th).sqrt();
    let sq = 1.0 - eta * (4.0 * c) / ((1.0 + c) * (1.0 + c) + detuning_ratio_sq);
    let asq = 1.0 + eta * (4.0 * c) / ((1.0 - c) * (1.0 - c) + detuning_ratio_sq);
    (sq, asq)
}

/// Squeezing and antisqueezing variances in dB.
///
/// The phase-noise mixing branch is selected by `mode`, not by the value of
/// `epsilon`: a three-parameter evaluation at `epsilon = 0` reduces to the
/// two-parameter form exactly (`cos^2 0 = 1`, `sin^2 0 = 0`).
pub fn quadrature_db(
    mode: FitMode,
    power: f64,
    eta: f64,
    p_th: f64,
    epsilon: f64,
    detuning_ratio_sq: f64,
) -> (f64, f64) {
    let (sq, asq) = quadrature_linear(power, eta, p_th, detuning_ratio_sq);
    match mode {
        FitMode::TwoParameter => (to_db(sq), to_db(asq)),
        FitMode::ThreeParameter => {
            let cos2 = epsilon.cos() * epsilon.cos();
            let sin2 = epsilon.sin() * epsilon.sin();
            (
                to_db(sq * cos2 + asq * sin2),
                to_db(asq * cos2 + sq * sin2),
            )
        }
    }
}

/// Parametric gain `G(P) = 1 / (1 - sqrt(P / P_th))^2`.
pub fn parametric_gain(power: f64, p_th: f64) -> f64 {
    let d = 1.0 - (power / p_th).sqrt();
    1.0 / (d * d)
}

/// Natural log of the parametric gain; the threshold fit works in log space
/// so high-gain points near threshold do not dominate the objective.
pub fn log_parametric_gain(power: f64, p_th: f64) -> f64 {
    parametric_gain(power, p_th).ln()
}

fn to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}
