//! Dense model curves for overlay plotting.

use crate::domain::{CurveGrid, FitMode, NoiseParams};
use crate::math::lin_space;
use crate::models::quadrature_db;

/// Reference grid density for the noise-fit overlay curve.
pub const NOISE_CURVE_POINTS: usize = 1000;

/// Evaluate the noise model on a dense grid from 0 to the fitted threshold.
///
/// The endpoint `P_th` is evaluated unguarded: at zero detuning the
/// antisqueezing denominator vanishes there and the final `asq_db` value is
/// `+inf` (propagated, not clamped — consumers skip non-finite samples when
/// rendering). With a nonzero detuning ratio the endpoint is finite.
pub fn dense_noise_curve(
    params: &NoiseParams,
    mode: FitMode,
    detuning_ratio_sq: f64,
    points: usize,
) -> CurveGrid {
    let power = lin_space(0.0, params.p_th, points);
    let mut sq_db = Vec::with_capacity(power.len());
    let mut asq_db = Vec::with_capacity(power.len());

    for &p in &power {
        let (sq, asq) = quadrature_db(mode, p, params.eta, params.p_th, params.epsilon, detuning_ratio_sq);
        sq_db.push(sq);
        asq_db.push(asq);
    }

    CurveGrid { power, sq_db, asq_db }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_spans_zero_to_threshold() {
        let params = NoiseParams {
            eta: 0.75,
            p_th: 40.0,
            epsilon: 0.0,
        };
        let curve = dense_noise_curve(&params, FitMode::TwoParameter, 0.0607, NOISE_CURVE_POINTS);

        assert_eq!(curve.power.len(), NOISE_CURVE_POINTS);
        assert_eq!(curve.power[0], 0.0);
        assert_eq!(*curve.power.last().unwrap(), 40.0);
        for w in curve.power.windows(2) {
            assert!(w[1] > w[0]);
        }
        // Vacuum level at zero pump; with a nonzero detuning ratio the
        // threshold endpoint is large but finite.
        assert_eq!(curve.sq_db[0], 0.0);
        assert_eq!(curve.asq_db[0], 0.0);
        assert!(curve.sq_db.iter().all(|v| v.is_finite()));
        assert!(curve.asq_db.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_detuning_endpoint_propagates_the_pole() {
        let params = NoiseParams {
            eta: 0.9,
            p_th: 20.0,
            epsilon: 0.0,
        };
        let curve = dense_noise_curve(&params, FitMode::TwoParameter, 0.0, 100);
        assert!(curve.asq_db.last().unwrap().is_infinite());
        assert!(curve.asq_db[..99].iter().all(|v| v.is_finite()));
    }
}
