//! Residual construction for the noise fit.
//!
//! The fit couples both quadratures into a single objective: the residual
//! vector is `concat(model_sq - observed_sq, model_asq - observed_asq)`,
//! length `2N`, and the optimizer drives it to zero. The two model variants
//! are resolved once at construction time; the hot evaluation path contains
//! no flag checks beyond the already-resolved `FitMode` dispatch inside the
//! forward model.

use nalgebra::DVector;

use crate::domain::{FitMode, FitSettings, Measurement};
use crate::models::quadrature_db;

/// Squeezing/antisqueezing residual vector as a function of the parameters.
///
/// Borrows the measurement; pure and side-effect-free, evaluated many times
/// per fit by the optimizer.
#[derive(Debug, Clone)]
pub struct NoiseResidual<'a> {
    power: &'a [f64],
    sq_obs: &'a [f64],
    asq_obs: &'a [f64],
    detuning_ratio_sq: f64,
    mode: FitMode,
}

impl<'a> NoiseResidual<'a> {
    pub fn new(measurement: &'a Measurement, settings: &FitSettings) -> Self {
        Self {
            power: measurement.power(),
            sq_obs: measurement.sq_db(),
            asq_obs: measurement.asq_db(),
            detuning_ratio_sq: settings.instrument.detuning_ratio_sq(),
            mode: settings.mode,
        }
    }

    /// Residual vector length (`2N`).
    pub fn len(&self) -> usize {
        2 * self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Evaluate the residual vector at a parameter point.
    ///
    /// Layout: `x = [eta, p_th]` in two-parameter mode,
    /// `x = [eta, p_th, epsilon]` in three-parameter mode.
    pub fn eval(&self, x: &DVector<f64>) -> DVector<f64> {
        let eta = x[0];
        let p_th = x[1];
        let epsilon = match self.mode {
            FitMode::TwoParameter => 0.0,
            FitMode::ThreeParameter => x[2],
        };

        let n = self.power.len();
        let mut out = DVector::<f64>::zeros(2 * n);
        for i in 0..n {
            let (sq, asq) = quadrature_db(
                self.mode,
                self.power[i],
                eta,
                p_th,
                epsilon,
                self.detuning_ratio_sq,
            );
            out[i] = sq - self.sq_obs[i];
            out[n + i] = asq - self.asq_obs[i];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Instrument;

    fn settings(mode: FitMode) -> FitSettings {
        FitSettings::new(mode, Instrument::new(5.0, 20.3).unwrap(), None).unwrap()
    }

    #[test]
    fn residual_is_zero_on_exact_model_data() {
        let inst = Instrument::new(5.0, 20.3).unwrap();
        let power = vec![5.0, 10.0, 15.0];
        let (mut sq, mut asq) = (Vec::new(), Vec::new());
        for &p in &power {
            let (s, a) =
                quadrature_db(FitMode::TwoParameter, p, 0.75, 40.0, 0.0, inst.detuning_ratio_sq());
            sq.push(s);
            asq.push(a);
        }
        let m = Measurement::new(power, sq, asq).unwrap();
        let residual = NoiseResidual::new(&m, &settings(FitMode::TwoParameter));

        let r = residual.eval(&DVector::from_row_slice(&[0.75, 40.0]));
        assert_eq!(r.len(), 6);
        assert!(r.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn residual_layout_is_sq_then_asq() {
        let m = Measurement::new(vec![10.0], vec![-5.0], vec![3.0]).unwrap();
        let residual = NoiseResidual::new(&m, &settings(FitMode::TwoParameter));
        let r = residual.eval(&DVector::from_row_slice(&[0.9, 40.0]));

        let inst = Instrument::new(5.0, 20.3).unwrap();
        let (sq, asq) =
            quadrature_db(FitMode::TwoParameter, 10.0, 0.9, 40.0, 0.0, inst.detuning_ratio_sq());
        assert!((r[0] - (sq - -5.0)).abs() < 1e-12);
        assert!((r[1] - (asq - 3.0)).abs() < 1e-12);
    }
}
