//! Synthetic squeezing dataset generation.
//!
//! Generates noisy (sq, asq) observations from known model parameters. Used
//! for demos and for exercising the fitter end-to-end: fit the generated
//! file and compare the recovered parameters against the spec printed in the
//! CSV comment header.
//!
//! Generation is fully deterministic given the seed (no hidden randomness).

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{FitMode, Instrument, Measurement};
use crate::error::AppError;
use crate::models::quadrature_db;

/// True parameters and layout of a synthetic dataset.
#[derive(Debug, Clone, Copy)]
pub struct SampleSpec {
    pub eta: f64,
    pub p_th: f64,
    /// Phase-noise angle; 0 generates two-parameter data.
    pub epsilon: f64,
    pub instrument: Instrument,
    /// Number of (power, sq, asq) triples.
    pub n_points: usize,
    /// Largest pump power as a fraction of `p_th` (must stay below 1).
    pub max_power_frac: f64,
    /// Standard deviation of the additive Gaussian noise (dB).
    pub noise_db: f64,
    pub seed: u64,
}

/// A generated dataset together with the spec that produced it.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub measurement: Measurement,
    pub spec: SampleSpec,
}

/// Generate a synthetic measurement set from known parameters.
pub fn generate_sample(spec: &SampleSpec) -> Result<SampleData, AppError> {
    if spec.n_points == 0 {
        return Err(AppError::configuration("Sample point count must be > 0."));
    }
    if !(spec.eta.is_finite() && (0.0..=1.0).contains(&spec.eta)) {
        return Err(AppError::domain(format!(
            "Sample eta must lie in [0, 1] (got {}).",
            spec.eta
        )));
    }
    if !(spec.p_th.is_finite() && spec.p_th > 0.0) {
        return Err(AppError::domain(format!(
            "Sample threshold power must be > 0 mW (got {}).",
            spec.p_th
        )));
    }
    if !(spec.epsilon.is_finite() && (0.0..=std::f64::consts::FRAC_PI_4).contains(&spec.epsilon)) {
        return Err(AppError::domain(format!(
            "Sample phase-noise angle must lie in [0, pi/4] rad (got {}).",
            spec.epsilon
        )));
    }
    if !(spec.max_power_frac > 0.0 && spec.max_power_frac < 1.0) {
        return Err(AppError::domain(
            "Max power fraction must lie strictly between 0 and 1 (the model has a pole at threshold).",
        ));
    }
    if !(spec.noise_db.is_finite() && spec.noise_db >= 0.0) {
        return Err(AppError::domain(format!(
            "Noise level must be >= 0 dB (got {}).",
            spec.noise_db
        )));
    }

    let mode = if spec.epsilon > 0.0 {
        FitMode::ThreeParameter
    } else {
        FitMode::TwoParameter
    };
    let ratio = spec.instrument.detuning_ratio_sq();

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, spec.noise_db.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::domain(format!("Noise distribution error: {e}")))?;

    let p_max = spec.max_power_frac * spec.p_th;
    let n = spec.n_points;

    let mut power = Vec::with_capacity(n);
    let mut sq_db = Vec::with_capacity(n);
    let mut asq_db = Vec::with_capacity(n);

    for i in 0..n {
        // Evenly spaced, skipping zero pump (a vacuum point carries no
        // information about eta or the threshold).
        let p = p_max * (i as f64 + 1.0) / n as f64;
        let (sq, asq) = quadrature_db(mode, p, spec.eta, spec.p_th, spec.epsilon, ratio);
        let noise = if spec.noise_db > 0.0 {
            (normal.sample(&mut rng), normal.sample(&mut rng))
        } else {
            (0.0, 0.0)
        };
        power.push(p);
        sq_db.push(sq + noise.0);
        asq_db.push(asq + noise.1);
    }

    let measurement = Measurement::new(power, sq_db, asq_db)?;
    Ok(SampleData {
        measurement,
        spec: *spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SampleSpec {
        SampleSpec {
            eta: 0.75,
            p_th: 40.0,
            epsilon: 0.0,
            instrument: Instrument::new(5.0, 20.3).unwrap(),
            n_points: 8,
            max_power_frac: 0.5,
            noise_db: 0.1,
            seed: 42,
        }
    }

    #[test]
    fn sample_is_deterministic_for_a_seed() {
        let a = generate_sample(&spec()).unwrap();
        let b = generate_sample(&spec()).unwrap();
        assert_eq!(a.measurement.sq_db(), b.measurement.sq_db());
        assert_eq!(a.measurement.asq_db(), b.measurement.asq_db());
    }

    #[test]
    fn sample_stays_below_threshold() {
        let data = generate_sample(&spec()).unwrap();
        assert_eq!(data.measurement.len(), 8);
        assert!(data.measurement.max_power() < 40.0);
        assert!(data.measurement.power().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn noiseless_sample_matches_the_model_exactly() {
        let mut s = spec();
        s.noise_db = 0.0;
        let data = generate_sample(&s).unwrap();
        let ratio = s.instrument.detuning_ratio_sq();
        for (i, &p) in data.measurement.power().iter().enumerate() {
            let (sq, _) = quadrature_db(FitMode::TwoParameter, p, 0.75, 40.0, 0.0, ratio);
            assert_eq!(data.measurement.sq_db()[i], sq);
        }
    }

    #[test]
    fn rejects_fraction_reaching_threshold() {
        let mut s = spec();
        s.max_power_frac = 1.0;
        assert!(generate_sample(&s).is_err());
    }
}
