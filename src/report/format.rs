//! Terminal report formatting.
//!
//! The fitted efficiency is reported in percent, the threshold in mW and the
//! phase-noise angle in mrad, matching how these quantities are quoted in
//! squeezing experiments.

use crate::calc::IntracavityLoss;
use crate::domain::{FitMode, GainFit, GainMeasurement, Instrument, Measurement, NoiseFit};
use crate::models::quadrature_db;

/// Format the full noise-fit summary (setup + parameters + diagnostics).
pub fn format_noise_summary(
    measurement: &Measurement,
    instrument: &Instrument,
    fit: &NoiseFit,
) -> String {
    let mut out = String::new();

    out.push_str("=== sq - Squeezing Noise Fit ===\n");
    out.push_str(&format!("Model: {}\n", fit.mode.display_name()));
    out.push_str(&format!(
        "Instrument: f = {} MHz | f_HWHM = {} MHz\n",
        instrument.detection_frequency(),
        instrument.cavity_hwhm(),
    ));
    out.push_str(&format!(
        "Points: n={} | power=[{:.2}, {:.2}] mW\n",
        measurement.len(),
        measurement.power().iter().copied().fold(f64::INFINITY, f64::min),
        measurement.max_power(),
    ));

    out.push_str("\nFitted parameters:\n");
    out.push_str(&format!("  eta     = {:.2} %\n", fit.params.eta * 100.0));
    out.push_str(&format!("  P_th    = {:.2} mW\n", fit.params.p_th));
    if fit.mode == FitMode::ThreeParameter {
        out.push_str(&format!(
            "  epsilon = {:.2} mrad\n",
            fit.params.epsilon * 1e3
        ));
    }

    out.push_str(&format!(
        "\nQuality: sse={:.4e} | rmse={:.4} dB | residuals={} | iterations={}\n",
        fit.quality.sse, fit.quality.rmse, fit.quality.n_residuals, fit.quality.iterations,
    ));

    out.push_str("\nResiduals (model - data):\n");
    out.push_str("  power[mW]   sq_obs   sq_res   asq_obs  asq_res\n");
    let ratio = instrument.detuning_ratio_sq();
    for i in 0..measurement.len() {
        let p = measurement.power()[i];
        let (sq, asq) = quadrature_db(
            fit.mode,
            p,
            fit.params.eta,
            fit.params.p_th,
            fit.params.epsilon,
            ratio,
        );
        out.push_str(&format!(
            "  {:>9.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3}\n",
            p,
            measurement.sq_db()[i],
            sq - measurement.sq_db()[i],
            measurement.asq_db()[i],
            asq - measurement.asq_db()[i],
        ));
    }

    out
}

/// Format the gain-fit summary.
pub fn format_gain_summary(measurement: &GainMeasurement, fit: &GainFit) -> String {
    let mut out = String::new();
    out.push_str("=== sq - Parametric Gain Fit ===\n");
    out.push_str(&format!(
        "Points: n={} | gain=[{:.3}, {:.3}]\n",
        measurement.len(),
        measurement.gain().iter().copied().fold(f64::INFINITY, f64::min),
        measurement.gain().iter().copied().fold(f64::NEG_INFINITY, f64::max),
    ));
    out.push_str(&format!("\n  P_th = {:.2} mW\n", fit.p_th));
    out.push_str(&format!(
        "\nQuality: sse={:.4e} | rmse={:.4} | residuals={} | iterations={}\n",
        fit.quality.sse, fit.quality.rmse, fit.quality.n_residuals, fit.quality.iterations,
    ));
    out
}

/// Format the intracavity-loss result.
pub fn format_loss(loss: &IntracavityLoss) -> String {
    format!(
        "Intracavity loss:\n  L1 (full)        = {:.6e}\n  L2 (thin mirror) = {:.6e}\n",
        loss.full, loss.thin_mirror
    )
}

/// Format the visibility result.
pub fn format_visibility(v: f64) -> String {
    format!("Visibility: {:.4} ({:.2} %)\n", v, v * 100.0)
}

/// Format the clearance-corrected variance.
pub fn format_clearance(var_db: f64, corrected_db: f64) -> String {
    format!(
        "Clearance correction:\n  measured  = {var_db:.3} dB\n  corrected = {corrected_db:.3} dB\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitSettings, Measurement};
    use crate::fit::fit_noise;

    #[test]
    fn summary_mentions_parameters_and_units() {
        let inst = Instrument::new(5.0, 20.3).unwrap();
        let m =
            Measurement::new(vec![6.0, 10.0], vec![-1.5, -2.0], vec![4.0, 6.0]).unwrap();
        let settings = FitSettings::new(FitMode::TwoParameter, inst, None).unwrap();
        let fit = fit_noise(&m, &settings).unwrap();

        let s = format_noise_summary(&m, &inst, &fit);
        assert!(s.contains("eta"));
        assert!(s.contains("P_th"));
        assert!(s.contains("mW"));
        // Two-parameter mode does not report a phase-noise angle.
        assert!(!s.contains("mrad"));
    }
}
