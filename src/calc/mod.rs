//! Closed-form optics calculators.
//!
//! These are the purely algebraic companions of the curve fits: no iteration,
//! no coupling, no failure modes beyond range checks on the inputs. Each
//! function validates once and then evaluates a single formula.

use crate::error::AppError;

/// Intracavity loss estimates from a reflection measurement.
#[derive(Debug, Clone, Copy)]
pub struct IntracavityLoss {
    /// Full expression, valid for any mirror transmission.
    pub full: f64,
    /// Low-transmission approximation (`T << 1`).
    pub thin_mirror: f64,
}

/// Intracavity loss from mirror transmission `t`, reflected power on
/// resonance `p_refl`, input power `p_in` and mode matching `m`.
///
/// Both the full expression `L1` and the thin-mirror approximation `L2` are
/// returned; they agree to first order for small `t`.
pub fn intracavity_loss(
    t: f64,
    p_refl: f64,
    p_in: f64,
    m: f64,
) -> Result<IntracavityLoss, AppError> {
    if !(t.is_finite() && (0.0..=1.0).contains(&t)) {
        return Err(AppError::domain(format!(
            "Mirror transmission must lie in [0, 1] (got {t})."
        )));
    }
    if !(m.is_finite() && m > 0.0 && m <= 1.0) {
        return Err(AppError::domain(format!(
            "Mode matching must lie in (0, 1] (got {m})."
        )));
    }
    if !(p_in.is_finite() && p_refl.is_finite() && p_in > 0.0 && p_refl >= 0.0) {
        return Err(AppError::domain(format!(
            "Powers must be finite with P_in > 0 and P_refl >= 0 (got {p_refl} / {p_in})."
        )));
    }
    if p_refl > p_in {
        return Err(AppError::domain(format!(
            "Reflected power cannot exceed input power ({p_refl} > {p_in})."
        )));
    }

    // Dip depth of the mode-matched part of the reflection.
    let f = (p_refl - (1.0 - m) * p_in) / (m * p_in);
    if f < 0.0 {
        return Err(AppError::domain(
            "Reflected power is below the mode-mismatch floor; check P_refl, P_in and m.",
        ));
    }

    let full = t * (1.0 - f) / (1.0 + (f * (1.0 - t)).sqrt()).powi(2);
    let s = f.sqrt();
    let thin_mirror = t * (1.0 - s) / (1.0 + s);

    Ok(IntracavityLoss { full, thin_mirror })
}

/// Homodyne visibility from the two field intensities and the interference
/// extrema, with an optional common floor level subtracted from all four.
///
/// `v = (1 + beta) / (2 sqrt(beta)) * (Imax - Imin) / (Imax + Imin)` with
/// `beta = I1 / I2`; the prefactor corrects for unbalanced field powers.
pub fn visibility(
    i1: f64,
    i2: f64,
    i_max: f64,
    i_min: f64,
    floor: f64,
) -> Result<f64, AppError> {
    for (name, v) in [("I1", i1), ("I2", i2), ("Imax", i_max), ("Imin", i_min), ("floor", floor)] {
        if !v.is_finite() {
            return Err(AppError::domain(format!("{name} must be finite (got {v}).")));
        }
    }

    let i1 = i1 - floor;
    let i2 = i2 - floor;
    let i_max = i_max - floor;
    let i_min = i_min - floor;

    if i1 <= 0.0 || i2 <= 0.0 || i_max < 0.0 || i_min < 0.0 {
        return Err(AppError::domain(
            "Intensities must be positive after floor subtraction.",
        ));
    }
    if i_min >= i_max {
        return Err(AppError::domain(format!(
            "Minimum interference must be below the maximum ({i_min} >= {i_max})."
        )));
    }

    let beta = i1 / i2;
    Ok((1.0 + beta) / (2.0 * beta.sqrt()) * (i_max - i_min) / (i_max + i_min))
}

/// Remove the electronic-noise contribution from a measured variance.
///
/// `var_db` is the variance relative to vacuum (dB) and `clearance_db` the
/// dark-noise clearance of the detector (dB, > 0). Returns the corrected
/// variance in dB.
pub fn clearance_corrected(var_db: f64, clearance_db: f64) -> Result<f64, AppError> {
    if !(clearance_db.is_finite() && clearance_db > 0.0) {
        return Err(AppError::domain(format!(
            "Clearance must be finite and > 0 dB (got {clearance_db})."
        )));
    }
    if !var_db.is_finite() {
        return Err(AppError::domain(format!(
            "Variance must be finite (got {var_db})."
        )));
    }

    let noise = 10f64.powf(-clearance_db / 10.0);
    let signal = 10f64.powf(var_db / 10.0);
    if signal <= noise {
        return Err(AppError::domain(
            "Signal is at or below the electronic noise floor; clearance too low.",
        ));
    }

    Ok(-10.0 * (1.0 - noise).log10() + 10.0 * (signal - noise).log10())
}
