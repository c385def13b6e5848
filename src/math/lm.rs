//! Bounded Levenberg–Marquardt solver.
//!
//! In this project we solve small nonlinear least-squares problems of the form:
//!
//! ```text
//! minimize ||r(x)||^2   subject to   lo <= x <= hi
//! ```
//!
//! with 1–3 parameters and a few dozen residuals, so a dense implementation
//! on top of nalgebra is entirely adequate.
//!
//! Implementation choices:
//! - Numerical forward-difference Jacobian (the models are cheap to evaluate);
//!   the difference step flips to backward when a bound is in the way.
//! - Classic damping: solve `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr` via Cholesky,
//!   shrink λ on accepted steps, grow it on rejected ones.
//! - Box constraints by projection: candidate points are clamped into the box
//!   before evaluation, so the iterate never leaves it.
//! - Pinned parameters (degenerately narrow boxes) are held at the box
//!   midpoint and eliminated from the solve entirely. Clamping alone is not
//!   enough for them: every proposed step gets truncated to the box width and
//!   the iteration crawls, and at large parameter scales the finite-difference
//!   step can exceed the box width altogether.
//! - Only cost-decreasing steps are ever accepted, so the returned SSE is
//!   always <= the SSE at the initial guess.
//! - A step that lands on a non-finite residual vector (e.g. the threshold
//!   pole of the squeezing model) is rejected like any other bad step rather
//!   than special-cased.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Stopping tolerances and iteration budget.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Maximum accepted iterations before giving up with a convergence error.
    pub max_iters: usize,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Relative step-size tolerance.
    pub xtol: f64,
    /// Gradient infinity-norm tolerance (projected onto the box).
    pub gtol: f64,
    /// Initial damping factor.
    pub lambda_init: f64,
    /// Damping ceiling; beyond this no useful step exists.
    pub lambda_max: f64,
    /// Relative box width below which a parameter is treated as pinned and
    /// held at the box midpoint instead of being optimized over.
    pub pin_width: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-10,
            xtol: 1e-12,
            gtol: 1e-10,
            lambda_init: 1e-3,
            lambda_max: 1e14,
            pin_width: 1e-2,
        }
    }
}

/// Result of a successful bounded solve.
#[derive(Debug, Clone)]
pub struct LmSolution {
    /// Minimizing parameter vector (inside the box).
    pub x: DVector<f64>,
    /// Sum of squared residuals at `x`.
    pub sse: f64,
    /// Sum of squared residuals at the (clamped) initial guess.
    pub initial_sse: f64,
    /// Number of accepted iterations.
    pub iterations: usize,
}

/// Minimize `||r(x)||^2` over the box `[lo, hi]` starting from `x0`.
pub fn solve_bounded<F>(
    residuals: F,
    x0: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    opts: &LmOptions,
) -> Result<LmSolution, AppError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = x0.len();
    if lo.len() != n || hi.len() != n {
        return Err(AppError::domain(
            "Bound box dimensions do not match the parameter vector.",
        ));
    }
    for j in 0..n {
        if !(lo[j] <= hi[j]) {
            return Err(AppError::domain(format!(
                "Invalid bound box for parameter {j}: [{}, {}].",
                lo[j], hi[j]
            )));
        }
    }

    let mut x = x0.clone();
    clamp_into(&mut x, lo, hi);

    // Split off pinned dimensions and solve over the rest.
    let free: Vec<usize> = (0..n)
        .filter(|&j| !is_pinned(lo[j], hi[j], opts.pin_width))
        .collect();
    for j in 0..n {
        if !free.contains(&j) {
            x[j] = 0.5 * (lo[j] + hi[j]);
        }
    }

    if free.len() == n {
        return solve_free(&residuals, &x, lo, hi, opts);
    }

    if free.is_empty() {
        let r = residuals(&x);
        if r.is_empty() {
            return Err(AppError::configuration("Empty residual vector."));
        }
        if !r.iter().all(|v| v.is_finite()) {
            return Err(AppError::convergence(
                "Model is non-finite at the initial guess.",
            ));
        }
        let sse = r.norm_squared();
        return Ok(LmSolution {
            x,
            sse,
            initial_sse: sse,
            iterations: 0,
        });
    }

    let pinned = x.clone();
    let gather = |v: &DVector<f64>, idx: &[usize]| -> DVector<f64> {
        DVector::from_iterator(idx.len(), idx.iter().map(|&j| v[j]))
    };
    let reduced = |xf: &DVector<f64>| {
        let mut full = pinned.clone();
        for (k, &j) in free.iter().enumerate() {
            full[j] = xf[k];
        }
        residuals(&full)
    };

    let sol = solve_free(
        &reduced,
        &gather(&x, &free),
        &gather(lo, &free),
        &gather(hi, &free),
        opts,
    )?;

    let mut x_full = pinned;
    for (k, &j) in free.iter().enumerate() {
        x_full[j] = sol.x[k];
    }
    Ok(LmSolution {
        x: x_full,
        sse: sol.sse,
        initial_sse: sol.initial_sse,
        iterations: sol.iterations,
    })
}

/// A box narrow enough that the difference quotient cannot resolve it gets
/// treated as an equality constraint on the midpoint.
fn is_pinned(lo: f64, hi: f64, pin_width: f64) -> bool {
    let width = hi - lo;
    width.is_finite() && width <= pin_width * lo.abs().max(hi.abs()).max(1.0)
}

/// The iteration itself, over a box with no pinned dimensions.
fn solve_free<F>(
    residuals: &F,
    x0: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    opts: &LmOptions,
) -> Result<LmSolution, AppError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = x0.len();
    let mut x = x0.clone();

    let mut r = residuals(&x);
    if r.is_empty() {
        return Err(AppError::configuration("Empty residual vector."));
    }
    if !r.iter().all(|v| v.is_finite()) {
        return Err(AppError::convergence(
            "Model is non-finite at the initial guess.",
        ));
    }

    let mut sse = r.norm_squared();
    let initial_sse = sse;
    let mut lambda = opts.lambda_init;
    let mut iterations = 0usize;

    let done = |x: &DVector<f64>, sse: f64, iterations: usize| LmSolution {
        x: x.clone(),
        sse,
        initial_sse,
        iterations,
    };

    for _ in 0..opts.max_iters {
        let jac = numeric_jacobian(residuals, &x, &r, lo, hi).ok_or_else(|| {
            AppError::convergence("Could not evaluate a finite Jacobian at the current iterate.")
        })?;

        // Gradient of 0.5*SSE; projected onto the box so active bounds do not
        // block the stationarity test.
        let grad = jac.transpose() * &r;
        if projected_grad_inf_norm(&x, &grad, lo, hi) < opts.gtol {
            return Ok(done(&x, sse, iterations));
        }

        let jtj = jac.transpose() * &jac;
        let mut improved = false;

        loop {
            let mut a = jtj.clone();
            for i in 0..n {
                a[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }

            let Some(chol) = a.cholesky() else {
                lambda *= 10.0;
                if lambda > opts.lambda_max {
                    return Ok(done(&x, sse, iterations));
                }
                continue;
            };
            let delta = chol.solve(&(-&grad));

            let mut x_new = &x + &delta;
            clamp_into(&mut x_new, lo, hi);
            let step = (&x_new - &x).norm();
            if step <= opts.xtol * (opts.xtol + x.norm()) {
                // The box (or the damping) has shrunk the step below resolution;
                // nothing left to gain.
                return Ok(done(&x, sse, iterations));
            }

            let r_new = residuals(&x_new);
            let sse_new = if r_new.iter().all(|v| v.is_finite()) {
                r_new.norm_squared()
            } else {
                f64::INFINITY
            };

            if sse_new < sse {
                let reduction = sse - sse_new;
                x = x_new;
                r = r_new;
                sse = sse_new;
                iterations += 1;
                lambda = (lambda / 3.0).max(1e-12);
                improved = true;
                if reduction <= opts.ftol * sse.max(opts.ftol) {
                    return Ok(done(&x, sse, iterations));
                }
                break;
            }

            lambda *= 10.0;
            if lambda > opts.lambda_max {
                // No descent step exists at any damping level: local minimum.
                return Ok(done(&x, sse, iterations));
            }
        }

        if !improved {
            return Ok(done(&x, sse, iterations));
        }
    }

    Err(AppError::convergence(format!(
        "Bounded least-squares did not converge within {} iterations.",
        opts.max_iters
    )))
}

fn clamp_into(x: &mut DVector<f64>, lo: &DVector<f64>, hi: &DVector<f64>) {
    for j in 0..x.len() {
        x[j] = x[j].clamp(lo[j], hi[j]);
    }
}

/// Infinity norm of the gradient with outward components at active bounds
/// zeroed (descent there would leave the box).
fn projected_grad_inf_norm(
    x: &DVector<f64>,
    grad: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
) -> f64 {
    let mut norm = 0.0f64;
    for j in 0..x.len() {
        let g = grad[j];
        let at_lo = x[j] - lo[j] <= f64::EPSILON * (1.0 + lo[j].abs());
        let at_hi = hi[j] - x[j] <= f64::EPSILON * (1.0 + hi[j].abs());
        // Descent direction is -g: at the lower bound a positive g pushes
        // outward, at the upper bound a negative g does.
        if (at_lo && g > 0.0) || (at_hi && g < 0.0) {
            continue;
        }
        norm = norm.max(g.abs());
    }
    norm
}

/// Forward-difference Jacobian, switching to backward difference when the
/// forward step would leave the box. Returns `None` if any entry is
/// non-finite or the box is narrower than the difference step.
fn numeric_jacobian<F>(
    residuals: &F,
    x: &DVector<f64>,
    r0: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
) -> Option<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let m = r0.len();
    let n = x.len();
    let eps_sqrt = f64::EPSILON.sqrt();

    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut xp = x.clone();

    for j in 0..n {
        let h = eps_sqrt * x[j].abs().max(1.0);
        let (x_step, sign) = if x[j] + h <= hi[j] {
            (x[j] + h, 1.0)
        } else {
            (x[j] - h, -1.0)
        };
        if x_step < lo[j] || x_step > hi[j] {
            return None;
        }

        xp[j] = x_step;
        let rp = residuals(&xp);
        xp[j] = x[j];

        if rp.len() != m {
            return None;
        }
        for i in 0..m {
            let d = sign * (rp[i] - r0[i]) / h;
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
    }

    Some(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(a: f64, b: f64) -> DVector<f64> {
        DVector::from_row_slice(&[a, b])
    }

    #[test]
    fn recovers_linear_coefficients() {
        // r_i = (a + b*t_i) - y_i with y from a=2, b=3.
        let t = [0.0, 1.0, 2.0, 3.0];
        let f = move |x: &DVector<f64>| {
            DVector::from_iterator(4, t.iter().map(|&ti| x[0] + x[1] * ti - (2.0 + 3.0 * ti)))
        };
        let sol = solve_bounded(
            f,
            &vec2(0.0, 0.0),
            &vec2(-100.0, -100.0),
            &vec2(100.0, 100.0),
            &LmOptions::default(),
        )
        .unwrap();
        assert!((sol.x[0] - 2.0).abs() < 1e-6);
        assert!((sol.x[1] - 3.0).abs() < 1e-6);
        assert!(sol.sse <= sol.initial_sse);
    }

    #[test]
    fn respects_box_constraints() {
        // Unconstrained minimum at x = 5, box caps it at 2.
        let f = |x: &DVector<f64>| DVector::from_row_slice(&[x[0] - 5.0]);
        let sol = solve_bounded(
            f,
            &DVector::from_row_slice(&[0.0]),
            &DVector::from_row_slice(&[0.0]),
            &DVector::from_row_slice(&[2.0]),
            &LmOptions::default(),
        )
        .unwrap();
        assert!((sol.x[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn pinned_parameter_stays_in_narrow_box() {
        // Second parameter pinned to 40 +/- 1e-3; first free.
        let f = |x: &DVector<f64>| DVector::from_row_slice(&[x[0] - 1.0, (x[1] - 30.0) * 0.1]);
        let sol = solve_bounded(
            f,
            &vec2(0.0, 40.0),
            &vec2(-10.0, 40.0 - 1e-3),
            &vec2(10.0, 40.0 + 1e-3),
            &LmOptions::default(),
        )
        .unwrap();
        assert!((sol.x[0] - 1.0).abs() < 1e-6);
        assert!((sol.x[1] - 40.0).abs() <= 1e-3);
    }

    #[test]
    fn pinned_box_survives_large_parameter_scales() {
        // At this scale the difference step would overshoot the 1e-3
        // half-width; the parameter must be eliminated, not differentiated.
        let f = |x: &DVector<f64>| DVector::from_row_slice(&[x[0] - 1.0, (x[1] - 9.0e4) * 1e-4]);
        let sol = solve_bounded(
            f,
            &vec2(0.0, 1.0e5),
            &vec2(-10.0, 1.0e5 - 1e-3),
            &vec2(10.0, 1.0e5 + 1e-3),
            &LmOptions::default(),
        )
        .unwrap();
        assert!((sol.x[0] - 1.0).abs() < 1e-6);
        assert!((sol.x[1] - 1.0e5).abs() <= 1e-3);
    }

    #[test]
    fn fully_pinned_box_evaluates_at_midpoint() {
        let f = |x: &DVector<f64>| DVector::from_row_slice(&[x[0] - 2.0]);
        let sol = solve_bounded(
            f,
            &DVector::from_row_slice(&[7.3]),
            &DVector::from_row_slice(&[7.0 - 1e-3]),
            &DVector::from_row_slice(&[7.0 + 1e-3]),
            &LmOptions::default(),
        )
        .unwrap();
        assert_eq!(sol.x[0], 7.0);
        assert_eq!(sol.iterations, 0);
        assert!((sol.sse - 25.0).abs() < 1e-9);
    }

    #[test]
    fn nonlinear_rosenbrock_style_descent_is_monotone() {
        let f = |x: &DVector<f64>| {
            DVector::from_row_slice(&[10.0 * (x[1] - x[0] * x[0]), 1.0 - x[0]])
        };
        let sol = solve_bounded(
            f,
            &vec2(-1.2, 1.0),
            &vec2(-10.0, -10.0),
            &vec2(10.0, 10.0),
            &LmOptions::default(),
        )
        .unwrap();
        assert!(sol.sse <= sol.initial_sse);
        assert!((sol.x[0] - 1.0).abs() < 1e-4);
        assert!((sol.x[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let f = |x: &DVector<f64>| x.clone();
        let err = solve_bounded(
            f,
            &DVector::from_row_slice(&[0.0]),
            &DVector::from_row_slice(&[1.0]),
            &DVector::from_row_slice(&[-1.0]),
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Domain);
    }

    #[test]
    fn errors_when_model_is_non_finite_at_guess() {
        let f = |_: &DVector<f64>| DVector::from_row_slice(&[f64::NAN]);
        let err = solve_bounded(
            f,
            &DVector::from_row_slice(&[0.5]),
            &DVector::from_row_slice(&[0.0]),
            &DVector::from_row_slice(&[1.0]),
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Convergence);
    }
}
