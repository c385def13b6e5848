//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed squeezing points: `o`, observed antisqueezing points: `x`
//! - fitted curves: `.`
//!
//! Non-finite samples (the unguarded threshold endpoint of the model curve)
//! are skipped rather than clamped into the frame.

use crate::domain::{CurveGrid, GainCurve, GainMeasurement, Measurement, NoiseFit};

/// Render the squeezing/antisqueezing overlay for an in-memory fit.
pub fn render_noise_plot(
    measurement: &Measurement,
    fit: &NoiseFit,
    width: usize,
    height: usize,
) -> String {
    render_noise_series(
        measurement.power(),
        measurement.sq_db(),
        measurement.asq_db(),
        &fit.curve,
        width,
        height,
    )
}

/// Render the overlay from saved observation arrays (used by `sq plot`).
pub fn render_noise_series(
    obs_power: &[f64],
    obs_sq: &[f64],
    obs_asq: &[f64],
    curve: &CurveGrid,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let x_max = curve
        .power
        .last()
        .copied()
        .unwrap_or(1.0)
        .max(obs_power.iter().copied().fold(0.0, f64::max));
    let (y_min, y_max) = y_range(
        [obs_sq, obs_asq, curve.sq_db.as_slice(), curve.asq_db.as_slice()]
            .iter()
            .flat_map(|s| s.iter().copied()),
    );

    let mut grid = vec![vec![' '; width]; height];

    // Curves first so observed points overlay them.
    draw_series(&mut grid, &curve.power, &curve.sq_db, '.', x_max, y_min, y_max);
    draw_series(&mut grid, &curve.power, &curve.asq_db, '.', x_max, y_min, y_max);
    draw_series(&mut grid, obs_power, obs_sq, 'o', x_max, y_min, y_max);
    draw_series(&mut grid, obs_power, obs_asq, 'x', x_max, y_min, y_max);

    frame(
        grid,
        &format!(
            "Plot: power=[0, {x_max:.2}] mW | variance=[{y_min:.2}, {y_max:.2}] dB | o=sq x=asq .=fit\n"
        ),
    )
}

/// Render the parametric-gain overlay.
pub fn render_gain_plot(
    measurement: &GainMeasurement,
    curve: &GainCurve,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let x_max = curve
        .power
        .last()
        .copied()
        .unwrap_or(1.0)
        .max(measurement.power().iter().copied().fold(0.0, f64::max));
    let (y_min, y_max) = y_range(
        curve
            .gain
            .iter()
            .copied()
            .chain(measurement.gain().iter().copied()),
    );

    let mut grid = vec![vec![' '; width]; height];
    draw_series(&mut grid, &curve.power, &curve.gain, '.', x_max, y_min, y_max);
    draw_series(
        &mut grid,
        measurement.power(),
        measurement.gain(),
        'o',
        x_max,
        y_min,
        y_max,
    );

    frame(
        grid,
        &format!("Plot: power=[0, {x_max:.2}] mW | gain=[{y_min:.2}, {y_max:.2}] | o=data .=fit\n"),
    )
}

fn y_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    // Pad so extreme points do not sit on the border.
    let pad = (hi - lo).max(1e-9) * 0.05;
    (lo - pad, hi + pad)
}

fn draw_series(
    grid: &mut [Vec<char>],
    xs: &[f64],
    ys: &[f64],
    ch: char,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map(x, 0.0, x_max, width);
        // Row 0 is the top of the frame.
        let row = height - 1 - map(y, y_min, y_max, height);
        grid[row][col] = ch;
    }
}

fn map(v: f64, lo: f64, hi: f64, cells: usize) -> usize {
    if hi <= lo {
        return 0;
    }
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((u * (cells as f64 - 1.0)).round() as usize).min(cells - 1)
}

fn frame(grid: Vec<Vec<char>>, header: &str) -> String {
    let width = grid[0].len();
    let mut out = String::new();
    out.push_str(header);
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");
    for row in grid {
        out.push('|');
        out.extend(row);
        out.push_str("|\n");
    }
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitMode, NoiseParams};
    use crate::fit::dense_noise_curve;

    #[test]
    fn noise_plot_contains_both_marker_kinds() {
        let m = Measurement::new(vec![6.0, 10.0], vec![-1.5, -2.0], vec![4.0, 6.0]).unwrap();
        let params = NoiseParams {
            eta: 0.8,
            p_th: 30.0,
            epsilon: 0.0,
        };
        let curve = dense_noise_curve(&params, FitMode::TwoParameter, 0.0607, 200);
        let fit = NoiseFit {
            mode: FitMode::TwoParameter,
            params,
            quality: crate::domain::FitQuality {
                sse: 0.0,
                rmse: 0.0,
                n_residuals: 4,
                iterations: 0,
            },
            curve,
        };

        let plot = render_noise_plot(&m, &fit, 60, 20);
        assert!(plot.contains('o'));
        assert!(plot.contains('x'));
        assert!(plot.contains('.'));
        // Fixed frame: header + borders + height rows.
        assert_eq!(plot.lines().count(), 1 + 2 + 20);
    }

    #[test]
    fn non_finite_curve_samples_are_skipped() {
        let curve = CurveGrid {
            power: vec![0.0, 1.0, 2.0],
            sq_db: vec![0.0, -1.0, f64::NAN],
            asq_db: vec![0.0, 1.0, f64::INFINITY],
        };
        let plot = render_noise_series(&[], &[], &[], &curve, 40, 10);
        assert!(plot.contains('.'));
    }
}
