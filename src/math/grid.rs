//! Evaluation grid generation.

/// Generate `n` evenly spaced points from `start` to `stop` inclusive.
///
/// The final element is set to exactly `stop` so that curve grids terminate
/// precisely at the threshold power (where the antisqueezing pole lives)
/// rather than a rounding-error short of it. Requires `stop > start` for a
/// strictly increasing grid; `n` is clamped to at least 2.
pub fn lin_space(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let n = n.max(2);
    let step = (stop - start) / (n as f64 - 1.0);

    let mut out = Vec::with_capacity(n);
    for i in 0..n - 1 {
        out.push(start + step * i as f64);
    }
    out.push(stop);
    out
}
