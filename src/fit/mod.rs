//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - build the combined squeezing + antisqueezing residual vector
//! - drive the bounded least-squares solve (initial guess + box constraints)
//! - generate dense model curves from the fitted parameters
//! - the single-parameter gain-threshold fit

pub mod curve;
pub mod fitter;
pub mod gain;
pub mod residual;

pub use curve::*;
pub use fitter::*;
pub use gain::*;
pub use residual::*;
