//! Mathematical utilities: bounded nonlinear least squares and grid helpers.

pub mod grid;
pub mod lm;

pub use grid::*;
pub use lm::*;
