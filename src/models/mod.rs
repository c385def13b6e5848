//! Parametric-oscillator model implementations.
//!
//! Models are implemented as small, pure functions so that fitting/curve code
//! can stay generic and allocation-free in the hot path.

pub mod model;

pub use model::*;
