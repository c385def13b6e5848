//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated measurement containers (`Measurement`, `GainMeasurement`)
//! - fit configuration (`Instrument`, `FitMode`, `FitSettings`)
//! - fit outputs (`NoiseParams`, `NoiseFit`, `GainFit`, etc.)

pub mod types;

pub use types::*;
