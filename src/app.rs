//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit pipelines / calculators
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{
    ClearanceArgs, Command, FitArgs, GainArgs, LossArgs, PlotArgs, SampleArgs, VisibilityArgs,
};
use crate::domain::Instrument;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sq` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Gain(args) => handle_gain(args),
        Command::Sample(args) => handle_sample(args),
        Command::Loss(args) => handle_loss(args),
        Command::Visibility(args) => handle_visibility(args),
        Command::Clearance(args) => handle_clearance(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = pipeline::NoiseRunConfig {
        csv_path: args.csv.clone(),
        phase_noise: args.phase_noise,
        detection_frequency: args.detection_frequency,
        cavity_hwhm: args.cavity_hwhm,
        fixed_threshold: args.fixed_threshold,
    };
    let run = pipeline::run_noise_fit(&config)?;

    println!(
        "{}",
        crate::report::format_noise_summary(&run.measurement, &run.instrument, &run.fit)
    );

    if !args.no_plot {
        let plot =
            crate::plot::render_noise_plot(&run.measurement, &run.fit, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        crate::io::export::write_fit_json(path, &run.fit, &run.instrument, &run.measurement)?;
    }
    if let Some(path) = &args.export_curve {
        crate::io::export::write_curve_csv(path, &run.fit)?;
    }

    Ok(())
}

fn handle_gain(args: GainArgs) -> Result<(), AppError> {
    let (measurement, fit) = pipeline::run_gain_fit(&args.csv)?;

    println!("{}", crate::report::format_gain_summary(&measurement, &fit));

    if !args.no_plot {
        let plot =
            crate::plot::render_gain_plot(&measurement, &fit.curve, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        crate::io::export::write_gain_json(path, &fit)?;
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = crate::data::SampleSpec {
        eta: args.eta,
        p_th: args.p_th,
        epsilon: args.epsilon,
        instrument: Instrument::new(args.detection_frequency, args.cavity_hwhm)?,
        n_points: args.points,
        max_power_frac: args.max_power_frac,
        noise_db: args.noise_db,
        seed: args.seed,
    };
    let data = crate::data::generate_sample(&spec)?;
    crate::io::export::write_sample_csv(&args.out, &data)?;

    println!(
        "Wrote {} synthetic points to '{}' (eta={}, P_th={} mW, epsilon={} rad).",
        data.measurement.len(),
        args.out.display(),
        spec.eta,
        spec.p_th,
        spec.epsilon,
    );
    Ok(())
}

fn handle_loss(args: LossArgs) -> Result<(), AppError> {
    let loss =
        crate::calc::intracavity_loss(args.transmission, args.p_refl, args.p_in, args.mode_matching)?;
    println!("{}", crate::report::format_loss(&loss));
    Ok(())
}

fn handle_visibility(args: VisibilityArgs) -> Result<(), AppError> {
    let v = crate::calc::visibility(args.i1, args.i2, args.i_max, args.i_min, args.floor)?;
    println!("{}", crate::report::format_visibility(v));
    Ok(())
}

fn handle_clearance(args: ClearanceArgs) -> Result<(), AppError> {
    let corrected = crate::calc::clearance_corrected(args.variance, args.clearance)?;
    println!(
        "{}",
        crate::report::format_clearance(args.variance, corrected)
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let saved = crate::io::export::read_fit_json(&args.fit)?;

    let plot = crate::plot::render_noise_series(
        &saved.observed_power,
        &saved.observed_sq_db,
        &saved.observed_asq_db,
        &saved.fit.curve,
        args.width,
        args.height,
    );
    println!("{plot}");
    Ok(())
}
