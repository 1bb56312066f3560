//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - starts the analysis pipeline on its own thread
//! - prints the notification stream as timestamped lines
//! - generates synthetic light curves

use std::sync::mpsc;

use chrono::Local;
use clap::Parser;
use log::info;

use crate::cli::{AnalyzeArgs, Command, SimulateArgs};
use crate::data::generate_light_curve;
use crate::error::AppError;
use crate::io::DirectoryWriter;
use crate::io::ingest::write_observations;
use crate::report::format_clock;

pub mod pipeline;

use pipeline::{AnalysisPipeline, Completion, DataSource, PipelineEvent};

/// Exit code when the pipeline reports an error completion.
pub const EXIT_RUN_FAILED: u8 = 1;

/// Entry point for the `mist` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

/// `info` unless `RUST_LOG` says otherwise. Safe to call more than once.
fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = args.analysis_config();
    let writer = match &args.out {
        Some(dir) => DirectoryWriter::new(dir),
        None => DirectoryWriter::beside_input(&args.input),
    };

    let (tx, rx) = mpsc::channel();
    let handle = AnalysisPipeline::new(config, DataSource::File(args.input.clone()), Box::new(writer), tx).spawn();

    let mut outcome = None;
    for event in rx.iter() {
        match event {
            PipelineEvent::Progress(percent) => println!("[{}] PROGRESS {percent}%", format_clock(&Local::now())),
            PipelineEvent::Log { message, .. } => println!("[{}] {message}", format_clock(&Local::now())),
            PipelineEvent::Completed(completion) => outcome = Some(completion),
        }
    }
    handle
        .join()
        .map_err(|_| AppError::internal("Analysis thread panicked."))?;

    match outcome {
        Some(Completion::Output(location)) => {
            println!("Analysis stored in: {location}");
            Ok(())
        }
        Some(Completion::Error) => Err(AppError::new(EXIT_RUN_FAILED, "Analysis failed.")),
        None => Err(AppError::internal("Analysis ended without a completion notice.")),
    }
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let curve = generate_light_curve(&args.synthetic_config())?;
    write_observations(&args.out, &curve.table)?;
    info!("wrote {} rows to {}", curve.table.len(), args.out.display());

    println!("Primary minima:");
    for t in &curve.primary_minima {
        println!("  {t:.5}");
    }
    println!("Secondary minima:");
    for t in &curve.secondary_minima {
        println!("  {t:.5}");
    }
    Ok(())
}
