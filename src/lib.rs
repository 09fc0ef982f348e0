//! Pawscan - dog and cat detection, breed classification and photo annotation.
//!
//! The crate runs an object detector over candidate images, suppresses
//! overlapping boxes, classifies each surviving dog or cat crop with a
//! species-specific breed model and renders the result onto the image.

#![warn(missing_docs)]

pub mod annotate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod utils;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, ConfigAction};
use config::{
    Config, PipelineConfig, config_dir, config_file_path, load_default_config, save_default_config,
    validate_config,
};
use output::{AnalysisReport, save_annotated, write_report};
use pipeline::{AnalysisStatus, ImageRef, PetPipeline, collect_image_files};
use std::path::PathBuf;
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the pawscan CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    if let Some(Command::Config { action }) = cli.command {
        return handle_config_command(action);
    }

    if cli.inputs.is_empty() {
        return Err(Error::NoInputs);
    }

    let config = load_default_config()?;
    validate_config(&config)?;

    analyze_images(&cli.inputs, &cli.analyze, &config)
}

/// Analyse the candidate images with the given options.
#[allow(clippy::print_stdout)]
fn analyze_images(inputs: &[PathBuf], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let files = collect_image_files(inputs)?;
    info!("Found {} candidate image(s)", files.len());

    let base = config_dir().ok();
    let pipeline = PetPipeline::from_config(config, base.as_deref())?;
    let pipeline_config = pipeline_config(args, config);

    let candidates: Vec<ImageRef> = files.into_iter().map(ImageRef::from).collect();
    let outcome = pipeline
        .analyze(&candidates, &pipeline_config)
        .ok_or_else(|| Error::Internal {
            message: "first invocation was throttled".to_string(),
        })?;

    let mut report = AnalysisReport::new(&outcome, &pipeline_config);
    if let (Some(path), Some(image)) = (&args.output, &outcome.annotated_image) {
        save_annotated(image, path)?;
        info!("Annotated image written to {}", path.display());
        report = report.with_annotated_path(path);
    }

    if args.json {
        write_report(std::io::stdout().lock(), &report)?;
    } else {
        println!("{}", outcome.summary);
    }

    if outcome.status == AnalysisStatus::Error {
        return Err(Error::NoInputs);
    }

    Ok(())
}

/// Per-invocation filter settings: the `[pipeline]` table with CLI overrides applied.
fn pipeline_config(args: &AnalyzeArgs, config: &Config) -> PipelineConfig {
    let mut pipeline_config = PipelineConfig::from_section(&config.pipeline);

    if let Some(value) = args.score_threshold {
        pipeline_config.set_score_threshold(value);
    }
    if let Some(value) = args.iou_threshold {
        pipeline_config.set_iou_threshold(value);
    }
    if let Some(value) = args.min_box {
        pipeline_config.set_min_box_px(value);
    }
    if args.all_labels {
        pipeline_config.set_label_filter(std::iter::empty::<&str>());
    } else if let Some(labels) = &args.labels {
        pipeline_config.set_label_filter(labels);
    }

    pipeline_config
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging stays off by default; -v and up surface it.
    let filter_str = if quiet {
        "warn,ort=off"
    } else {
        match verbose {
            0 => "info,ort=off",
            1 => "debug,ort=warn",
            2 => "trace,ort=info",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps: set [detector] path and the [classifiers.dog] / [classifiers.cat]");
                println!("model and label paths. Relative paths resolve against the config directory.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
