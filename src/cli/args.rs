//! CLI argument definitions.

use super::validators::{parse_pixels, parse_unit};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dog and cat detection with breed classification.
#[derive(Debug, Parser)]
#[command(name = "pawscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Candidate images or directories, tried in order until one shows a pet.
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for analysis.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Write the annotated image here (PNG or JPEG by extension).
    #[arg(short, long, env = "PAWSCAN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Print the JSON report instead of the summary line.
    #[arg(long)]
    pub json: bool,

    /// Minimum detection confidence (0.0-1.0).
    #[arg(long, value_parser = parse_unit, env = "PAWSCAN_SCORE_THRESHOLD")]
    pub score_threshold: Option<f32>,

    /// NMS overlap cutoff (0.0-1.0).
    #[arg(long, value_parser = parse_unit, env = "PAWSCAN_IOU_THRESHOLD")]
    pub iou_threshold: Option<f32>,

    /// Minimum box width and height in pixels.
    #[arg(long, value_parser = parse_pixels, env = "PAWSCAN_MIN_BOX")]
    pub min_box: Option<f32>,

    /// Accepted labels (comma-separated, e.g. dog,cat).
    #[arg(long, value_delimiter = ',', env = "PAWSCAN_LABELS", conflicts_with = "all_labels")]
    pub labels: Option<Vec<String>>,

    /// Accept every detector label.
    #[arg(long)]
    pub all_labels: bool,

    /// Only print warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
