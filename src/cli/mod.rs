//! CLI argument parsing.

mod args;
mod validators;

pub use args::{AnalyzeArgs, Cli, Command, ConfigAction};
pub use validators::{parse_pixels, parse_unit};
