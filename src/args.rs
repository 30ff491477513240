use crate::config::DEFAULT_CONFIG_FILE;
use crate::coordinate_system::geographic::LLBBox;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments parser
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Category configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Bounding box (min_lat,min_lng,max_lat,max_lng), overrides the configured one (optional)
    #[arg(long, allow_hyphen_values = true, value_parser = LLBBox::from_str)]
    pub bbox: Option<LLBBox>,

    /// Saved Overpass JSON response to read instead of querying the servers (optional)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// File to write JSON lines features to; stdout when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Overpass request timeout in seconds (optional)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Enable debug mode (optional)
    #[arg(long)]
    pub debug: bool,
}

/// Validates CLI arguments after parsing.
pub fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(ref file) = args.file {
        if !file.is_file() {
            return Err(format!("Input file does not exist: {}", file.display()));
        }
    }

    if let Some(ref output) = args.output {
        let parent = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !parent.is_dir() {
                return Err(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                ));
            }
        }
    }

    Ok(())
}

fn parse_duration(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}
