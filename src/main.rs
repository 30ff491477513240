use clap::Parser;
use colored::*;
use log::debug;
use osm_features::args::{validate_args, Args};
use osm_features::config::{validate_bbox, Config};
use osm_features::data_processing::run_categories;
use osm_features::logging::init_logging;
use osm_features::retrieve_data::{FeatureSource, FileSource, OverpassSource};
use osm_features::sink::{emit_records, JsonLinesSink};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};

type FeatureWriter = Box<dyn Write + Send + Sync>;

fn open_output(args: &Args) -> io::Result<FeatureWriter> {
    match args.output {
        Some(ref path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(io::stdout())),
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load(&args.config)?;
    if let Some(bbox) = args.bbox {
        config.bbox = validate_bbox(bbox)?;
    }
    if let Some(timeout) = args.timeout {
        config.overpass.timeout = timeout;
    }
    debug!("Loaded configuration: {config:?}");

    let source: Box<dyn FeatureSource> = match args.file {
        Some(ref path) => Box::new(FileSource::new(path)),
        None => Box::new(OverpassSource::new(&config.overpass)?),
    };

    let categories = config.enabled_categories();
    eprintln!(
        "{} Processing {} categories...",
        "[1/2]".bold(),
        categories.len()
    );

    let mut sink = JsonLinesSink::new(open_output(args)?);
    let outputs = run_categories(source.as_ref(), &categories, &config.bbox, &sink)?;

    eprintln!("{} Writing features...", "[2/2]".bold());
    let mut rejected = 0;
    for output in &outputs {
        emit_records(&mut sink, &output.records)?;
        rejected += output.rejections.len();
    }

    let written = sink.written();
    sink.finish()?;

    eprintln!(
        "{} {written} features written, {rejected} rejected",
        "Done!".green().bold()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = init_logging(args.debug) {
        eprintln!("{}: {}", "Error setting up logging".red().bold(), e);
    }

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
