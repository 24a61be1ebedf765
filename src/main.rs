use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use wsprpath::config::{AugmentConfig, InvalidRowPolicy};
use wsprpath::output::{RowFormat, create_writer};
use wsprpath::pipeline::{Augmenter, SpotReader};

#[derive(Parser, Debug)]
#[command(name = "wsprpath")]
#[command(
    about = "Add azimuth, endpoint and vertex calculations to a wsprnet spot file",
    long_about = None
)]
struct Args {
    /// CSV file of wsprnet spots (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Augmented output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: csv, json
    #[arg(short, long, value_enum, default_value = "csv")]
    format: RowFormat,

    /// Worker threads for row processing
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Rows with bad locators or frequencies: skip, sentinel
    #[arg(long, value_enum)]
    on_invalid: Option<InvalidRowPolicy>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => AugmentConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AugmentConfig::default(),
    };
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(policy) = args.on_invalid {
        config.on_invalid = policy;
    }

    let input: Box<dyn Read + Send> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut augmenter = Augmenter::new(config).context("Invalid configuration")?;
    let mut writer = create_writer(args.format, output);

    let stats = augmenter
        .run(SpotReader::new(input), |row| writer.write_row(row))
        .context("Failed to write augmented spots")?;
    writer.flush().context("Failed to flush output")?;

    log::info!(
        "Skipped {} rows ({} wrong width, {} invalid, {} unreadable)",
        stats.skipped(),
        stats.skipped_schema,
        stats.skipped_invalid,
        stats.skipped_unreadable
    );

    Ok(())
}
