use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use wsprpath::constants::UPLOAD_PAGE_SIZE;
use wsprpath::upload::{ConnectionConfig, PgStore, read_batch_file, upload_batch};

#[derive(Parser, Debug)]
#[command(name = "spot_upload")]
#[command(about = "Upload an augmented spot file to TimescaleDB in one batch", long_about = None)]
struct Args {
    /// Augmented spot CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// INSERT statement with $1..$n placeholders, one per column
    #[arg(short, long)]
    sql: String,

    /// Database host, optionally with :port
    #[arg(short, long)]
    address: String,

    /// Database name
    #[arg(short, long)]
    database: String,

    /// Database user
    #[arg(short, long)]
    username: String,

    /// Database password
    #[arg(short, long)]
    password: String,

    /// Rows sent per round trip
    #[arg(long, default_value_t = UPLOAD_PAGE_SIZE)]
    page_size: usize,

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

    let rows = read_batch_file(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    log::info!("Read {} spots from {}", rows.len(), args.input.display());

    let mut store = PgStore::new(ConnectionConfig {
        address: args.address,
        database: args.database,
        username: args.username,
        password: args.password,
    });

    let outcome = upload_batch(&mut store, &args.sql, &rows, args.page_size);
    let report = outcome.stage_report();
    let uploaded = outcome
        .into_result()
        .with_context(|| format!("Unable to record spot file to the database: {}", report))?;

    log::info!("Committed {} spots", uploaded);
    Ok(())
}
