//! CLI tool for reconstructing MBP-10 from an MBO CSV file.
//!
//! # Usage
//!
//! ```bash
//! # Replay mbo.csv into ./output.csv
//! cargo run --release --bin reconstruct_mbp10 -- mbo.csv
//!
//! # Also write run statistics as JSON
//! cargo run --release --bin reconstruct_mbp10 -- mbo.csv --summary stats.json
//! ```
//!
//! Output always goes to `output.csv` in the working directory. A missing
//! argument or unreadable input exits non-zero before any work is done.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mbp10_reconstructor::{
    BookConfig, CsvSource, DuplicateAddPolicy, MarketDataSource, Mbp10Replayer, Mbp10Writer,
    ReplayConfig, ReplayError, Result, DEFAULT_OUTPUT_PATH,
};

/// Reconstruct an MBP-10 book stream from MBO events
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// MBO CSV input file (first line is a header)
    input: PathBuf,

    /// Write run statistics as JSON to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Reverse an active order's size before re-adding it on a duplicate add
    #[arg(long)]
    replace_duplicates: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<()> {
    let source = CsvSource::open(&args.input)?;

    let policy = if args.replace_duplicates {
        DuplicateAddPolicy::Replace
    } else {
        DuplicateAddPolicy::Overwrite
    };
    let config = ReplayConfig::new(BookConfig::default().with_duplicate_add_policy(policy));
    let mut replayer = Mbp10Replayer::with_config(config);
    let mut writer = Mbp10Writer::create(DEFAULT_OUTPUT_PATH, replayer.book().levels())?;

    log::info!(
        "Replaying {} ({} bytes)",
        args.input.display(),
        source.metadata().file_size.unwrap_or(0)
    );

    let mut events = source.messages()?;
    replayer.run(&mut events, &mut writer)?;
    replayer.add_malformed_fields(events.decoder().malformed_fields());

    let stats = replayer.stats();
    log::info!(
        "Processed {} events, emitted {} rows in {:.2}s ({} resting orders left)",
        stats.events_read,
        stats.rows_emitted,
        stats.elapsed_secs,
        stats.resting_orders
    );
    if stats.malformed_fields > 0 {
        log::warn!("{} malformed numeric fields read as 0", stats.malformed_fields);
    }

    if let Some(path) = &args.summary {
        let file = File::create(path).map_err(|source| ReplayError::OutputCreate {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &stats)?;
        log::info!("Summary written to {}", path.display());
    }

    println!("Processing complete. Output written to {DEFAULT_OUTPUT_PATH}");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
