//! feed_harvest: replays saved renders of an infinite-scroll feed through the
//! harvester and prints every new record as one JSON object per line.
//!
//! Each SNAPSHOT is the full document after one more page of the feed loaded.
//! Scrolling to the bottom shows the next one; once the last snapshot stops
//! growing the session ends as stalled.

mod config;
mod logging;
mod replay;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use feed_logging::{harvest_error, harvest_info};

use config::RunOptions;
use logging::LogDestination;

#[derive(Parser)]
#[command(name = "feed_harvest")]
#[command(about = "Harvest feed records from saved page snapshots")]
#[command(version)]
struct Cli {
    /// Stop after this many records (0 harvests until the feed stalls)
    #[arg(long)]
    limit: Option<usize>,

    /// Milliseconds between scroll ticks
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Ticks without growth before giving up
    #[arg(long, value_name = "TICKS")]
    stall_ticks: Option<u32>,

    /// Base for relative post links
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// RON settings file; flags given here override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    #[arg(short, long)]
    verbose: bool,

    #[arg(value_name = "SNAPSHOT", required = true)]
    snapshots: Vec<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> RunOptions {
        RunOptions {
            limit: self.limit,
            tick_ms: self.tick_ms,
            stall_ticks: self.stall_ticks,
            base_url: self.base_url.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    if let Err(err) = run(&cli) {
        harvest_error!("feed_harvest failed: {:#}", err);
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file_options = match &cli.config {
        Some(path) => RunOptions::load(path)?,
        None => RunOptions::default(),
    };
    let options = file_options.merged_with(cli.overrides());
    let settings = options.harvest_settings()?;
    let pages = replay::read_snapshots(&cli.snapshots)?;
    harvest_info!(
        "replaying {} snapshots, limit {}, tick {:?}, stall after {} ticks",
        pages.len(),
        options.limit(),
        settings.tick_interval,
        settings.stall_threshold
    );

    let summary = replay::replay(pages, options.limit(), settings, &mut io::stdout().lock())?;
    harvest_info!(
        "harvest finished ({}), {} records written",
        summary.reason,
        summary.records
    );
    Ok(())
}
