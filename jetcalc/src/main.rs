use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use jetcalc::config::CalcConfig;
use jetcalc::driver::{analyze_events, EventFeatureDriver};
use jetcalc::error::Result;
use jetcalc::event::read_events;

/// Computes jet substructure and lepton isolation features for a file of events.
#[derive(Parser, Debug)]
#[command(name = "jetcalc")]
#[command(version)]
struct Cli {
    /// JSON configuration; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of events
    #[arg(short, long)]
    events: PathBuf,

    /// Output file for the per-event feature sets; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CalcConfig::load(path)?,
        None => CalcConfig::default(),
    };
    let driver = EventFeatureDriver::from_config(config)?;

    let events = read_events(&cli.events)?;
    info!(events = events.len(), path = %cli.events.display(), "read events");

    let features = analyze_events(&driver, &events, cli.threads)?;
    let json = serde_json::to_string_pretty(&features)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path.display(), "wrote features");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
