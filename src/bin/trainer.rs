//! Trainer Binary
//!
//! Trains the reference rock-paper-scissors agent under every configured
//! self-play scheme, each in isolation, and records the evolving
//! maximum-entropy Nash equilibrium of its checkpoints.
//!
//! Type "Q" + Enter to stop at the next checkpoint boundary.

use clap::Parser;
use nashpop::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, help = "JSON configuration file; defaults apply when omitted")]
    config: Option<PathBuf>,
    #[arg(long, help = "Override the output directory")]
    output: Option<PathBuf>,
    #[arg(long, help = "Override the random seed")]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    log();
    brb();
    let args = Args::parse();
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let experiment = Experiment::new(config)?;
    let results = experiment.run_isolated(&Rps, &RpsAgent::default());
    let failures = results.iter().filter(|(_, result)| result.is_err()).count();
    for (scheme, result) in results {
        match result {
            Ok(report) => log::info!(
                "{} {:?}: {} checkpoints in {}",
                scheme,
                report.status,
                report.records.len(),
                report.root.display()
            ),
            Err(error) => log::error!("{}: {}", scheme, error),
        }
    }
    anyhow::ensure!(failures == 0, "{} configuration(s) failed", failures);
    Ok(())
}
