//! Benchmark sweep entry point.
//!
//! Runs every configured size in both index modes and prints the results.
//! Ceiling violations are reported, not fatal; exit code 1 means the sweep
//! itself could not run.

use anyhow::{Context, Result};
use log::info;
use std::process;
use structopt::StructOpt;

use contact_bench::app::{print_sweep_statistics, print_sweep_summary};
use contact_bench::initialization::init_logger_with;
use contact_bench::report::reporter_for;
use contact_bench::{BenchConfig, BenchmarkDriver, SweepOpt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = SweepOpt::from_args();

    init_logger_with(opt.log_level.into(), opt.log_format)
        .context("Failed to initialize logger")?;

    let format = opt.format;
    let output = opt.output.clone();
    let config = BenchConfig::from(opt);
    info!(
        "Sweeping sizes {:?} against {}",
        config.ordered_sizes(),
        config.db_path.display()
    );

    let report = match BenchmarkDriver::new(config).run().await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("contact_sweep error: {:#}", anyhow::Error::new(e));
            process::exit(1);
        }
    };

    let mut reporter = reporter_for(format, output.as_deref())?;
    if let Err(e) = reporter.report(&report.rows()) {
        eprintln!("contact_sweep error: {:#}", e);
        process::exit(1);
    }

    print_sweep_statistics(&report.stats);
    print_sweep_summary(&report);
    Ok(())
}
