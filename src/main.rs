//! Single-run entry point.
//!
//! Inserts `count` synthetic contacts into the store at `--db-path` and times a
//! lookup of the last one. The file is kept, so repeated runs accumulate rows.

use anyhow::{Context, Result};
use std::process;
use structopt::StructOpt;

use contact_bench::app::print_single_summary;
use contact_bench::initialization::init_logger_with;
use contact_bench::{run_single, ContactsOpt, IndexMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing or malformed arguments print usage to stderr and exit 1
    let opt = ContactsOpt::from_args();

    init_logger_with(opt.log_level.into(), opt.log_format)
        .context("Failed to initialize logger")?;

    let mode = if opt.with_index {
        IndexMode::WithIndex
    } else {
        IndexMode::NoIndex
    };

    match run_single(&opt.db_path, opt.count, mode, opt.batch_size).await {
        Ok(report) => {
            print_single_summary(&report);
            match report.found_name {
                Some(name) => println!("{}", name),
                None => println!("not found"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "contact_bench error: {:#}",
                anyhow::Error::new(e).context(format!("run against {}", opt.db_path.display()))
            );
            process::exit(1);
        }
    }
}
