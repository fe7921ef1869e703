//! run-jstests - Run an in-browser JavaScript test suite
//!
//! Loads the suite's test page in Chrome through chromedriver, runs its
//! test entry point and exits with 0 only if every test passed.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use jstest_runner::cli::{self, Cli};
use jstest_runner::common::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    logging::init_cli(cli.verbose);

    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
