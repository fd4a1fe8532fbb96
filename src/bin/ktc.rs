#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use ktc::cli::args::{CliArgs, OutputFormat};
use ktc::cli::driver;
use ktc::cli::reporter::{Reporter, render_json};

const EXIT_SUCCESS: i32 = 0;
/// At least one error diagnostic was reported.
const EXIT_DIAGNOSTICS: i32 = 1;
/// At least one unit could not be analyzed.
const EXIT_UNIT_FAILED: i32 = 2;

fn main() -> Result<()> {
    // Initialize tracing if KTC_LOG or RUST_LOG is set (zero cost otherwise).
    ktc::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    let result = driver::check(&args, &cwd)?;

    match args.format {
        OutputFormat::Json => println!("{}", render_json(&result)?),
        OutputFormat::Pretty => {
            let pretty = args
                .pretty
                .unwrap_or_else(|| std::io::stderr().is_terminal());
            let mut reporter = Reporter::new(pretty);
            eprint!("{}", reporter.render_run(&result));
        }
    }

    if result.failed_count() > 0 {
        std::process::exit(EXIT_UNIT_FAILED);
    }
    if result.error_count() > 0 {
        std::process::exit(EXIT_DIAGNOSTICS);
    }
    std::process::exit(EXIT_SUCCESS);
}
