mod makefile;
mod pipeline;
mod shader;
mod toolchain;

use std::{io::Write, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use pipeline::{Outcome, Report};
use shader::scan::ExternalScanner;
use toolchain::Toolchain;

#[macro_use]
extern crate tracing;

/// Generate makefiles that compile the shaders of each directory to SPIR-V.
#[derive(Parser)]
#[command(name = "spvmake", version)]
struct Cli {
    /// Directories containing the shaders
    #[arg(value_name = "DIRECTORY", required = true)]
    directories: Vec<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let toolchain = Toolchain::default();
    let scanner = ExternalScanner::new(toolchain.clone());

    let report = pipeline::run(&cli.directories, &toolchain, &scanner);

    print_summary(&report, &mut std::io::stdout().lock()).context("could not print summary")?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_summary(report: &Report, out: &mut impl Write) -> std::io::Result<()> {
    for (dir, result) in &report.results {
        match result {
            Ok(Outcome::Written { makefile, shaders }) => {
                writeln!(out, "ok      {} ({shaders} shaders)", makefile.display())?
            }
            Ok(Outcome::Empty) => writeln!(out, "empty   {} (no shaders)", dir.display())?,
            Err(error) => writeln!(out, "FAILED  {}: {}", dir.display(), pipeline::chain(error))?,
        }
    }

    let failures = report.failures();
    if failures > 0 {
        writeln!(out, "{failures} of {} directories failed", report.results.len())?;
    }

    Ok(())
}
