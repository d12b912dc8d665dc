//! The go-driver Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Logs go to stderr, filtered by `GO_DRIVER_LOG`
//! (default `go_driver=warn`); stdout carries only results.

use std::io::{self, BufReader};
use std::path::Path;
use std::process;
use std::sync::Once;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

use crate::annotate::Role;
use crate::cli::args::{Command, DriverArgs};
use crate::diagnostics::DriverError;
use crate::driver::{Driver, DriverOptions, Status};
use crate::uast::Node;

pub mod args;
pub mod output;

static INIT: Once = Once::new();

/// Installs the stderr log subscriber. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("GO_DRIVER_LOG")
            .unwrap_or_else(|_| EnvFilter::new("go_driver=warn"));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .try_init();
    });
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = DriverArgs::parse();
    let driver = Driver::new(DriverOptions {
        mode: args.mode,
        language_version: args.language_version,
    });

    let result = match args.command {
        Command::Serve => serve(&driver),
        Command::Parse { file, pretty } => parse(&driver, &file, pretty),
        Command::Generate { file } => generate(&driver, &file),
        Command::Roundtrip { file } => roundtrip(&driver, &file),
        Command::Check { path } => check(&driver, &path),
        Command::Roles => {
            for role in Role::ALL {
                println!("{}", role);
            }
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            output::print_error(e);
            process::exit(1);
        }
    }
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

// Each handler returns whether the command succeeded; `Err` is reserved for failures that
// stop the command outright.

fn serve(driver: &Driver) -> Result<bool, DriverError> {
    let stdin = io::stdin();
    let answered = driver.serve(BufReader::new(stdin.lock()), io::stdout().lock())?;
    info!(answered, "input closed");
    Ok(true)
}

fn parse(driver: &Driver, file: &Path, pretty: bool) -> Result<bool, DriverError> {
    let source = read_file(file)?;
    let name = file.display().to_string();
    let (ast, diagnostics) = driver.try_parse(&name, &source, driver.mode())?;
    let errors: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    output::print_warnings(&errors);
    output::print_tree(&ast, pretty)?;
    Ok(errors.is_empty())
}

fn generate(driver: &Driver, file: &Path) -> Result<bool, DriverError> {
    let json = read_file(file)?;
    let ast: Node = serde_json::from_str(&json)?;
    print!("{}", driver.generate(&ast, driver.mode())?);
    Ok(true)
}

fn roundtrip(driver: &Driver, file: &Path) -> Result<bool, DriverError> {
    let source = read_file(file)?;
    let (expected, actual) = driver.roundtrip(&file.display().to_string(), &source)?;
    Ok(!output::print_roundtrip(&expected, &actual))
}

fn check(driver: &Driver, path: &Path) -> Result<bool, DriverError> {
    let mut passed = 0;
    let mut failed = 0;
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| crate::driver_err!(Io, "{}", e))?;
        if !entry.file_type().is_file() || entry.path().extension().map_or(true, |ext| ext != "go") {
            continue;
        }
        let name = entry.path().display().to_string();
        let verdict = read_file(entry.path()).and_then(|source| {
            let outcome = driver.parse(&source, driver.mode());
            if outcome.status == Status::Fatal {
                return Ok(Some(outcome.errors.join("; ")));
            }
            let (expected, actual) = driver.roundtrip(&name, &source)?;
            Ok((expected != actual).then(|| "round trip changed the source".to_string()))
        });
        match verdict {
            Ok(None) => {
                passed += 1;
                output::print_check(&name, true, None);
            }
            Ok(Some(detail)) => {
                failed += 1;
                output::print_check(&name, false, Some(&detail));
            }
            Err(e) => {
                failed += 1;
                output::print_check(&name, false, Some(&e.to_string()));
            }
        }
    }
    output::print_summary(passed, failed);
    Ok(failed == 0)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn read_file(path: &Path) -> Result<String, DriverError> {
    std::fs::read_to_string(path).map_err(|e| DriverError::from(e).within(path.display()))
}
