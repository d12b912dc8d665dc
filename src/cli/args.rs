//! Defines the command-line arguments and subcommands for the driver CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::driver::Mode;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "go-driver",
    version,
    about = "Parses Go source into an annotated, language-independent syntax tree and back."
)]
pub struct DriverArgs {
    /// How far down the pipeline to go.
    #[arg(long, value_enum, global = true, default_value_t = Mode::Semantic)]
    pub mode: Mode,

    /// Reported back in protocol responses.
    #[arg(long, global = true)]
    pub language_version: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer line-delimited JSON requests from stdin until EOF.
    Serve,
    /// Print the generic tree of a Go file as JSON.
    Parse {
        /// The Go source file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Indent the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Print Go source regenerated from a JSON tree.
    Generate {
        /// A JSON file holding a tree produced in the same mode.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show the difference between a file's canonical form and its form after a round trip.
    Roundtrip {
        /// The Go source file to check.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Round-trip every `.go` file under a directory.
    Check {
        /// The directory to search.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// List the role vocabulary.
    Roles,
}
