//! Handles all user-facing output for the CLI.
//!
//! Protocol and JSON output go to stdout uncolored; status lines and diffs are colored when the
//! terminal supports it.

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diagnostics::DriverError;
use crate::uast::Node;

// ============================================================================
// TREES AND ERRORS
// ============================================================================

/// Prints a generic tree as JSON.
pub fn print_tree(node: &Node, pretty: bool) -> Result<(), DriverError> {
    let json = if pretty {
        serde_json::to_string_pretty(node)?
    } else {
        serde_json::to_string(node)?
    };
    println!("{}", json);
    Ok(())
}

/// Prints an error with its source snippet, if it carries one.
pub fn print_error(err: DriverError) {
    let report = miette::Report::new(err);
    eprintln!("{report:?}");
}

/// Prints recoverable syntax diagnostics to stderr.
pub fn print_warnings(errors: &[String]) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    for err in errors {
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        eprint!("warning");
        let _ = stderr.reset();
        eprintln!(": {}", err);
    }
}

// ============================================================================
// ROUND TRIPS
// ============================================================================

/// Prints a colored line diff. Returns whether the two texts differ.
pub fn print_roundtrip(expected: &str, actual: &str) -> bool {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let changeset = Changeset::new(expected, actual, "\n");
    if changeset.distance == 0 {
        print_status(&mut stdout, true, "round trip is lossless");
        return false;
    }
    print_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
    true
}

/// One `✓`/`✗` line per checked file.
pub fn print_check(name: &str, ok: bool, detail: Option<&str>) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    print_status(&mut stdout, ok, name);
    if let Some(detail) = detail {
        println!("    {}", detail);
    }
}

pub fn print_summary(passed: usize, failed: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_bold(true));
    println!("\nChecked {} files", passed + failed);
    let _ = stdout.reset();
    if passed > 0 {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        println!("  passed: {}", passed);
    }
    if failed > 0 {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        println!("  failed: {}", failed);
    }
    let _ = stdout.reset();
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_status(stdout: &mut StandardStream, ok: bool, text: &str) {
    let (mark, color) = if ok { ("✓", Color::Green) } else { ("✗", Color::Red) };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
    print!("{}", mark);
    let _ = stdout.reset();
    println!(" {}", text);
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    println!(" {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    println!("+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    println!("-{}", line);
                }
            }
        }
    }
}
