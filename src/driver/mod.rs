//! # Driver
//!
//! The end-to-end entry points: Go source in, generic tree out, and back.
//!
//! ## Pipeline
//!
//! Parsing runs, in order: the native parser, forward conversion, annotation (annotated and
//! semantic modes), the transform stages (semantic mode only) and finally position
//! reconciliation against the original source. Generation runs the inverse: the transform
//! stages in reverse, reverse conversion, the post-pass repair and the printer.
//!
//! ## Outcomes
//!
//! A parse never fails outright at this level. Recoverable syntax errors give an [`Status::Error`]
//! outcome that still carries the partial tree; anything that prevents a tree from being produced
//! gives [`Status::Fatal`] with no tree at all.
//!
//! A [`Driver`] holds only read-only tables and can be shared between threads.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::annotate::RuleSet;
use crate::convert::{to_file, to_generic};
use crate::diagnostics::{DriverError, SyntaxError};
use crate::reflect::TypeRegistry;
use crate::syntax::{parse_file, print_file};
use crate::transform::Transforms;
use crate::uast::{reconcile, Node};

pub mod protocol;

/// The file name used in diagnostics when the caller gives none.
pub const DEFAULT_NAME: &str = "<input>";

// ============================================================================
// OPTIONS
// ============================================================================

/// How far down the pipeline a parse goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The native tree, converted as-is.
    Native,
    /// The native tree with semantic roles.
    Annotated,
    /// Annotated and normalized to language-independent shapes.
    #[default]
    Semantic,
}

impl Mode {
    fn annotates(self) -> bool {
        !matches!(self, Mode::Native)
    }

    fn normalizes(self) -> bool {
        matches!(self, Mode::Semantic)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub mode: Mode,
    /// Reported back in responses; the parser accepts a single Go grammar.
    pub language_version: Option<String>,
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// A partial tree with syntax diagnostics.
    Error,
    /// No tree.
    Fatal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub status: Status,
    pub errors: Vec<String>,
    pub ast: Option<Node>,
}

impl ParseOutcome {
    fn fatal(err: &DriverError) -> Self {
        Self {
            status: Status::Fatal,
            errors: vec![err.to_string()],
            ast: None,
        }
    }
}

// ============================================================================
// DRIVER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Driver {
    registry: TypeRegistry,
    rules: RuleSet,
    transforms: Transforms,
    options: DriverOptions,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(DriverOptions::default())
    }
}

impl Driver {
    /// A driver with the Go registry, annotation rules and normalization stages.
    pub fn new(options: DriverOptions) -> Self {
        Self {
            registry: TypeRegistry::go(),
            rules: RuleSet::go(),
            transforms: Transforms::go(),
            options,
        }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn mode(&self) -> Mode {
        self.options.mode
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// Parses `source` into a generic tree and classifies the result.
    pub fn parse(&self, source: &str, mode: Mode) -> ParseOutcome {
        match self.try_parse(DEFAULT_NAME, source, mode) {
            Ok((ast, diagnostics)) if diagnostics.is_empty() => ParseOutcome {
                status: Status::Ok,
                errors: Vec::new(),
                ast: Some(ast),
            },
            Ok((ast, diagnostics)) => ParseOutcome {
                status: Status::Error,
                errors: diagnostics.iter().map(ToString::to_string).collect(),
                ast: Some(ast),
            },
            Err(err) => {
                error!(kind = err.kind().as_str(), "parse failed: {}", err);
                ParseOutcome::fatal(&err)
            }
        }
    }

    /// Runs the forward pipeline, returning the tree with any recoverable syntax errors.
    pub fn try_parse(
        &self,
        name: &str,
        source: &str,
        mode: Mode,
    ) -> Result<(Node, Vec<SyntaxError>), DriverError> {
        let parsed = parse_file(name, source)?;
        for diagnostic in &parsed.diagnostics {
            warn!(file = name, "{}", diagnostic);
        }

        let mut ast = to_generic(&parsed.file);
        debug!(file = name, objects = ast.count_objects(), "converted native tree");

        if mode.annotates() {
            self.rules.annotate(&mut ast)?;
            debug!(file = name, "annotated");
        }
        if mode.normalizes() {
            ast = self.transforms.forward(ast)?;
            debug!(file = name, stages = self.transforms.stages().len(), "normalized");
        }

        let filled = reconcile(&mut ast, source);
        debug!(file = name, positions = filled, "reconciled positions");
        Ok((ast, parsed.diagnostics))
    }

    /// Turns a generic tree produced in `mode` back into Go source.
    pub fn generate(&self, ast: &Node, mode: Mode) -> Result<String, DriverError> {
        let native = if mode.normalizes() {
            let reversed = self.transforms.reverse(ast.clone())?;
            debug!("reversed normalization");
            to_file(&reversed, &self.registry)?
        } else {
            to_file(ast, &self.registry)?
        };
        Ok(print_file(&native))
    }

    /// Prints `source` canonically twice: straight from the parser, and after a trip through
    /// the generic tree in the driver's mode. Equal strings mean the trip was lossless.
    pub fn roundtrip(&self, name: &str, source: &str) -> Result<(String, String), DriverError> {
        let expected = print_file(&parse_file(name, source)?.file);
        let (ast, _) = self.try_parse(name, source, self.mode())?;
        let actual = self.generate(&ast, self.mode())?;
        Ok((expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uast::{Position, KEY_POS, KEY_START};

    #[test]
    fn test_minimal_file_in_native_mode() {
        let outcome = Driver::default().parse("package main", Mode::Native);
        assert_eq!(outcome.status, Status::Ok);
        let ast = outcome.ast.expect("tree");
        assert_eq!(ast.type_name(), Some("File"));
        let start = ast
            .get(KEY_POS)
            .and_then(|p| p.get(KEY_START))
            .and_then(Position::from_node)
            .expect("start");
        assert_eq!((start.offset, start.line, start.col), (0, 1, 1));
    }

    #[test]
    fn test_missing_package_clause_is_fatal() {
        let outcome = Driver::default().parse("func main() {}", Mode::Semantic);
        assert_eq!(outcome.status, Status::Fatal);
        assert!(outcome.ast.is_none());
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_syntax_errors_keep_partial_tree() {
        let outcome = Driver::default().parse("package p\nfunc f( {}\nvar x = 1\n", Mode::Annotated);
        assert_eq!(outcome.status, Status::Error);
        assert!(!outcome.errors.is_empty());
        assert!(outcome.ast.is_some());
    }

    #[test]
    fn test_generate_inverts_every_mode() {
        let src = "package p\n\nfunc f(a, b int) int {\n\treturn a + b\n}\n";
        for mode in [Mode::Native, Mode::Annotated, Mode::Semantic] {
            let driver = Driver::new(DriverOptions {
                mode,
                language_version: None,
            });
            let (expected, actual) = driver.roundtrip(DEFAULT_NAME, src).expect("roundtrip");
            assert_eq!(expected, actual, "mode {:?}", mode);
        }
    }
}
