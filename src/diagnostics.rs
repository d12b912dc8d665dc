//! # Driver Diagnostics
//!
//! This module defines the unified, `miette`-based error type for the driver. Every stage of the
//! pipeline (native parsing, both converters, annotation, normalization and the protocol layer)
//! reports failure through [`DriverError`].
//!
//! ## Error Construction Macros
//!
//! - `driver_err!(ShapeMismatch, "expected {} but found {}", want, got)` builds an error with a
//!   formatted message and an empty context.
//! - `driver_ctx!(ParseFailure, message, src, span)` attaches the source text and a byte span so
//!   that `miette` can render the offending region. An optional fifth argument adds a help line.
//!
//! ## Classification
//!
//! [`ErrorKind`] mirrors the variants one to one and is what tests and the protocol layer match on.
//! Recoverable syntax errors are *not* `DriverError`s: they travel as [`SyntaxError`] values next to
//! a partial tree (see `driver::Status::Error`).

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// A half-open byte range into a source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Type-safe classification of [`DriverError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The native parser produced no tree at all.
    ParseFailure,
    /// A generic object named a structural type the registry does not know.
    UnknownType,
    /// A generic object carried a field the resolved descriptor does not declare.
    UnknownField,
    /// A value had a different shape than the conversion step expected.
    ShapeMismatch,
    /// A mapping matched but its replacement could not be built.
    Transform,
    /// Malformed request or response envelope.
    Protocol,
    /// Reading or writing failed.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseFailure => "ParseFailure",
            ErrorKind::UnknownType => "UnknownType",
            ErrorKind::UnknownField => "UnknownField",
            ErrorKind::ShapeMismatch => "ShapeMismatch",
            ErrorKind::Transform => "Transform",
            ErrorKind::Protocol => "Protocol",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source, span and help attached to an error for rendering.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for every failure mode of the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Parse failure: {message}")]
    ParseFailure {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("Unknown type: {message}")]
    UnknownType {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("Unknown field: {message}")]
    UnknownField {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("Shape mismatch: {message}")]
    ShapeMismatch {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("Transform error: {message}")]
    Transform {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DriverError {
    fn ctx(&self) -> &ErrorContext {
        match self {
            DriverError::ParseFailure { ctx, .. }
            | DriverError::UnknownType { ctx, .. }
            | DriverError::UnknownField { ctx, .. }
            | DriverError::ShapeMismatch { ctx, .. }
            | DriverError::Transform { ctx, .. }
            | DriverError::Protocol { ctx, .. }
            | DriverError::Io { ctx, .. } => ctx,
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            DriverError::ParseFailure { ctx, .. }
            | DriverError::UnknownType { ctx, .. }
            | DriverError::UnknownField { ctx, .. }
            | DriverError::ShapeMismatch { ctx, .. }
            | DriverError::Transform { ctx, .. }
            | DriverError::Protocol { ctx, .. }
            | DriverError::Io { ctx, .. } => ctx,
        }
    }

    /// The bare message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            DriverError::ParseFailure { message, .. }
            | DriverError::UnknownType { message, .. }
            | DriverError::UnknownField { message, .. }
            | DriverError::ShapeMismatch { message, .. }
            | DriverError::Transform { message, .. }
            | DriverError::Protocol { message, .. }
            | DriverError::Io { message, .. } => message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::ParseFailure { .. } => ErrorKind::ParseFailure,
            DriverError::UnknownType { .. } => ErrorKind::UnknownType,
            DriverError::UnknownField { .. } => ErrorKind::UnknownField,
            DriverError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            DriverError::Transform { .. } => ErrorKind::Transform,
            DriverError::Protocol { .. } => ErrorKind::Protocol,
            DriverError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Attaches a named source so the error renders with a snippet. Keeps an existing source.
    pub fn with_source(mut self, name: &str, text: &str) -> Self {
        let ctx = self.ctx_mut();
        if ctx.source.is_none() {
            ctx.source = Some(to_error_source(name, text));
        }
        self
    }

    /// Prefixes the message with the location it occurred at, e.g. a field path.
    pub fn within(mut self, location: impl fmt::Display) -> Self {
        match &mut self {
            DriverError::ParseFailure { message, .. }
            | DriverError::UnknownType { message, .. }
            | DriverError::UnknownField { message, .. }
            | DriverError::ShapeMismatch { message, .. }
            | DriverError::Transform { message, .. }
            | DriverError::Protocol { message, .. }
            | DriverError::Io { message, .. } => {
                *message = format!("{location}: {message}");
            }
        }
        self
    }
}

impl Diagnostic for DriverError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("go_driver::{}", self.kind())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.ctx().span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message().to_string()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io {
            message: err.to_string(),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Protocol {
            message: err.to_string(),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }
}

/// A recoverable syntax error reported by the native parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Byte offset of the offending token.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

pub fn to_error_source(name: &str, text: &str) -> SourceArc {
    Arc::new(NamedSource::new(name, text.to_string()))
}

/// Constructs a [`DriverError`] variant with a formatted message and no context.
#[macro_export]
macro_rules! driver_err {
    ($variant:ident, $($fmt:tt)+) => {
        $crate::DriverError::$variant {
            message: format!($($fmt)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a [`DriverError`] variant carrying a source text and span, with optional help.
#[macro_export]
macro_rules! driver_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::DriverError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::DriverError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_message_and_kind() {
        let err = driver_err!(UnknownField, "field {} on {}", "Foo", "Ident");
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        assert_eq!(err.message(), "field Foo on Ident");
        assert_eq!(err.to_string(), "Unknown field: field Foo on Ident");
    }

    #[test]
    fn test_within_prefixes_location() {
        let err = driver_err!(ShapeMismatch, "expected object").within("File.Decls[0]");
        assert_eq!(err.message(), "File.Decls[0]: expected object");
    }

    #[test]
    fn test_report_renders_label_and_help() {
        let src = to_error_source("main.go", "pkg main");
        let err = driver_ctx!(
            ParseFailure,
            "expected 'package'",
            &src,
            Span::new(0, 3),
            "every Go file starts with a package clause"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("expected 'package'"));
        assert!(output.contains("every Go file starts with a package clause"));
    }

    #[test]
    fn test_with_source_keeps_existing() {
        let src = to_error_source("a.go", "package a");
        let err = driver_ctx!(ParseFailure, "boom", &src, Span::new(0, 1)).with_source("b.go", "x");
        let named = err.ctx().source.as_ref().map(|s| s.name().to_string());
        assert_eq!(named.as_deref(), Some("a.go"));
    }

    #[test]
    fn test_underlying_cause_is_the_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.go");
        let err = DriverError::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
        let cause = err.source().expect("io cause");
        assert_eq!(cause.to_string(), "missing.go");

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(DriverError::from(json).source().is_some());
        assert!(driver_err!(ShapeMismatch, "no cause").source().is_none());
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError {
            offset: 14,
            line: 2,
            column: 3,
            message: "expected ';', found 'EOF'".to_string(),
        };
        assert_eq!(err.to_string(), "2:3: expected ';', found 'EOF'");
    }
}
