//! # go-driver
//!
//! Parses Go source into a vendor-neutral generic tree annotated with semantic roles, and turns
//! such trees back into Go source.
//!
//! The [`driver::Driver`] ties the stages together; the modules below can also be used on their
//! own.

pub use crate::diagnostics::{DriverError, ErrorContext, ErrorKind, Span, SyntaxError};

pub mod annotate;
pub mod cli;
pub mod convert;
pub mod diagnostics;
pub mod driver;
pub mod reflect;
pub mod syntax;
pub mod transform;
pub mod uast;
