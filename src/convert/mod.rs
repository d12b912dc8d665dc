//! # Native ⇄ Generic Conversion
//!
//! [`to_generic`] walks a native tree through its reflective descriptors and produces the
//! vendor-neutral [`Node`](crate::uast::Node) form. [`to_native`] and [`to_file`] rebuild the
//! native tree from that form using a [`TypeRegistry`](crate::reflect::TypeRegistry).
//!
//! The two directions are inverses on everything but the excluded fields (scopes and resolved
//! objects) and the start/end summary positions, which are derived rather than stored.

pub mod forward;
pub mod reverse;

pub use forward::to_generic;
pub use reverse::{from_generic, repair, to_file, to_native};
