//! # Type Registry
//!
//! Maps structural type names to their descriptors so the reverse converter can instantiate a
//! native node from the `@type` tag of a generic object.
//!
//! ## Usage Workflow
//! ```rust
//! use go_driver::reflect::TypeRegistry;
//! let registry = TypeRegistry::go();
//! assert!(registry.contains("FuncDecl"));
//! assert!(registry.lookup("uast:Identifier").is_none());
//! ```
//!
//! ## Registry Invariant
//! The registry is built once at the entry point and passed by reference to every conversion.
//! Nothing in the crate keeps a hidden global copy.

use std::collections::{BTreeMap, BTreeSet};

use crate::reflect::TypeDescriptor;
use crate::syntax::ast;

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<&'static str, &'static TypeDescriptor>,
    /// Types whose null pointer is reconstructed as a zero instance rather than nil.
    non_null: BTreeSet<&'static str>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of every Go AST node type.
    pub fn go() -> Self {
        let mut registry = Self::new();
        for descriptor in ast::descriptors() {
            registry.register(descriptor);
        }
        registry.mark_non_null("FuncType");
        registry
    }

    /// Registers a descriptor under its type name, replacing any previous entry.
    pub fn register(&mut self, descriptor: &'static TypeDescriptor) {
        self.types.insert(descriptor.name, descriptor);
    }

    pub fn mark_non_null(&mut self, name: &'static str) {
        self.non_null.insert(name);
    }

    pub fn lookup(&self, name: &str) -> Option<&'static TypeDescriptor> {
        self.types.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn is_non_null(&self, name: &str) -> bool {
        self.non_null.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_registry_knows_every_node() {
        let registry = TypeRegistry::go();
        assert_eq!(registry.len(), ast::descriptors().len());
        for name in ["File", "Ident", "BasicLit", "FuncDecl", "RangeStmt", "ImportSpec"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert!(!registry.contains("Scope"));
        assert!(!registry.contains("Object"));
    }

    #[test]
    fn test_lookup_returns_descriptor_with_fields() {
        let registry = TypeRegistry::go();
        let ident = registry.lookup("Ident").expect("Ident registered");
        assert_eq!(ident.name, "Ident");
        assert!(ident.field("NamePos").is_some());
        assert!(registry.is_non_null("FuncType"));
        assert!(!registry.is_non_null("Ident"));
    }
}
