//! # Transform Pipeline
//!
//! Structural rewriting of generic trees with declarative [`Mapping`]s.
//!
//! ## Mappings
//!
//! A mapping is a pair of [patterns](ops::Op): a source shape and a destination shape. Forward,
//! a node that matches the source is replaced by the construction of the destination; reverse,
//! the roles swap. A node that does not match is left alone.
//!
//! ## Traversal
//!
//! [`Mappings`] walks the tree top-down. At each object, the candidate mappings are those whose
//! pattern requires the object's type tag; the first that matches rewrites the node, then the
//! walk continues into the rewritten node's children. Reverse, candidates are tried in reverse
//! declaration order, so a later, more general mapping never shadows an earlier, more specific
//! one on the way back.
//!
//! Mapping application preserves the node's own `@role`.
//!
//! ## Pipelines
//!
//! A [`Transforms`] value is an ordered list of stages. Forward runs the stages in order; reverse
//! runs them in reverse order, each in the reverse direction.

use tracing::trace;

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::uast::{is_reserved, Node, KEY_ROLE};

pub mod normalizer;
pub mod ops;

pub use ops::{CustomOp, FieldOp, Op, State};

/// Which way a mapping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

// ============================================================================
// MAPPING
// ============================================================================

#[derive(Debug, Clone)]
pub struct Mapping {
    name: String,
    src: Op,
    dst: Op,
}

impl Mapping {
    pub fn new(name: impl Into<String>, src: Op, dst: Op) -> Self {
        Self {
            name: name.into(),
            src,
            dst,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type tag of the nodes this mapping rewrites in the given direction.
    pub fn matches_type(&self, dir: Direction) -> Option<&str> {
        match dir {
            Direction::Forward => self.src.type_tag(),
            Direction::Reverse => self.dst.type_tag(),
        }
    }

    /// Rewrites one node. `Ok(None)` means the mapping does not apply.
    pub fn apply(&self, node: &Node, dir: Direction) -> Result<Option<Node>, DriverError> {
        let (from, to) = match dir {
            Direction::Forward => (&self.src, &self.dst),
            Direction::Reverse => (&self.dst, &self.src),
        };
        let mut input = node.clone();
        let roles = input.as_object_mut().and_then(|obj| obj.remove(KEY_ROLE));

        let mut st = State::new();
        if !from.check(&mut st, &input)? {
            return Ok(None);
        }
        let mut output = to
            .construct(&st)
            .map_err(|e| e.within(format!("mapping {:?}", self.name)))?;
        if let (Some(roles), Some(obj)) = (roles, output.as_object_mut()) {
            obj.insert(KEY_ROLE.to_string(), roles);
        }
        Ok(Some(output))
    }
}

// ============================================================================
// MAPPINGS
// ============================================================================

/// A named list of mappings applied together in one top-down walk.
#[derive(Debug, Clone)]
pub struct Mappings {
    name: &'static str,
    mappings: Vec<Mapping>,
}

impl Mappings {
    pub fn new(name: &'static str, mappings: Vec<Mapping>) -> Self {
        Self { name, mappings }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn apply(&self, node: Node, dir: Direction) -> Result<Node, DriverError> {
        self.walk(node, dir)
            .map_err(|e| e.within(format!("stage {}", self.name)))
    }

    fn walk(&self, node: Node, dir: Direction) -> Result<Node, DriverError> {
        let rewritten = match node.type_name() {
            Some(type_name) => self.rewrite(&node, type_name, dir)?,
            None => None,
        };
        let node = rewritten.unwrap_or(node);
        match node {
            Node::Object(obj) => obj
                .into_iter()
                .map(|(key, child)| {
                    if is_reserved(&key) {
                        Ok((key, child))
                    } else {
                        self.walk(child, dir).map(|child| (key, child))
                    }
                })
                .collect::<Result<_, _>>()
                .map(Node::Object),
            Node::Array(items) => items
                .into_iter()
                .map(|item| self.walk(item, dir))
                .collect::<Result<_, _>>()
                .map(Node::Array),
            scalar => Ok(scalar),
        }
    }

    fn rewrite(&self, node: &Node, type_name: &str, dir: Direction) -> Result<Option<Node>, DriverError> {
        let candidates: Box<dyn Iterator<Item = &Mapping>> = match dir {
            Direction::Forward => Box::new(self.mappings.iter()),
            Direction::Reverse => Box::new(self.mappings.iter().rev()),
        };
        for mapping in candidates.filter(|m| m.matches_type(dir) == Some(type_name)) {
            if let Some(out) = mapping.apply(node, dir)? {
                trace!(mapping = mapping.name(), ?dir, "rewrote node");
                return Ok(Some(out));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Ordered transform stages.
#[derive(Debug, Clone, Default)]
pub struct Transforms {
    stages: Vec<Mappings>,
}

impl Transforms {
    pub fn new(stages: Vec<Mappings>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Mappings] {
        &self.stages
    }

    pub fn forward(&self, mut node: Node) -> Result<Node, DriverError> {
        for stage in &self.stages {
            node = stage.apply(node, Direction::Forward)?;
        }
        Ok(node)
    }

    pub fn reverse(&self, mut node: Node) -> Result<Node, DriverError> {
        for stage in self.stages.iter().rev() {
            node = stage.apply(node, Direction::Reverse)?;
        }
        Ok(node)
    }
}

/// Fails a custom operation that found a node of the wrong shape while constructing.
pub(crate) fn unexpected(what: &str, found: &Node) -> DriverError {
    driver_err!(Transform, "expected {}, found {}", what, found.kind_name())
}
