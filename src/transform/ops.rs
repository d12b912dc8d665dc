//! # Pattern Operations
//!
//! A small pattern language over generic nodes. Every [`Op`] works in two directions:
//! - **check** matches a node against the pattern and binds variables into a [`State`],
//! - **construct** builds a node from the pattern and previously bound variables.
//!
//! A mapping checks with one pattern and constructs with the other, so the same pair of patterns
//! describes both the forward and the reverse rewrite.
//!
//! ## Object Patterns
//!
//! [`Op::Obj`] matches exactly the listed keys; a missing key reads as `null`. The `@role` key of
//! a matched object is metadata and is ignored. [`Op::Part`] matches the listed keys and binds
//! every other key into an object variable, which construction merges back.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::uast::{Node, Object, KEY_ROLE, KEY_TYPE};

// ============================================================================
// STATE
// ============================================================================

/// Variables bound while checking a pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    vars: BTreeMap<String, Node>,
    cases: BTreeMap<String, usize>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable. Rebinding to an equal value succeeds, to a different one fails.
    pub fn bind(&mut self, name: &str, value: Node) -> bool {
        match self.vars.get(name) {
            Some(existing) => *existing == value,
            None => {
                self.vars.insert(name.to_string(), value);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<&Node, DriverError> {
        self.vars
            .get(name)
            .ok_or_else(|| driver_err!(Transform, "variable {} is not bound", name))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn case(&self, name: &str) -> Option<usize> {
        self.cases.get(name).copied()
    }

    fn bind_case(&mut self, name: &str, index: usize) -> bool {
        match self.cases.get(name) {
            Some(existing) => *existing == index,
            None => {
                self.cases.insert(name.to_string(), index);
                true
            }
        }
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// A pattern operation implemented in code rather than composed from other operations.
pub trait CustomOp: fmt::Debug + Send + Sync {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError>;

    fn construct(&self, st: &State) -> Result<Node, DriverError>;
}

/// One key of an object pattern.
#[derive(Debug, Clone)]
pub struct FieldOp {
    pub name: String,
    pub op: Op,
    /// Omitted from constructed objects when the value is `null`.
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub enum Op {
    /// Matches anything; constructs `null`.
    Any,
    /// Matches and constructs exactly this value.
    Is(Node),
    /// Binds the whole value.
    Var(String),
    Obj(Vec<FieldOp>),
    /// Listed keys plus the rest of the object bound under a variable.
    Part(String, Vec<FieldOp>),
    /// A fixed-length array; the empty pattern also matches `null`.
    Arr(Vec<Op>),
    /// The first alternative that matches; the chosen index is bound under the variable.
    Cases(String, Vec<Op>),
    Custom(Arc<dyn CustomOp>),
}

impl Op {
    pub fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        match self {
            Op::Any => Ok(true),
            Op::Is(value) => Ok(value == node),
            Op::Var(name) => Ok(st.bind(name, node.clone())),
            Op::Obj(fields) => match node {
                Node::Object(obj) => check_fields(st, fields, obj, None),
                _ => Ok(false),
            },
            Op::Part(rest, fields) => match node {
                Node::Object(obj) => check_fields(st, fields, obj, Some(rest)),
                _ => Ok(false),
            },
            Op::Arr(ops) => {
                let items = match node {
                    Node::Array(items) => items.as_slice(),
                    Node::Null if ops.is_empty() => &[],
                    _ => return Ok(false),
                };
                if items.len() != ops.len() {
                    return Ok(false);
                }
                for (op, item) in ops.iter().zip(items) {
                    if !op.check(st, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Cases(name, alternatives) => {
                let bound = st.case(name);
                for (index, alt) in alternatives.iter().enumerate() {
                    if bound.map_or(false, |b| b != index) {
                        continue;
                    }
                    let mut attempt = st.clone();
                    if alt.check(&mut attempt, node)? && attempt.bind_case(name, index) {
                        *st = attempt;
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::Custom(op) => op.check(st, node),
        }
    }

    pub fn construct(&self, st: &State) -> Result<Node, DriverError> {
        match self {
            Op::Any => Ok(Node::Null),
            Op::Is(value) => Ok(value.clone()),
            Op::Var(name) => st.get(name).cloned(),
            Op::Obj(fields) => construct_fields(st, fields).map(Node::Object),
            Op::Part(rest, fields) => {
                let mut obj = match st.get(rest)? {
                    Node::Object(obj) => obj.clone(),
                    Node::Null => Object::new(),
                    other => {
                        return Err(driver_err!(
                            Transform,
                            "variable {} holds {}, not an object",
                            rest,
                            other.kind_name()
                        ))
                    }
                };
                obj.extend(construct_fields(st, fields)?);
                Ok(Node::Object(obj))
            }
            Op::Arr(ops) if ops.is_empty() => Ok(Node::Null),
            Op::Arr(ops) => ops
                .iter()
                .map(|op| op.construct(st))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::Array),
            Op::Cases(name, alternatives) => {
                let index = st
                    .case(name)
                    .ok_or_else(|| driver_err!(Transform, "case {} is not bound", name))?;
                alternatives
                    .get(index)
                    .ok_or_else(|| driver_err!(Transform, "case {} has no alternative {}", name, index))?
                    .construct(st)
            }
            Op::Custom(op) => op.construct(st),
        }
    }

    /// The type tag this pattern requires, if it requires a fixed one.
    pub fn type_tag(&self) -> Option<&str> {
        let fields = match self {
            Op::Obj(fields) | Op::Part(_, fields) => fields,
            _ => return None,
        };
        fields
            .iter()
            .find(|f| f.name == KEY_TYPE)
            .and_then(|f| match &f.op {
                Op::Is(Node::String(tag)) => Some(tag.as_str()),
                _ => None,
            })
    }
}

fn check_fields(
    st: &mut State,
    fields: &[FieldOp],
    obj: &Object,
    rest: Option<&String>,
) -> Result<bool, DriverError> {
    for field in fields {
        let value = obj.get(&field.name).unwrap_or(&Node::Null);
        if !field.op.check(st, value)? {
            return Ok(false);
        }
    }
    let unmatched: Object = obj
        .iter()
        .filter(|(key, _)| *key != KEY_ROLE && !fields.iter().any(|f| &f.name == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    match rest {
        Some(name) => Ok(st.bind(name, Node::Object(unmatched))),
        None => Ok(unmatched.is_empty()),
    }
}

fn construct_fields(st: &State, fields: &[FieldOp]) -> Result<Object, DriverError> {
    let mut obj = Object::new();
    for field in fields {
        let value = field
            .op
            .construct(st)
            .map_err(|e| e.within(&field.name))?;
        if field.optional && value.is_null() {
            continue;
        }
        obj.insert(field.name.clone(), value);
    }
    Ok(obj)
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn var(name: &str) -> Op {
    Op::Var(name.to_string())
}

pub fn is(value: impl Into<Node>) -> Op {
    Op::Is(value.into())
}

pub fn null() -> Op {
    Op::Is(Node::Null)
}

pub fn field(name: &str, op: Op) -> FieldOp {
    FieldOp {
        name: name.to_string(),
        op,
        optional: false,
    }
}

/// A key omitted from constructed objects when `null`.
pub fn optional(name: &str, op: Op) -> FieldOp {
    FieldOp {
        optional: true,
        ..field(name, op)
    }
}

pub fn obj(fields: Vec<FieldOp>) -> Op {
    Op::Obj(fields)
}

/// An object pattern with a fixed type tag.
pub fn typed(type_name: &str, mut fields: Vec<FieldOp>) -> Op {
    fields.insert(0, field(KEY_TYPE, is(type_name)));
    Op::Obj(fields)
}

pub fn part(rest: &str, fields: Vec<FieldOp>) -> Op {
    Op::Part(rest.to_string(), fields)
}

pub fn arr(ops: Vec<Op>) -> Op {
    Op::Arr(ops)
}

pub fn cases(name: &str, alternatives: Vec<Op>) -> Op {
    Op::Cases(name.to_string(), alternatives)
}

/// `null`, or the given pattern; which one matched is bound under `name`.
pub fn opt(name: &str, op: Op) -> Op {
    cases(name, vec![null(), op])
}

pub fn custom(op: impl CustomOp + 'static) -> Op {
    Op::Custom(Arc::new(op))
}
