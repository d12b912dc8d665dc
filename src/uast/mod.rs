//! # Generic Tree
//!
//! The vendor-neutral node shared by every stage after native parsing: objects, arrays and
//! scalars. Objects carry their structural type under the reserved `@type` key, their positions
//! under `@pos` and, once annotated, their roles under `@role`.
//!
//! ## Positions
//!
//! A single position is `{"@type": "uast:Position", "offset": N}`; `line` and `col` are added by
//! [`reconcile`]. A node's positions object is `{"@type": "uast:Positions", "start": .., "end": ..}`
//! plus the node's own named positions under their Go field names. Invalid positions are `null`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::syntax::token::Pos;

pub mod reconcile;

pub use reconcile::reconcile;

pub const KEY_TYPE: &str = "@type";
pub const KEY_POS: &str = "@pos";
pub const KEY_ROLE: &str = "@role";

pub const KEY_START: &str = "start";
pub const KEY_END: &str = "end";

pub const TYPE_POSITION: &str = "uast:Position";
pub const TYPE_POSITIONS: &str = "uast:Positions";

/// Type tags of the normalized, language-independent node shapes.
pub mod types {
    pub const IDENTIFIER: &str = "uast:Identifier";
    pub const QUALIFIED_IDENTIFIER: &str = "uast:QualifiedIdentifier";
    pub const STRING: &str = "uast:String";
    pub const COMMENT: &str = "uast:Comment";
    pub const BLOCK: &str = "uast:Block";
    pub const IMPORT: &str = "uast:Import";
    pub const ALIAS: &str = "uast:Alias";
    pub const FUNCTION_GROUP: &str = "uast:FunctionGroup";
    pub const FUNCTION: &str = "uast:Function";
    pub const FUNCTION_TYPE: &str = "uast:FunctionType";
    pub const ARGUMENT: &str = "uast:Argument";
}

pub type Object = BTreeMap<String, Node>;

/// A generic tree node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Array(Vec<Node>),
    Object(Object),
}

/// Whether an object key is metadata rather than a structural field.
pub fn is_reserved(key: &str) -> bool {
    key.starts_with('@')
}

impl Node {
    /// An object with only its type tag set.
    pub fn typed(type_name: &str) -> Node {
        let mut obj = Object::new();
        obj.insert(KEY_TYPE.to_string(), Node::from(type_name));
        Node::Object(obj)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Int(_) | Node::Uint(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// The `@type` tag of an object.
    pub fn type_name(&self) -> Option<&str> {
        self.get(KEY_TYPE).and_then(Node::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Node::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            Node::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Node::Int(i) => u64::try_from(*i).ok(),
            Node::Uint(u) => Some(*u),
            _ => None,
        }
    }

    /// Sets a key on an object node; other nodes are left untouched.
    pub fn set(&mut self, key: &str, value: Node) {
        if let Some(obj) = self.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }

    /// Number of object nodes in the tree, including this one.
    pub fn count_objects(&self) -> usize {
        match self {
            Node::Object(obj) => 1 + obj.values().map(Node::count_objects).sum::<usize>(),
            Node::Array(items) => items.iter().map(Node::count_objects).sum(),
            _ => 0,
        }
    }

    /// Calls `f` on this node and every descendant, parents before children.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        f(self);
        match self {
            Node::Object(obj) => obj.values().for_each(|child| child.walk(f)),
            Node::Array(items) => items.iter().for_each(|child| child.walk(f)),
            _ => {}
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl From<Object> for Node {
    fn from(obj: Object) -> Self {
        Node::Object(obj)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "<{}>", self.kind_name()),
        }
    }
}

// ============================================================================
// POSITIONS
// ============================================================================

/// A resolved source position. `line` and `col` are zero until reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The generic form of a native position; invalid positions become `null`.
    pub fn from_pos(pos: Pos) -> Node {
        match pos.offset() {
            Some(offset) => Position {
                offset,
                ..Position::default()
            }
            .to_node(),
            None => Node::Null,
        }
    }

    pub fn to_node(self) -> Node {
        let Node::Object(mut obj) = Node::typed(TYPE_POSITION) else {
            return Node::Null;
        };
        obj.insert("offset".to_string(), Node::Int(self.offset as i64));
        if self.line != 0 {
            obj.insert("line".to_string(), Node::Int(self.line as i64));
            obj.insert("col".to_string(), Node::Int(self.col as i64));
        }
        Node::Object(obj)
    }

    /// Reads a `uast:Position` object; `None` for anything else.
    pub fn from_node(node: &Node) -> Option<Position> {
        if node.type_name() != Some(TYPE_POSITION) {
            return None;
        }
        let field = |key: &str| {
            node.get(key)
                .and_then(Node::as_u64)
                .map_or(0, |v| v as usize)
        };
        Some(Position {
            offset: node.get("offset").and_then(Node::as_u64)? as usize,
            line: field("line"),
            col: field("col"),
        })
    }

    /// Back to a native position; `None` when the offset does not fit one.
    pub fn to_pos(self) -> Option<Pos> {
        Pos::try_from_offset(self.offset)
    }
}

/// Builds a `uast:Positions` object from start, end and the named positions of a node.
pub fn positions(start: Pos, end: Pos, named: &[(&str, Pos)]) -> Node {
    let mut node = Node::typed(TYPE_POSITIONS);
    node.set(KEY_START, Position::from_pos(start));
    node.set(KEY_END, Position::from_pos(end));
    for (name, pos) in named {
        node.set(name, Position::from_pos(*pos));
    }
    node
}

/// Start offset of a node's `@pos`, if it has a valid one.
pub fn start_offset(node: &Node) -> Option<usize> {
    node.get(KEY_POS)
        .and_then(|p| p.get(KEY_START))
        .and_then(Position::from_node)
        .map(|p| p.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shape() {
        let mut node = Node::typed("Ident");
        node.set("Name", Node::from("main"));
        node.set("Obj", Node::Null);
        let json = serde_json::to_string(&node).expect("serializes");
        assert_eq!(json, r#"{"@type":"Ident","Name":"main","Obj":null}"#);
        let back: Node = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, node);
    }

    #[test]
    fn test_numbers_prefer_signed_integers() {
        let node: Node = serde_json::from_str("[1, -2, 18446744073709551615, 1.5]").expect("parses");
        assert_eq!(
            node,
            Node::Array(vec![
                Node::Int(1),
                Node::Int(-2),
                Node::Uint(u64::MAX),
                Node::Float(1.5)
            ])
        );
    }

    #[test]
    fn test_position_round_trip() {
        let node = Position::from_pos(Pos::from_offset(8));
        assert_eq!(node.type_name(), Some(TYPE_POSITION));
        assert!(node.get("line").is_none());
        let pos = Position::from_node(&node).expect("is a position");
        assert_eq!(pos.offset, 8);
        assert_eq!(pos.to_pos(), Some(Pos::from_offset(8)));
        assert_eq!(Position::from_pos(Pos::NONE), Node::Null);
    }

    #[test]
    fn test_positions_object() {
        let node = positions(
            Pos::from_offset(0),
            Pos::from_offset(12),
            &[("Package", Pos::from_offset(0))],
        );
        assert_eq!(node.type_name(), Some(TYPE_POSITIONS));
        let mut file = Node::typed("File");
        file.set(KEY_POS, node.clone());
        assert_eq!(start_offset(&file), Some(0));
        assert!(node.get("Package").is_some());
    }
}
