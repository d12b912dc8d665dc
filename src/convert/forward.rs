//! Native tree to generic tree.
//!
//! The walk is driven by each node's [`TypeDescriptor`](crate::reflect::TypeDescriptor): one
//! generic object per structural node, one key per declared field. Position fields are gathered
//! into the node's `@pos` object instead of appearing as keys of their own.

use crate::reflect::{FieldRef, FieldType, Reflect};
use crate::syntax::token::Pos;
use crate::uast::{positions, Node, Object, Position, KEY_POS, KEY_TYPE};

/// Converts a structural node and everything below it.
pub fn to_generic(node: &dyn Reflect) -> Node {
    let descriptor = node.descriptor();
    let mut obj = Object::new();
    obj.insert(KEY_TYPE.to_string(), Node::from(descriptor.name));

    let mut named: Vec<(&str, Pos)> = Vec::new();
    for field in descriptor.fields {
        if field.ty.is_excluded() {
            continue;
        }
        match (field.ty, node.get(field.name)) {
            (FieldType::Pos, FieldRef::Pos(pos)) => named.push((field.name, pos)),
            (_, value) => {
                obj.insert(field.name.to_string(), value_to_generic(value));
            }
        }
    }
    obj.insert(
        KEY_POS.to_string(),
        positions(node.start(), node.end(), &named),
    );
    Node::Object(obj)
}

fn value_to_generic(value: FieldRef<'_>) -> Node {
    match value {
        FieldRef::Nil => Node::Null,
        FieldRef::Pos(pos) => Position::from_pos(pos),
        FieldRef::Token(token) => Node::from(token.as_str()),
        FieldRef::Str(s) => Node::from(s),
        FieldRef::Int(i) => Node::Int(i),
        FieldRef::Bool(b) => Node::Bool(b),
        FieldRef::Node(child) => to_generic(child),
        // Empty sequences are compacted to null.
        FieldRef::Seq(items) if items.is_empty() => Node::Null,
        FieldRef::Seq(items) => Node::Array(items.into_iter().map(value_to_generic).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{BinaryExpr, Expr, Ident};
    use crate::syntax::token::Token;
    use crate::uast::TYPE_POSITIONS;

    #[test]
    fn test_binary_expression_shape() {
        let expr = BinaryExpr {
            x: Expr::ident("a", Pos::from_offset(0)),
            op_pos: Pos::from_offset(2),
            op: Token::Add,
            y: Expr::ident("b", Pos::from_offset(4)),
        };
        let node = to_generic(&expr);
        assert_eq!(node.type_name(), Some("BinaryExpr"));
        assert_eq!(node.get("Op"), Some(&Node::from("+")));
        assert!(node.get("OpPos").is_none());

        let pos = node.get(KEY_POS).expect("positions");
        assert_eq!(pos.type_name(), Some(TYPE_POSITIONS));
        let op_pos = Position::from_node(pos.get("OpPos").expect("OpPos")).expect("valid");
        assert_eq!(op_pos.offset, 2);
        let end = Position::from_node(pos.get("end").expect("end")).expect("valid");
        assert_eq!(end.offset, 5);
    }

    #[test]
    fn test_excluded_and_empty_fields() {
        let ident = Ident::new("x", Pos::NONE);
        let node = to_generic(&ident);
        assert!(node.get("Obj").is_none());
        let pos = node.get(KEY_POS).expect("positions");
        assert_eq!(pos.get("start"), Some(&Node::Null));
        assert_eq!(pos.get("NamePos"), Some(&Node::Null));
    }
}
