//! Generic tree to native tree.
//!
//! The target shape comes from the data: every object names its structural type under `@type`,
//! which the [`TypeRegistry`] resolves to a descriptor. Each field value is then converted against
//! the field's declared [`FieldType`] and assigned through [`Reflect::set`].
//!
//! ## Null Handling
//!
//! `null` against a pointer or interface slot is the absent value, except for types the registry
//! marks as always non-null, which get a fresh zero instance. After reconstruction a repair pass
//! replaces the nulls the native printer cannot take (function types and parameter lists).

use std::collections::BTreeSet;

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::reflect::{downcast, FieldType, Iface, Native, Reflect, TypeRegistry};
use crate::syntax::ast::{self, File, FuncDecl, FuncLit, FuncType};
use crate::syntax::token::{Pos, Token};
use crate::uast::{
    is_reserved, Node, Object, Position, KEY_END, KEY_POS, KEY_START, KEY_TYPE, TYPE_POSITIONS,
};

/// Reconstructs any structural node, then repairs required substructures.
pub fn to_native(node: &Node, registry: &TypeRegistry) -> Result<Box<dyn Reflect>, DriverError> {
    match from_generic(node, FieldType::Iface(Iface::Node), registry)? {
        Native::Node(mut native) => {
            repair(native.as_mut());
            Ok(native)
        }
        other => Err(driver_err!(
            ShapeMismatch,
            "expected a structural node at the root, found {}",
            other.kind_name()
        )),
    }
}

/// Reconstructs a whole file.
pub fn to_file(node: &Node, registry: &TypeRegistry) -> Result<File, DriverError> {
    let native = to_native(node, registry)?;
    downcast::<File>(native).map(|file| *file)
}

/// Converts one generic value against a declared field type.
pub fn from_generic(
    node: &Node,
    ty: FieldType,
    registry: &TypeRegistry,
) -> Result<Native, DriverError> {
    match (node, ty) {
        (Node::Null, FieldType::Node(name)) if registry.is_non_null(name) => registry
            .lookup(name)
            .map(|desc| Native::Node(desc.instantiate()))
            .ok_or_else(|| driver_err!(UnknownType, "{}", name)),
        (Node::Null, _) => Ok(Native::Nil),
        (Node::Object(obj), FieldType::Pos) => position(obj, node).map(Native::Pos),
        (Node::Object(obj), FieldType::Node(_) | FieldType::Iface(_)) => {
            object(obj, ty, registry).map(Native::Node)
        }
        (Node::Array(items), FieldType::Seq(elem)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                from_generic(item, *elem, registry).map_err(|e| e.within(format!("[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Native::Seq),
        (Node::String(s), FieldType::Str) => Ok(Native::Str(s.clone())),
        (Node::String(s), FieldType::Token) => token(s).map(Native::Token),
        (Node::Bool(b), FieldType::Bool) => Ok(Native::Bool(*b)),
        (Node::Int(i), FieldType::Int) => Ok(Native::Int(*i)),
        (Node::Uint(u), FieldType::Int) => i64::try_from(*u)
            .map(Native::Int)
            .map_err(|_| driver_err!(ShapeMismatch, "integer {} out of range", u)),
        (Node::Float(f), FieldType::Int) if f.fract() == 0.0 => Ok(Native::Int(*f as i64)),
        (other, ty) => Err(driver_err!(
            ShapeMismatch,
            "expected {}, found {}",
            ty,
            other.kind_name()
        )),
    }
}

fn token(text: &str) -> Result<Token, DriverError> {
    Token::lookup(text).ok_or_else(|| driver_err!(ShapeMismatch, "unknown token {:?}", text))
}

fn position(obj: &Object, node: &Node) -> Result<Pos, DriverError> {
    let position = Position::from_node(node).ok_or_else(|| {
        driver_err!(
            ShapeMismatch,
            "expected a position, found {}",
            obj.get(KEY_TYPE).map_or("an untyped object".to_string(), Node::to_string)
        )
    })?;
    position.to_pos().ok_or_else(|| {
        driver_err!(
            ShapeMismatch,
            "position offset {} out of range",
            position.offset
        )
    })
}

fn object(
    obj: &Object,
    slot: FieldType,
    registry: &TypeRegistry,
) -> Result<Box<dyn Reflect>, DriverError> {
    let type_name = obj
        .get(KEY_TYPE)
        .and_then(Node::as_str)
        .ok_or_else(|| driver_err!(ShapeMismatch, "object without a type tag"))?;
    let descriptor = registry
        .lookup(type_name)
        .ok_or_else(|| driver_err!(UnknownType, "{}", type_name))?;

    let fits = match slot {
        FieldType::Node(expected) => expected == type_name,
        FieldType::Iface(iface) => ast::implements(iface, type_name),
        _ => false,
    };
    if !fits {
        return Err(driver_err!(
            ShapeMismatch,
            "{} cannot be used as {}",
            type_name,
            slot
        ));
    }

    let mut value = descriptor.instantiate();
    let mut assigned = BTreeSet::new();
    for (key, child) in obj {
        if key == KEY_POS {
            restore_positions(value.as_mut(), child)
                .map_err(|e| e.within(format!("{type_name}.{KEY_POS}")))?;
            continue;
        }
        if is_reserved(key) {
            continue;
        }
        let field = descriptor.field(key).ok_or_else(|| {
            driver_err!(UnknownField, "{} has no field {}", type_name, key)
        })?;
        if field.ty.is_excluded() {
            continue;
        }
        let native = from_generic(child, field.ty, registry)
            .map_err(|e| e.within(format!("{type_name}.{key}")))?;
        if matches!(native, Native::Nil) && !field.nullable {
            continue;
        }
        assigned.insert(field.name);
        value.set(key, native)?;
    }

    if let Some(missing) = descriptor
        .fields
        .iter()
        .find(|f| !f.nullable && !f.ty.is_excluded() && !assigned.contains(f.name))
    {
        return Err(driver_err!(
            ShapeMismatch,
            "{}.{} is required",
            type_name,
            missing.name
        ));
    }
    Ok(value)
}

/// Assigns the named position fields recorded in a `uast:Positions` object.
fn restore_positions(value: &mut dyn Reflect, pos: &Node) -> Result<(), DriverError> {
    let obj = match pos {
        Node::Null => return Ok(()),
        Node::Object(obj) if pos.type_name() == Some(TYPE_POSITIONS) => obj,
        other => {
            return Err(driver_err!(
                ShapeMismatch,
                "expected {}, found {}",
                TYPE_POSITIONS,
                other.type_name().unwrap_or(other.kind_name())
            ))
        }
    };
    let descriptor = value.descriptor();
    for (key, entry) in obj {
        if key == KEY_TYPE || key == KEY_START || key == KEY_END {
            continue;
        }
        let is_pos_field = descriptor
            .field(key)
            .map_or(false, |f| f.ty == FieldType::Pos);
        if !is_pos_field {
            continue;
        }
        let native = match entry {
            Node::Null => Native::Pos(Pos::NONE),
            Node::Object(obj) => Native::Pos(position(obj, entry)?),
            other => {
                return Err(driver_err!(
                    ShapeMismatch,
                    "expected a position for {}, found {}",
                    key,
                    other.kind_name()
                ))
            }
        };
        value.set(key, native)?;
    }
    Ok(())
}

/// Replaces nulls the native printer cannot handle with empty instances.
pub fn repair(node: &mut dyn Reflect) {
    let any = node.as_any_mut();
    if let Some(decl) = any.downcast_mut::<FuncDecl>() {
        ensure_func_type(&mut decl.typ);
    } else if let Some(lit) = any.downcast_mut::<FuncLit>() {
        ensure_func_type(&mut lit.typ);
    } else if let Some(typ) = any.downcast_mut::<FuncType>() {
        typ.params.get_or_insert_with(Box::default);
    }
    node.for_each_child_mut(&mut |child| repair(child));
}

fn ensure_func_type(typ: &mut Option<Box<FuncType>>) {
    typ.get_or_insert_with(Box::default);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::forward::to_generic;
    use crate::syntax::ast::{BlockStmt, Decl, Ident};
    use crate::ErrorKind;

    fn registry() -> TypeRegistry {
        TypeRegistry::go()
    }

    #[test]
    fn test_ident_round_trip_restores_positions() {
        let ident = Ident::new("main", Pos::from_offset(8));
        let generic = to_generic(&ident);
        let back = to_native(&generic, &registry()).expect("reconstructs");
        let back = downcast::<Ident>(back).expect("is an Ident");
        assert_eq!(back.name, "main");
        assert_eq!(back.name_pos, Pos::from_offset(8));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let node = Node::typed("uast:Identifier");
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
    }

    #[test]
    fn test_unknown_field_is_reported() {
        let mut node = Node::typed("Ident");
        node.set("Name", Node::from("x"));
        node.set("Shape", Node::from("round"));
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_unknown_token_is_a_shape_mismatch() {
        let mut node = Node::typed("BasicLit");
        node.set("Kind", Node::from("NUMBER"));
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_interface_membership_is_checked() {
        let mut node = Node::typed("ExprStmt");
        node.set("X", Node::typed("EmptyStmt"));
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.message().contains("EmptyStmt cannot be used as Expr"));
    }

    #[test]
    fn test_missing_required_field() {
        let node = Node::typed("ExprStmt");
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.message().contains("ExprStmt.X is required"));
    }

    #[test]
    fn test_null_func_type_is_repaired() {
        let mut name = Node::typed("Ident");
        name.set("Name", Node::from("f"));
        let mut decl = Node::typed("FuncDecl");
        decl.set("Name", name);
        decl.set("Type", Node::Null);
        decl.set("Body", Node::typed("BlockStmt"));
        let mut file_name = Node::typed("Ident");
        file_name.set("Name", Node::from("p"));
        let mut file = Node::typed("File");
        file.set("Name", file_name);
        file.set("Decls", Node::Array(vec![decl]));

        let file = to_file(&file, &registry()).expect("reconstructs");
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected FuncDecl");
        };
        let typ = func.typ.as_ref().expect("type repaired");
        assert!(typ.params.is_some());
        assert_eq!(func.body.as_deref(), Some(&BlockStmt::default()));
    }

    #[test]
    fn test_malformed_positions_object() {
        let mut node = Node::typed("Ident");
        node.set("Name", Node::from("x"));
        node.set(KEY_POS, Node::from("here"));
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_out_of_range_position_offset() {
        let mut node = to_generic(&Ident::new("main", Pos::from_offset(8)));
        let far = Position {
            offset: u32::MAX as usize,
            ..Position::default()
        };
        if let Some(pos) = node.as_object_mut().and_then(|o| o.get_mut(KEY_POS)) {
            pos.set("NamePos", far.to_node());
        }
        let err = to_native(&node, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.message().contains("out of range"));
    }
}
