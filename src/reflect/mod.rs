//! # Structural Reflection
//!
//! The converters never branch on concrete Go node types. Instead every native structural type
//! exposes a static [`TypeDescriptor`] (its name and declared field layout) and implements
//! [`Reflect`], which reads fields into a borrowed [`FieldRef`] view and writes them from an owned
//! [`Native`] value. Field-level conversions live on [`FieldValue`], implemented once per Rust
//! field type (positions, tokens, strings, boxes, options, vectors and the interface enums).
//!
//! ## Field Types
//!
//! [`FieldType`] is the declared type of a field as seen by the converters. Two kinds are
//! *excluded*: lexical scopes and resolved objects form a cyclic graph and are never walked.

use std::any::Any;
use std::fmt;

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::syntax::token::{ChanDir, Pos, Token};

pub mod registry;

pub use registry::TypeRegistry;

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// The interface slots of the Go AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Iface {
    Expr,
    Stmt,
    Decl,
    Spec,
    /// Any structural type.
    Node,
}

impl Iface {
    pub fn as_str(self) -> &'static str {
        match self {
            Iface::Expr => "Expr",
            Iface::Stmt => "Stmt",
            Iface::Decl => "Decl",
            Iface::Spec => "Spec",
            Iface::Node => "Node",
        }
    }
}

/// Declared type of a structural field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Pos,
    Token,
    Str,
    Bool,
    Int,
    /// A pointer to one concrete structural type.
    Node(&'static str),
    /// An interface slot holding any member of the interface.
    Iface(Iface),
    Seq(&'static FieldType),
    /// Lexical scope (excluded).
    Scope,
    /// Resolved object (excluded).
    Object,
}

impl FieldType {
    pub fn is_excluded(&self) -> bool {
        matches!(self, FieldType::Scope | FieldType::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Pos => f.write_str("Pos"),
            FieldType::Token => f.write_str("Token"),
            FieldType::Str => f.write_str("string"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Node(name) => write!(f, "*{name}"),
            FieldType::Iface(iface) => f.write_str(iface.as_str()),
            FieldType::Seq(elem) => write!(f, "[]{elem}"),
            FieldType::Scope => f.write_str("*Scope"),
            FieldType::Object => f.write_str("*Object"),
        }
    }
}

#[derive(Debug)]
pub struct FieldDesc {
    /// Field name as it appears in generic objects.
    pub name: &'static str,
    pub ty: FieldType,
    /// Whether the native field may hold the zero/absent value.
    pub nullable: bool,
}

/// Name and field layout of one structural type.
pub struct TypeDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDesc],
    pub zero: fn() -> Box<dyn Reflect>,
}

impl TypeDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A fresh zero-valued instance of this type.
    pub fn instantiate(&self) -> Box<dyn Reflect> {
        (self.zero)()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// Borrowed view of one field value.
#[derive(Debug)]
pub enum FieldRef<'a> {
    Nil,
    Pos(Pos),
    Token(Token),
    Str(&'a str),
    Int(i64),
    Bool(bool),
    Node(&'a dyn Reflect),
    Seq(Vec<FieldRef<'a>>),
}

/// Owned value produced by the reverse converter and assigned into a field.
#[derive(Debug)]
pub enum Native {
    Nil,
    Pos(Pos),
    Token(Token),
    Str(String),
    Int(i64),
    Bool(bool),
    Node(Box<dyn Reflect>),
    Seq(Vec<Native>),
}

impl Native {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Native::Nil => "nil",
            Native::Pos(_) => "position",
            Native::Token(_) => "token",
            Native::Str(_) => "string",
            Native::Int(_) => "integer",
            Native::Bool(_) => "boolean",
            Native::Node(node) => node.descriptor().name,
            Native::Seq(_) => "sequence",
        }
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Reflective access to a native structural node.
pub trait Reflect: Any + fmt::Debug {
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Reads a field by its generic name; unknown names read as `Nil`.
    fn get(&self, field: &str) -> FieldRef<'_>;

    /// Assigns a field by its generic name.
    fn set(&mut self, field: &str, value: Native) -> Result<(), DriverError>;

    /// Start position of the node.
    fn start(&self) -> Pos;

    /// Position just past the node.
    fn end(&self) -> Pos;

    /// Calls `f` on every direct structural child.
    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect));

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Implemented by concrete structural types; gives access to the descriptor without an instance.
pub trait Structural: Reflect + Default {
    fn type_descriptor() -> &'static TypeDescriptor;
}

/// Conversion between a Rust field type and the reflective value forms.
pub trait FieldValue: Sized {
    /// Whether the zero value is a legal native value for this field.
    const NULLABLE: bool = true;

    fn view(&self) -> FieldRef<'_>;

    fn from_native(value: Native) -> Result<Self, DriverError>;

    fn visit_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Reflect)) {}
}

/// Recovers a concrete node from a type-erased one.
pub fn downcast<T: Structural>(node: Box<dyn Reflect>) -> Result<Box<T>, DriverError> {
    let found = node.descriptor().name;
    node.into_any().downcast::<T>().map_err(|_| {
        driver_err!(
            ShapeMismatch,
            "expected {}, found {}",
            T::type_descriptor().name,
            found
        )
    })
}

pub(crate) fn mismatch(expected: &str, found: &Native) -> DriverError {
    driver_err!(
        ShapeMismatch,
        "expected {}, found {}",
        expected,
        found.kind_name()
    )
}

impl FieldValue for Pos {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Pos(*self)
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Pos(pos) => Ok(pos),
            Native::Nil => Ok(Pos::NONE),
            other => Err(mismatch("position", &other)),
        }
    }
}

impl FieldValue for Token {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Token(*self)
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Token(token) => Ok(token),
            Native::Nil => Ok(Token::Illegal),
            other => Err(mismatch("token", &other)),
        }
    }
}

impl FieldValue for String {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Str(self)
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Str(s) => Ok(s),
            Native::Nil => Ok(String::new()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FieldValue for bool {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Bool(*self)
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Bool(b) => Ok(b),
            Native::Nil => Ok(false),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FieldValue for ChanDir {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Int(i64::from(self.0))
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Int(i) => u8::try_from(i)
                .map(ChanDir)
                .map_err(|_| driver_err!(ShapeMismatch, "channel direction {} out of range", i)),
            Native::Nil => Ok(ChanDir::default()),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl<T: Structural> FieldValue for Box<T> {
    const NULLABLE: bool = false;

    fn view(&self) -> FieldRef<'_> {
        FieldRef::Node(&**self)
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Node(node) => downcast::<T>(node),
            other => Err(mismatch(T::type_descriptor().name, &other)),
        }
    }

    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
        f(&mut **self)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn view(&self) -> FieldRef<'_> {
        match self {
            Some(value) => value.view(),
            None => FieldRef::Nil,
        }
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Nil => Ok(None),
            other => T::from_native(other).map(Some),
        }
    }

    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
        if let Some(value) = self {
            value.visit_mut(f);
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Seq(self.iter().map(FieldValue::view).collect())
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        match value {
            Native::Seq(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_native(item).map_err(|e| e.within(format!("[{i}]"))))
                .collect(),
            Native::Nil => Ok(Vec::new()),
            other => Err(mismatch("sequence", &other)),
        }
    }

    fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
        for item in self.iter_mut() {
            item.visit_mut(f);
        }
    }
}
