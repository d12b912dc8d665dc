//! # Native Go Syntax Tree
//!
//! The structural types of the Go AST, one Rust struct per Go node kind, with the same field
//! names and field order as `go/ast` (pre type-parameters). Pointer fields become `Box`/`Option`,
//! interface slots become the [`Expr`], [`Stmt`], [`Decl`] and [`Spec`] enums, slices become `Vec`.
//!
//! ## Generated Reflection
//!
//! The `nodes!` macro emits, from a single field list per type:
//! - the struct itself,
//! - its static [`TypeDescriptor`] (generic field name, declared [`FieldType`], nullability),
//! - its [`Reflect`] implementation (field get/set by name, child traversal, span).
//!
//! The registry and both converters are driven by those descriptors only, so adding a node kind is
//! one entry here plus its span rule in `span.rs`.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::reflect::{
    downcast, mismatch, FieldDesc, FieldRef, FieldType, FieldValue, Iface, Native, Reflect,
    Structural, TypeDescriptor,
};
use crate::syntax::span::Spanned;
use crate::syntax::token::{ChanDir, Pos, Token};

// ============================================================================
// FIELD TYPE SHORTHANDS
// ============================================================================

const POS: FieldType = FieldType::Pos;
const TOKEN: FieldType = FieldType::Token;
const STR: FieldType = FieldType::Str;
const BOOL: FieldType = FieldType::Bool;
const INT: FieldType = FieldType::Int;
const SCOPE: FieldType = FieldType::Scope;
const OBJECT: FieldType = FieldType::Object;

const EXPR: FieldType = FieldType::Iface(Iface::Expr);
const EXPRS: FieldType = FieldType::Seq(&EXPR);
const STMT: FieldType = FieldType::Iface(Iface::Stmt);
const STMTS: FieldType = FieldType::Seq(&STMT);
const DECL: FieldType = FieldType::Iface(Iface::Decl);
const DECLS: FieldType = FieldType::Seq(&DECL);
const SPECS: FieldType = FieldType::Seq(&FieldType::Iface(Iface::Spec));

const IDENT: FieldType = FieldType::Node("Ident");
const IDENTS: FieldType = FieldType::Seq(&IDENT);
const BASIC_LIT: FieldType = FieldType::Node("BasicLit");
const COMMENT_GROUP: FieldType = FieldType::Node("CommentGroup");
const COMMENT_GROUPS: FieldType = FieldType::Seq(&COMMENT_GROUP);
const FIELD_LIST: FieldType = FieldType::Node("FieldList");
const FUNC_TYPE: FieldType = FieldType::Node("FuncType");
const BLOCK_STMT: FieldType = FieldType::Node("BlockStmt");
const CALL_EXPR: FieldType = FieldType::Node("CallExpr");
const IMPORT_SPECS: FieldType = FieldType::Seq(&FieldType::Node("ImportSpec"));

// ============================================================================
// SCOPES AND OBJECTS
// ============================================================================

/// Kind of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Bad,
    Pkg,
    Con,
    Typ,
    Var,
    Fun,
    Lbl,
}

/// A named language entity recorded while parsing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjKind,
    pub name: String,
}

pub type ObjectRef = Arc<Object>;

/// The set of top-level names declared in a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub objects: BTreeMap<String, ObjectRef>,
}

pub type ScopeRef = Arc<Scope>;

impl FieldValue for ObjectRef {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Nil
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        Err(mismatch("resolved object (never reconstructed)", &value))
    }
}

impl FieldValue for ScopeRef {
    fn view(&self) -> FieldRef<'_> {
        FieldRef::Nil
    }

    fn from_native(value: Native) -> Result<Self, DriverError> {
        Err(mismatch("scope (never reconstructed)", &value))
    }
}

// ============================================================================
// NODE GENERATION
// ============================================================================

macro_rules! nodes {
    ($(
        $(#[$meta:meta])*
        $name:ident {
            $( $field:ident : $ty:ty = $go:literal => $kind:expr ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq)]
            pub struct $name {
                $( pub $field: $ty, )*
            }

            impl Structural for $name {
                fn type_descriptor() -> &'static TypeDescriptor {
                    fn zero() -> Box<dyn Reflect> {
                        Box::new($name::default())
                    }
                    static DESCRIPTOR: TypeDescriptor = TypeDescriptor {
                        name: stringify!($name),
                        fields: &[
                            $( FieldDesc {
                                name: $go,
                                ty: $kind,
                                nullable: <$ty as FieldValue>::NULLABLE,
                            }, )*
                        ],
                        zero,
                    };
                    &DESCRIPTOR
                }
            }

            impl Reflect for $name {
                fn descriptor(&self) -> &'static TypeDescriptor {
                    <$name as Structural>::type_descriptor()
                }

                #[allow(unused_variables)]
                fn get(&self, field: &str) -> FieldRef<'_> {
                    match field {
                        $( $go => FieldValue::view(&self.$field), )*
                        _ => FieldRef::Nil,
                    }
                }

                #[allow(unused_variables)]
                fn set(&mut self, field: &str, value: Native) -> Result<(), DriverError> {
                    match field {
                        $( $go => {
                            self.$field = FieldValue::from_native(value)
                                .map_err(|e| e.within(concat!(stringify!($name), ".", $go)))?;
                            Ok(())
                        } )*
                        _ => Err(driver_err!(
                            UnknownField,
                            "{} has no field {}",
                            stringify!($name),
                            field
                        )),
                    }
                }

                fn start(&self) -> Pos {
                    Spanned::pos(self)
                }

                fn end(&self) -> Pos {
                    Spanned::end(self)
                }

                #[allow(unused_variables)]
                fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
                    $( FieldValue::visit_mut(&mut self.$field, f); )*
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn Any> {
                    self
                }
            }

            impl FieldValue for $name {
                const NULLABLE: bool = false;

                fn view(&self) -> FieldRef<'_> {
                    FieldRef::Node(self)
                }

                fn from_native(value: Native) -> Result<Self, DriverError> {
                    match value {
                        Native::Node(node) => downcast::<$name>(node).map(|node| *node),
                        other => Err(mismatch(stringify!($name), &other)),
                    }
                }

                fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
                    f(self)
                }
            }
        )*

        /// Descriptors of every structural type, in declaration order.
        pub fn descriptors() -> Vec<&'static TypeDescriptor> {
            vec![ $( <$name as Structural>::type_descriptor() ),* ]
        }
    };
}

macro_rules! interface {
    (
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident($ty:ident) ),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $( $variant(Box<$ty>), )*
        }

        impl $name {
            /// Structural type names that may fill this interface slot.
            pub const MEMBERS: &'static [&'static str] = &[ $( stringify!($ty) ),* ];

            pub fn as_reflect(&self) -> &dyn Reflect {
                match self {
                    $( $name::$variant(node) => &**node, )*
                }
            }

            pub fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
                match self {
                    $( $name::$variant(node) => &mut **node, )*
                }
            }

            /// Wraps a type-erased node into this interface.
            pub fn from_reflect(node: Box<dyn Reflect>) -> Result<Self, DriverError> {
                match node.descriptor().name {
                    $( stringify!($ty) => Ok($name::$variant(downcast::<$ty>(node)?)), )*
                    other => Err(driver_err!(
                        ShapeMismatch,
                        "{} cannot be used as {}",
                        other,
                        stringify!($name)
                    )),
                }
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(node: $ty) -> Self {
                    $name::$variant(Box::new(node))
                }
            }
        )*

        impl FieldValue for $name {
            const NULLABLE: bool = false;

            fn view(&self) -> FieldRef<'_> {
                FieldRef::Node(self.as_reflect())
            }

            fn from_native(value: Native) -> Result<Self, DriverError> {
                match value {
                    Native::Node(node) => Self::from_reflect(node),
                    other => Err(mismatch(stringify!($name), &other)),
                }
            }

            fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn Reflect)) {
                f(self.as_reflect_mut())
            }
        }

        impl Spanned for $name {
            fn pos(&self) -> Pos {
                self.as_reflect().start()
            }

            fn end(&self) -> Pos {
                self.as_reflect().end()
            }
        }
    };
}

// ============================================================================
// STRUCTURAL TYPES
// ============================================================================

nodes! {
    /// A single `//` or `/* */` comment; `text` includes the delimiters.
    Comment {
        slash: Pos = "Slash" => POS,
        text: String = "Text" => STR,
    }

    /// Comments with no other tokens and no empty lines between them.
    CommentGroup {
        list: Vec<Comment> = "List" => FieldType::Seq(&FieldType::Node("Comment")),
    }

    /// A parameter, result, struct field or interface method.
    Field {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        names: Vec<Ident> = "Names" => IDENTS,
        typ: Option<Expr> = "Type" => EXPR,
        tag: Option<Box<BasicLit>> = "Tag" => BASIC_LIT,
        comment: Option<Box<CommentGroup>> = "Comment" => COMMENT_GROUP,
    }

    FieldList {
        opening: Pos = "Opening" => POS,
        list: Vec<Field> = "List" => FieldType::Seq(&FieldType::Node("Field")),
        closing: Pos = "Closing" => POS,
    }

    /// Placeholder for an expression that failed to parse.
    BadExpr {
        from: Pos = "From" => POS,
        to: Pos = "To" => POS,
    }

    Ident {
        name_pos: Pos = "NamePos" => POS,
        name: String = "Name" => STR,
        obj: Option<ObjectRef> = "Obj" => OBJECT,
    }

    /// `...T` in a parameter list or `[...]T` in an array type.
    Ellipsis {
        ellipsis: Pos = "Ellipsis" => POS,
        elt: Option<Expr> = "Elt" => EXPR,
    }

    BasicLit {
        value_pos: Pos = "ValuePos" => POS,
        kind: Token = "Kind" => TOKEN,
        value: String = "Value" => STR,
    }

    FuncLit {
        typ: Option<Box<FuncType>> = "Type" => FUNC_TYPE,
        body: Option<Box<BlockStmt>> = "Body" => BLOCK_STMT,
    }

    CompositeLit {
        typ: Option<Expr> = "Type" => EXPR,
        lbrace: Pos = "Lbrace" => POS,
        elts: Vec<Expr> = "Elts" => EXPRS,
        rbrace: Pos = "Rbrace" => POS,
        incomplete: bool = "Incomplete" => BOOL,
    }

    ParenExpr {
        lparen: Pos = "Lparen" => POS,
        x: Expr = "X" => EXPR,
        rparen: Pos = "Rparen" => POS,
    }

    SelectorExpr {
        x: Expr = "X" => EXPR,
        sel: Box<Ident> = "Sel" => IDENT,
    }

    IndexExpr {
        x: Expr = "X" => EXPR,
        lbrack: Pos = "Lbrack" => POS,
        index: Expr = "Index" => EXPR,
        rbrack: Pos = "Rbrack" => POS,
    }

    SliceExpr {
        x: Expr = "X" => EXPR,
        lbrack: Pos = "Lbrack" => POS,
        low: Option<Expr> = "Low" => EXPR,
        high: Option<Expr> = "High" => EXPR,
        max: Option<Expr> = "Max" => EXPR,
        slice3: bool = "Slice3" => BOOL,
        rbrack: Pos = "Rbrack" => POS,
    }

    /// `x.(T)`; a missing type means `x.(type)` in a type switch guard.
    TypeAssertExpr {
        x: Expr = "X" => EXPR,
        lparen: Pos = "Lparen" => POS,
        typ: Option<Expr> = "Type" => EXPR,
        rparen: Pos = "Rparen" => POS,
    }

    CallExpr {
        fun: Expr = "Fun" => EXPR,
        lparen: Pos = "Lparen" => POS,
        args: Vec<Expr> = "Args" => EXPRS,
        ellipsis: Pos = "Ellipsis" => POS,
        rparen: Pos = "Rparen" => POS,
    }

    /// `*X`, either a dereference or a pointer type.
    StarExpr {
        star: Pos = "Star" => POS,
        x: Expr = "X" => EXPR,
    }

    UnaryExpr {
        op_pos: Pos = "OpPos" => POS,
        op: Token = "Op" => TOKEN,
        x: Expr = "X" => EXPR,
    }

    BinaryExpr {
        x: Expr = "X" => EXPR,
        op_pos: Pos = "OpPos" => POS,
        op: Token = "Op" => TOKEN,
        y: Expr = "Y" => EXPR,
    }

    KeyValueExpr {
        key: Expr = "Key" => EXPR,
        colon: Pos = "Colon" => POS,
        value: Expr = "Value" => EXPR,
    }

    /// `[Len]Elt`; no length for slices, an `Ellipsis` for `[...]T`.
    ArrayType {
        lbrack: Pos = "Lbrack" => POS,
        len: Option<Expr> = "Len" => EXPR,
        elt: Expr = "Elt" => EXPR,
    }

    StructType {
        r#struct: Pos = "Struct" => POS,
        fields: Option<Box<FieldList>> = "Fields" => FIELD_LIST,
        incomplete: bool = "Incomplete" => BOOL,
    }

    FuncType {
        func: Pos = "Func" => POS,
        params: Option<Box<FieldList>> = "Params" => FIELD_LIST,
        results: Option<Box<FieldList>> = "Results" => FIELD_LIST,
    }

    InterfaceType {
        interface: Pos = "Interface" => POS,
        methods: Option<Box<FieldList>> = "Methods" => FIELD_LIST,
        incomplete: bool = "Incomplete" => BOOL,
    }

    MapType {
        map: Pos = "Map" => POS,
        key: Expr = "Key" => EXPR,
        value: Expr = "Value" => EXPR,
    }

    ChanType {
        begin: Pos = "Begin" => POS,
        arrow: Pos = "Arrow" => POS,
        dir: ChanDir = "Dir" => INT,
        value: Expr = "Value" => EXPR,
    }

    BadStmt {
        from: Pos = "From" => POS,
        to: Pos = "To" => POS,
    }

    DeclStmt {
        decl: Decl = "Decl" => DECL,
    }

    /// An explicit `;` or an implicit empty statement.
    EmptyStmt {
        semicolon: Pos = "Semicolon" => POS,
        implicit: bool = "Implicit" => BOOL,
    }

    LabeledStmt {
        label: Box<Ident> = "Label" => IDENT,
        colon: Pos = "Colon" => POS,
        stmt: Stmt = "Stmt" => STMT,
    }

    ExprStmt {
        x: Expr = "X" => EXPR,
    }

    SendStmt {
        chan: Expr = "Chan" => EXPR,
        arrow: Pos = "Arrow" => POS,
        value: Expr = "Value" => EXPR,
    }

    IncDecStmt {
        x: Expr = "X" => EXPR,
        tok_pos: Pos = "TokPos" => POS,
        tok: Token = "Tok" => TOKEN,
    }

    AssignStmt {
        lhs: Vec<Expr> = "Lhs" => EXPRS,
        tok_pos: Pos = "TokPos" => POS,
        tok: Token = "Tok" => TOKEN,
        rhs: Vec<Expr> = "Rhs" => EXPRS,
    }

    GoStmt {
        go: Pos = "Go" => POS,
        call: Box<CallExpr> = "Call" => CALL_EXPR,
    }

    DeferStmt {
        defer: Pos = "Defer" => POS,
        call: Box<CallExpr> = "Call" => CALL_EXPR,
    }

    ReturnStmt {
        r#return: Pos = "Return" => POS,
        results: Vec<Expr> = "Results" => EXPRS,
    }

    /// `break`, `continue`, `goto` or `fallthrough`.
    BranchStmt {
        tok_pos: Pos = "TokPos" => POS,
        tok: Token = "Tok" => TOKEN,
        label: Option<Box<Ident>> = "Label" => IDENT,
    }

    BlockStmt {
        lbrace: Pos = "Lbrace" => POS,
        list: Vec<Stmt> = "List" => STMTS,
        rbrace: Pos = "Rbrace" => POS,
    }

    IfStmt {
        r#if: Pos = "If" => POS,
        init: Option<Stmt> = "Init" => STMT,
        cond: Expr = "Cond" => EXPR,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
        r#else: Option<Stmt> = "Else" => STMT,
    }

    /// A `case` or `default` clause of an expression or type switch.
    CaseClause {
        case: Pos = "Case" => POS,
        list: Vec<Expr> = "List" => EXPRS,
        colon: Pos = "Colon" => POS,
        body: Vec<Stmt> = "Body" => STMTS,
    }

    SwitchStmt {
        switch: Pos = "Switch" => POS,
        init: Option<Stmt> = "Init" => STMT,
        tag: Option<Expr> = "Tag" => EXPR,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
    }

    TypeSwitchStmt {
        switch: Pos = "Switch" => POS,
        init: Option<Stmt> = "Init" => STMT,
        assign: Stmt = "Assign" => STMT,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
    }

    /// A `case` or `default` clause of a select statement.
    CommClause {
        case: Pos = "Case" => POS,
        comm: Option<Stmt> = "Comm" => STMT,
        colon: Pos = "Colon" => POS,
        body: Vec<Stmt> = "Body" => STMTS,
    }

    SelectStmt {
        select: Pos = "Select" => POS,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
    }

    ForStmt {
        r#for: Pos = "For" => POS,
        init: Option<Stmt> = "Init" => STMT,
        cond: Option<Expr> = "Cond" => EXPR,
        post: Option<Stmt> = "Post" => STMT,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
    }

    RangeStmt {
        r#for: Pos = "For" => POS,
        key: Option<Expr> = "Key" => EXPR,
        value: Option<Expr> = "Value" => EXPR,
        tok_pos: Pos = "TokPos" => POS,
        tok: Token = "Tok" => TOKEN,
        x: Expr = "X" => EXPR,
        body: Box<BlockStmt> = "Body" => BLOCK_STMT,
    }

    ImportSpec {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        name: Option<Box<Ident>> = "Name" => IDENT,
        path: Box<BasicLit> = "Path" => BASIC_LIT,
        comment: Option<Box<CommentGroup>> = "Comment" => COMMENT_GROUP,
        end_pos: Pos = "EndPos" => POS,
    }

    /// A constant or variable declaration.
    ValueSpec {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        names: Vec<Ident> = "Names" => IDENTS,
        typ: Option<Expr> = "Type" => EXPR,
        values: Vec<Expr> = "Values" => EXPRS,
        comment: Option<Box<CommentGroup>> = "Comment" => COMMENT_GROUP,
    }

    TypeSpec {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        name: Box<Ident> = "Name" => IDENT,
        assign: Pos = "Assign" => POS,
        typ: Expr = "Type" => EXPR,
        comment: Option<Box<CommentGroup>> = "Comment" => COMMENT_GROUP,
    }

    BadDecl {
        from: Pos = "From" => POS,
        to: Pos = "To" => POS,
    }

    /// An `import`, `const`, `type` or `var` declaration, grouped when `lparen` is valid.
    GenDecl {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        tok_pos: Pos = "TokPos" => POS,
        tok: Token = "Tok" => TOKEN,
        lparen: Pos = "Lparen" => POS,
        specs: Vec<Spec> = "Specs" => SPECS,
        rparen: Pos = "Rparen" => POS,
    }

    FuncDecl {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        recv: Option<Box<FieldList>> = "Recv" => FIELD_LIST,
        name: Box<Ident> = "Name" => IDENT,
        typ: Option<Box<FuncType>> = "Type" => FUNC_TYPE,
        body: Option<Box<BlockStmt>> = "Body" => BLOCK_STMT,
    }

    /// A Go source file.
    File {
        doc: Option<Box<CommentGroup>> = "Doc" => COMMENT_GROUP,
        package: Pos = "Package" => POS,
        name: Box<Ident> = "Name" => IDENT,
        decls: Vec<Decl> = "Decls" => DECLS,
        scope: Option<ScopeRef> = "Scope" => SCOPE,
        imports: Vec<ImportSpec> = "Imports" => IMPORT_SPECS,
        unresolved: Vec<Ident> = "Unresolved" => IDENTS,
        comments: Vec<CommentGroup> = "Comments" => COMMENT_GROUPS,
    }
}

// ============================================================================
// INTERFACES
// ============================================================================

interface! {
    /// Expressions and type expressions.
    Expr {
        Bad(BadExpr),
        Ident(Ident),
        Ellipsis(Ellipsis),
        BasicLit(BasicLit),
        FuncLit(FuncLit),
        CompositeLit(CompositeLit),
        Paren(ParenExpr),
        Selector(SelectorExpr),
        Index(IndexExpr),
        Slice(SliceExpr),
        TypeAssert(TypeAssertExpr),
        Call(CallExpr),
        Star(StarExpr),
        Unary(UnaryExpr),
        Binary(BinaryExpr),
        KeyValue(KeyValueExpr),
        ArrayType(ArrayType),
        StructType(StructType),
        FuncType(FuncType),
        InterfaceType(InterfaceType),
        MapType(MapType),
        ChanType(ChanType),
    }
}

interface! {
    Stmt {
        Bad(BadStmt),
        Decl(DeclStmt),
        Empty(EmptyStmt),
        Labeled(LabeledStmt),
        Expr(ExprStmt),
        Send(SendStmt),
        IncDec(IncDecStmt),
        Assign(AssignStmt),
        Go(GoStmt),
        Defer(DeferStmt),
        Return(ReturnStmt),
        Branch(BranchStmt),
        Block(BlockStmt),
        If(IfStmt),
        CaseClause(CaseClause),
        Switch(SwitchStmt),
        TypeSwitch(TypeSwitchStmt),
        CommClause(CommClause),
        Select(SelectStmt),
        For(ForStmt),
        Range(RangeStmt),
    }
}

interface! {
    Decl {
        Bad(BadDecl),
        Gen(GenDecl),
        Func(FuncDecl),
    }
}

interface! {
    Spec {
        Import(ImportSpec),
        Value(ValueSpec),
        Type(TypeSpec),
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Bad(Box::default())
    }
}

impl Default for Stmt {
    fn default() -> Self {
        Stmt::Bad(Box::default())
    }
}

impl Default for Decl {
    fn default() -> Self {
        Decl::Bad(Box::default())
    }
}

/// Whether a structural type may fill the given interface slot.
pub fn implements(iface: Iface, type_name: &str) -> bool {
    match iface {
        Iface::Expr => Expr::MEMBERS.contains(&type_name),
        Iface::Stmt => Stmt::MEMBERS.contains(&type_name),
        Iface::Decl => Decl::MEMBERS.contains(&type_name),
        Iface::Spec => Spec::MEMBERS.contains(&type_name),
        Iface::Node => true,
    }
}

// ============================================================================
// CONVENIENCE CONSTRUCTORS
// ============================================================================

impl Ident {
    pub fn new(name: impl Into<String>, name_pos: Pos) -> Self {
        Ident {
            name_pos,
            name: name.into(),
            obj: None,
        }
    }
}

impl Expr {
    pub fn ident(name: impl Into<String>, pos: Pos) -> Self {
        Expr::from(Ident::new(name, pos))
    }

    /// The expression with any enclosing parentheses removed.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren(p) => p.x.unparen(),
            other => other,
        }
    }
}

impl File {
    /// Function and method declarations, in source order.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f.as_ref()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_layout_follows_declaration_order() {
        let desc = BinaryExpr::type_descriptor();
        let names: Vec<_> = desc.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["X", "OpPos", "Op", "Y"]);
        assert_eq!(desc.field("Op").map(|f| f.ty), Some(FieldType::Token));
        assert!(!desc.field("X").map_or(true, |f| f.nullable));
    }

    #[test]
    fn test_set_and_get_by_generic_name() {
        let mut ident = Ident::default();
        ident
            .set("Name", Native::Str("main".to_string()))
            .expect("Name is a string field");
        assert!(matches!(ident.get("Name"), FieldRef::Str("main")));
        let err = ident.set("Bogus", Native::Nil).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnknownField);
    }

    #[test]
    fn test_interface_wrapping() {
        let node: Box<dyn Reflect> = Box::new(Ident::new("x", Pos::NONE));
        let expr = Expr::from_reflect(node).expect("Ident is an expression");
        assert!(matches!(expr, Expr::Ident(_)));

        let stmt: Box<dyn Reflect> = Box::new(EmptyStmt::default());
        let err = Expr::from_reflect(stmt).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_excluded_field_types() {
        let file = File::type_descriptor();
        assert!(file.field("Scope").map_or(false, |f| f.ty.is_excluded()));
        assert!(Ident::type_descriptor()
            .field("Obj")
            .map_or(false, |f| f.ty.is_excluded()));
    }
}
