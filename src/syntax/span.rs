//! Start and end positions of every structural type, following the `go/ast` `Pos`/`End` rules.

use crate::syntax::ast::*;
use crate::syntax::token::Pos;

/// A node with a start position and the position just past its last character.
pub trait Spanned {
    fn pos(&self) -> Pos;
    fn end(&self) -> Pos;
}

impl<T: Spanned> Spanned for Box<T> {
    fn pos(&self) -> Pos {
        (**self).pos()
    }

    fn end(&self) -> Pos {
        (**self).end()
    }
}

fn pos_of<T: Spanned>(node: &Option<T>) -> Pos {
    node.as_ref().map_or(Pos::NONE, Spanned::pos)
}

fn end_of<T: Spanned>(node: &Option<T>) -> Pos {
    node.as_ref().map_or(Pos::NONE, Spanned::end)
}

/// End of the last element, or `fallback` when the list is empty.
fn last_end<T: Spanned>(list: &[T], fallback: Pos) -> Pos {
    list.last().map_or(fallback, Spanned::end)
}

/// One past a closing delimiter.
fn after(pos: Pos) -> Pos {
    pos.add(1)
}

macro_rules! span {
    ($ty:ident, |$n:ident| $pos:expr, $end:expr) => {
        impl Spanned for $ty {
            fn pos(&self) -> Pos {
                let $n = self;
                $pos
            }

            fn end(&self) -> Pos {
                let $n = self;
                $end
            }
        }
    };
}

span!(Comment, |n| n.slash, n.slash.add(n.text.len()));
span!(
    CommentGroup,
    |n| n.list.first().map_or(Pos::NONE, Spanned::pos),
    last_end(&n.list, Pos::NONE)
);
span!(
    Field,
    |n| n.names.first().map_or_else(|| pos_of(&n.typ), Spanned::pos),
    match (&n.tag, &n.typ) {
        (Some(tag), _) => tag.end(),
        (None, Some(typ)) => typ.end(),
        (None, None) => last_end(&n.names, Pos::NONE),
    }
);
span!(
    FieldList,
    |n| if n.opening.is_valid() {
        n.opening
    } else {
        n.list.first().map_or(Pos::NONE, Spanned::pos)
    },
    if n.closing.is_valid() {
        after(n.closing)
    } else {
        last_end(&n.list, Pos::NONE)
    }
);

span!(BadExpr, |n| n.from, n.to);
span!(Ident, |n| n.name_pos, n.name_pos.add(n.name.len()));
span!(
    Ellipsis,
    |n| n.ellipsis,
    n.elt.as_ref().map_or(n.ellipsis.add(3), Spanned::end)
);
span!(BasicLit, |n| n.value_pos, n.value_pos.add(n.value.len()));
span!(FuncLit, |n| pos_of(&n.typ), end_of(&n.body));
span!(
    CompositeLit,
    |n| n.typ.as_ref().map_or(n.lbrace, Spanned::pos),
    after(n.rbrace)
);
span!(ParenExpr, |n| n.lparen, after(n.rparen));
span!(SelectorExpr, |n| n.x.pos(), n.sel.end());
span!(IndexExpr, |n| n.x.pos(), after(n.rbrack));
span!(SliceExpr, |n| n.x.pos(), after(n.rbrack));
span!(TypeAssertExpr, |n| n.x.pos(), after(n.rparen));
span!(CallExpr, |n| n.fun.pos(), after(n.rparen));
span!(StarExpr, |n| n.star, n.x.end());
span!(UnaryExpr, |n| n.op_pos, n.x.end());
span!(BinaryExpr, |n| n.x.pos(), n.y.end());
span!(KeyValueExpr, |n| n.key.pos(), n.value.end());
span!(ArrayType, |n| n.lbrack, n.elt.end());
span!(StructType, |n| n.r#struct, end_of(&n.fields));
span!(
    FuncType,
    |n| if n.func.is_valid() || n.params.is_none() {
        n.func
    } else {
        pos_of(&n.params)
    },
    if n.results.is_some() {
        end_of(&n.results)
    } else {
        end_of(&n.params)
    }
);
span!(InterfaceType, |n| n.interface, end_of(&n.methods));
span!(MapType, |n| n.map, n.value.end());
span!(ChanType, |n| n.begin, n.value.end());

span!(BadStmt, |n| n.from, n.to);
span!(DeclStmt, |n| n.decl.pos(), n.decl.end());
span!(
    EmptyStmt,
    |n| n.semicolon,
    if n.implicit {
        n.semicolon
    } else {
        after(n.semicolon)
    }
);
span!(LabeledStmt, |n| n.label.pos(), n.stmt.end());
span!(ExprStmt, |n| n.x.pos(), n.x.end());
span!(SendStmt, |n| n.chan.pos(), n.value.end());
span!(IncDecStmt, |n| n.x.pos(), n.tok_pos.add(2));
span!(
    AssignStmt,
    |n| n.lhs.first().map_or(n.tok_pos, Spanned::pos),
    last_end(&n.rhs, n.tok_pos.add(n.tok.as_str().len()))
);
span!(GoStmt, |n| n.go, n.call.end());
span!(DeferStmt, |n| n.defer, n.call.end());
span!(ReturnStmt, |n| n.r#return, last_end(&n.results, n.r#return.add(6)));
span!(
    BranchStmt,
    |n| n.tok_pos,
    n.label
        .as_ref()
        .map_or(n.tok_pos.add(n.tok.as_str().len()), Spanned::end)
);
span!(
    BlockStmt,
    |n| n.lbrace,
    if n.rbrace.is_valid() {
        after(n.rbrace)
    } else {
        last_end(&n.list, after(n.lbrace))
    }
);
span!(
    IfStmt,
    |n| n.r#if,
    n.r#else.as_ref().map_or_else(|| n.body.end(), Spanned::end)
);
span!(CaseClause, |n| n.case, last_end(&n.body, after(n.colon)));
span!(SwitchStmt, |n| n.switch, n.body.end());
span!(TypeSwitchStmt, |n| n.switch, n.body.end());
span!(CommClause, |n| n.case, last_end(&n.body, after(n.colon)));
span!(SelectStmt, |n| n.select, n.body.end());
span!(ForStmt, |n| n.r#for, n.body.end());
span!(RangeStmt, |n| n.r#for, n.body.end());

span!(
    ImportSpec,
    |n| n.name.as_ref().map_or_else(|| n.path.pos(), Spanned::pos),
    if n.end_pos.is_valid() {
        n.end_pos
    } else {
        n.path.end()
    }
);
span!(
    ValueSpec,
    |n| n.names.first().map_or(Pos::NONE, Spanned::pos),
    match (n.values.last(), &n.typ) {
        (Some(value), _) => value.end(),
        (None, Some(typ)) => typ.end(),
        (None, None) => last_end(&n.names, Pos::NONE),
    }
);
span!(TypeSpec, |n| n.name.pos(), n.typ.end());

span!(BadDecl, |n| n.from, n.to);
span!(
    GenDecl,
    |n| n.tok_pos,
    if n.rparen.is_valid() {
        after(n.rparen)
    } else {
        n.specs.first().map_or(Pos::NONE, Spanned::end)
    }
);
span!(
    FuncDecl,
    |n| pos_of(&n.typ),
    n.body.as_ref().map_or_else(|| end_of(&n.typ), Spanned::end)
);
span!(
    File,
    |n| n.package,
    n.decls.last().map_or_else(|| n.name.end(), Spanned::end)
);
