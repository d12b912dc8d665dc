//! Renders a native tree back to Go source.
//!
//! Layout is canonical (tab indentation, one statement per line, single-line composite literals)
//! and depends only on the tree's structure, never on its positions. Comments are not printed.

use crate::syntax::ast::*;
use crate::syntax::token::{ChanDir, Token};

/// Prints a whole file.
pub fn print_file(file: &File) -> String {
    let mut p = Printer::default();
    p.file(file);
    p.out
}

/// Prints a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut p = Printer::default();
    p.expr(expr);
    p.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn w(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn list<T>(&mut self, items: &[T], sep: &str, mut f: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.w(sep);
            }
            f(self, item);
        }
    }

    fn exprs(&mut self, list: &[Expr]) {
        self.list(list, ", ", |p, e| p.expr(e));
    }

    fn idents(&mut self, list: &[Ident]) {
        self.list(list, ", ", |p, i| p.w(&i.name));
    }

    // ========================================================================
    // FILE AND DECLARATIONS
    // ========================================================================

    fn file(&mut self, file: &File) {
        self.w("package ");
        self.w(&file.name.name);
        self.w("\n");
        for decl in &file.decls {
            self.w("\n");
            self.decl(decl);
            self.w("\n");
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Bad(_) => self.w("/* bad declaration */"),
            Decl::Gen(g) => self.gen_decl(g),
            Decl::Func(f) => self.func_decl(f),
        }
    }

    fn gen_decl(&mut self, decl: &GenDecl) {
        self.w(decl.tok.as_str());
        self.w(" ");
        if decl.lparen.is_valid() || decl.specs.len() != 1 {
            self.w("(");
            self.indent += 1;
            for spec in &decl.specs {
                self.newline();
                self.spec(spec);
            }
            self.indent -= 1;
            self.newline();
            self.w(")");
        } else {
            self.spec(&decl.specs[0]);
        }
    }

    fn spec(&mut self, spec: &Spec) {
        match spec {
            Spec::Import(s) => {
                if let Some(name) = &s.name {
                    self.w(&name.name);
                    self.w(" ");
                }
                self.w(&s.path.value);
            }
            Spec::Value(s) => {
                self.idents(&s.names);
                if let Some(typ) = &s.typ {
                    self.w(" ");
                    self.expr(typ);
                }
                if !s.values.is_empty() {
                    self.w(" = ");
                    self.exprs(&s.values);
                }
            }
            Spec::Type(s) => {
                self.w(&s.name.name);
                self.w(if s.assign.is_valid() { " = " } else { " " });
                self.expr(&s.typ);
            }
        }
    }

    fn func_decl(&mut self, decl: &FuncDecl) {
        self.w("func ");
        if let Some(recv) = &decl.recv {
            self.w("(");
            self.fields(&recv.list);
            self.w(") ");
        }
        self.w(&decl.name.name);
        if let Some(typ) = &decl.typ {
            self.signature(typ);
        } else {
            self.w("()");
        }
        if let Some(body) = &decl.body {
            self.w(" ");
            self.block(body);
        }
    }

    // ========================================================================
    // FIELDS AND SIGNATURES
    // ========================================================================

    fn field(&mut self, field: &Field) {
        self.idents(&field.names);
        if let Some(typ) = &field.typ {
            if !field.names.is_empty() {
                self.w(" ");
            }
            self.expr(typ);
        }
        if let Some(tag) = &field.tag {
            self.w(" ");
            self.w(&tag.value);
        }
    }

    fn fields(&mut self, list: &[Field]) {
        self.list(list, ", ", |p, f| p.field(f));
    }

    fn signature(&mut self, typ: &FuncType) {
        self.w("(");
        if let Some(params) = &typ.params {
            self.fields(&params.list);
        }
        self.w(")");
        let Some(results) = &typ.results else {
            return;
        };
        match results.list.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.w(" ");
                self.field(single);
            }
            list => {
                self.w(" (");
                self.fields(list);
                self.w(")");
            }
        }
    }

    /// Struct fields or interface methods, one per line.
    fn member_block(&mut self, list: &Option<Box<FieldList>>, methods: bool) {
        let list = list.as_ref().map_or(&[][..], |l| l.list.as_slice());
        if list.is_empty() {
            self.w("{}");
            return;
        }
        self.w(" {");
        self.indent += 1;
        for field in list {
            self.newline();
            match (&field.typ, methods) {
                (Some(Expr::FuncType(sig)), true) if !field.names.is_empty() => {
                    self.idents(&field.names);
                    self.signature(sig);
                }
                _ => self.field(field),
            }
        }
        self.indent -= 1;
        self.newline();
        self.w("}");
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Bad(_) => self.w("BadExpr"),
            Expr::Ident(i) => self.w(&i.name),
            Expr::Ellipsis(e) => {
                self.w("...");
                if let Some(elt) = &e.elt {
                    self.expr(elt);
                }
            }
            Expr::BasicLit(l) => self.w(&l.value),
            Expr::FuncLit(f) => {
                self.w("func");
                if let Some(typ) = &f.typ {
                    self.signature(typ);
                } else {
                    self.w("()");
                }
                if let Some(body) = &f.body {
                    self.w(" ");
                    self.block(body);
                }
            }
            Expr::CompositeLit(c) => {
                if let Some(typ) = &c.typ {
                    self.expr(typ);
                }
                self.w("{");
                self.exprs(&c.elts);
                self.w("}");
            }
            Expr::Paren(p) => {
                self.w("(");
                self.expr(&p.x);
                self.w(")");
            }
            Expr::Selector(s) => {
                self.expr(&s.x);
                self.w(".");
                self.w(&s.sel.name);
            }
            Expr::Index(i) => {
                self.expr(&i.x);
                self.w("[");
                self.expr(&i.index);
                self.w("]");
            }
            Expr::Slice(s) => {
                self.expr(&s.x);
                self.w("[");
                if let Some(low) = &s.low {
                    self.expr(low);
                }
                self.w(":");
                if let Some(high) = &s.high {
                    self.expr(high);
                }
                if s.slice3 {
                    self.w(":");
                    if let Some(max) = &s.max {
                        self.expr(max);
                    }
                }
                self.w("]");
            }
            Expr::TypeAssert(t) => {
                self.expr(&t.x);
                self.w(".(");
                match &t.typ {
                    Some(typ) => self.expr(typ),
                    None => self.w("type"),
                }
                self.w(")");
            }
            Expr::Call(c) => self.call(c),
            Expr::Star(s) => {
                self.w("*");
                self.expr(&s.x);
            }
            Expr::Unary(u) => {
                if u.op == Token::Range {
                    self.w("range ");
                } else {
                    self.w(u.op.as_str());
                }
                self.expr(&u.x);
            }
            Expr::Binary(b) => {
                self.expr(&b.x);
                self.w(" ");
                self.w(b.op.as_str());
                self.w(" ");
                self.expr(&b.y);
            }
            Expr::KeyValue(kv) => {
                self.expr(&kv.key);
                self.w(": ");
                self.expr(&kv.value);
            }
            Expr::ArrayType(a) => {
                self.w("[");
                if let Some(len) = &a.len {
                    self.expr(len);
                }
                self.w("]");
                self.expr(&a.elt);
            }
            Expr::StructType(s) => {
                self.w("struct");
                self.member_block(&s.fields, false);
            }
            Expr::FuncType(f) => {
                self.w("func");
                self.signature(f);
            }
            Expr::InterfaceType(i) => {
                self.w("interface");
                self.member_block(&i.methods, true);
            }
            Expr::MapType(m) => {
                self.w("map[");
                self.expr(&m.key);
                self.w("]");
                self.expr(&m.value);
            }
            Expr::ChanType(c) => {
                self.w(match c.dir {
                    ChanDir::SEND => "chan<- ",
                    ChanDir::RECV => "<-chan ",
                    _ => "chan ",
                });
                self.expr(&c.value);
            }
        }
    }

    fn call(&mut self, call: &CallExpr) {
        self.expr(&call.fun);
        self.w("(");
        self.exprs(&call.args);
        if call.ellipsis.is_valid() {
            self.w("...");
        }
        self.w(")");
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn block(&mut self, block: &BlockStmt) {
        self.w("{");
        self.indent += 1;
        for stmt in &block.list {
            if matches!(stmt, Stmt::Empty(e) if e.implicit) {
                continue;
            }
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.w("}");
    }

    /// Statements of a case body, one level deeper than the clause.
    fn clause_body(&mut self, body: &[Stmt]) {
        self.indent += 1;
        for stmt in body {
            if matches!(stmt, Stmt::Empty(e) if e.implicit) {
                continue;
            }
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn simple_header(&mut self, init: &Option<Stmt>) {
        if let Some(init) = init {
            self.stmt(init);
            self.w("; ");
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Bad(_) => self.w("/* bad statement */"),
            Stmt::Decl(d) => self.decl(&d.decl),
            Stmt::Empty(_) => {}
            Stmt::Labeled(l) => {
                self.w(&l.label.name);
                self.w(":");
                if !matches!(&l.stmt, Stmt::Empty(e) if e.implicit) {
                    self.newline();
                    self.stmt(&l.stmt);
                }
            }
            Stmt::Expr(e) => self.expr(&e.x),
            Stmt::Send(s) => {
                self.expr(&s.chan);
                self.w(" <- ");
                self.expr(&s.value);
            }
            Stmt::IncDec(s) => {
                self.expr(&s.x);
                self.w(s.tok.as_str());
            }
            Stmt::Assign(a) => {
                self.exprs(&a.lhs);
                self.w(" ");
                self.w(a.tok.as_str());
                self.w(" ");
                self.exprs(&a.rhs);
            }
            Stmt::Go(g) => {
                self.w("go ");
                self.call(&g.call);
            }
            Stmt::Defer(d) => {
                self.w("defer ");
                self.call(&d.call);
            }
            Stmt::Return(r) => {
                self.w("return");
                if !r.results.is_empty() {
                    self.w(" ");
                    self.exprs(&r.results);
                }
            }
            Stmt::Branch(b) => {
                self.w(b.tok.as_str());
                if let Some(label) = &b.label {
                    self.w(" ");
                    self.w(&label.name);
                }
            }
            Stmt::Block(b) => self.block(b),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::CaseClause(c) => {
                if c.list.is_empty() {
                    self.w("default:");
                } else {
                    self.w("case ");
                    self.exprs(&c.list);
                    self.w(":");
                }
                self.clause_body(&c.body);
            }
            Stmt::Switch(s) => {
                self.w("switch ");
                self.simple_header(&s.init);
                if let Some(tag) = &s.tag {
                    self.expr(tag);
                    self.w(" ");
                }
                self.clauses(&s.body);
            }
            Stmt::TypeSwitch(s) => {
                self.w("switch ");
                self.simple_header(&s.init);
                self.stmt(&s.assign);
                self.w(" ");
                self.clauses(&s.body);
            }
            Stmt::CommClause(c) => {
                match &c.comm {
                    Some(comm) => {
                        self.w("case ");
                        self.stmt(comm);
                        self.w(":");
                    }
                    None => self.w("default:"),
                }
                self.clause_body(&c.body);
            }
            Stmt::Select(s) => {
                self.w("select ");
                self.clauses(&s.body);
            }
            Stmt::For(f) => {
                self.w("for ");
                match (&f.init, &f.cond, &f.post) {
                    (None, None, None) => {}
                    (None, Some(cond), None) => {
                        self.expr(cond);
                        self.w(" ");
                    }
                    (init, cond, post) => {
                        if let Some(init) = init {
                            self.stmt(init);
                        }
                        self.w("; ");
                        if let Some(cond) = cond {
                            self.expr(cond);
                        }
                        self.w(";");
                        if let Some(post) = post {
                            self.w(" ");
                            self.stmt(post);
                        }
                        self.w(" ");
                    }
                }
                self.block(&f.body);
            }
            Stmt::Range(r) => {
                self.w("for ");
                if let Some(key) = &r.key {
                    self.expr(key);
                    if let Some(value) = &r.value {
                        self.w(", ");
                        self.expr(value);
                    }
                    self.w(" ");
                    self.w(r.tok.as_str());
                    self.w(" ");
                }
                self.w("range ");
                self.expr(&r.x);
                self.w(" ");
                self.block(&r.body);
            }
        }
    }

    /// A switch or select body: clauses stay at the statement's own indentation.
    fn clauses(&mut self, body: &BlockStmt) {
        self.w("{");
        for clause in &body.list {
            self.newline();
            self.stmt(clause);
        }
        self.newline();
        self.w("}");
    }

    fn if_stmt(&mut self, stmt: &IfStmt) {
        self.w("if ");
        self.simple_header(&stmt.init);
        self.expr(&stmt.cond);
        self.w(" ");
        self.block(&stmt.body);
        if let Some(r#else) = &stmt.r#else {
            self.w(" else ");
            self.stmt(r#else);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_file;

    fn reprint(src: &str) -> String {
        let parsed = parse_file("test.go", src).expect("parses");
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        print_file(&parsed.file)
    }

    #[test]
    fn test_canonical_source_is_a_fixed_point() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_grouped_declarations() {
        let src = "package p\n\nconst (\n\tA = iota\n\tB\n)\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_control_flow_layout() {
        let src = "package p\n\nfunc f(xs []int) int {\n\tn := 0\n\tfor i, x := range xs {\n\t\tif x > 0 {\n\t\t\tn += i\n\t\t} else {\n\t\t\tcontinue\n\t\t}\n\t}\n\tswitch {\n\tcase n > 1:\n\t\treturn n\n\tdefault:\n\t}\n\treturn 0\n}\n";
        assert_eq!(reprint(src), src);
    }

    #[test]
    fn test_types_and_signatures() {
        let src = "package p\n\ntype T struct {\n\ta, b int\n\tc chan<- string `json:\"c\"`\n}\n\nfunc (t *T) M(args ...int) (n int, err error) {\n\treturn\n}\n";
        assert_eq!(reprint(src), src);
    }
}
