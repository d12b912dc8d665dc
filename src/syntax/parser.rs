//! # Native Go Parser
//!
//! A recursive-descent parser producing the structural tree of `ast.rs`. It follows the grammar of
//! Go before type parameters.
//!
//! ## Comments
//!
//! Comment tokens never reach the grammar functions. While advancing, consecutive comments are
//! collected into groups: a group on the same line as the previous token becomes the *line
//! comment*, and a group ending on the line right before the next token becomes the *lead
//! comment* (the doc comment of whatever declaration starts there). Every group is also kept in
//! source order for `File.Comments`.
//!
//! ## Recovery
//!
//! A syntax error inside a top-level declaration records a `line:col: message` diagnostic, skips
//! to the next declaration keyword and leaves a `BadDecl` in place of the broken declaration. An
//! error in the package clause is fatal.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostics::{to_error_source, DriverError, Span, SyntaxError};
use crate::driver_ctx;
use crate::syntax::ast::*;
use crate::syntax::scanner::Scanner;
use crate::syntax::span::Spanned;
use crate::syntax::token::{ChanDir, LineIndex, Pos, Token};

/// The result of parsing a file that at least has a valid package clause.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub file: File,
    /// Recoverable syntax errors, in source order.
    pub diagnostics: Vec<SyntaxError>,
}

/// Parses one Go source file.
///
/// Returns a `ParseFailure` error when no tree can be produced at all.
pub fn parse_file(name: &str, source: &str) -> Result<Parsed, DriverError> {
    let mut parser = Parser::new(source);
    match parser.parse_file() {
        Some(file) => Ok(Parsed {
            file,
            diagnostics: parser.errors,
        }),
        None => {
            let first = parser.errors.first().cloned().unwrap_or_else(|| SyntaxError {
                offset: 0,
                line: 1,
                column: 1,
                message: "expected 'package'".to_string(),
            });
            let src = to_error_source(name, source);
            Err(driver_ctx!(
                ParseFailure,
                first.to_string(),
                &src,
                Span::new(first.offset, first.offset + 1),
                "a Go source file must start with a package clause"
            ))
        }
    }
}

/// Marker for an abandoned production; the diagnostic is already recorded.
#[derive(Debug)]
struct Bail;

type PResult<T> = Result<T, Bail>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
    RangeOk,
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    lines: LineIndex,
    errors: Vec<SyntaxError>,

    pos: Pos,
    tok: Token,
    lit: String,

    comments: Vec<CommentGroup>,
    lead_comment: Option<CommentGroup>,
    line_comment: Option<CommentGroup>,

    /// < 0 in control clauses, >= 0 in expressions.
    expr_lev: i32,
    /// Function body nesting; only depth 0 declarations enter the file scope.
    depth: usize,
    scope: BTreeMap<String, ObjectRef>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        let mut parser = Parser {
            scanner: Scanner::new(source),
            lines: LineIndex::new(source),
            errors: Vec::new(),
            pos: Pos::NONE,
            tok: Token::Illegal,
            lit: String::new(),
            comments: Vec::new(),
            lead_comment: None,
            line_comment: None,
            expr_lev: 0,
            depth: 0,
            scope: BTreeMap::new(),
        };
        parser.next();
        parser
    }

    // ========================================================================
    // TOKEN STREAM
    // ========================================================================

    fn next0(&mut self) {
        let scanned = self.scanner.scan();
        for (offset, message) in self.scanner.take_errors() {
            self.record(offset, message);
        }
        self.pos = Pos::from_offset(scanned.offset);
        self.tok = scanned.tok;
        self.lit = scanned.lit;
    }

    fn line(&self, pos: Pos) -> usize {
        pos.offset().map_or(0, |o| self.lines.line(o))
    }

    fn consume_comment(&mut self) -> (Comment, usize) {
        let mut endline = self.line(self.pos);
        if self.lit.starts_with("/*") {
            endline += self.lit.matches('\n').count();
        }
        let comment = Comment {
            slash: self.pos,
            text: std::mem::take(&mut self.lit),
        };
        self.next0();
        (comment, endline)
    }

    fn consume_comment_group(&mut self, n: usize) -> (CommentGroup, usize) {
        let mut list = Vec::new();
        let mut endline = self.line(self.pos);
        while self.tok == Token::Comment && self.line(self.pos) <= endline + n {
            let (comment, end) = self.consume_comment();
            endline = end;
            list.push(comment);
        }
        let group = CommentGroup { list };
        self.comments.push(group.clone());
        (group, endline)
    }

    fn next(&mut self) {
        self.lead_comment = None;
        self.line_comment = None;
        let prev = self.pos;
        self.next0();

        if self.tok != Token::Comment {
            return;
        }
        if self.line(self.pos) == self.line(prev) {
            let (group, endline) = self.consume_comment_group(0);
            if self.line(self.pos) != endline || self.tok == Token::Eof {
                self.line_comment = Some(group);
            }
        }
        let mut last = None;
        let mut endline = None;
        while self.tok == Token::Comment {
            let (group, end) = self.consume_comment_group(1);
            last = Some(group);
            endline = Some(end);
        }
        if endline.map_or(false, |e| e + 1 == self.line(self.pos)) {
            self.lead_comment = last;
        }
    }

    // ========================================================================
    // ERRORS
    // ========================================================================

    fn record(&mut self, offset: usize, message: impl Into<String>) {
        let (line, column) = self.lines.line_col(offset);
        let message = message.into();
        // One error per line keeps cascades out of the report.
        if self.errors.last().map_or(false, |e| e.line == line) {
            return;
        }
        self.errors.push(SyntaxError {
            offset,
            line,
            column,
            message,
        });
    }

    fn error_at(&mut self, pos: Pos, message: impl Into<String>) -> Bail {
        self.record(pos.offset().unwrap_or(0), message);
        Bail
    }

    fn found(&self) -> String {
        match self.tok {
            Token::Semicolon if self.lit == "\n" => "newline".to_string(),
            Token::Eof => "EOF".to_string(),
            tok if tok.is_literal() => self.lit.clone(),
            tok => format!("'{tok}'"),
        }
    }

    fn error_expected(&mut self, what: &str) -> Bail {
        let message = format!("expected {what}, found {}", self.found());
        self.error_at(self.pos, message)
    }

    fn expect(&mut self, tok: Token) -> PResult<Pos> {
        let pos = self.pos;
        if self.tok != tok {
            return Err(self.error_expected(&format!("'{tok}'")));
        }
        self.next();
        Ok(pos)
    }

    /// Like `expect`, but names a likely missing comma when the closer sits on the next line.
    fn expect_closing(&mut self, tok: Token, context: &str) -> PResult<Pos> {
        if self.tok != tok && self.tok == Token::Semicolon && self.lit == "\n" {
            let pos = self.pos;
            return Err(self.error_at(pos, format!("missing ',' before newline in {context}")));
        }
        self.expect(tok)
    }

    fn expect_semi(&mut self) -> PResult<()> {
        match self.tok {
            Token::RParen | Token::RBrace => Ok(()),
            Token::Semicolon => {
                self.next();
                Ok(())
            }
            _ => Err(self.error_expected("';'")),
        }
    }

    fn at_comma(&mut self, context: &str, follow: Token) -> PResult<bool> {
        if self.tok == Token::Comma {
            return Ok(true);
        }
        if self.tok != follow {
            let mut message = "missing ','".to_string();
            if self.tok == Token::Semicolon && self.lit == "\n" {
                message.push_str(" before newline");
            }
            let pos = self.pos;
            return Err(self.error_at(pos, format!("{message} in {context}")));
        }
        Ok(false)
    }

    // ========================================================================
    // SCOPE
    // ========================================================================

    fn declare(&mut self, ident: &mut Ident, kind: ObjKind) {
        if self.depth > 0 || ident.name == "_" {
            return;
        }
        let object = Arc::new(Object {
            kind,
            name: ident.name.clone(),
        });
        ident.obj = Some(Arc::clone(&object));
        self.scope.entry(ident.name.clone()).or_insert(object);
    }

    // ========================================================================
    // FILE AND DECLARATIONS
    // ========================================================================

    fn parse_file(&mut self) -> Option<File> {
        let doc = self.lead_comment.take().map(Box::new);
        let package = self.pos;
        let header = self.expect(Token::Package).and_then(|_| {
            let name = self.parse_ident()?;
            if name.name == "_" {
                return Err(self.error_at(name.name_pos, "invalid package name _"));
            }
            self.expect_semi()?;
            Ok(name)
        });
        let name = match header {
            Ok(name) if self.errors.is_empty() => name,
            _ => return None,
        };

        let mut decls = Vec::new();
        while self.tok == Token::Import {
            decls.push(self.parse_decl_recovering(true));
        }
        while self.tok != Token::Eof {
            decls.push(self.parse_decl_recovering(false));
        }

        let imports = decls
            .iter()
            .filter_map(|d| match d {
                Decl::Gen(g) if g.tok == Token::Import => Some(&g.specs),
                _ => None,
            })
            .flatten()
            .filter_map(|s| match s {
                Spec::Import(i) => Some((**i).clone()),
                _ => None,
            })
            .collect();

        Some(File {
            doc,
            package,
            name: Box::new(name),
            decls,
            scope: Some(Arc::new(Scope {
                objects: std::mem::take(&mut self.scope),
            })),
            imports,
            unresolved: Vec::new(),
            comments: std::mem::take(&mut self.comments),
        })
    }

    fn parse_decl_recovering(&mut self, imports: bool) -> Decl {
        let from = self.pos;
        let result = if imports {
            self.parse_gen_decl(Token::Import).map(Decl::from)
        } else {
            self.parse_decl()
        };
        match result {
            Ok(decl) => decl,
            Err(Bail) => {
                self.depth = 0;
                self.expr_lev = 0;
                if self.pos == from {
                    self.next();
                }
                while !matches!(
                    self.tok,
                    Token::Const | Token::Type | Token::Var | Token::Func | Token::Eof
                ) {
                    self.next();
                }
                Decl::from(BadDecl {
                    from,
                    to: self.pos,
                })
            }
        }
    }

    fn parse_decl(&mut self) -> PResult<Decl> {
        match self.tok {
            Token::Const | Token::Var | Token::Type => {
                let keyword = self.tok;
                self.parse_gen_decl(keyword).map(Decl::from)
            }
            Token::Func => self.parse_func_decl().map(Decl::from),
            Token::Import => {
                let pos = self.pos;
                Err(self.error_at(pos, "imports must appear before other declarations"))
            }
            _ => Err(self.error_expected("declaration")),
        }
    }

    fn parse_gen_decl(&mut self, keyword: Token) -> PResult<GenDecl> {
        let doc = self.lead_comment.take().map(Box::new);
        let tok_pos = self.expect(keyword)?;
        let mut lparen = Pos::NONE;
        let mut rparen = Pos::NONE;
        let mut specs = Vec::new();
        if self.tok == Token::LParen {
            lparen = self.pos;
            self.next();
            let mut iota = 0;
            while self.tok != Token::RParen && self.tok != Token::Eof {
                let doc = self.lead_comment.take();
                specs.push(self.parse_spec(keyword, doc, iota)?);
                iota += 1;
            }
            rparen = self.expect(Token::RParen)?;
            self.expect_semi()?;
        } else {
            let doc = self.lead_comment.take();
            specs.push(self.parse_spec(keyword, doc, 0)?);
        }
        Ok(GenDecl {
            doc,
            tok_pos,
            tok: keyword,
            lparen,
            specs,
            rparen,
        })
    }

    fn parse_spec(&mut self, keyword: Token, doc: Option<CommentGroup>, iota: usize) -> PResult<Spec> {
        let doc = doc.map(Box::new);
        match keyword {
            Token::Import => self.parse_import_spec(doc).map(Spec::from),
            Token::Type => self.parse_type_spec(doc).map(Spec::from),
            _ => self.parse_value_spec(doc, keyword, iota).map(Spec::from),
        }
    }

    fn parse_import_spec(&mut self, doc: Option<Box<CommentGroup>>) -> PResult<ImportSpec> {
        let name = match self.tok {
            Token::Period => {
                let ident = Ident::new(".", self.pos);
                self.next();
                Some(Box::new(ident))
            }
            Token::Ident => Some(Box::new(self.parse_ident()?)),
            _ => None,
        };
        if self.tok != Token::String {
            return Err(self.error_expected("import path"));
        }
        let path = BasicLit {
            value_pos: self.pos,
            kind: Token::String,
            value: std::mem::take(&mut self.lit),
        };
        self.next();
        self.expect_semi()?;
        Ok(ImportSpec {
            doc,
            name,
            path: Box::new(path),
            comment: self.line_comment.take().map(Box::new),
            end_pos: Pos::NONE,
        })
    }

    fn parse_value_spec(
        &mut self,
        doc: Option<Box<CommentGroup>>,
        keyword: Token,
        iota: usize,
    ) -> PResult<ValueSpec> {
        let mut names = self.parse_ident_list()?;
        let mut typ = None;
        let mut values = Vec::new();
        if !matches!(self.tok, Token::Assign | Token::Semicolon | Token::RParen) {
            typ = Some(self.parse_type()?);
        }
        if self.tok == Token::Assign {
            self.next();
            values = self.parse_expr_list()?;
        }
        self.expect_semi()?;
        let pos = names.first().map_or(self.pos, |n| n.name_pos);
        if keyword == Token::Const && values.is_empty() && (typ.is_some() || iota == 0) {
            self.error_at(pos, "missing init expr for const declaration");
        } else if keyword == Token::Var && values.is_empty() && typ.is_none() {
            self.error_at(pos, "missing variable type or initialization");
        }
        let kind = if keyword == Token::Const {
            ObjKind::Con
        } else {
            ObjKind::Var
        };
        for name in &mut names {
            self.declare(name, kind);
        }
        Ok(ValueSpec {
            doc,
            names,
            typ,
            values,
            comment: self.line_comment.take().map(Box::new),
        })
    }

    fn parse_type_spec(&mut self, doc: Option<Box<CommentGroup>>) -> PResult<TypeSpec> {
        let mut name = self.parse_ident()?;
        self.declare(&mut name, ObjKind::Typ);
        let mut assign = Pos::NONE;
        if self.tok == Token::Assign {
            assign = self.pos;
            self.next();
        }
        let typ = self.parse_type()?;
        self.expect_semi()?;
        Ok(TypeSpec {
            doc,
            name: Box::new(name),
            assign,
            typ,
            comment: self.line_comment.take().map(Box::new),
        })
    }

    fn parse_func_decl(&mut self) -> PResult<FuncDecl> {
        let doc = self.lead_comment.take().map(Box::new);
        let func = self.expect(Token::Func)?;
        let recv = if self.tok == Token::LParen {
            Some(Box::new(self.parse_parameters(false)?))
        } else {
            None
        };
        let mut name = self.parse_ident()?;
        let (params, results) = self.parse_signature()?;
        let body = if self.tok == Token::LBrace {
            Some(Box::new(self.parse_body()?))
        } else {
            None
        };
        self.expect_semi()?;
        if recv.is_none() && name.name != "init" {
            self.declare(&mut name, ObjKind::Fun);
        }
        Ok(FuncDecl {
            doc,
            recv,
            name: Box::new(name),
            typ: Some(Box::new(FuncType {
                func,
                params: Some(Box::new(params)),
                results,
            })),
            body,
        })
    }

    // ========================================================================
    // IDENTIFIERS AND TYPES
    // ========================================================================

    fn parse_ident(&mut self) -> PResult<Ident> {
        if self.tok != Token::Ident {
            return Err(self.error_expected("'IDENT'"));
        }
        let ident = Ident::new(std::mem::take(&mut self.lit), self.pos);
        self.next();
        Ok(ident)
    }

    fn parse_ident_list(&mut self) -> PResult<Vec<Ident>> {
        let mut list = vec![self.parse_ident()?];
        while self.tok == Token::Comma {
            self.next();
            list.push(self.parse_ident()?);
        }
        Ok(list)
    }

    fn parse_type(&mut self) -> PResult<Expr> {
        match self.try_ident_or_type()? {
            Some(typ) => Ok(typ),
            None => Err(self.error_expected("type")),
        }
    }

    fn parse_type_name(&mut self) -> PResult<Expr> {
        let ident = self.parse_ident()?;
        if self.tok == Token::Period {
            self.next();
            let sel = self.parse_ident()?;
            return Ok(Expr::from(SelectorExpr {
                x: Expr::from(ident),
                sel: Box::new(sel),
            }));
        }
        Ok(Expr::from(ident))
    }

    fn try_ident_or_type(&mut self) -> PResult<Option<Expr>> {
        let typ = match self.tok {
            Token::Ident => self.parse_type_name()?,
            Token::LBrack => self.parse_array_type()?,
            Token::Struct => self.parse_struct_type()?,
            Token::Mul => {
                let star = self.pos;
                self.next();
                let x = self.parse_type()?;
                Expr::from(StarExpr { star, x })
            }
            Token::Func => {
                let func = self.pos;
                self.next();
                let (params, results) = self.parse_signature()?;
                Expr::from(FuncType {
                    func,
                    params: Some(Box::new(params)),
                    results,
                })
            }
            Token::Interface => self.parse_interface_type()?,
            Token::Map => self.parse_map_type()?,
            Token::Chan | Token::Arrow => self.parse_chan_type()?,
            Token::LParen => {
                let lparen = self.pos;
                self.next();
                let x = self.parse_type()?;
                let rparen = self.expect(Token::RParen)?;
                Expr::from(ParenExpr { lparen, x, rparen })
            }
            _ => return Ok(None),
        };
        Ok(Some(typ))
    }

    fn parse_array_type(&mut self) -> PResult<Expr> {
        let lbrack = self.expect(Token::LBrack)?;
        let len = match self.tok {
            Token::Ellipsis => {
                let ellipsis = self.pos;
                self.next();
                Some(Expr::from(Ellipsis {
                    ellipsis,
                    elt: None,
                }))
            }
            Token::RBrack => None,
            _ => {
                self.expr_lev += 1;
                let len = self.parse_expr();
                self.expr_lev -= 1;
                Some(len?)
            }
        };
        self.expect(Token::RBrack)?;
        let elt = self.parse_type()?;
        Ok(Expr::from(ArrayType { lbrack, len, elt }))
    }

    fn parse_struct_type(&mut self) -> PResult<Expr> {
        let r#struct = self.expect(Token::Struct)?;
        let opening = self.expect(Token::LBrace)?;
        let mut list = Vec::new();
        while matches!(self.tok, Token::Ident | Token::Mul | Token::LParen) {
            list.push(self.parse_field_decl()?);
        }
        let closing = self.expect(Token::RBrace)?;
        Ok(Expr::from(StructType {
            r#struct,
            fields: Some(Box::new(FieldList {
                opening,
                list,
                closing,
            })),
            incomplete: false,
        }))
    }

    fn parse_field_decl(&mut self) -> PResult<Field> {
        let doc = self.lead_comment.take().map(Box::new);
        let mut names = Vec::new();
        let typ;
        if self.tok == Token::Ident {
            let first = self.parse_type_name()?;
            match first {
                Expr::Ident(ident) if matches!(self.tok, Token::Comma) || self.starts_type() => {
                    names.push(*ident);
                    while self.tok == Token::Comma {
                        self.next();
                        names.push(self.parse_ident()?);
                    }
                    typ = self.parse_type()?;
                }
                embedded => typ = embedded,
            }
        } else if self.tok == Token::Mul {
            let star = self.pos;
            self.next();
            let x = self.parse_type_name()?;
            typ = Expr::from(StarExpr { star, x });
        } else {
            let lparen = self.expect(Token::LParen)?;
            let x = self.parse_type()?;
            let rparen = self.expect(Token::RParen)?;
            typ = Expr::from(ParenExpr { lparen, x, rparen });
        }
        let tag = if self.tok == Token::String {
            let lit = BasicLit {
                value_pos: self.pos,
                kind: Token::String,
                value: std::mem::take(&mut self.lit),
            };
            self.next();
            Some(Box::new(lit))
        } else {
            None
        };
        self.expect_semi()?;
        Ok(Field {
            doc,
            names,
            typ: Some(typ),
            tag,
            comment: self.line_comment.take().map(Box::new),
        })
    }

    /// Whether the current token can begin a type.
    fn starts_type(&self) -> bool {
        matches!(
            self.tok,
            Token::Ident
                | Token::LBrack
                | Token::Struct
                | Token::Mul
                | Token::Func
                | Token::Interface
                | Token::Map
                | Token::Chan
                | Token::Arrow
                | Token::LParen
        )
    }

    fn parse_interface_type(&mut self) -> PResult<Expr> {
        let interface = self.expect(Token::Interface)?;
        let opening = self.expect(Token::LBrace)?;
        let mut list = Vec::new();
        while self.tok == Token::Ident {
            list.push(self.parse_method_spec()?);
        }
        let closing = self.expect(Token::RBrace)?;
        Ok(Expr::from(InterfaceType {
            interface,
            methods: Some(Box::new(FieldList {
                opening,
                list,
                closing,
            })),
            incomplete: false,
        }))
    }

    fn parse_method_spec(&mut self) -> PResult<Field> {
        let doc = self.lead_comment.take().map(Box::new);
        let x = self.parse_type_name()?;
        let field = match x {
            Expr::Ident(ident) if self.tok == Token::LParen => {
                let (params, results) = self.parse_signature()?;
                Field {
                    doc,
                    names: vec![*ident],
                    typ: Some(Expr::from(FuncType {
                        func: Pos::NONE,
                        params: Some(Box::new(params)),
                        results,
                    })),
                    ..Field::default()
                }
            }
            embedded => Field {
                doc,
                typ: Some(embedded),
                ..Field::default()
            },
        };
        self.expect_semi()?;
        Ok(Field {
            comment: self.line_comment.take().map(Box::new),
            ..field
        })
    }

    fn parse_map_type(&mut self) -> PResult<Expr> {
        let map = self.expect(Token::Map)?;
        self.expect(Token::LBrack)?;
        let key = self.parse_type()?;
        self.expect(Token::RBrack)?;
        let value = self.parse_type()?;
        Ok(Expr::from(MapType { map, key, value }))
    }

    fn parse_chan_type(&mut self) -> PResult<Expr> {
        let begin = self.pos;
        let mut arrow = Pos::NONE;
        let dir;
        if self.tok == Token::Chan {
            self.next();
            if self.tok == Token::Arrow {
                arrow = self.pos;
                self.next();
                dir = ChanDir::SEND;
            } else {
                dir = ChanDir::BOTH;
            }
        } else {
            arrow = self.expect(Token::Arrow)?;
            self.expect(Token::Chan)?;
            dir = ChanDir::RECV;
        }
        let value = self.parse_type()?;
        Ok(Expr::from(ChanType {
            begin,
            arrow,
            dir,
            value,
        }))
    }

    // ========================================================================
    // SIGNATURES
    // ========================================================================

    fn parse_signature(&mut self) -> PResult<(FieldList, Option<Box<FieldList>>)> {
        let params = self.parse_parameters(true)?;
        let results = self.parse_result()?;
        Ok((params, results))
    }

    fn parse_result(&mut self) -> PResult<Option<Box<FieldList>>> {
        if self.tok == Token::LParen {
            return Ok(Some(Box::new(self.parse_parameters(false)?)));
        }
        Ok(self.try_ident_or_type()?.map(|typ| {
            Box::new(FieldList {
                opening: Pos::NONE,
                list: vec![Field {
                    typ: Some(typ),
                    ..Field::default()
                }],
                closing: Pos::NONE,
            })
        }))
    }

    fn parse_parameters(&mut self, ellipsis_ok: bool) -> PResult<FieldList> {
        let opening = self.expect(Token::LParen)?;
        let list = if self.tok != Token::RParen {
            self.parse_parameter_list(ellipsis_ok)?
        } else {
            Vec::new()
        };
        let closing = self.expect_closing(Token::RParen, "parameter list")?;
        Ok(FieldList {
            opening,
            list,
            closing,
        })
    }

    /// `IdentifierList Type {, IdentifierList Type}` or `Type {, Type}`, decided after the first
    /// run of comma-separated entries.
    fn parse_parameter_list(&mut self, ellipsis_ok: bool) -> PResult<Vec<Field>> {
        let mut list = Vec::new();
        loop {
            list.push(self.parse_var_type(ellipsis_ok)?);
            if self.tok != Token::Comma {
                break;
            }
            self.next();
            if self.tok == Token::RParen {
                break;
            }
        }

        let Some(typ) = self.try_var_type(ellipsis_ok)? else {
            return Ok(list
                .into_iter()
                .map(|typ| Field {
                    typ: Some(typ),
                    ..Field::default()
                })
                .collect());
        };

        let names = self.make_ident_list(list)?;
        let mut params = vec![Field {
            names,
            typ: Some(typ),
            ..Field::default()
        }];
        if !self.at_comma("parameter list", Token::RParen)? {
            return Ok(params);
        }
        self.next();
        while self.tok != Token::RParen && self.tok != Token::Eof {
            let names = self.parse_ident_list()?;
            let typ = self.parse_var_type(ellipsis_ok)?;
            params.push(Field {
                names,
                typ: Some(typ),
                ..Field::default()
            });
            if !self.at_comma("parameter list", Token::RParen)? {
                break;
            }
            self.next();
        }
        Ok(params)
    }

    fn make_ident_list(&mut self, list: Vec<Expr>) -> PResult<Vec<Ident>> {
        list.into_iter()
            .map(|x| match x {
                Expr::Ident(ident) => Ok(*ident),
                other => {
                    let pos = other.pos();
                    Err(self.error_at(pos, "expected 'IDENT'"))
                }
            })
            .collect()
    }

    fn parse_var_type(&mut self, ellipsis_ok: bool) -> PResult<Expr> {
        match self.try_var_type(ellipsis_ok)? {
            Some(typ) => Ok(typ),
            None => Err(self.error_expected("type")),
        }
    }

    fn try_var_type(&mut self, ellipsis_ok: bool) -> PResult<Option<Expr>> {
        if self.tok != Token::Ellipsis {
            return self.try_ident_or_type();
        }
        let ellipsis = self.pos;
        if !ellipsis_ok {
            return Err(self.error_at(ellipsis, "can only use ... with final parameter in list"));
        }
        self.next();
        let elt = self.try_ident_or_type()?;
        if elt.is_none() {
            return Err(self.error_expected("type"));
        }
        Ok(Some(Expr::from(Ellipsis { ellipsis, elt })))
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary_expr(1)
    }

    fn parse_expr_list(&mut self) -> PResult<Vec<Expr>> {
        let mut list = vec![self.parse_expr()?];
        while self.tok == Token::Comma {
            self.next();
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_binary_expr(&mut self, prec1: u8) -> PResult<Expr> {
        let mut x = self.parse_unary_expr()?;
        loop {
            let prec = self.tok.precedence();
            if prec < prec1 {
                return Ok(x);
            }
            let op = self.tok;
            let op_pos = self.pos;
            self.next();
            let y = self.parse_binary_expr(prec + 1)?;
            x = Expr::from(BinaryExpr { x, op_pos, op, y });
        }
    }

    fn parse_unary_expr(&mut self) -> PResult<Expr> {
        match self.tok {
            Token::Add | Token::Sub | Token::Not | Token::Xor | Token::And => {
                let op_pos = self.pos;
                let op = self.tok;
                self.next();
                let x = self.parse_unary_expr()?;
                Ok(Expr::from(UnaryExpr { op_pos, op, x }))
            }
            Token::Arrow => {
                let arrow = self.pos;
                self.next();
                if self.tok == Token::Chan {
                    self.next();
                    let value = self.parse_type()?;
                    return Ok(Expr::from(ChanType {
                        begin: arrow,
                        arrow,
                        dir: ChanDir::RECV,
                        value,
                    }));
                }
                let x = self.parse_unary_expr()?;
                Ok(Expr::from(UnaryExpr {
                    op_pos: arrow,
                    op: Token::Arrow,
                    x,
                }))
            }
            Token::Mul => {
                let star = self.pos;
                self.next();
                let x = self.parse_unary_expr()?;
                Ok(Expr::from(StarExpr { star, x }))
            }
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_operand(&mut self) -> PResult<Expr> {
        match self.tok {
            Token::Ident => Ok(Expr::from(self.parse_ident()?)),
            Token::Int | Token::Float | Token::Imag | Token::Char | Token::String => {
                let lit = BasicLit {
                    value_pos: self.pos,
                    kind: self.tok,
                    value: std::mem::take(&mut self.lit),
                };
                self.next();
                Ok(Expr::from(lit))
            }
            Token::LParen => {
                let lparen = self.pos;
                self.next();
                self.expr_lev += 1;
                let x = self.parse_expr();
                self.expr_lev -= 1;
                let x = x?;
                let rparen = self.expect(Token::RParen)?;
                Ok(Expr::from(ParenExpr { lparen, x, rparen }))
            }
            Token::Func => self.parse_func_type_or_lit(),
            _ => match self.try_ident_or_type()? {
                Some(typ) => Ok(typ),
                None => Err(self.error_expected("operand")),
            },
        }
    }

    fn parse_func_type_or_lit(&mut self) -> PResult<Expr> {
        let func = self.expect(Token::Func)?;
        let (params, results) = self.parse_signature()?;
        let typ = FuncType {
            func,
            params: Some(Box::new(params)),
            results,
        };
        if self.tok != Token::LBrace {
            return Ok(Expr::from(typ));
        }
        self.expr_lev += 1;
        let body = self.parse_body();
        self.expr_lev -= 1;
        Ok(Expr::from(FuncLit {
            typ: Some(Box::new(typ)),
            body: Some(Box::new(body?)),
        }))
    }

    fn parse_primary_expr(&mut self) -> PResult<Expr> {
        let mut x = self.parse_operand()?;
        loop {
            x = match self.tok {
                Token::Period => {
                    self.next();
                    match self.tok {
                        Token::Ident => {
                            let sel = self.parse_ident()?;
                            Expr::from(SelectorExpr {
                                x,
                                sel: Box::new(sel),
                            })
                        }
                        Token::LParen => {
                            let lparen = self.pos;
                            self.next();
                            let typ = if self.tok == Token::Type {
                                self.next();
                                None
                            } else {
                                Some(self.parse_type()?)
                            };
                            let rparen = self.expect(Token::RParen)?;
                            Expr::from(TypeAssertExpr {
                                x,
                                lparen,
                                typ,
                                rparen,
                            })
                        }
                        _ => return Err(self.error_expected("selector or type assertion")),
                    }
                }
                Token::LBrack => self.parse_index_or_slice(x)?,
                Token::LParen => Expr::from(self.parse_call(x)?),
                Token::LBrace
                    if is_literal_type(&x) && (self.expr_lev >= 0 || !is_type_name(&x)) =>
                {
                    self.parse_literal_value(Some(x))?
                }
                _ => return Ok(x),
            };
        }
    }

    fn parse_index_or_slice(&mut self, x: Expr) -> PResult<Expr> {
        let lbrack = self.expect(Token::LBrack)?;
        self.expr_lev += 1;
        let parts = self.parse_index_parts();
        self.expr_lev -= 1;
        let (index, ncolons) = parts?;
        let rbrack = self.expect(Token::RBrack)?;
        let [low, high, max] = index;

        if ncolons > 0 {
            let slice3 = ncolons == 2;
            if slice3 && (high.is_none() || max.is_none()) {
                let which = if high.is_none() { "middle" } else { "final" };
                return Err(self.error_at(rbrack, format!("{which} index required in 3-index slice")));
            }
            return Ok(Expr::from(SliceExpr {
                x,
                lbrack,
                low,
                high,
                max,
                slice3,
                rbrack,
            }));
        }
        match low {
            Some(index) => Ok(Expr::from(IndexExpr {
                x,
                lbrack,
                index,
                rbrack,
            })),
            None => Err(self.error_at(rbrack, "expected operand")),
        }
    }

    fn parse_index_parts(&mut self) -> PResult<([Option<Expr>; 3], usize)> {
        let mut index: [Option<Expr>; 3] = [None, None, None];
        if self.tok != Token::Colon {
            index[0] = Some(self.parse_expr()?);
        }
        let mut ncolons = 0;
        while self.tok == Token::Colon && ncolons < 2 {
            ncolons += 1;
            self.next();
            if !matches!(self.tok, Token::Colon | Token::RBrack | Token::Eof) {
                index[ncolons] = Some(self.parse_expr()?);
            }
        }
        Ok((index, ncolons))
    }

    fn parse_call(&mut self, fun: Expr) -> PResult<CallExpr> {
        let lparen = self.expect(Token::LParen)?;
        self.expr_lev += 1;
        let args = self.parse_call_args();
        self.expr_lev -= 1;
        let (args, ellipsis) = args?;
        let rparen = self.expect_closing(Token::RParen, "argument list")?;
        Ok(CallExpr {
            fun,
            lparen,
            args,
            ellipsis,
            rparen,
        })
    }

    fn parse_call_args(&mut self) -> PResult<(Vec<Expr>, Pos)> {
        let mut args = Vec::new();
        let mut ellipsis = Pos::NONE;
        while self.tok != Token::RParen && self.tok != Token::Eof && !ellipsis.is_valid() {
            args.push(self.parse_expr()?);
            if self.tok == Token::Ellipsis {
                ellipsis = self.pos;
                self.next();
            }
            if !self.at_comma("argument list", Token::RParen)? {
                break;
            }
            self.next();
        }
        Ok((args, ellipsis))
    }

    fn parse_literal_value(&mut self, typ: Option<Expr>) -> PResult<Expr> {
        let lbrace = self.expect(Token::LBrace)?;
        self.expr_lev += 1;
        let elts = self.parse_element_list();
        self.expr_lev -= 1;
        let elts = elts?;
        let rbrace = self.expect_closing(Token::RBrace, "composite literal")?;
        Ok(Expr::from(CompositeLit {
            typ,
            lbrace,
            elts,
            rbrace,
            incomplete: false,
        }))
    }

    fn parse_element_list(&mut self) -> PResult<Vec<Expr>> {
        let mut elts = Vec::new();
        while self.tok != Token::RBrace && self.tok != Token::Eof {
            elts.push(self.parse_element()?);
            if !self.at_comma("composite literal", Token::RBrace)? {
                break;
            }
            self.next();
        }
        Ok(elts)
    }

    fn parse_element(&mut self) -> PResult<Expr> {
        let x = self.parse_element_value()?;
        if self.tok != Token::Colon {
            return Ok(x);
        }
        let colon = self.pos;
        self.next();
        let value = self.parse_element_value()?;
        Ok(Expr::from(KeyValueExpr {
            key: x,
            colon,
            value,
        }))
    }

    fn parse_element_value(&mut self) -> PResult<Expr> {
        if self.tok == Token::LBrace {
            return self.parse_literal_value(None);
        }
        self.parse_expr()
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn parse_body(&mut self) -> PResult<BlockStmt> {
        self.depth += 1;
        let block = self.parse_block_stmt();
        self.depth -= 1;
        block
    }

    fn parse_block_stmt(&mut self) -> PResult<BlockStmt> {
        let lbrace = self.expect(Token::LBrace)?;
        let list = self.parse_stmt_list()?;
        let rbrace = self.expect(Token::RBrace)?;
        Ok(BlockStmt {
            lbrace,
            list,
            rbrace,
        })
    }

    fn parse_stmt_list(&mut self) -> PResult<Vec<Stmt>> {
        let mut list = Vec::new();
        while !matches!(
            self.tok,
            Token::Case | Token::Default | Token::RBrace | Token::Eof
        ) {
            list.push(self.parse_stmt()?);
        }
        Ok(list)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.tok {
            Token::Const | Token::Type | Token::Var => {
                let keyword = self.tok;
                let decl = self.parse_gen_decl(keyword)?;
                Ok(Stmt::from(DeclStmt {
                    decl: Decl::from(decl),
                }))
            }
            Token::Ident
            | Token::Int
            | Token::Float
            | Token::Imag
            | Token::Char
            | Token::String
            | Token::Func
            | Token::LParen
            | Token::LBrack
            | Token::Struct
            | Token::Map
            | Token::Chan
            | Token::Interface
            | Token::Add
            | Token::Sub
            | Token::Mul
            | Token::And
            | Token::Xor
            | Token::Arrow
            | Token::Not => {
                let (stmt, _) = self.parse_simple_stmt(SimpleMode::LabelOk)?;
                if !matches!(stmt, Stmt::Labeled(_)) {
                    self.expect_semi()?;
                }
                Ok(stmt)
            }
            Token::Go => {
                let go = self.expect(Token::Go)?;
                let call = self.parse_call_expr("go")?;
                self.expect_semi()?;
                Ok(Stmt::from(GoStmt { go, call }))
            }
            Token::Defer => {
                let defer = self.expect(Token::Defer)?;
                let call = self.parse_call_expr("defer")?;
                self.expect_semi()?;
                Ok(Stmt::from(DeferStmt { defer, call }))
            }
            Token::Return => {
                let r#return = self.expect(Token::Return)?;
                let results = if !matches!(self.tok, Token::Semicolon | Token::RBrace) {
                    self.parse_expr_list()?
                } else {
                    Vec::new()
                };
                self.expect_semi()?;
                Ok(Stmt::from(ReturnStmt { r#return, results }))
            }
            Token::Break | Token::Continue | Token::Goto | Token::Fallthrough => {
                let tok = self.tok;
                let tok_pos = self.pos;
                self.next();
                let label = if tok != Token::Fallthrough && self.tok == Token::Ident {
                    Some(Box::new(self.parse_ident()?))
                } else {
                    None
                };
                if tok == Token::Goto && label.is_none() {
                    return Err(self.error_at(tok_pos, "expected label after goto"));
                }
                self.expect_semi()?;
                Ok(Stmt::from(BranchStmt {
                    tok_pos,
                    tok,
                    label,
                }))
            }
            Token::LBrace => {
                let block = self.parse_block_stmt()?;
                self.expect_semi()?;
                Ok(Stmt::from(block))
            }
            Token::If => self.parse_if_stmt(),
            Token::Switch => self.parse_switch_stmt(),
            Token::Select => self.parse_select_stmt(),
            Token::For => self.parse_for_stmt(),
            Token::Semicolon => {
                let stmt = EmptyStmt {
                    semicolon: self.pos,
                    implicit: self.lit == "\n",
                };
                self.next();
                Ok(Stmt::from(stmt))
            }
            Token::RBrace => Ok(Stmt::from(EmptyStmt {
                semicolon: self.pos,
                implicit: true,
            })),
            _ => Err(self.error_expected("statement")),
        }
    }

    fn parse_call_expr(&mut self, context: &str) -> PResult<Box<CallExpr>> {
        let pos = self.pos;
        match self.parse_unary_expr()? {
            Expr::Call(call) => Ok(call),
            Expr::Paren(paren) => match paren.x {
                Expr::Call(call) => Ok(call),
                _ => Err(self.error_at(pos, format!("expression in {context} must be function call"))),
            },
            _ => Err(self.error_at(pos, format!("expression in {context} must be function call"))),
        }
    }

    fn parse_simple_stmt(&mut self, mode: SimpleMode) -> PResult<(Stmt, bool)> {
        let mut lhs = self.parse_expr_list()?;

        if self.tok.is_assign_op() {
            let tok_pos = self.pos;
            let tok = self.tok;
            self.next();
            let mut is_range = false;
            let rhs = if mode == SimpleMode::RangeOk
                && self.tok == Token::Range
                && matches!(tok, Token::Define | Token::Assign)
            {
                let op_pos = self.pos;
                self.next();
                let x = self.parse_expr()?;
                is_range = true;
                vec![Expr::from(UnaryExpr {
                    op_pos,
                    op: Token::Range,
                    x,
                })]
            } else {
                self.parse_expr_list()?
            };
            return Ok((
                Stmt::from(AssignStmt {
                    lhs,
                    tok_pos,
                    tok,
                    rhs,
                }),
                is_range,
            ));
        }

        if lhs.len() > 1 {
            let pos = lhs[1].pos();
            return Err(self.error_at(pos, "expected 1 expression"));
        }
        let x = lhs.remove(0);

        let stmt = match (self.tok, x) {
            (Token::Colon, Expr::Ident(label)) if mode == SimpleMode::LabelOk => {
                let colon = self.pos;
                self.next();
                let stmt = self.parse_stmt()?;
                Stmt::from(LabeledStmt {
                    label,
                    colon,
                    stmt,
                })
            }
            (Token::Arrow, chan) => {
                let arrow = self.pos;
                self.next();
                let value = self.parse_expr()?;
                Stmt::from(SendStmt { chan, arrow, value })
            }
            (Token::Inc | Token::Dec, x) => {
                let stmt = IncDecStmt {
                    x,
                    tok_pos: self.pos,
                    tok: self.tok,
                };
                self.next();
                Stmt::from(stmt)
            }
            (_, x) => Stmt::from(ExprStmt { x }),
        };
        Ok((stmt, false))
    }

    fn make_expr(&mut self, stmt: Option<Stmt>, want: &str) -> PResult<Option<Expr>> {
        match stmt {
            None => Ok(None),
            Some(Stmt::Expr(e)) => Ok(Some(e.x)),
            Some(other) => {
                let found = if matches!(other, Stmt::Assign(_)) {
                    "assignment"
                } else {
                    "simple statement"
                };
                let pos = other.pos();
                Err(self.error_at(
                    pos,
                    format!(
                        "expected {want}, found {found} (missing parentheses around composite literal?)"
                    ),
                ))
            }
        }
    }

    /// Parses the `[init;] cond` header of an `if`, with composite literals disabled.
    fn parse_if_header(&mut self) -> PResult<(Option<Stmt>, Expr)> {
        if self.tok == Token::LBrace {
            let pos = self.pos;
            return Err(self.error_at(pos, "missing condition in if statement"));
        }
        let outer = self.expr_lev;
        self.expr_lev = -1;
        let header = self.parse_if_header_inner();
        self.expr_lev = outer;
        header
    }

    fn parse_if_header_inner(&mut self) -> PResult<(Option<Stmt>, Expr)> {
        let mut init = None;
        if self.tok != Token::Semicolon {
            init = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
        }
        let mut cond_stmt = None;
        if self.tok == Token::Semicolon {
            self.next();
            if self.tok != Token::LBrace {
                cond_stmt = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
            }
        } else {
            cond_stmt = init.take();
        }
        match self.make_expr(cond_stmt, "boolean expression")? {
            Some(cond) => Ok((init, cond)),
            None => {
                let pos = self.pos;
                Err(self.error_at(pos, "missing condition in if statement"))
            }
        }
    }

    fn parse_if_stmt(&mut self) -> PResult<Stmt> {
        let r#if = self.expect(Token::If)?;
        let (init, cond) = self.parse_if_header()?;
        let body = self.parse_block_stmt()?;
        let r#else = if self.tok == Token::Else {
            self.next();
            match self.tok {
                Token::If => Some(self.parse_if_stmt()?),
                Token::LBrace => {
                    let block = self.parse_block_stmt()?;
                    self.expect_semi()?;
                    Some(Stmt::from(block))
                }
                _ => return Err(self.error_expected("if statement or block")),
            }
        } else {
            self.expect_semi()?;
            None
        };
        Ok(Stmt::from(IfStmt {
            r#if,
            init,
            cond,
            body: Box::new(body),
            r#else,
        }))
    }

    /// Parses up to two simple statements separated by `;` before a `{`.
    fn parse_header_pair(&mut self, mode: SimpleMode) -> PResult<(Option<Stmt>, Option<Stmt>, bool)> {
        let mut s1 = None;
        let mut s2 = None;
        let mut is_range = false;
        if self.tok != Token::Semicolon {
            let (stmt, range) = self.parse_simple_stmt(mode)?;
            s2 = Some(stmt);
            is_range = range;
        }
        if !is_range && self.tok == Token::Semicolon {
            self.next();
            s1 = s2.take();
            if self.tok != Token::LBrace {
                s2 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
            }
        }
        Ok((s1, s2, is_range))
    }

    fn parse_switch_stmt(&mut self) -> PResult<Stmt> {
        let switch = self.expect(Token::Switch)?;
        let mut init = None;
        let mut tag = None;
        if self.tok != Token::LBrace {
            let outer = self.expr_lev;
            self.expr_lev = -1;
            let header = self.parse_header_pair(SimpleMode::Basic);
            self.expr_lev = outer;
            let (s1, s2, _) = header?;
            init = s1;
            tag = s2;
        }

        let type_switch = tag.as_ref().map_or(false, is_type_switch_guard);
        let lbrace = self.expect(Token::LBrace)?;
        let mut list = Vec::new();
        while matches!(self.tok, Token::Case | Token::Default) {
            list.push(Stmt::from(self.parse_case_clause()?));
        }
        let rbrace = self.expect(Token::RBrace)?;
        self.expect_semi()?;
        let body = Box::new(BlockStmt {
            lbrace,
            list,
            rbrace,
        });

        if type_switch {
            if let Some(assign) = tag {
                return Ok(Stmt::from(TypeSwitchStmt {
                    switch,
                    init,
                    assign,
                    body,
                }));
            }
        }
        let tag = self.make_expr(tag, "switch expression")?;
        Ok(Stmt::from(SwitchStmt {
            switch,
            init,
            tag,
            body,
        }))
    }

    fn parse_case_clause(&mut self) -> PResult<CaseClause> {
        let case = self.pos;
        let mut list = Vec::new();
        if self.tok == Token::Case {
            self.next();
            list = self.parse_expr_list()?;
        } else {
            self.expect(Token::Default)?;
        }
        let colon = self.expect(Token::Colon)?;
        let body = self.parse_stmt_list()?;
        Ok(CaseClause {
            case,
            list,
            colon,
            body,
        })
    }

    fn parse_select_stmt(&mut self) -> PResult<Stmt> {
        let select = self.expect(Token::Select)?;
        let lbrace = self.expect(Token::LBrace)?;
        let mut list = Vec::new();
        while matches!(self.tok, Token::Case | Token::Default) {
            list.push(Stmt::from(self.parse_comm_clause()?));
        }
        let rbrace = self.expect(Token::RBrace)?;
        self.expect_semi()?;
        Ok(Stmt::from(SelectStmt {
            select,
            body: Box::new(BlockStmt {
                lbrace,
                list,
                rbrace,
            }),
        }))
    }

    fn parse_comm_clause(&mut self) -> PResult<CommClause> {
        let case = self.pos;
        let mut comm = None;
        if self.tok == Token::Case {
            self.next();
            let mut lhs = self.parse_expr_list()?;
            if self.tok == Token::Arrow {
                if lhs.len() > 1 {
                    let pos = lhs[1].pos();
                    return Err(self.error_at(pos, "expected 1 expression"));
                }
                let arrow = self.pos;
                self.next();
                let value = self.parse_expr()?;
                comm = Some(Stmt::from(SendStmt {
                    chan: lhs.remove(0),
                    arrow,
                    value,
                }));
            } else if matches!(self.tok, Token::Assign | Token::Define) {
                let tok_pos = self.pos;
                let tok = self.tok;
                self.next();
                let rhs = self.parse_expr()?;
                comm = Some(Stmt::from(AssignStmt {
                    lhs,
                    tok_pos,
                    tok,
                    rhs: vec![rhs],
                }));
            } else {
                if lhs.len() > 1 {
                    let pos = lhs[1].pos();
                    return Err(self.error_at(pos, "expected 1 expression"));
                }
                comm = Some(Stmt::from(ExprStmt { x: lhs.remove(0) }));
            }
        } else {
            self.expect(Token::Default)?;
        }
        let colon = self.expect(Token::Colon)?;
        let body = self.parse_stmt_list()?;
        Ok(CommClause {
            case,
            comm,
            colon,
            body,
        })
    }

    fn parse_for_stmt(&mut self) -> PResult<Stmt> {
        let r#for = self.expect(Token::For)?;
        let outer = self.expr_lev;
        self.expr_lev = -1;
        let header = self.parse_for_header();
        self.expr_lev = outer;
        let (s1, s2, s3, is_range) = header?;

        let body = Box::new(self.parse_block_stmt()?);
        self.expect_semi()?;

        if is_range {
            let Some(Stmt::Assign(assign)) = s2 else {
                return Err(self.error_at(r#for, "expected range clause"));
            };
            let AssignStmt {
                lhs,
                tok_pos,
                tok,
                rhs,
            } = *assign;
            if lhs.len() > 2 {
                let pos = lhs[2].pos();
                return Err(self.error_at(pos, "range clause permits at most two iteration variables"));
            }
            let mut lhs = lhs.into_iter();
            let key = lhs.next();
            let value = lhs.next();
            let x = match rhs.into_iter().next() {
                Some(Expr::Unary(unary)) if unary.op == Token::Range => unary.x,
                _ => return Err(self.error_at(r#for, "expected range clause")),
            };
            return Ok(Stmt::from(RangeStmt {
                r#for,
                key,
                value,
                tok_pos,
                tok,
                x,
                body,
            }));
        }

        let cond = self.make_expr(s2, "boolean or range expression")?;
        Ok(Stmt::from(ForStmt {
            r#for,
            init: s1,
            cond,
            post: s3,
            body,
        }))
    }

    fn parse_for_header(&mut self) -> PResult<(Option<Stmt>, Option<Stmt>, Option<Stmt>, bool)> {
        if self.tok == Token::LBrace {
            return Ok((None, None, None, false));
        }
        if self.tok == Token::Range {
            // `for range x`
            let op_pos = self.pos;
            self.next();
            let x = self.parse_expr()?;
            let assign = AssignStmt {
                lhs: Vec::new(),
                tok_pos: Pos::NONE,
                tok: Token::Illegal,
                rhs: vec![Expr::from(UnaryExpr {
                    op_pos,
                    op: Token::Range,
                    x,
                })],
            };
            return Ok((None, Some(Stmt::from(assign)), None, true));
        }

        let mut s1 = None;
        let mut s2 = None;
        let mut s3 = None;
        let mut is_range = false;
        if self.tok != Token::Semicolon {
            let (stmt, range) = self.parse_simple_stmt(SimpleMode::RangeOk)?;
            s2 = Some(stmt);
            is_range = range;
        }
        if !is_range && self.tok == Token::Semicolon {
            self.next();
            s1 = s2.take();
            if self.tok != Token::Semicolon {
                s2 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
            }
            self.expect_semi_in_for()?;
            if self.tok != Token::LBrace {
                s3 = Some(self.parse_simple_stmt(SimpleMode::Basic)?.0);
            }
        }
        Ok((s1, s2, s3, is_range))
    }

    fn expect_semi_in_for(&mut self) -> PResult<()> {
        if self.tok == Token::Semicolon {
            self.next();
            return Ok(());
        }
        Err(self.error_expected("';'"))
    }
}

fn is_type_name(x: &Expr) -> bool {
    match x {
        Expr::Ident(_) => true,
        Expr::Selector(s) => matches!(s.x, Expr::Ident(_)),
        _ => false,
    }
}

fn is_literal_type(x: &Expr) -> bool {
    match x {
        Expr::Ident(_) | Expr::ArrayType(_) | Expr::StructType(_) | Expr::MapType(_) => true,
        Expr::Selector(s) => matches!(s.x, Expr::Ident(_)),
        _ => false,
    }
}

fn is_type_switch_guard(stmt: &Stmt) -> bool {
    let is_guard = |x: &Expr| matches!(x, Expr::TypeAssert(t) if t.typ.is_none());
    match stmt {
        Stmt::Expr(e) => is_guard(&e.x),
        Stmt::Assign(a) => {
            a.tok == Token::Define && a.lhs.len() == 1 && a.rhs.len() == 1 && is_guard(&a.rhs[0])
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> File {
        let parsed = parse_file("test.go", src).expect("package clause is valid");
        assert!(
            parsed.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            parsed.diagnostics
        );
        parsed.file
    }

    fn first_body_stmt(file: &File) -> &Stmt {
        let func = file.funcs().next().expect("file has a function");
        &func.body.as_ref().expect("function has a body").list[0]
    }

    #[test]
    fn test_minimal_file() {
        let file = parse_ok("package main\n");
        assert_eq!(file.name.name, "main");
        assert_eq!(file.package, Pos::from_offset(0));
        assert!(file.decls.is_empty());
        assert!(file.unresolved.is_empty());
    }

    #[test]
    fn test_missing_package_clause_is_fatal() {
        let err = parse_file("x.go", "func main() {}\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ParseFailure);
        assert!(err.message().contains("expected 'package'"));
    }

    #[test]
    fn test_grouped_parameters_share_one_field() {
        let file = parse_ok("package p\nfunc f(a, b int, c string) {}\n");
        let func = file.funcs().next().expect("one func");
        let params = &func.typ.as_ref().expect("type").params.as_ref().expect("params").list;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].names.len(), 2);
        assert_eq!(params[1].names[0].name, "c");
    }

    #[test]
    fn test_unnamed_parameters() {
        let file = parse_ok("package p\nfunc f(int, ...string) (bool, error) {}\n");
        let func = file.funcs().next().expect("one func");
        let typ = func.typ.as_ref().expect("type");
        let params = &typ.params.as_ref().expect("params").list;
        assert!(params.iter().all(|f| f.names.is_empty()));
        assert!(matches!(params[1].typ, Some(Expr::Ellipsis(_))));
        assert_eq!(typ.results.as_ref().expect("results").list.len(), 2);
    }

    #[test]
    fn test_composite_literal_in_if_header_needs_parens() {
        let file = parse_ok("package p\nfunc f() {\n\tif x == (T{}) {\n\t}\n}\n");
        assert!(matches!(first_body_stmt(&file), Stmt::If(_)));
    }

    #[test]
    fn test_type_switch_detection() {
        let file = parse_ok(
            "package p\nfunc f(x interface{}) {\n\tswitch v := x.(type) {\n\tcase int:\n\t\t_ = v\n\t}\n}\n",
        );
        assert!(matches!(first_body_stmt(&file), Stmt::TypeSwitch(_)));
    }

    #[test]
    fn test_range_clause() {
        let file = parse_ok("package p\nfunc f(m map[string]int) {\n\tfor k, v := range m {\n\t\t_, _ = k, v\n\t}\n}\n");
        match first_body_stmt(&file) {
            Stmt::Range(r) => {
                assert!(r.key.is_some() && r.value.is_some());
                assert_eq!(r.tok, Token::Define);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn test_doc_and_line_comments() {
        let file = parse_ok("package p\n\n// Answer is it.\nconst Answer = 42 // the answer\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected GenDecl");
        };
        let doc = decl.doc.as_ref().expect("doc comment");
        assert_eq!(doc.list[0].text, "// Answer is it.");
        let Spec::Value(spec) = &decl.specs[0] else {
            panic!("expected ValueSpec");
        };
        let comment = spec.comment.as_ref().expect("line comment");
        assert_eq!(comment.list[0].text, "// the answer");
        assert_eq!(file.comments.len(), 2);
    }

    #[test]
    fn test_file_scope_records_top_level_names() {
        let file = parse_ok("package p\nvar x int\nfunc f() { var y int; _ = y }\n");
        let scope = file.scope.as_ref().expect("scope");
        assert!(scope.objects.contains_key("x"));
        assert!(scope.objects.contains_key("f"));
        assert!(!scope.objects.contains_key("y"));
    }

    #[test]
    fn test_broken_declaration_becomes_bad_decl() {
        let parsed = parse_file("x.go", "package p\nfunc f( {\n}\nfunc g() {}\n").expect("recoverable");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(matches!(parsed.file.decls[0], Decl::Bad(_)));
        assert!(matches!(parsed.file.decls[1], Decl::Func(_)));
        assert!(parsed.diagnostics[0].to_string().starts_with("2:"));
    }

    #[test]
    fn test_imports_are_collected() {
        let file = parse_ok("package p\n\nimport (\n\t\"fmt\"\n\tm \"math\"\n)\n");
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[1].name.as_ref().map(|n| n.name.as_str()), Some("m"));
    }
}
