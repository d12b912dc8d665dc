//! # Go Normalization
//!
//! The Go-specific transform stages:
//! 1. [`preprocess`] drops file-level data that has no generic meaning (`File.Unresolved`).
//! 2. [`normalize`] rewrites native Go nodes into the language-independent `uast:` shapes.
//!
//! Most mappings are plain pattern pairs built with [`map_uast`]; the rest of the work is done by
//! a handful of custom operations:
//! - [`Quoted`] unquotes string literals,
//! - [`CommentText`] splits comment text from its delimiters and padding,
//! - [`ImportPath`] turns an import path literal into an identifier chain,
//! - [`MergeReceiver`] moves a method receiver into the parameter list,
//! - [`SplitFields`] and [`SplitSpecs`] split multi-name declarations one per name.
//!
//! Each custom operation only matches when its reconstruction reproduces the input exactly, so
//! whatever it rewrites comes back unchanged in reverse.

use std::fmt::Write as _;

use crate::diagnostics::DriverError;
use crate::syntax::token::Pos;
use crate::transform::ops::{
    arr, cases, custom, field, is, null, opt, optional, part, typed, var, CustomOp, FieldOp, Op,
    State,
};
use crate::transform::{unexpected, Mapping, Mappings, Transforms};
use crate::uast::types::{
    ALIAS, ARGUMENT, BLOCK, COMMENT, FUNCTION, FUNCTION_GROUP, FUNCTION_TYPE, IDENTIFIER, IMPORT,
    QUALIFIED_IDENTIFIER, STRING,
};
use crate::uast::{
    positions, start_offset, Node, Object, KEY_POS, KEY_ROLE, KEY_END, KEY_START, KEY_TYPE,
    TYPE_POSITIONS,
};

impl Transforms {
    /// Preprocessing followed by normalization.
    pub fn go() -> Self {
        Transforms::new(vec![preprocess(), normalize()])
    }
}

pub fn preprocess() -> Mappings {
    Mappings::new(
        "preprocess",
        vec![Mapping::new(
            "remove unresolved",
            part("_", vec![field(KEY_TYPE, is("File")), field("Unresolved", Op::Any)]),
            part("_", vec![field(KEY_TYPE, is("File"))]),
        )],
    )
}

pub fn normalize() -> Mappings {
    let import_pos = &[("EndPos", "end_pos")];
    let import = |name: Op| {
        vec![
            field("Doc", null()),
            field("Name", name),
            field("Path", custom(ImportPath { var: "path" })),
            field("Comment", null()),
        ]
    };
    let dot_ident = |text: &str| typed("Ident", vec![field(KEY_POS, Op::Any), field("Name", is(text))]);
    let function_alias = typed(
        ALIAS,
        vec![
            field("Name", var("name")),
            field(
                "Node",
                typed(
                    FUNCTION,
                    vec![
                        field(
                            "Type",
                            custom(MergeReceiver {
                                recv: "recv",
                                typ: "type",
                            }),
                        ),
                        field("Body", var("body")),
                    ],
                ),
            ),
        ],
    );

    Mappings::new(
        "normalize",
        vec![
            map_uast(
                "Ident",
                IDENTIFIER,
                &[("NamePos", KEY_START)],
                vec![field("Name", var("name"))],
                vec![field("Name", var("name"))],
            ),
            map_uast(
                "BasicLit",
                STRING,
                &[("ValuePos", KEY_START)],
                vec![
                    field("Kind", is("STRING")),
                    field(
                        "Value",
                        custom(Quoted {
                            value: "value",
                            format: "format",
                        }),
                    ),
                ],
                vec![
                    field("Value", var("value")),
                    field("Format", var("format")),
                ],
            ),
            map_uast(
                "Comment",
                COMMENT,
                &[("Slash", KEY_START)],
                vec![field("Text", custom(CommentText))],
                vec![
                    field("Text", var("text")),
                    field("Block", var("block")),
                    field("Prefix", var("prefix")),
                    field("Suffix", var("suffix")),
                    field("Padded", var("padded")),
                ],
            ),
            map_uast(
                "BlockStmt",
                BLOCK,
                &[("Lbrace", KEY_START), ("Rbrace", "rbrace")],
                vec![field("List", var("stmts"))],
                vec![field("Statements", var("stmts"))],
            ),
            // The four import forms; reverse tries them bottom to top.
            map_uast(
                "ImportSpec",
                IMPORT,
                import_pos,
                import(dot_ident("_")),
                vec![
                    field("Path", var("path")),
                    field("All", is(false)),
                    field("Names", null()),
                    field("Target", null()),
                ],
            )
            .named("ImportSpec -> uast:Import (side effects)"),
            map_uast(
                "ImportSpec",
                IMPORT,
                import_pos,
                import(dot_ident(".")),
                vec![
                    field("Path", var("path")),
                    field("All", is(true)),
                    field("Names", null()),
                    field("Target", is(".")),
                ],
            )
            .named("ImportSpec -> uast:Import (into scope)"),
            map_uast(
                "ImportSpec",
                IMPORT,
                import_pos,
                import(null()),
                vec![
                    field("Path", var("path")),
                    field("All", is(true)),
                    field("Names", null()),
                    field("Target", null()),
                ],
            )
            .named("ImportSpec -> uast:Import (all)"),
            map_uast(
                "ImportSpec",
                IMPORT,
                import_pos,
                import(var("alias")),
                vec![
                    field(
                        "Path",
                        typed(
                            ALIAS,
                            vec![field("Name", var("alias")), field("Node", var("path"))],
                        ),
                    ),
                    field("All", is(true)),
                    field("Names", null()),
                    field("Target", null()),
                ],
            )
            .named("ImportSpec -> uast:Import (alias)"),
            map_uast(
                "FuncDecl",
                FUNCTION_GROUP,
                &[],
                vec![
                    field("Doc", opt("has_doc", var("doc"))),
                    field("Recv", var("recv")),
                    field("Name", var("name")),
                    field("Type", var("type")),
                    field("Body", var("body")),
                ],
                vec![field(
                    "Nodes",
                    cases(
                        "has_doc",
                        vec![
                            arr(vec![function_alias.clone()]),
                            arr(vec![var("doc"), function_alias]),
                        ],
                    ),
                )],
            ),
            map_uast(
                "FuncType",
                FUNCTION_TYPE,
                &[("Func", "func")],
                vec![
                    field("Params", field_list(SplitFields { var: "args" })),
                    field(
                        "Results",
                        opt("has_results", field_list(SplitFields { var: "returns" })),
                    ),
                ],
                vec![
                    field("Arguments", var("args")),
                    field("Returns", cases("has_results", vec![null(), var("returns")])),
                ],
            ),
            map_uast(
                "Field",
                ARGUMENT,
                &[],
                vec![
                    field("Doc", null()),
                    field("Names", cases("named", vec![null(), arr(vec![var("name")])])),
                    field(
                        "Type",
                        cases(
                            "variadic",
                            vec![
                                typed(
                                    "Ellipsis",
                                    vec![field(KEY_POS, Op::Any), field("Elt", var("type"))],
                                ),
                                var("type"),
                            ],
                        ),
                    ),
                    field("Tag", null()),
                    field("Comment", null()),
                    optional(RECEIVER, opt("receiver", is(true))),
                ],
                vec![
                    field("Name", cases("named", vec![null(), var("name")])),
                    field("Type", var("type")),
                    field("Variadic", cases("variadic", vec![is(true), is(false)])),
                    optional(RECEIVER, opt("receiver", is(true))),
                ],
            ),
            Mapping::new(
                "GenDecl split specs",
                part(
                    "decl",
                    vec![
                        field(KEY_TYPE, is("GenDecl")),
                        field("Specs", custom(SplitSpecs { var: "specs" })),
                    ],
                ),
                part(
                    "decl",
                    vec![field(KEY_TYPE, is("GenDecl")), field("Specs", var("specs"))],
                ),
            ),
        ],
    )
}

/// Marks the argument that came from a method receiver.
const RECEIVER: &str = "Receiver";

/// A mapping from a native type to a `uast:` type that carries positions across.
///
/// `pos` maps the native node's named positions to variables. Positions mapped to `start` or
/// `end` are derived again on the way back; the others are kept on the normalized node's `@pos`
/// under the variable name.
pub fn map_uast(
    native: &str,
    uast: &str,
    pos: &[(&str, &str)],
    src: Vec<FieldOp>,
    dst: Vec<FieldOp>,
) -> Mapping {
    let mut src_pos = vec![
        field(KEY_START, var(KEY_START)),
        field(KEY_END, var(KEY_END)),
    ];
    let mut dst_pos = src_pos.clone();
    for (name, v) in pos {
        src_pos.push(field(name, var(v)));
        if *v != KEY_START && *v != KEY_END {
            dst_pos.push(field(v, var(v)));
        }
    }

    let mut src_fields = vec![field(KEY_POS, opt("has_pos", typed(TYPE_POSITIONS, src_pos)))];
    src_fields.extend(src);
    let mut dst_fields = vec![field(KEY_POS, opt("has_pos", typed(TYPE_POSITIONS, dst_pos)))];
    dst_fields.extend(dst);

    Mapping::new(
        format!("{native} -> {uast}"),
        typed(native, src_fields),
        typed(uast, dst_fields),
    )
}

impl Mapping {
    fn named(self, name: &str) -> Self {
        Mapping {
            name: name.to_string(),
            ..self
        }
    }
}

fn field_list(list: impl CustomOp + 'static) -> Op {
    typed(
        "FieldList",
        vec![field(KEY_POS, Op::Any), field("List", custom(list))],
    )
}

// ============================================================================
// STRING LITERALS
// ============================================================================

/// Unquotes a Go string literal into its value and format (`""` or `"raw"`).
pub fn unquote(lit: &str) -> Option<(String, &'static str)> {
    if lit.len() >= 2 && lit.starts_with('`') && lit.ends_with('`') {
        let inner = &lit[1..lit.len() - 1];
        return (!inner.contains('`')).then(|| (inner.to_string(), "raw"));
    }
    if lit.len() < 2 || !lit.starts_with('"') || !lit.ends_with('"') {
        return None;
    }
    let inner = &lit[1..lit.len() - 1];
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let simple = match chars.next()? {
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0c,
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            'v' => 0x0b,
            '\\' => b'\\',
            '"' => b'"',
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(u8::from_str_radix(&hex, 16).ok()?);
                continue;
            }
            d @ '0'..='7' => {
                let rest: String = chars.by_ref().take(2).collect();
                let octal = format!("{d}{rest}");
                out.push(u8::from_str_radix(&octal, 8).ok()?);
                continue;
            }
            e @ ('u' | 'U') => {
                let len = if e == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(len).collect();
                let c = char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?;
                let mut buf = [0; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            _ => return None,
        };
        out.push(simple);
    }
    String::from_utf8(out).ok().map(|s| (s, ""))
}

/// Quotes a value as a Go string literal in the given format.
pub fn quote(value: &str, format: &str) -> String {
    if format == "raw" {
        return format!("`{value}`");
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c < ' ' || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A Go string literal as value plus format.
#[derive(Debug)]
pub struct Quoted {
    pub value: &'static str,
    pub format: &'static str,
}

impl CustomOp for Quoted {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        let Some(lit) = node.as_str() else {
            return Ok(false);
        };
        let Some((value, format)) = unquote(lit) else {
            return Ok(false);
        };
        if quote(&value, format) != lit {
            return Ok(false);
        }
        Ok(st.bind(self.value, Node::from(value)) && st.bind(self.format, Node::from(format)))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let value = string_var(st, self.value)?;
        let format = string_var(st, self.format)?;
        Ok(Node::from(quote(value, format)))
    }
}

fn string_var<'a>(st: &'a State, name: &str) -> Result<&'a str, DriverError> {
    let node = st.get(name)?;
    node.as_str().ok_or_else(|| unexpected("a string", node))
}

// ============================================================================
// COMMENTS
// ============================================================================

/// The parts of a comment's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentParts {
    pub text: String,
    pub block: bool,
    pub prefix: String,
    pub suffix: String,
    /// One conventional space follows the opening delimiter (and, for block comments, precedes
    /// the closing one). The padding is not part of `prefix`/`suffix`.
    pub padded: bool,
}

impl CommentParts {
    pub fn split(comment: &str) -> Option<Self> {
        let (block, body) = if let Some(body) = comment.strip_prefix("//") {
            (false, body)
        } else {
            let body = comment.strip_prefix("/*")?.strip_suffix("*/")?;
            (true, body)
        };
        let lead = body.len() - body.trim_start().len();
        let (prefix, rest) = body.split_at(lead);
        let text = rest.trim_end();
        let suffix = &rest[text.len()..];

        let padded = prefix.starts_with(' ') && (!block || suffix.ends_with(' '));
        let (prefix, suffix) = match (padded, block) {
            (true, true) => (&prefix[1..], &suffix[..suffix.len() - 1]),
            (true, false) => (&prefix[1..], suffix),
            (false, _) => (prefix, suffix),
        };
        Some(CommentParts {
            text: text.to_string(),
            block,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            padded,
        })
    }

    pub fn join(&self) -> String {
        let pad = if self.padded { " " } else { "" };
        if self.block {
            format!("/*{pad}{}{}{}{pad}*/", self.prefix, self.text, self.suffix)
        } else {
            format!("//{pad}{}{}{}", self.prefix, self.text, self.suffix)
        }
    }
}

/// Comment text to `text`, `block`, `prefix`, `suffix` and `padded`.
#[derive(Debug)]
pub struct CommentText;

impl CustomOp for CommentText {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        let Some(comment) = node.as_str() else {
            return Ok(false);
        };
        let Some(parts) = CommentParts::split(comment) else {
            return Ok(false);
        };
        if parts.join() != comment {
            return Ok(false);
        }
        Ok(st.bind("text", Node::from(parts.text))
            && st.bind("block", Node::from(parts.block))
            && st.bind("prefix", Node::from(parts.prefix))
            && st.bind("suffix", Node::from(parts.suffix))
            && st.bind("padded", Node::from(parts.padded)))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let flag = |name: &str| -> Result<bool, DriverError> {
            let node = st.get(name)?;
            node.as_bool().ok_or_else(|| unexpected("a boolean", node))
        };
        let parts = CommentParts {
            text: string_var(st, "text")?.to_string(),
            block: flag("block")?,
            prefix: string_var(st, "prefix")?.to_string(),
            suffix: string_var(st, "suffix")?.to_string(),
            padded: flag("padded")?,
        };
        Ok(Node::from(parts.join()))
    }
}

// ============================================================================
// IMPORT PATHS
// ============================================================================

/// An import path literal as a `uast:Identifier` (one segment) or a `uast:QualifiedIdentifier`
/// (several). Each segment gets its own position inside the literal.
#[derive(Debug)]
pub struct ImportPath {
    pub var: &'static str,
}

fn identifier(name: &str, offset: Option<usize>) -> Node {
    let mut node = Node::typed(IDENTIFIER);
    let (start, end) = match offset {
        Some(off) => (Pos::from_offset(off), Pos::from_offset(off + name.len())),
        None => (Pos::NONE, Pos::NONE),
    };
    node.set(KEY_POS, positions(start, end, &[]));
    node.set("Name", Node::from(name));
    node
}

/// Splits an import path at `/` and `.` into identifiers, positioned from the literal's opening
/// quote. A qualified path records its delimiters in `Separators`.
pub fn split_import_path(path: &str, lit_offset: Option<usize>) -> Option<Node> {
    let segments: Vec<&str> = path.split(['/', '.']).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    let separators: Vec<Node> = path
        .chars()
        .filter(|c| matches!(c, '/' | '.'))
        .map(|c| Node::from(c.to_string()))
        .collect();
    let mut offset = lit_offset.map(|off| off + 1);
    let mut idents = Vec::with_capacity(segments.len());
    for segment in &segments {
        idents.push(identifier(segment, offset));
        offset = offset.map(|off| off + segment.len() + 1);
    }
    if idents.len() == 1 {
        return idents.pop();
    }
    let first = idents.first().and_then(|n| n.get(KEY_POS)).and_then(|p| p.get(KEY_START));
    let last = idents.last().and_then(|n| n.get(KEY_POS)).and_then(|p| p.get(KEY_END));
    let mut pos = Node::typed(TYPE_POSITIONS);
    pos.set(KEY_START, first.cloned().unwrap_or_default());
    pos.set(KEY_END, last.cloned().unwrap_or_default());

    let mut node = Node::typed(QUALIFIED_IDENTIFIER);
    node.set(KEY_POS, pos);
    node.set("Names", Node::Array(idents));
    node.set("Separators", Node::Array(separators));
    Some(node)
}

/// Rejoins path segments. Missing separators default to `/`.
fn join_import_path(names: &[&str], separators: Option<&[Node]>) -> Result<String, DriverError> {
    let mut path = String::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            let sep = match separators.and_then(|seps| seps.get(i - 1)) {
                None => "/",
                Some(sep) => match sep.as_str() {
                    Some(text @ ("/" | ".")) => text,
                    _ => return Err(unexpected("an import path separator", sep)),
                },
            };
            path.push_str(sep);
        }
        path.push_str(name);
    }
    Ok(path)
}

impl CustomOp for ImportPath {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        if node.type_name() != Some("BasicLit") || node.get("Kind") != Some(&Node::from("STRING")) {
            return Ok(false);
        }
        let Some(lit) = node.get("Value").and_then(Node::as_str) else {
            return Ok(false);
        };
        let Some((path, "")) = unquote(lit) else {
            return Ok(false);
        };
        if quote(&path, "") != lit {
            return Ok(false);
        }
        let Some(mut ident) = split_import_path(&path, start_offset(node)) else {
            return Ok(false);
        };
        if let (Some(roles), Some(obj)) = (node.get(KEY_ROLE), ident.as_object_mut()) {
            obj.insert(KEY_ROLE.to_string(), roles.clone());
        }
        Ok(st.bind(self.var, ident))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let node = st.get(self.var)?;
        let idents: Vec<&Node> = match node.type_name() {
            Some(IDENTIFIER) => vec![node],
            Some(QUALIFIED_IDENTIFIER) => node
                .get("Names")
                .and_then(Node::as_array)
                .map(|names| names.iter().collect())
                .unwrap_or_default(),
            _ => return Err(unexpected("an import path identifier", node)),
        };
        let names = idents
            .iter()
            .map(|ident| {
                ident
                    .get("Name")
                    .and_then(Node::as_str)
                    .ok_or_else(|| unexpected("an identifier name", ident))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let separators = node.get("Separators").and_then(Node::as_array);
        let value = quote(&join_import_path(&names, separators)?, "");
        let value_pos = idents
            .first()
            .and_then(|ident| start_offset(ident))
            .and_then(|off| off.checked_sub(1))
            .map_or(Pos::NONE, Pos::from_offset);

        let mut lit = Node::typed("BasicLit");
        lit.set(
            KEY_POS,
            positions(value_pos, value_pos.add(value.len()), &[("ValuePos", value_pos)]),
        );
        lit.set("Kind", Node::from("STRING"));
        lit.set("Value", Node::from(value));
        if let (Some(roles), Some(obj)) = (node.get(KEY_ROLE), lit.as_object_mut()) {
            obj.insert(KEY_ROLE.to_string(), roles.clone());
        }
        Ok(lit)
    }
}

// ============================================================================
// RECEIVERS
// ============================================================================

/// A function type with the method receiver merged in front of its parameters.
///
/// Forward it builds the merged native `FuncType` from the `recv` and `typ` variables; reverse it
/// takes a flagged leading argument back out.
#[derive(Debug)]
pub struct MergeReceiver {
    pub recv: &'static str,
    pub typ: &'static str,
}

/// The parameter array of a native or normalized function type.
fn params_mut(typ: &mut Node) -> Option<&mut Node> {
    let normalized = typ.type_name() == Some(FUNCTION_TYPE);
    let native = typ.type_name() == Some("FuncType");
    let obj = typ.as_object_mut()?;
    if normalized {
        obj.get_mut("Arguments")
    } else if native {
        obj.get_mut("Params")?.as_object_mut()?.get_mut("List")
    } else {
        None
    }
}

impl CustomOp for MergeReceiver {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        let mut typ = node.clone();
        let mut recv = Node::Null;
        if let Some(params) = params_mut(&mut typ) {
            let flagged = params
                .as_array()
                .and_then(<[Node]>::first)
                .map_or(false, |first| first.get(RECEIVER) == Some(&Node::Bool(true)));
            let mut emptied = false;
            if let (true, Node::Array(items)) = (flagged, &mut *params) {
                let mut receiver = items.remove(0);
                if let Some(obj) = receiver.as_object_mut() {
                    obj.remove(RECEIVER);
                }
                emptied = items.is_empty();
                let mut list = Node::typed("FieldList");
                list.set(KEY_POS, Node::Null);
                list.set("List", Node::Array(vec![receiver]));
                recv = list;
            }
            if emptied {
                *params = Node::Null;
            }
        }
        Ok(st.bind(self.recv, recv) && st.bind(self.typ, typ))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let recv = st.get(self.recv)?;
        let mut typ = st.get(self.typ)?.clone();
        if recv.is_null() {
            return Ok(typ);
        }
        let mut receivers: Vec<Node> = recv
            .get("List")
            .and_then(Node::as_array)
            .ok_or_else(|| unexpected("a receiver field list", recv))?
            .to_vec();
        for receiver in &mut receivers {
            receiver.set(RECEIVER, Node::Bool(true));
        }
        let params = params_mut(&mut typ).ok_or_else(|| unexpected("a function type", recv))?;
        match params {
            Node::Array(items) => {
                receivers.append(items);
                *items = receivers;
            }
            Node::Null => *params = Node::Array(receivers),
            other => return Err(unexpected("a parameter list", other)),
        }
        Ok(typ)
    }
}

// ============================================================================
// SPLITTING
// ============================================================================

/// Whether two split parts came from the same declaration.
fn same_origin(a: &Object, b: &Object) -> bool {
    let pos = a.get(KEY_POS);
    let valid = pos.map_or(false, |p| p.get(KEY_START).map_or(false, |s| !s.is_null()));
    valid && pos == b.get(KEY_POS) && a.get("Type") == b.get("Type")
}

fn names_of(obj: &Object) -> Vec<Node> {
    obj.get("Names")
        .and_then(Node::as_array)
        .map(<[Node]>::to_vec)
        .unwrap_or_default()
}

/// Parameter and result fields split one per name.
///
/// Reverse, adjacent parts with the same valid position and type are joined back into one native
/// `Field`, whether they are still native fields or already normalized arguments.
#[derive(Debug)]
pub struct SplitFields {
    pub var: &'static str,
}

impl CustomOp for SplitFields {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        let items = match node {
            Node::Null => return Ok(st.bind(self.var, Node::Null)),
            Node::Array(items) => items,
            _ => return Ok(false),
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let names = match item.as_object() {
                Some(obj) if item.type_name() == Some("Field") => names_of(obj),
                _ => Vec::new(),
            };
            if names.len() < 2 {
                out.push(item.clone());
                continue;
            }
            for name in names {
                let mut part = item.clone();
                part.set("Names", Node::Array(vec![name]));
                out.push(part);
            }
        }
        Ok(st.bind(self.var, Node::Array(out)))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let items = match st.get(self.var)? {
            Node::Null => return Ok(Node::Null),
            Node::Array(items) => items,
            other => return Err(unexpected("a parameter list", other)),
        };
        let mut out: Vec<Node> = Vec::with_capacity(items.len());
        for item in items {
            match (out.last().and_then(|last| join_fields(last, item)), out.last_mut()) {
                (Some(joined), Some(last)) => *last = joined,
                _ => out.push(item.clone()),
            }
        }
        Ok(Node::Array(out))
    }
}

/// Joins a field or argument into the previous one if both came from one declaration.
fn join_fields(last: &Node, item: &Node) -> Option<Node> {
    let (a, b) = (last.as_object()?, item.as_object()?);
    if !same_origin(a, b) {
        return None;
    }
    let single = |obj: &Object| -> Option<Vec<Node>> {
        match obj.get(KEY_TYPE).and_then(Node::as_str)? {
            "Field" => {
                let names = names_of(obj);
                let plain = ["Doc", "Tag", "Comment"]
                    .iter()
                    .all(|k| obj.get(*k).map_or(true, Node::is_null));
                (!names.is_empty() && plain && obj.get(RECEIVER).is_none()).then_some(names)
            }
            ARGUMENT => {
                let name = obj.get("Name").filter(|n| !n.is_null())?;
                let plain = obj.get("Variadic") == Some(&Node::Bool(false))
                    && obj.get(RECEIVER).is_none();
                plain.then(|| vec![name.clone()])
            }
            _ => None,
        }
    };
    let mut names = single(a)?;
    names.extend(single(b)?);

    let mut field = Node::typed("Field");
    field.set(KEY_POS, a.get(KEY_POS).cloned().unwrap_or_default());
    field.set("Doc", Node::Null);
    field.set("Names", Node::Array(names));
    field.set("Type", a.get("Type").cloned().unwrap_or_default());
    field.set("Tag", Node::Null);
    field.set("Comment", Node::Null);
    if let (Some(roles), Some(obj)) = (a.get(KEY_ROLE), field.as_object_mut()) {
        obj.insert(KEY_ROLE.to_string(), roles.clone());
    }
    Some(field)
}

/// `var`/`const` specs with several names split one per name.
///
/// A spec is split only when it has no values or one value per name. The first part keeps the
/// doc comment and the last keeps the line comment.
#[derive(Debug)]
pub struct SplitSpecs {
    pub var: &'static str,
}

impl CustomOp for SplitSpecs {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool, DriverError> {
        let items = match node {
            Node::Null => return Ok(st.bind(self.var, Node::Null)),
            Node::Array(items) => items,
            _ => return Ok(false),
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Some(obj) = item.as_object().filter(|_| item.type_name() == Some("ValueSpec")) else {
                out.push(item.clone());
                continue;
            };
            let names = names_of(obj);
            let values = obj.get("Values").and_then(Node::as_array).unwrap_or(&[]);
            if names.len() < 2 || !(values.is_empty() || values.len() == names.len()) {
                out.push(item.clone());
                continue;
            }
            let last = names.len() - 1;
            for (i, name) in names.into_iter().enumerate() {
                let mut part = item.clone();
                part.set("Names", Node::Array(vec![name]));
                if !values.is_empty() {
                    part.set("Values", Node::Array(vec![values[i].clone()]));
                }
                if i > 0 {
                    part.set("Doc", Node::Null);
                }
                if i < last {
                    part.set("Comment", Node::Null);
                }
                out.push(part);
            }
        }
        Ok(st.bind(self.var, Node::Array(out)))
    }

    fn construct(&self, st: &State) -> Result<Node, DriverError> {
        let items = match st.get(self.var)? {
            Node::Null => return Ok(Node::Null),
            Node::Array(items) => items,
            other => return Err(unexpected("a spec list", other)),
        };
        let mut out: Vec<Node> = Vec::with_capacity(items.len());
        for item in items {
            let joined = match out.last_mut() {
                Some(last) => join_specs(last, item),
                None => false,
            };
            if !joined {
                out.push(item.clone());
            }
        }
        Ok(Node::Array(out))
    }
}

/// Merges `item` into `last` when both are parts of one split spec.
fn join_specs(last: &mut Node, item: &Node) -> bool {
    let (Some(a), Some(b)) = (last.as_object(), item.as_object()) else {
        return false;
    };
    let is_spec = |o: &Object| o.get(KEY_TYPE).and_then(Node::as_str) == Some("ValueSpec");
    let has_values = |o: &Object| o.get("Values").map_or(false, |v| !v.is_null());
    let joinable = is_spec(a)
        && is_spec(b)
        && same_origin(a, b)
        && has_values(a) == has_values(b)
        && a.get("Comment").map_or(true, Node::is_null)
        && b.get("Doc").map_or(true, Node::is_null);
    if !joinable {
        return false;
    }

    let mut names = names_of(a);
    names.extend(names_of(b));
    let values = has_values(a).then(|| {
        let mut values: Vec<Node> = a.get("Values").and_then(Node::as_array).map(<[Node]>::to_vec).unwrap_or_default();
        values.extend(b.get("Values").and_then(Node::as_array).map(<[Node]>::to_vec).unwrap_or_default());
        Node::Array(values)
    });
    let comment = b.get("Comment").cloned().unwrap_or_default();

    last.set("Names", Node::Array(names));
    last.set("Values", values.unwrap_or_default());
    last.set("Comment", comment);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Direction;
    use crate::uast::Position;

    #[test]
    fn test_comment_parts() {
        let line = CommentParts::split("// hello ").expect("line comment");
        assert_eq!(
            (line.text.as_str(), line.block, line.prefix.as_str(), line.suffix.as_str()),
            ("hello", false, "", " ")
        );
        assert_eq!(line.join(), "// hello ");

        let block = CommentParts::split("/* hi */").expect("block comment");
        assert_eq!(
            (block.text.as_str(), block.block, block.prefix.as_str(), block.suffix.as_str()),
            ("hi", true, "", "")
        );
        assert_eq!(block.join(), "/* hi */");

        let tight = CommentParts::split("//x").expect("line comment");
        assert!(!tight.padded);
        assert_eq!(tight.join(), "//x");
        assert!(CommentParts::split("/* open").is_none());
    }

    #[test]
    fn test_quote_round_trip() {
        assert_eq!(unquote(r#""fmt""#), Some(("fmt".to_string(), "")));
        assert_eq!(unquote(r#""a\tb\"c""#), Some(("a\tb\"c".to_string(), "")));
        assert_eq!(unquote("`raw\\n`"), Some(("raw\\n".to_string(), "raw")));
        assert_eq!(unquote(r#""\x41\101é""#), Some(("AAé".to_string(), "")));
        assert_eq!(quote("a\tb\"c", ""), r#""a\tb\"c""#);
        assert_eq!(quote("x", "raw"), "`x`");
        assert!(unquote("'c'").is_none());
    }

    #[test]
    fn test_import_path_segments() {
        let path = split_import_path("a/b/c", Some(7)).expect("splits");
        assert_eq!(path.type_name(), Some(QUALIFIED_IDENTIFIER));
        let names = path.get("Names").and_then(Node::as_array).expect("names");
        let offsets: Vec<(usize, usize)> = names
            .iter()
            .map(|n| {
                let pos = n.get(KEY_POS).expect("pos");
                let start = Position::from_node(pos.get(KEY_START).expect("start")).expect("valid");
                let end = Position::from_node(pos.get(KEY_END).expect("end")).expect("valid");
                (start.offset, end.offset)
            })
            .collect();
        assert_eq!(offsets, [(8, 9), (10, 11), (12, 13)]);

        let single = split_import_path("fmt", Some(7)).expect("splits");
        assert_eq!(single.type_name(), Some(IDENTIFIER));
        assert!(split_import_path("a//b", None).is_none());
        assert!(split_import_path("a./b", None).is_none());
    }

    #[test]
    fn test_dotted_import_path_segments() {
        let path = split_import_path("gopkg.in/yaml.v2", Some(0)).expect("splits");
        let names = path.get("Names").and_then(Node::as_array).expect("names");
        let parts: Vec<(&str, usize, usize)> = names
            .iter()
            .map(|n| {
                let pos = n.get(KEY_POS).expect("pos");
                let start = Position::from_node(pos.get(KEY_START).expect("start")).expect("valid");
                let end = Position::from_node(pos.get(KEY_END).expect("end")).expect("valid");
                (n.get("Name").and_then(Node::as_str).expect("name"), start.offset, end.offset)
            })
            .collect();
        assert_eq!(
            parts,
            [("gopkg", 1, 6), ("in", 7, 9), ("yaml", 10, 14), ("v2", 15, 17)]
        );
        let separators = path.get("Separators").and_then(Node::as_array).expect("separators");
        assert_eq!(separators, [Node::from("."), Node::from("/"), Node::from(".")]);
    }

    #[test]
    fn test_dotted_import_path_reverse_restores_literal() {
        let mut lit = Node::typed("BasicLit");
        lit.set(
            KEY_POS,
            positions(
                Pos::from_offset(7),
                Pos::from_offset(25),
                &[("ValuePos", Pos::from_offset(7))],
            ),
        );
        lit.set("Kind", Node::from("STRING"));
        lit.set("Value", Node::from("\"gopkg.in/yaml.v2\""));
        let op = ImportPath { var: "path" };
        let mut st = State::new();
        assert!(op.check(&mut st, &lit).expect("checks"));
        let back = op.construct(&st).expect("constructs");
        assert_eq!(back, lit);
    }

    #[test]
    fn test_import_path_reverse_restores_literal() {
        let mut lit = Node::typed("BasicLit");
        lit.set(
            KEY_POS,
            positions(
                Pos::from_offset(7),
                Pos::from_offset(20),
                &[("ValuePos", Pos::from_offset(7))],
            ),
        );
        lit.set("Kind", Node::from("STRING"));
        lit.set("Value", Node::from("\"net/http\""));
        let op = ImportPath { var: "path" };
        let mut st = State::new();
        assert!(op.check(&mut st, &lit).expect("checks"));
        let mut back = op.construct(&st).expect("constructs");
        back.set(KEY_POS, lit.get(KEY_POS).cloned().unwrap_or_default());
        assert_eq!(back, lit);
    }

    #[test]
    fn test_preprocess_drops_unresolved() {
        let mut file = Node::typed("File");
        file.set("Unresolved", Node::Array(vec![Node::typed("Ident")]));
        let out = preprocess().apply(file, Direction::Forward).expect("forward");
        assert!(out.get("Unresolved").is_none());
        let back = preprocess().apply(out, Direction::Reverse).expect("reverse");
        assert_eq!(back.get("Unresolved"), Some(&Node::Null));
    }
}
