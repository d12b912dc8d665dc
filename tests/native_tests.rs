// Forward conversion of native Go trees into the generic form.

mod common;

use common::*;
use go_driver::convert::{to_file, to_generic};
use go_driver::driver::{Mode, Status};
use go_driver::reflect::TypeRegistry;
use go_driver::syntax::{parse_file, print_file};
use go_driver::uast::{Node, KEY_END, KEY_START};

#[test]
fn test_package_clause_fixture() {
    let ast = parse_ok("package main", Mode::Native);
    assert_eq!(ast.type_name(), Some("File"));

    let start = position(&ast, KEY_START);
    let end = position(&ast, KEY_END);
    assert_eq!((start.offset, start.line, start.col), (0, 1, 1));
    assert_eq!((end.offset, end.line, end.col), (12, 1, 13));

    let name = at(&ast, &["Name"]);
    assert_eq!(name.type_name(), Some("Ident"));
    assert_eq!(name_of(name), "main");
    assert_eq!(span(name), (8, 12));

    for field in ["Imports", "Comments", "Decls", "Unresolved", "Doc"] {
        assert_eq!(ast.get(field), Some(&Node::Null), "{field} should be null");
    }
}

#[test]
fn test_package_clause_fixture_normalized() {
    let ast = parse_ok("package main", Mode::Semantic);
    let name = at(&ast, &["Name"]);
    assert_eq!(name.type_name(), Some("uast:Identifier"));
    assert_eq!(name_of(name), "main");
    assert_eq!(span(name), (8, 12));
    assert!(ast.get("Unresolved").is_none());
}

#[test]
fn test_empty_sequences_become_null() {
    for (name, source) in fixtures() {
        let ast = parse_ok(&source, Mode::Native);
        ast.walk(&mut |node| {
            if let Node::Array(items) = node {
                assert!(!items.is_empty(), "{name}: empty array in generic tree");
            }
        });
    }
}

#[test]
fn test_every_emitted_type_is_registered() {
    let registry = TypeRegistry::go();
    for (name, source) in fixtures() {
        let ast = parse_ok(&source, Mode::Native);
        ast.walk(&mut |node| {
            if let Some(tag) = node.type_name() {
                if !tag.starts_with("uast:") {
                    assert!(registry.contains(tag), "{name}: {tag} is not registered");
                }
            }
        });
    }
}

#[test]
fn test_scopes_and_objects_are_not_serialized() {
    let ast = parse_ok(&fixture("methods.go"), Mode::Native);
    ast.walk(&mut |node| {
        assert!(node.get("Scope").is_none());
        assert!(node.get("Obj").is_none());
    });
}

#[test]
fn test_tokens_and_named_positions() {
    let ast = parse_ok("package p\n\nvar x = 1 + 2\n", Mode::Native);
    let decl = at(&ast, &["Decls", "0"]);
    assert_eq!(decl.get("Tok"), Some(&Node::from("var")));
    assert_eq!(decl.get("@pos").and_then(|p| p.get("Lparen")), Some(&Node::Null));

    let binary = find_first(&ast, "BinaryExpr");
    assert_eq!(binary.get("Op"), Some(&Node::from("+")));
    assert_eq!(position(binary, "OpPos").offset, 21);

    let lit = find_first(&ast, "BasicLit");
    assert_eq!(lit.get("Kind"), Some(&Node::from("INT")));
    assert_eq!(lit.get("Value"), Some(&Node::from("1")));
}

#[test]
fn test_native_round_trip_through_generic_tree() {
    let registry = TypeRegistry::go();
    for (name, source) in fixtures() {
        let parsed = parse_file(&name, &source).expect("fixture parses");
        let generic = to_generic(&parsed.file);
        let rebuilt = to_file(&generic, &registry).expect("generic tree converts back");
        assert_eq!(print_file(&rebuilt), print_file(&parsed.file), "{name}");
    }
}

#[test]
fn test_malformed_literals_and_bare_goto_are_diagnosed() {
    let cases = [
        ("var a = 0x\n", "3:", "hexadecimal literal has no digits"),
        ("var b = 1e\n", "3:", "exponent has no digits"),
        ("var c = 1.e+\n", "3:", "exponent has no digits"),
        ("var d = 08\n", "3:", "invalid digit '8' in octal literal"),
        ("func f() {\n\tgoto\n}\n", "4:", "expected label after goto"),
    ];
    for (body, line, message) in cases {
        let source = format!("package p\n\n{body}");
        let outcome = driver(Mode::Native).parse(&source, Mode::Native);
        assert_eq!(outcome.status, Status::Error, "{body:?}");
        assert!(
            outcome.errors.iter().any(|e| e.starts_with(line) && e.contains(message)),
            "{body:?}: {:?}",
            outcome.errors
        );
        assert!(outcome.ast.is_some());
    }
}

#[test]
fn test_syntax_errors_give_partial_tree() {
    let source = "package p\n\nfunc broken( {\n}\n\nvar ok = 1\n";
    let outcome = driver(Mode::Native).parse(source, Mode::Native);
    assert_eq!(outcome.status, Status::Error);
    assert!(outcome.errors[0].starts_with("3:"), "{:?}", outcome.errors);

    let ast = outcome.ast.expect("partial tree");
    assert!(!find_all(&ast, "BadDecl").is_empty());
    assert_eq!(find_all(&ast, "ValueSpec").len(), 1);
}

#[test]
fn test_missing_package_is_fatal() {
    let outcome = driver(Mode::Semantic).parse("var x = 1\n", Mode::Semantic);
    assert_eq!(outcome.status, Status::Fatal);
    assert!(outcome.ast.is_none());
    assert!(outcome.errors[0].contains("Parse failure"));
}
