// The semantic-mode shapes produced by the normalization stages.

mod common;

use common::*;
use go_driver::driver::Mode;
use go_driver::uast::Node;

fn normalized(source: &str) -> Node {
    parse_ok(source, Mode::Semantic)
}

// ============================================================================
// IMPORTS
// ============================================================================

#[test]
fn test_qualified_import_path_is_an_identifier_chain() {
    let ast = normalized("package p\n\nimport \"a/b/c\"\n");
    let import = at(&ast, &["Decls", "0", "Specs", "0"]);
    assert_eq!(import.type_name(), Some("uast:Import"));
    assert_eq!(import.get("All"), Some(&Node::Bool(true)));

    let path = at(import, &["Path"]);
    assert_eq!(path.type_name(), Some("uast:QualifiedIdentifier"));
    let names = at(path, &["Names"]).as_array().expect("names");
    let parts: Vec<(&str, (usize, usize))> = names.iter().map(|n| (name_of(n), span(n))).collect();
    assert_eq!(parts, vec![("a", (19, 20)), ("b", (21, 22)), ("c", (23, 24))]);
    for pair in names.windows(2) {
        assert!(span(&pair[0]).1 < span(&pair[1]).0);
    }
}

#[test]
fn test_dotted_import_path_splits_at_every_delimiter() {
    let source = "package p\n\nimport \"gopkg.in/yaml.v2\"\n";
    let ast = normalized(source);
    let path = at(&ast, &["Decls", "0", "Specs", "0", "Path"]);
    let names = at(path, &["Names"]).as_array().expect("names");
    let parts: Vec<(&str, (usize, usize))> = names.iter().map(|n| (name_of(n), span(n))).collect();
    assert_eq!(
        parts,
        vec![("gopkg", (19, 24)), ("in", (25, 27)), ("yaml", (28, 32)), ("v2", (33, 35))]
    );
    for pair in names.windows(2) {
        assert!(span(&pair[0]).1 < span(&pair[1]).0);
    }

    let (expected, actual) = driver(Mode::Semantic)
        .roundtrip("yaml.go", source)
        .expect("round trips");
    assert_eq!(expected, actual);
    assert!(actual.contains("\"gopkg.in/yaml.v2\""));
}

#[test]
fn test_single_segment_import_is_a_plain_identifier() {
    let ast = normalized("package p\n\nimport \"a\"\n");
    let path = at(&ast, &["Decls", "0", "Specs", "0", "Path"]);
    assert_eq!(path.type_name(), Some("uast:Identifier"));
    assert_eq!(name_of(path), "a");
}

#[test]
fn test_import_forms() {
    let ast = normalized(&fixture("declarations.go"));
    let specs = at(&ast, &["Decls", "0", "Specs"]).as_array().expect("specs");
    assert_eq!(specs.len(), 4);
    assert!(specs.iter().all(|s| s.type_name() == Some("uast:Import")));

    // _ "embed"
    assert_eq!(specs[0].get("All"), Some(&Node::Bool(false)));
    assert_eq!(specs[0].get("Target"), Some(&Node::Null));
    // . "math"
    assert_eq!(specs[1].get("All"), Some(&Node::Bool(true)));
    assert_eq!(specs[1].get("Target"), Some(&Node::from(".")));
    // "net/http"
    assert_eq!(at(&specs[2], &["Path"]).type_name(), Some("uast:QualifiedIdentifier"));
    assert_eq!(specs[2].get("Target"), Some(&Node::Null));
    // str "strings"
    let alias = at(&specs[3], &["Path"]);
    assert_eq!(alias.type_name(), Some("uast:Alias"));
    assert_eq!(name_of(at(alias, &["Name"])), "str");
    assert_eq!(name_of(at(alias, &["Node"])), "strings");
}

// ============================================================================
// FUNCTIONS
// ============================================================================

fn arguments(group: &Node) -> &[Node] {
    at(group, &["Nodes"])
        .as_array()
        .and_then(|nodes| nodes.last())
        .map(|alias| at(alias, &["Node", "Type", "Arguments"]))
        .and_then(Node::as_array)
        .unwrap_or(&[])
}

#[test]
fn test_receiver_becomes_first_argument() {
    let ast = normalized("package p\n\nfunc (r *T) M(x int, y string) {}\n");
    let group = at(&ast, &["Decls", "0"]);
    assert_eq!(group.type_name(), Some("uast:FunctionGroup"));
    let alias = at(group, &["Nodes", "0"]);
    assert_eq!(alias.type_name(), Some("uast:Alias"));
    assert_eq!(name_of(at(alias, &["Name"])), "M");
    assert_eq!(at(alias, &["Node"]).type_name(), Some("uast:Function"));

    let args = arguments(group);
    assert_eq!(args.len(), 3);
    assert_eq!(args[0].get("Receiver"), Some(&Node::Bool(true)));
    assert_eq!(name_of(at(&args[0], &["Name"])), "r");
    assert_eq!(at(&args[0], &["Type"]).type_name(), Some("StarExpr"));
    let rest: Vec<&str> = args[1..].iter().map(|a| name_of(at(a, &["Name"]))).collect();
    assert_eq!(rest, ["x", "y"]);
    assert!(args[1..].iter().all(|a| a.get("Receiver").is_none()));
}

#[test]
fn test_free_function_has_no_synthetic_argument() {
    let ast = normalized("package p\n\nfunc F(x int) {}\n\nfunc G() {}\n");
    let args = arguments(at(&ast, &["Decls", "0"]));
    assert_eq!(args.len(), 1);
    assert!(args[0].get("Receiver").is_none());
    assert!(arguments(at(&ast, &["Decls", "1"])).is_empty());
}

#[test]
fn test_doc_comment_leads_the_function_group() {
    let ast = normalized(&fixture("methods.go"));
    let add = find_all(&ast, "uast:FunctionGroup")
        .into_iter()
        .find(|g| at(g, &["Nodes"]).as_array().map_or(0, <[Node]>::len) == 2)
        .expect("a documented method");
    assert_eq!(at(add, &["Nodes", "0"]).type_name(), Some("CommentGroup"));
}

#[test]
fn test_grouped_parameters_are_split() {
    let ast = normalized("package p\n\nfunc f(a, b int, rest ...string) (n int) {}\n");
    let function_type = find_first(&ast, "uast:FunctionType");
    let args = at(function_type, &["Arguments"]).as_array().expect("arguments");
    let names: Vec<&str> = args.iter().map(|a| name_of(at(a, &["Name"]))).collect();
    assert_eq!(names, ["a", "b", "rest"]);
    assert_eq!(span(&args[0]), span(&args[1]));
    assert_eq!(args[2].get("Variadic"), Some(&Node::Bool(true)));
    assert_eq!(at(&args[2], &["Type"]).type_name(), Some("uast:Identifier"));

    let returns = at(function_type, &["Returns"]).as_array().expect("returns");
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].type_name(), Some("uast:Argument"));
}

// ============================================================================
// LITERALS, BLOCKS, COMMENTS
// ============================================================================

#[test]
fn test_string_literals_are_unquoted() {
    let ast = normalized("package p\n\nvar a, b = \"x\\ty\", `raw`\n");
    let strings = find_all(&ast, "uast:String");
    let values: Vec<(&Node, &Node)> = strings
        .iter()
        .map(|s| (s.get("Value").expect("value"), s.get("Format").expect("format")))
        .collect();
    assert_eq!(
        values,
        vec![
            (&Node::from("x\ty"), &Node::from("")),
            (&Node::from("raw"), &Node::from("raw")),
        ]
    );
}

#[test]
fn test_blocks_hold_statements() {
    let ast = normalized("package p\n\nfunc f() {\n\tx := 1\n\t_ = x\n}\n");
    let block = find_first(&ast, "uast:Block");
    let statements = at(block, &["Statements"]).as_array().expect("statements");
    assert_eq!(statements.len(), 2);
    assert_eq!(span(block), (20, 38));
}

#[test]
fn test_comment_delimiters() {
    let ast = normalized("package p\n\n// hello \nvar x int\n\n/* hi */\nvar y int\n");
    let comments = find_all(&ast, "uast:Comment");
    let line = comments
        .iter()
        .find(|c| c.get("Block") == Some(&Node::Bool(false)))
        .expect("line comment");
    assert_eq!(line.get("Text"), Some(&Node::from("hello")));
    assert_eq!(line.get("Prefix"), Some(&Node::from("")));
    assert_eq!(line.get("Suffix"), Some(&Node::from(" ")));

    let block = comments
        .iter()
        .find(|c| c.get("Block") == Some(&Node::Bool(true)))
        .expect("block comment");
    assert_eq!(block.get("Text"), Some(&Node::from("hi")));
    assert_eq!(block.get("Prefix"), Some(&Node::from("")));
    assert_eq!(block.get("Suffix"), Some(&Node::from("")));
}

#[test]
fn test_comments_reconstruct_exactly() {
    let source = fixture("comments.go");
    let driver = driver(Mode::Semantic);
    let ast = normalized(&source);
    let reversed = driver.transforms().reverse(ast).expect("reverses");
    let mut texts = Vec::new();
    reversed.walk(&mut |node| {
        if node.type_name() == Some("Comment") {
            texts.push(node.get("Text").and_then(Node::as_str).expect("text").to_string());
        }
    });
    for text in ["// detached comment", "/* detached block */", "//tight comment", "// trailing"] {
        assert!(texts.iter().any(|t| t == text), "{text:?} not in {texts:?}");
    }
    assert!(texts.iter().any(|t| t == "/*\n\tmulti\n\tline\n*/"));
}

#[test]
fn test_unresolved_names_are_dropped() {
    let ast = normalized("package p\n\nvar x = y\n");
    assert!(ast.get("Unresolved").is_none());
    let native = parse_ok("package p\n\nvar x = y\n", Mode::Native);
    assert!(native.get("Unresolved").is_some());
}
