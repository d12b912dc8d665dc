//! # go-driver Test Helpers
//!
//! Fixture loading and small tree queries shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use go_driver::driver::{Driver, DriverOptions, Mode, Status};
use go_driver::uast::{Node, Position, KEY_END, KEY_POS, KEY_START};
use walkdir::WalkDir;

pub const MODES: [Mode; 3] = [Mode::Native, Mode::Annotated, Mode::Semantic];

pub fn driver(mode: Mode) -> Driver {
    Driver::new(DriverOptions {
        mode,
        language_version: None,
    })
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Every `.go` fixture as `(file name, source)`, sorted by name.
pub fn fixtures() -> Vec<(String, String)> {
    WalkDir::new(fixtures_dir())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().map_or(false, |x| x == "go"))
        .map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let source = std::fs::read_to_string(e.path()).expect("fixture is readable");
            (name, source)
        })
        .collect()
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name)).expect("fixture is readable")
}

/// Parses and insists on a clean `ok` outcome.
pub fn parse_ok(source: &str, mode: Mode) -> Node {
    let outcome = driver(mode).parse(source, mode);
    assert_eq!(outcome.status, Status::Ok, "errors: {:?}", outcome.errors);
    outcome.ast.expect("ok outcome carries a tree")
}

/// Every object in the tree with the given type tag, in walk order.
pub fn find_all<'a>(root: &'a Node, type_name: &str) -> Vec<&'a Node> {
    let mut found = Vec::new();
    root.walk(&mut |node| {
        if node.type_name() == Some(type_name) {
            found.push(node);
        }
    });
    found
}

pub fn find_first<'a>(root: &'a Node, type_name: &str) -> &'a Node {
    find_all(root, type_name)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no {type_name} in tree"))
}

/// Follows a path of field names and array indices, e.g. `["Decls", "0", "Specs"]`.
pub fn at<'a>(root: &'a Node, path: &[&str]) -> &'a Node {
    path.iter().fold(root, |node, step| {
        let next = match step.parse::<usize>() {
            Ok(i) => node.as_array().and_then(|items| items.get(i)),
            Err(_) => node.get(step),
        };
        next.unwrap_or_else(|| panic!("no {step:?} in {node:?}"))
    })
}

pub fn position(node: &Node, which: &str) -> Position {
    node.get(KEY_POS)
        .and_then(|p| p.get(which))
        .and_then(Position::from_node)
        .unwrap_or_else(|| panic!("no valid {which} position on {node:?}"))
}

pub fn span(node: &Node) -> (usize, usize) {
    (position(node, KEY_START).offset, position(node, KEY_END).offset)
}

pub fn name_of(node: &Node) -> &str {
    node.get("Name")
        .and_then(Node::as_str)
        .unwrap_or_else(|| panic!("no name on {node:?}"))
}
