// The line-delimited JSON protocol, end to end through `Driver::serve`.

mod common;

use common::*;
use go_driver::driver::protocol::{Action, Request, Response};
use go_driver::driver::{Mode, Status};
use go_driver::uast::{Node, KEY_POS};

fn exchange(mode: Mode, requests: &[String]) -> Vec<Response> {
    let input = requests.join("\n");
    let mut output = Vec::new();
    let answered = driver(mode)
        .serve(input.as_bytes(), &mut output)
        .expect("serve loop runs to EOF");
    let text = String::from_utf8(output).expect("utf-8 output");
    let responses: Vec<Response> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("one response per line"))
        .collect();
    assert_eq!(responses.len(), answered);
    responses
}

#[test]
fn test_parse_then_generate() {
    let source = fixture("hello.go");
    let parse = serde_json::to_string(&Request::parse(source.clone())).expect("encodes");
    let responses = exchange(Mode::Semantic, &[parse]);
    assert_eq!(responses[0].status, Status::Ok);
    assert!(responses[0].errors.is_empty());
    let ast = responses[0].ast.clone().expect("tree");

    let generate = serde_json::to_string(&Request::generate(ast, Mode::Semantic)).expect("encodes");
    let responses = exchange(Mode::Semantic, &[generate]);
    assert_eq!(responses[0].status, Status::Ok);
    assert_eq!(responses[0].content.as_deref(), Some(source.as_str()));
}

#[test]
fn test_request_mode_overrides_driver_mode() {
    let request = Request {
        mode: Some(Mode::Native),
        ..Request::parse("package p\n")
    };
    let line = serde_json::to_string(&request).expect("encodes");
    let responses = exchange(Mode::Semantic, &[line]);
    let ast = responses[0].ast.as_ref().expect("tree");
    assert_eq!(at(ast, &["Name"]).type_name(), Some("Ident"));
}

#[test]
fn test_syntax_errors_are_reported_with_the_tree() {
    let line = serde_json::to_string(&Request::parse("package p\n\nvar = 1\n")).expect("encodes");
    let responses = exchange(Mode::Semantic, &[line]);
    assert_eq!(responses[0].status, Status::Error);
    assert!(!responses[0].errors.is_empty());
    assert!(responses[0].ast.is_some());
}

#[test]
fn test_failures_do_not_stop_the_loop() {
    let requests = [
        "{\"action\": \"parse\", \"content\": \"not go\"}".to_string(),
        "{\"action\": \"bogus\"}".to_string(),
        "{\"action\": \"generate\", \"mode\": \"native\", \"ast\": {\"@type\": \"Nope\"}}".to_string(),
        "{\"action\": \"parse\", \"content\": \"package ok\"}".to_string(),
    ];
    let responses = exchange(Mode::Semantic, &requests);
    let statuses: Vec<Status> = responses.iter().map(|r| r.status).collect();
    assert_eq!(statuses, [Status::Fatal, Status::Fatal, Status::Fatal, Status::Ok]);
    assert!(responses[2].errors[0].contains("Nope"));
    assert!(responses.iter().all(|r| r.language == "go"));
}

#[test]
fn test_language_version_is_echoed() {
    let request = Request {
        action: Action::Parse,
        language_version: Some("1.12".to_string()),
        ..Request::parse("package p")
    };
    let line = serde_json::to_string(&request).expect("encodes");
    let responses = exchange(Mode::Semantic, &[line]);
    assert_eq!(responses[0].language_version, "1.12");
}

#[test]
fn test_out_of_range_offsets_are_fatal_not_panics() {
    let mut ast = parse_ok("package main", Mode::Native);
    let name_pos = ast
        .as_object_mut()
        .and_then(|file| file.get_mut("Name"))
        .and_then(Node::as_object_mut)
        .and_then(|name| name.get_mut(KEY_POS))
        .and_then(Node::as_object_mut)
        .and_then(|pos| pos.get_mut("NamePos"))
        .expect("NamePos");
    name_pos.set("offset", Node::Int(i64::from(u32::MAX)));

    let requests = [
        serde_json::to_string(&Request::generate(ast, Mode::Native)).expect("encodes"),
        serde_json::to_string(&Request::parse("package ok")).expect("encodes"),
    ];
    let responses = exchange(Mode::Semantic, &requests);
    assert_eq!(responses[0].status, Status::Fatal);
    assert!(responses[0].errors[0].contains("out of range"));
    assert_eq!(responses[1].status, Status::Ok);
}
