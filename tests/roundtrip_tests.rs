// Source -> generic tree -> source, in every mode.

mod common;

use common::*;
use go_driver::driver::Mode;
use go_driver::uast::Node;

fn assert_round_trip(name: &str, source: &str, mode: Mode) {
    let (expected, actual) = driver(mode)
        .roundtrip(name, source)
        .unwrap_or_else(|e| panic!("{name} ({mode:?}): {e}"));
    assert_eq!(actual, expected, "{name} ({mode:?}) changed in a round trip");
}

#[test]
fn test_fixtures_round_trip_in_every_mode() {
    let fixtures = fixtures();
    assert!(fixtures.len() >= 6, "fixtures are missing");
    for (name, source) in &fixtures {
        for mode in MODES {
            assert_round_trip(name, source, mode);
        }
    }
}

#[test]
fn test_wire_encoding_round_trips() {
    for (name, source) in fixtures() {
        let driver = driver(Mode::Semantic);
        let ast = parse_ok(&source, Mode::Semantic);
        let json = serde_json::to_string(&ast).expect("encodes");
        let decoded: Node = serde_json::from_str(&json).expect("decodes");
        assert_eq!(decoded, ast, "{name}");
        let expected = driver.generate(&ast, Mode::Semantic).expect("generates");
        let actual = driver.generate(&decoded, Mode::Semantic).expect("generates");
        assert_eq!(actual, expected, "{name}");
    }
}

#[test]
fn test_generated_source_is_canonical() {
    let source = "package p\nfunc  f(a,b int)(int){return a+b}\n";
    let ast = parse_ok(source, Mode::Semantic);
    let generated = driver(Mode::Semantic)
        .generate(&ast, Mode::Semantic)
        .expect("generates");
    assert_eq!(generated, "package p\n\nfunc f(a, b int) int {\n\treturn a + b\n}\n");
}

#[test]
fn test_split_declarations_rejoin() {
    let cases = [
        "package p\n\nvar a, b, c = 1, 2, 3\n",
        "package p\n\nvar (\n\tx, y int\n\tz    string\n)\n",
        "package p\n\nconst A, B = \"a\", \"b\"\n",
        "package p\n\nfunc f(a, b int, c, d string) (x, y bool) {\n\treturn\n}\n",
        "package p\n\nvar f = func(p, q int) {}\n",
    ];
    for source in cases {
        for mode in MODES {
            assert_round_trip("split.go", source, mode);
        }
    }
}

#[test]
fn test_mismatched_value_counts_are_not_split() {
    let source = "package p\n\nvar a, b = pair()\n";
    let ast = parse_ok(source, Mode::Semantic);
    let specs = at(&ast, &["Decls", "0", "Specs"]).as_array().expect("specs");
    assert_eq!(specs.len(), 1);
    assert_round_trip("pair.go", source, Mode::Semantic);
}
