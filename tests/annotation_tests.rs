// Role annotation over whole files, plus property tests for deduplication and comments.

mod common;

use common::*;
use go_driver::annotate::{add_roles, dedup, roles_of, Role, RuleSet};
use go_driver::driver::Mode;
use go_driver::transform::normalizer::CommentParts;
use go_driver::uast::{Node, KEY_ROLE};
use go_driver::ErrorKind;
use proptest::prelude::*;

fn annotated(source: &str) -> Node {
    parse_ok(source, Mode::Annotated)
}

#[test]
fn test_binary_expression_roles() {
    let ast = annotated("package p\n\nvar x = a <= b\n");
    let binary = find_first(&ast, "BinaryExpr");
    let roles = roles_of(binary);
    for role in [Role::Expression, Role::Binary, Role::Operator, Role::Relational, Role::LessThanOrEqual] {
        assert!(roles.contains(&role), "{role} missing from {roles:?}");
    }
    assert!(roles_of(at(binary, &["X"])).contains(&Role::Left));
    assert!(roles_of(at(binary, &["Y"])).contains(&Role::Right));
}

#[test]
fn test_conditional_roles_follow_tokens() {
    let ast = annotated(&fixture("control.go"));
    let branches = find_all(&ast, "BranchStmt");
    let kinds: Vec<Role> = branches
        .iter()
        .filter_map(|b| {
            roles_of(b)
                .into_iter()
                .find(|r| matches!(r, Role::Break | Role::Continue | Role::Goto | Role::Fallthrough))
        })
        .collect();
    assert_eq!(kinds.len(), branches.len());
    for role in [Role::Break, Role::Continue, Role::Goto, Role::Fallthrough] {
        assert!(kinds.contains(&role), "no {role} branch");
    }

    let decls = find_all(&ast, "GenDecl");
    assert!(roles_of(decls[0]).contains(&Role::Import));
}

#[test]
fn test_every_native_node_has_roles() {
    for (name, source) in fixtures() {
        let ast = annotated(&source);
        ast.walk(&mut |node| {
            let Some(tag) = node.type_name() else { return };
            if tag.starts_with("uast:") {
                return;
            }
            let roles = roles_of(node);
            assert!(!roles.is_empty(), "{name}: {tag} has no roles");
            assert!(!roles.contains(&Role::Incomplete), "{name}: {tag} is incomplete");
        });
    }
}

#[test]
fn test_roles_have_no_duplicates() {
    let ast = annotated(&fixture("methods.go"));
    ast.walk(&mut |node| {
        let roles = roles_of(node);
        let mut unique = roles.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), roles.len(), "duplicate roles on {:?}", node.type_name());
    });
}

#[test]
fn test_bad_declarations_are_incomplete() {
    let outcome = driver(Mode::Annotated).parse("package p\n\nfunc ( {\n", Mode::Annotated);
    let ast = outcome.ast.expect("partial tree");
    let bad = find_first(&ast, "BadDecl");
    assert_eq!(roles_of(bad), vec![Role::Incomplete]);
}

#[test]
fn test_annotation_requires_a_file_root() {
    let mut node = Node::typed("Ident");
    let err = RuleSet::go().annotate(&mut node).expect_err("not a file");
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
}

#[test]
fn test_semantic_mode_keeps_roles() {
    let ast = parse_ok("package p\n\nimport \"fmt\"\n", Mode::Semantic);
    let import = at(&ast, &["Decls", "0", "Specs", "0"]);
    assert_eq!(import.type_name(), Some("uast:Import"));
    assert!(roles_of(import).contains(&Role::Import));
    assert!(roles_of(at(import, &["Path"])).contains(&Role::Pathname));
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn role_strategy() -> impl Strategy<Value = Role> {
    (0..Role::ALL.len()).prop_map(|i| Role::ALL[i])
}

fn tree_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop::collection::vec(role_strategy(), 0..6).prop_map(|roles| {
        let mut node = Node::typed("Ident");
        add_roles(&mut node, &roles);
        node
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (prop::collection::vec(role_strategy(), 0..6), prop::collection::vec(inner, 1..4)).prop_map(
            |(roles, children)| {
                let mut node = Node::typed("CallExpr");
                add_roles(&mut node, &roles);
                add_roles(&mut node, &roles);
                node.set("Args", Node::Array(children));
                node
            },
        )
    })
}

proptest! {
    #[test]
    fn prop_dedup_is_idempotent(tree in tree_strategy()) {
        let mut once = tree.clone();
        dedup(&mut once);
        let mut twice = once.clone();
        dedup(&mut twice);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_dedup_keeps_first_occurrences(roles in prop::collection::vec(role_strategy(), 0..12)) {
        let mut node = Node::typed("Ident");
        add_roles(&mut node, &roles);
        dedup(&mut node);
        let mut expected: Vec<Role> = Vec::new();
        for role in roles {
            if !expected.contains(&role) {
                expected.push(role);
            }
        }
        prop_assert_eq!(roles_of(&node), expected.clone());
        prop_assert_eq!(node.get(KEY_ROLE).is_some(), !expected.is_empty());
    }

    #[test]
    fn prop_line_comments_reconstruct(body in "[ a-zA-Z0-9:.,!*/-]{0,24}") {
        let text = format!("//{body}");
        let parts = CommentParts::split(&text).expect("line comment");
        prop_assert!(!parts.block);
        prop_assert_eq!(parts.join(), text);
    }

    #[test]
    fn prop_block_comments_reconstruct(body in "[ \ta-zA-Z0-9\n.,]{0,24}") {
        let text = format!("/*{body}*/");
        let parts = CommentParts::split(&text).expect("block comment");
        prop_assert!(parts.block);
        prop_assert_eq!(parts.join(), text);
    }
}
