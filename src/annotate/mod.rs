//! # Annotation Engine
//!
//! Assigns semantic [`Role`]s to the objects of a generic tree. Roles are stored on each object
//! under the reserved `@role` key as an array of role names.
//!
//! ## Rules
//!
//! A [`Rule`] is data, not code: it names the structural type it applies to and lists
//! - roles for the node itself,
//! - roles that apply when a scalar field (usually a token) has one of a set of values,
//! - roles for the object (or every element of the array) held by a named child field.
//!
//! Rules are grouped by type tag in a [`RuleSet`]. Every rule registered for a node's type is
//! applied, in registration order, parents before children.
//!
//! ## Finishing Passes
//!
//! After the rule pass, repeated roles are collapsed keeping first-seen order ([`dedup`]), and
//! every node of a type that is expected to carry roles but received none is marked
//! [`Role::Incomplete`].

use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::DriverError;
use crate::driver_err;
use crate::uast::{is_reserved, Node, KEY_ROLE};

pub mod role;
pub mod rules;

pub use role::Role;

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone)]
struct Conditional {
    field: &'static str,
    values: &'static [&'static str],
    roles: Vec<Role>,
}

#[derive(Debug, Clone)]
struct ChildRoles {
    field: &'static str,
    roles: Vec<Role>,
}

/// Roles for one structural type.
#[derive(Debug, Clone)]
pub struct Rule {
    type_name: &'static str,
    roles: Vec<Role>,
    when: Vec<Conditional>,
    children: Vec<ChildRoles>,
}

/// Starts a rule for the given type tag.
pub fn on(type_name: &'static str) -> Rule {
    Rule {
        type_name,
        roles: Vec::new(),
        when: Vec::new(),
        children: Vec::new(),
    }
}

impl Rule {
    /// Roles given to every node of the type.
    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.roles.extend_from_slice(roles);
        self
    }

    /// Roles given when the scalar field `field` equals one of `values`.
    pub fn when(mut self, field: &'static str, values: &'static [&'static str], roles: &[Role]) -> Self {
        self.when.push(Conditional {
            field,
            values,
            roles: roles.to_vec(),
        });
        self
    }

    /// Roles given to the child object (or each child in the array) under `field`.
    pub fn child(mut self, field: &'static str, roles: &[Role]) -> Self {
        self.children.push(ChildRoles {
            field,
            roles: roles.to_vec(),
        });
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn apply(&self, node: &mut Node) {
        add_roles(node, &self.roles);
        for cond in &self.when {
            let matches = node
                .get(cond.field)
                .and_then(Node::as_str)
                .map_or(false, |value| cond.values.contains(&value));
            if matches {
                add_roles(node, &cond.roles);
            }
        }
        let Some(obj) = node.as_object_mut() else {
            return;
        };
        for child in &self.children {
            match obj.get_mut(child.field) {
                Some(Node::Array(items)) => {
                    for item in items.iter_mut() {
                        add_roles(item, &child.roles);
                    }
                }
                Some(target) => add_roles(target, &child.roles),
                None => {}
            }
        }
    }
}

// ============================================================================
// RULE SETS
// ============================================================================

/// Rules keyed by type tag, plus the root constraint and the set of types expected to carry roles.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    root: Option<&'static str>,
    rules: BTreeMap<&'static str, Vec<Rule>>,
    expected: BTreeSet<&'static str>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the annotated tree's root to have this type tag.
    pub fn with_root(mut self, type_name: &'static str) -> Self {
        self.root = Some(type_name);
        self
    }

    pub fn add(&mut self, rule: Rule) {
        self.rules.entry(rule.type_name).or_default().push(rule);
    }

    /// Marks types whose nodes get [`Role::Incomplete`] when no rule gives them a role.
    pub fn expect<I: IntoIterator<Item = &'static str>>(&mut self, names: I) {
        self.expected.extend(names);
    }

    pub fn rules_for(&self, type_name: &str) -> &[Rule] {
        self.rules.get(type_name).map_or(&[], Vec::as_slice)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Annotates the whole tree in place.
    pub fn annotate(&self, node: &mut Node) -> Result<(), DriverError> {
        if let Some(root) = self.root {
            let found = node.type_name();
            if found != Some(root) {
                return Err(driver_err!(
                    ShapeMismatch,
                    "root must be {}, found {}",
                    root,
                    found.unwrap_or(node.kind_name())
                ));
            }
        }
        self.visit(node);
        dedup(node);
        self.mark_incomplete(node);
        Ok(())
    }

    fn visit(&self, node: &mut Node) {
        match node {
            Node::Object(_) => {
                if let Some(type_name) = node.type_name().map(str::to_string) {
                    for rule in self.rules_for(&type_name) {
                        rule.apply(node);
                    }
                }
                if let Node::Object(obj) = node {
                    for (key, child) in obj.iter_mut() {
                        if !is_reserved(key) {
                            self.visit(child);
                        }
                    }
                }
            }
            Node::Array(items) => items.iter_mut().for_each(|item| self.visit(item)),
            _ => {}
        }
    }

    fn mark_incomplete(&self, node: &mut Node) {
        match node {
            Node::Object(obj) => {
                let expected = obj
                    .get("@type")
                    .and_then(Node::as_str)
                    .map_or(false, |t| self.expected.contains(t));
                let has_roles = obj
                    .get(KEY_ROLE)
                    .and_then(Node::as_array)
                    .map_or(false, |roles| !roles.is_empty());
                if expected && !has_roles {
                    obj.insert(
                        KEY_ROLE.to_string(),
                        Node::Array(vec![Node::from(Role::Incomplete.as_str())]),
                    );
                }
                for (key, child) in obj.iter_mut() {
                    if !is_reserved(key) {
                        self.mark_incomplete(child);
                    }
                }
            }
            Node::Array(items) => items.iter_mut().for_each(|item| self.mark_incomplete(item)),
            _ => {}
        }
    }
}

// ============================================================================
// ROLE STORAGE
// ============================================================================

/// Appends roles to an object's `@role` array. Non-objects are ignored.
pub fn add_roles(node: &mut Node, roles: &[Role]) {
    if roles.is_empty() {
        return;
    }
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    let entry = obj
        .entry(KEY_ROLE.to_string())
        .or_insert_with(|| Node::Array(Vec::new()));
    if let Node::Array(items) = entry {
        items.extend(roles.iter().map(|r| Node::from(r.as_str())));
    }
}

/// The roles recorded on a node, in order. Unknown role names are skipped.
pub fn roles_of(node: &Node) -> Vec<Role> {
    node.get(KEY_ROLE)
        .and_then(Node::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Node::as_str)
                .filter_map(|name| name.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Collapses repeated roles on every object, keeping the first occurrence of each.
pub fn dedup(node: &mut Node) {
    match node {
        Node::Object(obj) => {
            if let Some(Node::Array(roles)) = obj.get_mut(KEY_ROLE) {
                let mut seen = BTreeSet::new();
                roles.retain(|role| seen.insert(role.to_string()));
            }
            for (key, child) in obj.iter_mut() {
                if !is_reserved(key) {
                    dedup(child);
                }
            }
        }
        Node::Array(items) => items.iter_mut().for_each(dedup),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Node {
        let mut node = Node::typed("Ident");
        node.set("Name", Node::from(name));
        node
    }

    fn rules() -> RuleSet {
        let mut set = RuleSet::new().with_root("File");
        set.add(on("File").roles(&[Role::File]));
        set.add(on("Ident").roles(&[Role::Identifier]));
        set.add(
            on("BinaryExpr")
                .roles(&[Role::Expression, Role::Binary])
                .when("Op", &["+"], &[Role::Arithmetic, Role::Add])
                .child("X", &[Role::Binary, Role::Left])
                .child("Y", &[Role::Binary, Role::Right]),
        );
        set.expect(["File", "Ident", "BinaryExpr", "BadExpr"]);
        set
    }

    #[test]
    fn test_rule_roles_and_children() {
        let mut expr = Node::typed("BinaryExpr");
        expr.set("Op", Node::from("+"));
        expr.set("X", ident("a"));
        expr.set("Y", ident("b"));
        let mut file = Node::typed("File");
        file.set("Decls", Node::Array(vec![expr]));

        rules().annotate(&mut file).expect("annotates");
        let expr = &file.get("Decls").and_then(Node::as_array).expect("decls")[0];
        assert_eq!(
            roles_of(expr),
            [Role::Expression, Role::Binary, Role::Arithmetic, Role::Add]
        );
        assert_eq!(
            roles_of(expr.get("X").expect("X")),
            [Role::Binary, Role::Left, Role::Identifier]
        );
    }

    #[test]
    fn test_root_must_match() {
        let mut node = ident("x");
        let err = rules().annotate(&mut node).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ShapeMismatch);
        assert!(err.message().contains("root must be File"));
    }

    #[test]
    fn test_expected_types_without_roles_are_incomplete() {
        let mut file = Node::typed("File");
        file.set("Decls", Node::Array(vec![Node::typed("BadExpr"), Node::typed("Other")]));
        rules().annotate(&mut file).expect("annotates");
        let decls = file.get("Decls").and_then(Node::as_array).expect("decls");
        assert_eq!(roles_of(&decls[0]), [Role::Incomplete]);
        assert!(decls[1].get(KEY_ROLE).is_none());
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let mut node = ident("x");
        add_roles(&mut node, &[Role::Identifier, Role::Name, Role::Identifier, Role::Left]);
        dedup(&mut node);
        assert_eq!(roles_of(&node), [Role::Identifier, Role::Name, Role::Left]);
        let once = node.clone();
        dedup(&mut node);
        assert_eq!(node, once);
    }
}
