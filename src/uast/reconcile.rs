//! Position reconciliation: fills `line`/`col` on offset-only positions from the source text.
//!
//! Must run against the original, unmodified source, after every stage that moves offsets.

use crate::syntax::token::LineIndex;
use crate::uast::{Node, Position, TYPE_POSITION};

/// Adds line and column to every position object that lacks them. Returns how many were filled.
pub fn reconcile(node: &mut Node, source: &str) -> usize {
    let index = LineIndex::new(source);
    fill(node, &index)
}

fn fill(node: &mut Node, index: &LineIndex) -> usize {
    match node {
        Node::Object(obj) => {
            let mut filled = 0;
            let is_position = obj.get("@type").and_then(Node::as_str) == Some(TYPE_POSITION);
            if is_position && !obj.contains_key("line") {
                if let Some(offset) = obj.get("offset").and_then(Node::as_u64) {
                    let (line, col) = index.line_col(offset as usize);
                    let resolved = Position {
                        offset: offset as usize,
                        line,
                        col,
                    };
                    if let Node::Object(full) = resolved.to_node() {
                        *obj = full;
                        filled += 1;
                    }
                }
                return filled;
            }
            for child in obj.values_mut() {
                filled += fill(child, index);
            }
            filled
        }
        Node::Array(items) => items.iter_mut().map(|child| fill(child, index)).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::token::Pos;
    use crate::uast::positions;

    #[test]
    fn test_fills_line_and_column() {
        let mut node = positions(Pos::from_offset(0), Pos::from_offset(14), &[]);
        let filled = reconcile(&mut node, "package main\n\nfunc f() {}\n");
        assert_eq!(filled, 2);
        let end = Position::from_node(node.get("end").expect("end")).expect("position");
        assert_eq!((end.line, end.col), (3, 1));
    }

    #[test]
    fn test_leaves_resolved_positions_alone() {
        let mut node = Position {
            offset: 3,
            line: 9,
            col: 9,
        }
        .to_node();
        assert_eq!(reconcile(&mut node, "abcdef"), 0);
        assert_eq!(Position::from_node(&node).map(|p| p.line), Some(9));
    }
}
