//! Indexes an allow-listed set of structural nodes within a function body, each with its type,
//! spans, raw hash, and nesting depth.

use reforge_common::Sha256Hex;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

pub const ALLOWED_KINDS: &[&str] = &[
    "compound_statement",
    "if_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "return_statement",
    "goto_statement",
    "labeled_statement",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructuralNode {
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub raw_hash: Sha256Hex,
    pub depth: u32,
}

/// Walks `body`, recording every allow-listed node with its depth relative to `body` (depth 0).
/// Returns the index and the maximum depth reached.
pub fn index_structural_nodes(body: Node<'_>, source: &[u8]) -> (Vec<StructuralNode>, u32) {
    let mut nodes = Vec::new();
    let mut max_depth = 0;
    walk(body, source, 0, &mut nodes, &mut max_depth);
    (nodes, max_depth)
}

fn walk(
    node: Node<'_>,
    source: &[u8],
    depth: u32,
    out: &mut Vec<StructuralNode>,
    max_depth: &mut u32,
) {
    let is_allowed = ALLOWED_KINDS.contains(&node.kind());
    if is_allowed {
        *max_depth = (*max_depth).max(depth);
        out.push(StructuralNode {
            kind: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            raw_hash: Sha256Hex::of_bytes(&source[node.start_byte()..node.end_byte()]),
            depth,
        });
    }

    let next_depth = if is_allowed { depth + 1 } else { depth };
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, next_depth, out, max_depth);
    }
}
