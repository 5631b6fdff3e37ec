//! Per-function-definition extraction: spans, hashes, and the structural node index.

use reforge_common::Sha256Hex;
use tree_sitter::Node;

use crate::context_hash::context_hash;
use crate::structural::{index_structural_nodes, StructuralNode};

#[derive(Clone, Debug)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

fn span_of(node: Node<'_>) -> Span {
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: node.start_position().row,
        end_line: node.end_position().row,
    }
}

#[derive(Clone, Debug)]
pub struct TsFunction {
    pub name: Option<String>,
    pub span: Span,
    pub signature_span: Option<Span>,
    pub body_span: Option<Span>,
    pub raw_text_hash: Sha256Hex,
    pub context_hash: Sha256Hex,
    pub ts_func_id: String,
    pub max_depth: u32,
    pub structural_nodes: Vec<StructuralNode>,
}

/// Finds the declared function name by walking a `function_declarator`'s descendants for the
/// first identifier, skipping past pointer/array declarator wrappers.
fn declarator_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    if node.kind() == "identifier" {
        return node.utf8_text(source).ok().map(str::to_string);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(name) = declarator_name(child, source) {
            return Some(name);
        }
    }
    None
}

/// Walks the whole tree collecting every `function_definition` node.
pub fn extract_functions(root: Node<'_>, source: &[u8], tu_path: &str) -> Vec<TsFunction> {
    let mut out = Vec::new();
    walk(root, source, tu_path, &mut out);
    out
}

fn walk(node: Node<'_>, source: &[u8], tu_path: &str, out: &mut Vec<TsFunction>) {
    if node.kind() == "function_definition" {
        out.push(build_function(node, source, tu_path));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, tu_path, out);
    }
}

fn build_function(node: Node<'_>, source: &[u8], tu_path: &str) -> TsFunction {
    let span = span_of(node);
    let raw_text = &source[span.start_byte..span.end_byte];

    let declarator = node.child_by_field_name("declarator");
    let name = declarator.and_then(|d| declarator_name(d, source));
    let signature_span = declarator.map(span_of);
    let body = node.child_by_field_name("body");
    let body_span = body.map(span_of);

    let raw_text_hash = Sha256Hex::of_bytes(raw_text);
    let context_hash = context_hash(raw_text);
    let ts_func_id = format!(
        "{tu_path}:{}:{}:{context_hash}",
        span.start_byte, span.end_byte
    );

    let (structural_nodes, max_depth) = body
        .map(|b| index_structural_nodes(b, source))
        .unwrap_or((Vec::new(), 0));

    TsFunction {
        name,
        span,
        signature_span,
        body_span,
        raw_text_hash,
        context_hash,
        ts_func_id,
        max_depth,
        structural_nodes,
    }
}
