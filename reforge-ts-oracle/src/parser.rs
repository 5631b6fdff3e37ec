//! Thin wrapper around `tree-sitter-c`: parses one translation unit and records parser identity.

use reforge_common::Sha256Hex;
use thiserror::Error;
use tree_sitter::{Parser, Tree};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to set the tree-sitter C grammar")]
    SetLanguage(#[source] tree_sitter::LanguageError),
    #[error("tree-sitter returned no tree for this input")]
    NoTree,
}

pub const PARSER_NAME: &str = "tree-sitter-c";

/// The C grammar's ABI version, recorded alongside `PARSER_NAME` as parser identity.
pub fn grammar_version() -> usize {
    tree_sitter_c::language().version()
}

#[derive(Clone, Debug)]
pub struct ParseErrorLocation {
    pub byte: usize,
    pub line: usize,
    pub column: usize,
}

pub struct ParsedUnit {
    pub tree: Tree,
    pub tu_hash: Sha256Hex,
    pub has_errors: bool,
    pub error_locations: Vec<ParseErrorLocation>,
}

/// Parses `source` with the C grammar, recording whether the resulting tree contains any
/// `ERROR`/`MISSING` nodes and where they are.
pub fn parse(source: &[u8]) -> Result<ParsedUnit, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::language())
        .map_err(ParseError::SetLanguage)?;

    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    let mut error_locations = Vec::new();
    collect_errors(tree.root_node(), &mut error_locations);

    Ok(ParsedUnit {
        has_errors: !error_locations.is_empty(),
        tu_hash: Sha256Hex::of_bytes(source),
        error_locations,
        tree,
    })
}

fn collect_errors(node: tree_sitter::Node<'_>, out: &mut Vec<ParseErrorLocation>) {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        out.push(ParseErrorLocation {
            byte: node.start_byte(),
            line: pos.row,
            column: pos.column,
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, out);
    }
}
