//! Parses preprocessed `.i` translation units with a C grammar and extracts per-function byte,
//! line, signature, and body spans; raw-text and context hashes; structural node indices; and
//! deterministic extraction recipes.

mod context_hash;
mod functions;
mod parser;
mod recipes;
mod report;
mod structural;

use std::collections::HashMap;

use reforge_common::{TsThresholds, Verdict};
use tree_sitter::Node;

pub use functions::{Span, TsFunction};
pub use parser::{grammar_version, ParseError, ParseErrorLocation, PARSER_NAME};
pub use recipes::{ExtractionRecipe, RecipeKind};
pub use report::{
    FunctionRejectReason, FunctionWarnReason, ParseErrorRecord, SpanRecord, TsFunctionRecord,
    TsTuReport, TuRejectReason,
};
pub use structural::{StructuralNode, ALLOWED_KINDS};

/// Non-standard-extension node kinds this grammar emits for GNU/MS C extensions.
const EXTENSION_KINDS: &[&str] = &["attribute_specifier", "gnu_asm_expression", "ms_based_modifier"];

fn has_extension_node(node: Node<'_>) -> bool {
    if EXTENSION_KINDS.contains(&node.kind()) {
        return true;
    }
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(has_extension_node);
    result
}

fn has_anonymous_aggregate(node: Node<'_>) -> bool {
    let is_aggregate = matches!(node.kind(), "struct_specifier" | "union_specifier");
    if is_aggregate && node.child_by_field_name("name").is_none() {
        return true;
    }
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(has_anonymous_aggregate);
    result
}

/// Parses `source` (the `.i` file's bytes) and extracts every function definition's verdict and
/// record.
pub fn run_tu(tu_path: &str, source: &[u8], thresholds: &TsThresholds) -> TsTuReport {
    let parsed = match parser::parse(source) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::warn!(tu_path, %error, "translation unit failed to parse");
            return TsTuReport {
                tu_path: tu_path.to_string(),
                tu_hash: reforge_common::Sha256Hex::of_bytes(source),
                parser_name: PARSER_NAME.to_string(),
                grammar_version: grammar_version(),
                verdict: Verdict::Reject,
                reject_reason: Some(TuRejectReason::TuParseError),
                parse_errors: Vec::new(),
                functions: Vec::new(),
            };
        }
    };

    let parse_errors: Vec<ParseErrorRecord> = parsed
        .error_locations
        .iter()
        .map(|loc| ParseErrorRecord {
            byte: loc.byte,
            line: loc.line,
            column: loc.column,
        })
        .collect();

    if parsed.has_errors {
        return TsTuReport {
            tu_path: tu_path.to_string(),
            tu_hash: parsed.tu_hash,
            parser_name: PARSER_NAME.to_string(),
            grammar_version: grammar_version(),
            verdict: Verdict::Reject,
            reject_reason: Some(TuRejectReason::TuParseError),
            parse_errors,
            functions: Vec::new(),
        };
    }

    let raw_functions = functions::extract_functions(parsed.tree.root_node(), source, tu_path);

    let mut name_counts: HashMap<&str, u32> = HashMap::new();
    for f in &raw_functions {
        if let Some(name) = f.name.as_deref() {
            *name_counts.entry(name).or_insert(0) += 1;
        }
    }

    let function_nodes = collect_function_definition_nodes(parsed.tree.root_node());

    let records: Vec<TsFunctionRecord> = raw_functions
        .iter()
        .zip(function_nodes)
        .map(|(f, node)| classify_function(f, node, tu_path, thresholds, &name_counts))
        .collect();

    TsTuReport {
        tu_path: tu_path.to_string(),
        tu_hash: parsed.tu_hash,
        parser_name: PARSER_NAME.to_string(),
        grammar_version: grammar_version(),
        verdict: Verdict::Accept,
        reject_reason: None,
        parse_errors,
        functions: records,
    }
}

fn collect_function_definition_nodes(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    walk_collect(root, &mut out);
    out
}

fn walk_collect<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    if node.kind() == "function_definition" {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_collect(child, out);
    }
}

fn classify_function(
    function: &TsFunction,
    node: Node<'_>,
    tu_path: &str,
    thresholds: &TsThresholds,
    name_counts: &HashMap<&str, u32>,
) -> TsFunctionRecord {
    let mut reject_reasons = Vec::new();
    let mut warn_reasons = Vec::new();

    if function.span.start_byte >= function.span.end_byte {
        reject_reasons.push(FunctionRejectReason::InvalidSpan);
    }
    if function.name.is_none() {
        reject_reasons.push(FunctionRejectReason::MissingFunctionName);
    }

    if reject_reasons.is_empty() {
        if let Some(name) = function.name.as_deref() {
            if name_counts.get(name).copied().unwrap_or(0) > 1 {
                warn_reasons.push(FunctionWarnReason::DuplicateFunctionName);
            }
        }
        if function.max_depth >= thresholds.deep_nesting_depth {
            warn_reasons.push(FunctionWarnReason::DeepNesting);
        }
        if has_anonymous_aggregate(node) {
            warn_reasons.push(FunctionWarnReason::AnonymousAggregatePresent);
        }
        if has_extension_node(node) {
            warn_reasons.push(FunctionWarnReason::NonstandardExtensionPattern);
        }
    }

    let verdict = if !reject_reasons.is_empty() {
        Verdict::Reject
    } else if !warn_reasons.is_empty() {
        Verdict::Warn
    } else {
        Verdict::Accept
    };

    TsFunctionRecord {
        ts_func_id: function.ts_func_id.clone(),
        tu_path: tu_path.to_string(),
        name: function.name.clone(),
        span: SpanRecord::from(&function.span),
        signature_span: function.signature_span.as_ref().map(SpanRecord::from),
        body_span: function.body_span.as_ref().map(SpanRecord::from),
        raw_text_hash: function.raw_text_hash,
        context_hash: function.context_hash,
        structural_nodes: function.structural_nodes.clone(),
        recipes: recipes::recipes_for(function),
        verdict,
        reject_reasons,
        warn_reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_function_is_accepted() {
        let thresholds = TsThresholds::default();
        let source = b"int add(int a, int b) {\n    return a + b;\n}\n";
        let report = run_tu("main.i", source, &thresholds);
        assert_eq!(report.verdict, Verdict::Accept);
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].name.as_deref(), Some("add"));
        assert_eq!(report.functions[0].verdict, Verdict::Accept);
    }

    #[test]
    fn duplicate_names_are_flagged_as_warn() {
        let thresholds = TsThresholds::default();
        let source = b"int f(void) { return 1; }\nint f(int x) { return x; }\n";
        let report = run_tu("main.i", source, &thresholds);
        assert_eq!(report.functions.len(), 2);
        assert!(report
            .functions
            .iter()
            .all(|f| f.warn_reasons.contains(&FunctionWarnReason::DuplicateFunctionName)));
    }

    #[test]
    fn deep_nesting_is_flagged() {
        let thresholds = TsThresholds {
            deep_nesting_depth: 2,
        };
        let source = b"int f(int x) {\n  if (x) {\n    if (x) {\n      return 1;\n    }\n  }\n  return 0;\n}\n";
        let report = run_tu("main.i", source, &thresholds);
        assert!(report.functions[0]
            .warn_reasons
            .contains(&FunctionWarnReason::DeepNesting));
    }
}
