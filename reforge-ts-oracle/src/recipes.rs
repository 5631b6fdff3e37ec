//! Deterministic slice descriptors for re-extracting a function's source text later, without
//! re-parsing. These are descriptors, not compilation instructions.

use serde::{Deserialize, Serialize};

use crate::functions::TsFunction;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionRecipe {
    pub kind: RecipeKind,
    pub start_byte: usize,
    pub end_byte: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    FunctionOnly,
    FunctionWithFilePreamble,
}

pub fn recipes_for(function: &TsFunction) -> Vec<ExtractionRecipe> {
    vec![
        ExtractionRecipe {
            kind: RecipeKind::FunctionOnly,
            start_byte: function.span.start_byte,
            end_byte: function.span.end_byte,
        },
        ExtractionRecipe {
            kind: RecipeKind::FunctionWithFilePreamble,
            start_byte: 0,
            end_byte: function.span.end_byte,
        },
    ]
}
