//! The build profile: base flags, allowed link libraries, and per-variant flag deltas.

use std::collections::BTreeMap;

use reforge_common::Variant;
use serde::{Deserialize, Serialize};

/// A fixed base-flag set plus variant-specific deltas and an allow-list of link libraries.
///
/// The profile is immutable input to a job; nothing in the builder mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildProfile {
    pub base_flags: Vec<String>,
    pub variant_deltas: BTreeMap<Variant, Vec<String>>,
    pub allowed_link_libs: Vec<String>,
    /// Flags used for the optimization-independent preprocess phase: base language flags plus
    /// include paths, deliberately excluding `-O*` and `-g`.
    pub preprocess_flags: Vec<String>,
    pub compiler: String,
    pub strip_tool: String,
}

impl BuildProfile {
    /// The synthetic-test default profile: strict warnings, only `libm` permitted at link time.
    pub fn synthetic_default() -> Self {
        let mut variant_deltas = BTreeMap::new();
        variant_deltas.insert(Variant::Debug, vec!["-g".to_string()]);
        variant_deltas.insert(Variant::Release, Vec::new());
        variant_deltas.insert(Variant::Stripped, Vec::new());

        Self {
            base_flags: vec![
                "-std=c11".to_string(),
                "-Wall".to_string(),
                "-fno-builtin".to_string(),
            ],
            variant_deltas,
            allowed_link_libs: vec!["m".to_string()],
            preprocess_flags: vec!["-std=c11".to_string()],
            compiler: "cc".to_string(),
            strip_tool: "strip".to_string(),
        }
    }

    /// Flags for compiling one translation unit of `variant` at `opt_flag` (e.g. `-O2`).
    pub fn compile_flags(&self, variant: Variant, opt_flag: &str) -> Vec<String> {
        let mut flags = self.base_flags.clone();
        if let Some(delta) = self.variant_deltas.get(&variant) {
            flags.extend(delta.iter().cloned());
        }
        flags.push(opt_flag.to_string());
        flags.push("-c".to_string());
        flags
    }

    /// `-l{lib}` arguments for the link step, restricted to the allow-list.
    pub fn link_lib_flags(&self) -> Vec<String> {
        self.allowed_link_libs
            .iter()
            .map(|lib| format!("-l{lib}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_variant_adds_dash_g() {
        let profile = BuildProfile::synthetic_default();
        let flags = profile.compile_flags(Variant::Debug, "-O0");
        assert!(flags.contains(&"-g".to_string()));
        assert!(flags.contains(&"-O0".to_string()));
    }

    #[test]
    fn release_variant_has_no_delta() {
        let profile = BuildProfile::synthetic_default();
        let flags = profile.compile_flags(Variant::Release, "-O2");
        assert!(!flags.contains(&"-g".to_string()));
    }

    #[test]
    fn link_libs_are_restricted_to_allow_list() {
        let profile = BuildProfile::synthetic_default();
        assert_eq!(profile.link_lib_flags(), vec!["-lm".to_string()]);
    }
}
