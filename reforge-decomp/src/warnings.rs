//! The frozen decompile warning taxonomy, per-function verdict, and CFG completeness rating.

use reforge_common::Verdict;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecompileWarning {
    DecompileTimeout,
    UnknownCallingConvention,
    UnreachableBlocksRemoved,
    UnresolvedIndirectJump,
    SwitchRecoveryFailed,
    Unrecognized,
}

impl DecompileWarning {
    /// Parses a raw warning tag from the decompiler's output, mapping anything unrecognized into
    /// `Unrecognized` rather than dropping it.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "DECOMPILE_TIMEOUT" => Self::DecompileTimeout,
            "UNKNOWN_CALLING_CONVENTION" => Self::UnknownCallingConvention,
            "UNREACHABLE_BLOCKS_REMOVED" => Self::UnreachableBlocksRemoved,
            "UNRESOLVED_INDIRECT_JUMP" => Self::UnresolvedIndirectJump,
            "SWITCH_RECOVERY_FAILED" => Self::SwitchRecoveryFailed,
            _ => Self::Unrecognized,
        }
    }

    /// Fatal warnings disqualify a row from the high-confidence gate outright.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::DecompileTimeout | Self::UnresolvedIndirectJump)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CfgCompleteness {
    High,
    Medium,
    Low,
}

/// Derives CFG completeness from the warning set: any fatal warning is LOW; a structural warning
/// (unreachable blocks, switch recovery) without a fatal one is MEDIUM; none is HIGH.
pub fn cfg_completeness(warnings: &[DecompileWarning]) -> CfgCompleteness {
    if warnings.iter().any(|w| w.is_fatal()) {
        CfgCompleteness::Low
    } else if warnings.iter().any(|w| {
        matches!(
            w,
            DecompileWarning::UnreachableBlocksRemoved | DecompileWarning::SwitchRecoveryFailed
        )
    }) {
        CfgCompleteness::Medium
    } else {
        CfgCompleteness::High
    }
}

/// Derives the per-function verdict from the warning set and whether the body was resolvable.
pub fn function_verdict(warnings: &[DecompileWarning], has_body: bool) -> Verdict {
    if !has_body || warnings.iter().any(|w| w.is_fatal()) {
        Verdict::Reject
    } else if !warnings.is_empty() {
        Verdict::Warn
    } else {
        Verdict::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_warning_tags_map_to_unrecognized() {
        assert_eq!(DecompileWarning::parse("SOMETHING_NEW"), DecompileWarning::Unrecognized);
    }

    #[test]
    fn fatal_warning_drives_cfg_completeness_to_low() {
        let warnings = vec![DecompileWarning::DecompileTimeout];
        assert_eq!(cfg_completeness(&warnings), CfgCompleteness::Low);
    }

    #[test]
    fn no_warnings_is_high_completeness_and_accept() {
        assert_eq!(cfg_completeness(&[]), CfgCompleteness::High);
        assert_eq!(function_verdict(&[], true), Verdict::Accept);
    }

    #[test]
    fn missing_body_is_rejected_regardless_of_warnings() {
        assert_eq!(function_verdict(&[], false), Verdict::Reject);
    }
}
