//! Explicit configuration threaded through every stage call.
//!
//! Per the "no global mutable state" design note, a [`ReforgeConfig`] is constructed once at the
//! process entry point (CLI argument parsing, or a hosted deployment's config layer) and passed
//! by reference into every stage function. Nothing in this workspace reaches for a global/lazy
//! config cell.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Thresholds and policy knobs for the DWARF oracle's per-function verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DwarfThresholds {
    /// Below this dominant-file ratio, a function gets `MULTI_FILE_RANGE`.
    pub multi_file_ratio: f64,
    /// At or above this many disjoint `[low, high)` segments, a function gets
    /// `RANGES_FRAGMENTED`.
    pub fragmented_segment_count: usize,
}

impl Default for DwarfThresholds {
    fn default() -> Self {
        Self {
            multi_file_ratio: 0.7,
            fragmented_segment_count: 4,
        }
    }
}

/// Thresholds for the tree-sitter oracle's per-function verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TsThresholds {
    /// Structural-node nesting depth at or above which a function gets `DEEP_NESTING`.
    pub deep_nesting_depth: u32,
}

impl Default for TsThresholds {
    fn default() -> Self {
        Self {
            deep_nesting_depth: 6,
        }
    }
}

/// Thresholds for the DWARF-to-tree-sitter join.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinDwarfTsThresholds {
    pub min_overlap_ratio: f64,
    pub min_overlap_count: u64,
    pub near_tie_epsilon: f64,
}

impl Default for JoinDwarfTsThresholds {
    fn default() -> Self {
        Self {
            min_overlap_ratio: 0.7,
            min_overlap_count: 1,
            near_tie_epsilon: 0.02,
        }
    }
}

/// Thresholds for the oracle-to-decompiler address-overlap join.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinDecompileThresholds {
    pub strong_ratio: f64,
    pub weak_ratio: f64,
    pub multi_match_slack: f64,
}

impl Default for JoinDecompileThresholds {
    fn default() -> Self {
        Self {
            strong_ratio: 0.9,
            weak_ratio: 0.3,
            multi_match_slack: 0.05,
        }
    }
}

/// Path prefixes whose line rows are treated as system/compiler-internal rather than user code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExcludedPrefixes {
    pub prefixes: Vec<String>,
}

impl Default for ExcludedPrefixes {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "/usr/include".to_string(),
                "/usr/lib/gcc".to_string(),
                "<built-in>".to_string(),
                "<command-line>".to_string(),
            ],
        }
    }
}

impl ExcludedPrefixes {
    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// Per-subprocess timeouts, by phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timeouts {
    pub compile: Duration,
    pub link: Duration,
    pub strip: Duration,
    pub preprocess: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            compile: Duration::from_secs(60),
            link: Duration::from_secs(60),
            strip: Duration::from_secs(30),
            preprocess: Duration::from_secs(60),
        }
    }
}

/// The full, explicit configuration for a pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReforgeConfig {
    pub profile_id: String,
    pub dwarf: DwarfThresholds,
    pub ts: TsThresholds,
    pub join_dwarf_ts: JoinDwarfTsThresholds,
    pub join_decompile: JoinDecompileThresholds,
    pub excluded_prefixes: ExcludedPrefixes,
    pub timeouts: Timeouts,
    /// Upper bound on worker-local intra-job parallelism (matrix cells, TU hashing, …). `0`
    /// means "use the available parallelism reported by the OS".
    pub max_worker_threads: usize,
}

impl Default for ReforgeConfig {
    fn default() -> Self {
        Self {
            profile_id: "default".to_string(),
            dwarf: DwarfThresholds::default(),
            ts: TsThresholds::default(),
            join_dwarf_ts: JoinDwarfTsThresholds::default(),
            join_decompile: JoinDecompileThresholds::default(),
            excluded_prefixes: ExcludedPrefixes::default(),
            timeouts: Timeouts::default(),
            max_worker_threads: 0,
        }
    }
}

impl ReforgeConfig {
    /// Resolves `max_worker_threads` to a concrete, always-positive worker count.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.max_worker_threads > 0 {
            self.max_worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_prefix_matching() {
        let excluded = ExcludedPrefixes::default();
        assert!(excluded.matches("/usr/include/stdio.h"));
        assert!(excluded.matches("<built-in>"));
        assert!(!excluded.matches("/home/user/project/main.c"));
    }

    #[test]
    fn worker_threads_resolves_to_positive() {
        let config = ReforgeConfig::default();
        assert!(config.resolved_worker_threads() >= 1);
    }
}
