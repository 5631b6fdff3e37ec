//! The three-kind error/verdict taxonomy used identically by every stage: hard failures (stage
//! cannot proceed), per-unit failures (one function/cell/TU is unprocessable), and policy
//! warnings (processed, but flagged).

use serde::{Deserialize, Serialize};

/// A unit-level (function, cell, TU) quality verdict. Every per-unit output embeds one of these
/// rather than ever propagating a Rust error for an expected data condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accept,
    Warn,
    Reject,
}

impl Verdict {
    pub fn is_reject(self) -> bool {
        matches!(self, Verdict::Reject)
    }
}
