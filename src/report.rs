//! Audit trail of a patch pass.

use crate::rule::{Rule, RuleResult};
use std::fmt;

/// Outcome of one input rule, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// 1-based position in the config
    pub index: usize,
    pub old_hex: String,
    pub new_hex: String,
    pub result: RuleResult,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            RuleResult::Applied(_) | RuleResult::LimitReached(_) => write!(
                f,
                "Rule #{}: {} → {} ({})",
                self.index, self.old_hex, self.new_hex, self.result
            ),
            skipped => write!(f, "Rule #{} skipped: {}", self.index, skipped),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchReport {
    pub outcomes: Vec<RuleOutcome>,
    pub input_len: usize,
    pub output_len: usize,
}

impl PatchReport {
    /// Pair each rule with its result.
    ///
    /// `rules` and `results` must be the same length and in the same order.
    pub fn new(
        rules: &[Rule],
        results: Vec<RuleResult>,
        input_len: usize,
        output_len: usize,
    ) -> Self {
        debug_assert_eq!(rules.len(), results.len());
        let outcomes = rules
            .iter()
            .zip(results)
            .enumerate()
            .map(|(idx, (rule, result))| RuleOutcome {
                index: idx + 1,
                old_hex: rule.old_hex.clone(),
                new_hex: rule.new_hex.clone(),
                result,
            })
            .collect();
        Self {
            outcomes,
            input_len,
            output_len,
        }
    }

    pub fn total_replacements(&self) -> usize {
        self.outcomes.iter().map(|o| o.result.count()).sum()
    }

    /// Rules that ran to completion, including ones with zero matches.
    pub fn applied_rules(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, RuleResult::Applied(_)))
            .count()
    }

    pub fn skipped_rules(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_skipped()).count()
    }

    pub fn limited_rules(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, RuleResult::LimitReached(_)))
            .count()
    }
}

/// A contiguous run of bytes that differs between two equal-length buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedSpan<'a> {
    pub offset: usize,
    pub before: &'a [u8],
    pub after: &'a [u8],
}

/// Collect the differing runs between `before` and `after`.
///
/// Only the common prefix is compared; patching never changes length.
pub fn changed_spans<'a>(before: &'a [u8], after: &'a [u8]) -> Vec<ChangedSpan<'a>> {
    let len = before.len().min(after.len());
    let mut spans = Vec::new();
    let mut start = None;

    for idx in 0..=len {
        let differs = idx < len && before[idx] != after[idx];
        match (start, differs) {
            (None, true) => start = Some(idx),
            (Some(s), false) => {
                spans.push(ChangedSpan {
                    offset: s,
                    before: &before[s..idx],
                    after: &after[s..idx],
                });
                start = None;
            }
            _ => {}
        }
    }

    spans
}

/// Uppercase hex with a space between bytes, e.g. `DE AD BE EF`.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
