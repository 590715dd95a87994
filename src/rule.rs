//! Rule data model: textual rules, compiled byte pairs, and per-rule outcomes.

use serde::Deserialize;
use std::fmt;

/// A textual substitution rule as it appears in the config file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    #[serde(default)]
    pub old_hex: String,
    #[serde(default)]
    pub new_hex: String,
}

impl Rule {
    pub fn new(old_hex: impl Into<String>, new_hex: impl Into<String>) -> Self {
        Self {
            old_hex: old_hex.into(),
            new_hex: new_hex.into(),
        }
    }
}

/// Validated byte-level form of a [`Rule`].
///
/// Both sides are non-empty and of equal length. The only constructor is
/// [`crate::compiler::compile`], so every value of this type upholds that.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "CompiledRule does nothing until handed to the PatchEngine"]
pub struct CompiledRule {
    old_bytes: Vec<u8>,
    new_bytes: Vec<u8>,
}

impl CompiledRule {
    pub(crate) fn from_parts(old_bytes: Vec<u8>, new_bytes: Vec<u8>) -> Self {
        debug_assert!(!old_bytes.is_empty());
        debug_assert_eq!(old_bytes.len(), new_bytes.len());
        Self {
            old_bytes,
            new_bytes,
        }
    }

    pub fn old_bytes(&self) -> &[u8] {
        &self.old_bytes
    }

    pub fn new_bytes(&self) -> &[u8] {
        &self.new_bytes
    }

    /// Pattern length in bytes (same for both sides).
    pub fn len(&self) -> usize {
        self.old_bytes.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.old_bytes.is_empty()
    }

    /// Replacement leaves the buffer unchanged.
    pub fn is_identity(&self) -> bool {
        self.old_bytes == self.new_bytes
    }

    /// `true` when the replacement itself contains the search pattern.
    ///
    /// In restart mode such a rule never terminates once it matches. With
    /// equal-length sides that only happens for identity rules. A `false`
    /// result does not bound the number of restart passes; use
    /// [`crate::EngineOptions::max_replacements`] for that.
    pub fn is_self_matching(&self) -> bool {
        memchr::memmem::find(&self.new_bytes, &self.old_bytes).is_some()
    }
}

/// Which half of a rule a decode error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSide {
    Old,
    New,
}

impl fmt::Display for RuleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSide::Old => write!(f, "old"),
            RuleSide::New => write!(f, "new"),
        }
    }
}

/// Why a rule could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Old or new hex is empty after normalization
    EmptyPattern,
    /// Invalid hex syntax on one side
    DecodeError { side: RuleSide, message: String },
    /// Decoded sides differ in length
    LengthMismatch { old_len: usize, new_len: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyPattern => write!(f, "old or new hex is empty"),
            SkipReason::DecodeError { side, message } => {
                write!(f, "{side} hex decode failed: {message}")
            }
            SkipReason::LengthMismatch { old_len, new_len } => write!(
                f,
                "old and new length mismatch (old:{old_len}, new:{new_len})"
            ),
        }
    }
}

impl std::error::Error for SkipReason {}

/// Outcome of one input rule. Exactly one per rule, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RuleResult should be reported"]
pub enum RuleResult {
    /// Rule compiled and ran; number of replacements made
    Applied(usize),
    SkippedEmpty,
    SkippedDecodeError { side: RuleSide, message: String },
    SkippedLengthMismatch { old_len: usize, new_len: usize },
    /// Replacement cap was hit before the pattern disappeared
    LimitReached(usize),
}

impl RuleResult {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            RuleResult::SkippedEmpty
                | RuleResult::SkippedDecodeError { .. }
                | RuleResult::SkippedLengthMismatch { .. }
        )
    }

    /// Replacements made by this rule (zero for skipped rules).
    pub fn count(&self) -> usize {
        match self {
            RuleResult::Applied(count) | RuleResult::LimitReached(count) => *count,
            _ => 0,
        }
    }
}

impl From<SkipReason> for RuleResult {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::EmptyPattern => RuleResult::SkippedEmpty,
            SkipReason::DecodeError { side, message } => {
                RuleResult::SkippedDecodeError { side, message }
            }
            SkipReason::LengthMismatch { old_len, new_len } => {
                RuleResult::SkippedLengthMismatch { old_len, new_len }
            }
        }
    }
}

impl fmt::Display for RuleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleResult::Applied(1) => write!(f, "1 replacement"),
            RuleResult::Applied(count) => write!(f, "{count} replacements"),
            RuleResult::SkippedEmpty => write!(f, "{}", SkipReason::EmptyPattern),
            RuleResult::SkippedDecodeError { side, message } => {
                write!(f, "{side} hex decode failed: {message}")
            }
            RuleResult::SkippedLengthMismatch { old_len, new_len } => write!(
                f,
                "old and new length mismatch (old:{old_len}, new:{new_len})"
            ),
            RuleResult::LimitReached(count) => {
                write!(f, "stopped at replacement limit after {count} replacements")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_maps_to_result() {
        assert_eq!(
            RuleResult::from(SkipReason::EmptyPattern),
            RuleResult::SkippedEmpty
        );
        assert_eq!(
            RuleResult::from(SkipReason::LengthMismatch {
                old_len: 1,
                new_len: 2
            }),
            RuleResult::SkippedLengthMismatch {
                old_len: 1,
                new_len: 2
            }
        );
    }

    #[test]
    fn test_result_display() {
        assert_eq!(RuleResult::Applied(1).to_string(), "1 replacement");
        assert_eq!(RuleResult::Applied(3).to_string(), "3 replacements");
        assert_eq!(
            RuleResult::SkippedLengthMismatch {
                old_len: 1,
                new_len: 2
            }
            .to_string(),
            "old and new length mismatch (old:1, new:2)"
        );
        assert_eq!(
            RuleResult::SkippedDecodeError {
                side: RuleSide::New,
                message: "odd number of digits".to_string()
            }
            .to_string(),
            "new hex decode failed: odd number of digits"
        );
    }

    #[test]
    fn test_self_matching_detection() {
        let rule = CompiledRule::from_parts(vec![0xAA, 0xAA], vec![0xAA, 0xAA]);
        assert!(rule.is_self_matching());
        assert!(rule.is_identity());

        let rule = CompiledRule::from_parts(vec![0xAA], vec![0xBB]);
        assert!(!rule.is_self_matching());
        assert!(!rule.is_identity());

        // Moves its match rightwards; not self-matching yet still restarts
        let rule = crate::compiler::compile("00 01", "01 00").unwrap();
        assert!(!rule.is_self_matching());
    }

    #[test]
    fn test_count_and_skipped() {
        assert_eq!(RuleResult::Applied(4).count(), 4);
        assert_eq!(RuleResult::LimitReached(9).count(), 9);
        assert_eq!(RuleResult::SkippedEmpty.count(), 0);
        assert!(RuleResult::SkippedEmpty.is_skipped());
        assert!(!RuleResult::Applied(0).is_skipped());
        assert!(!RuleResult::LimitReached(1).is_skipped());
    }
}
