//! Patch engine - applies compiled rules to a byte buffer in place
//!
//! Rules run strictly in input order against one mutable buffer, so rule
//! N+1 sees the output of rule N. Replacement is always equal-length: the
//! buffer is borrowed as `&mut [u8]` and can never grow or shrink.
//!
//! # Scan modes
//!
//! [`ScanMode::Restart`] is the default and rescans from offset 0 after
//! every replacement. If a replacement recreates a match (for instance when
//! `new` contains `old`), that loop never ends unless a replacement cap is
//! set in [`EngineOptions::max_replacements`].
//!
//! [`ScanMode::Continue`] resumes the scan just past the replaced span. It
//! always terminates and replaces each non-overlapping occurrence of the
//! original pattern exactly once, which can give different output from
//! restart mode.

use crate::rule::{CompiledRule, RuleResult, SkipReason};
use log::{debug, trace, warn};
use memchr::memmem;
use std::fmt;
use std::str::FromStr;

/// Where the search resumes after a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Rescan from the start of the buffer
    #[default]
    Restart,
    /// Resume immediately after the replaced span
    Continue,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Restart => write!(f, "restart"),
            ScanMode::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(ScanMode::Restart),
            "continue" => Ok(ScanMode::Continue),
            other => Err(format!(
                "unknown scan mode '{other}' (expected 'restart' or 'continue')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    pub mode: ScanMode,
    /// Per-rule replacement cap. `None` means unbounded.
    pub max_replacements: Option<usize>,
}

/// Lowest offset `>= from` at which `needle` occurs in `haystack`.
///
/// An empty needle never matches.
pub fn find_pattern(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    memmem::find(&haystack[from..], needle).map(|idx| idx + from)
}

/// Number of non-overlapping occurrences of `pattern`, scanning left to right.
pub fn count_occurrences(buffer: &[u8], pattern: &[u8]) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    memmem::find_iter(buffer, pattern).count()
}

#[derive(Debug, Clone, Default)]
pub struct PatchEngine {
    options: EngineOptions,
}

impl PatchEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Replace every occurrence of one rule's pattern in `buffer`.
    ///
    /// Only a count is kept, so memory does not grow with the number of
    /// replacements.
    pub fn apply_rule(&self, buffer: &mut [u8], rule: &CompiledRule) -> RuleResult {
        let finder = memmem::Finder::new(rule.old_bytes());
        let width = rule.len();
        let mut count = 0usize;
        let mut from = 0;

        loop {
            let found = finder.find(&buffer[from..]).map(|idx| idx + from);
            let Some(idx) = found else {
                return RuleResult::Applied(count);
            };

            if self.options.max_replacements == Some(count) {
                warn!(
                    "replacement limit of {} reached with a match still pending at offset {:#x}",
                    count, idx
                );
                return RuleResult::LimitReached(count);
            }

            buffer[idx..idx + width].copy_from_slice(rule.new_bytes());
            count += 1;
            trace!("replaced {} bytes at offset {:#x}", width, idx);

            from = match self.options.mode {
                ScanMode::Restart => 0,
                ScanMode::Continue => idx + width,
            };
        }
    }

    /// Apply every rule in order, one [`RuleResult`] per input entry.
    ///
    /// Entries that failed compilation pass through as their skip result
    /// without touching the buffer.
    pub fn apply_all(
        &self,
        buffer: &mut [u8],
        rules: &[Result<CompiledRule, SkipReason>],
    ) -> Vec<RuleResult> {
        rules
            .iter()
            .enumerate()
            .map(|(idx, entry)| match entry {
                Ok(rule) => {
                    let result = self.apply_rule(buffer, rule);
                    debug!("rule #{}: {}", idx + 1, result);
                    result
                }
                Err(reason) => {
                    warn!("rule #{} skipped: {}", idx + 1, reason);
                    RuleResult::from(reason.clone())
                }
            })
            .collect()
    }
}
