//! Hex rule compilation.
//!
//! Turns a textual [`Rule`] into a [`CompiledRule`] or a definitive
//! [`SkipReason`]. Compilation is pure: it never sees the buffer.
//!
//! Checks run in a fixed order so that a rule always reports the first
//! problem it has:
//!
//! 1. Either side empty (raw or after normalization) → [`SkipReason::EmptyPattern`]
//! 2. Old side fails to decode → [`SkipReason::DecodeError`] tagged [`RuleSide::Old`]
//! 3. New side fails to decode → [`SkipReason::DecodeError`] tagged [`RuleSide::New`]
//! 4. Decoded lengths differ → [`SkipReason::LengthMismatch`]

use crate::rule::{CompiledRule, Rule, RuleSide, SkipReason};
use log::{debug, trace};

/// Strip all whitespace and uppercase the remaining characters.
pub fn normalize_hex(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Decode one normalized side of a rule.
pub fn decode_side(normalized: &str, side: RuleSide) -> Result<Vec<u8>, SkipReason> {
    ::hex::decode(normalized).map_err(|e| SkipReason::DecodeError {
        side,
        message: e.to_string(),
    })
}

/// Compile one rule from its two hex strings.
pub fn compile(old_hex: &str, new_hex: &str) -> Result<CompiledRule, SkipReason> {
    if old_hex.is_empty() || new_hex.is_empty() {
        return Err(SkipReason::EmptyPattern);
    }

    let old_norm = normalize_hex(old_hex);
    let new_norm = normalize_hex(new_hex);
    if old_norm.is_empty() || new_norm.is_empty() {
        return Err(SkipReason::EmptyPattern);
    }
    trace!("normalized rule: {old_norm} -> {new_norm}");

    let old_bytes = decode_side(&old_norm, RuleSide::Old)?;
    let new_bytes = decode_side(&new_norm, RuleSide::New)?;

    if old_bytes.len() != new_bytes.len() {
        return Err(SkipReason::LengthMismatch {
            old_len: old_bytes.len(),
            new_len: new_bytes.len(),
        });
    }

    Ok(CompiledRule::from_parts(old_bytes, new_bytes))
}

/// Compile a single [`Rule`].
pub fn compile_rule(rule: &Rule) -> Result<CompiledRule, SkipReason> {
    compile(&rule.old_hex, &rule.new_hex)
}

/// Compile every rule, preserving input order.
pub fn compile_all(rules: &[Rule]) -> Vec<Result<CompiledRule, SkipReason>> {
    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| {
            let compiled = compile_rule(rule);
            match &compiled {
                Ok(c) => debug!("rule #{} compiled ({} bytes)", idx + 1, c.len()),
                Err(reason) => debug!("rule #{} rejected: {}", idx + 1, reason),
            }
            compiled
        })
        .collect()
}
