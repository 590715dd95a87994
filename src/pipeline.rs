//! End-to-end patch pipeline: load, compile, apply, write.
//!
//! This is the boundary between the two error families. Anything that stops
//! the whole run (unreadable config, unreadable input, unwritable output)
//! comes back as [`PipelineError`]. Problems with individual rules never do:
//! they are recorded as [`RuleResult`](crate::rule::RuleResult) values in the
//! [`PatchReport`] and the remaining rules still run.

use crate::compiler::{compile_all, compile_rule};
use crate::config::{load_from_path, ConfigError, PatchConfig};
use crate::engine::{count_occurrences, EngineOptions, PatchEngine};
use crate::io::{read_input, write_output, IoError};
use crate::report::PatchReport;
use crate::rule::{CompiledRule, Rule, SkipReason};
use log::{debug, info};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Buffers and report from one patch pass.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub original: Vec<u8>,
    pub patched: Vec<u8>,
    pub report: PatchReport,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        self.original != self.patched
    }
}

/// Compile `rules` and apply them to `buffer` in order.
pub fn patch_buffer(buffer: &mut [u8], rules: &[Rule], options: EngineOptions) -> PatchReport {
    let input_len = buffer.len();
    let compiled = compile_all(rules);
    let results = PatchEngine::new(options).apply_all(buffer, &compiled);
    PatchReport::new(rules, results, input_len, buffer.len())
}

/// Read the input and patch it in memory without writing anything.
pub fn plan(config: &PatchConfig, options: EngineOptions) -> Result<PatchOutcome, PipelineError> {
    let original = read_input(&config.input_path())?;
    info!(
        "read {} bytes from {}",
        original.len(),
        config.input_path().display()
    );

    let mut patched = original.clone();
    let report = patch_buffer(&mut patched, &config.replacements, options);
    debug!(
        "{} replacements across {} rules",
        report.total_replacements(),
        report.outcomes.len()
    );

    Ok(PatchOutcome {
        original,
        patched,
        report,
    })
}

/// Patch the input and write the result to the configured output path.
pub fn run(config: &PatchConfig, options: EngineOptions) -> Result<PatchOutcome, PipelineError> {
    let outcome = plan(config, options)?;
    write_output(&config.output_path(), &outcome.patched)?;
    info!(
        "wrote {} bytes to {}",
        outcome.patched.len(),
        config.output_path().display()
    );
    Ok(outcome)
}

/// Load a config file and run it.
pub fn run_from_path(
    config_path: impl AsRef<Path>,
    options: EngineOptions,
) -> Result<PatchOutcome, PipelineError> {
    let config = load_from_path(config_path)?;
    run(&config, options)
}

/// Read-only view of how each rule relates to the unpatched input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    /// 1-based position in the config
    pub index: usize,
    pub rule: Rule,
    pub compiled: Result<CompiledRule, SkipReason>,
    /// Non-overlapping occurrences of the old pattern in the original input
    pub occurrences: usize,
}

impl RuleCheck {
    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }
}

/// Compile each rule and count its matches in the input, without patching.
///
/// Counts are taken against the original input, so they do not reflect
/// earlier rules in the list.
pub fn check(config: &PatchConfig) -> Result<Vec<RuleCheck>, PipelineError> {
    let input = read_input(&config.input_path())?;
    Ok(check_buffer(&input, &config.replacements))
}

pub fn check_buffer(input: &[u8], rules: &[Rule]) -> Vec<RuleCheck> {
    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| {
            let compiled = compile_rule(rule);
            let occurrences = compiled
                .as_ref()
                .map(|c| count_occurrences(input, c.old_bytes()))
                .unwrap_or(0);
            RuleCheck {
                index: idx + 1,
                rule: rule.clone(),
                compiled,
                occurrences,
            }
        })
        .collect()
}
