//! HexPatch: deterministic rule-driven binary patching
//!
//! Rewrites every occurrence of a byte pattern with a replacement of the
//! same length, driven by an ordered list of hex substitution rules.
//!
//! # Architecture
//!
//! Rules flow through two stages:
//!
//! 1. [`compiler`] turns each textual [`Rule`] into a [`CompiledRule`] or a
//!    [`SkipReason`]. Compilation is pure and never sees the buffer.
//! 2. [`engine::PatchEngine`] applies compiled rules in order to a single
//!    `&mut [u8]`, producing one [`RuleResult`] per input rule.
//!
//! [`pipeline`] wraps both with config loading and file I/O. Fatal problems
//! (unreadable config or input, unwritable output) are `Err` values there;
//! bad rules are only ever reported as data.
//!
//! # Example
//!
//! ```
//! use hexpatch::{patch_buffer, EngineOptions, Rule, RuleResult};
//!
//! let mut buffer = vec![0xDE, 0xAD, 0xBE, 0xEF];
//! let rules = vec![Rule::new("DE AD", "BE EF")];
//! let report = patch_buffer(&mut buffer, &rules, EngineOptions::default());
//!
//! assert_eq!(buffer, vec![0xBE, 0xEF, 0xBE, 0xEF]);
//! assert_eq!(report.outcomes[0].result, RuleResult::Applied(1));
//! ```

pub mod compiler;
pub mod config;
pub mod engine;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod rule;

// Re-exports
pub use compiler::{compile, compile_all, compile_rule, normalize_hex};
pub use config::{load_from_path, load_from_str, ConfigError, ConfigFormat, PatchConfig};
pub use engine::{EngineOptions, PatchEngine, ScanMode};
pub use io::IoError;
pub use pipeline::{check, patch_buffer, plan, run, PatchOutcome, PipelineError, RuleCheck};
pub use report::{PatchReport, RuleOutcome};
pub use rule::{CompiledRule, Rule, RuleResult, RuleSide, SkipReason};
