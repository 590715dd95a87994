use crate::rule::Rule;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    #[serde(default)]
    pub input_file: String,
    #[serde(default)]
    pub output_file: String,
    #[serde(default)]
    pub replacements: Vec<Rule>,
}

impl PatchConfig {
    /// Check the fields a run cannot proceed without.
    ///
    /// Rule contents are deliberately left alone: a malformed rule is
    /// skipped at patch time and reported, it never rejects the config.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.input_file.trim().is_empty() {
            issues.push(ValidationIssue::MissingField { field: "input_file" });
        }
        if self.output_file.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "output_file",
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_file)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "config missing required field '{field}'")
            }
        }
    }
}
