//! Emulator configuration.
//!
//! Compatibility knobs for behavior where DCPU-16 implementations
//! historically disagree. Defaults follow the DCPU-16 1.1 reference.

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// How much of the following instruction a taken skip consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Skip the instruction word and any extra operand words.
    #[default]
    WholeInstruction,
    /// Skip the instruction word only; extra words will run as code.
    InstructionWord,
    /// Only clear the flag. The "skipped" instruction runs on the next step.
    NoFetch,
}

impl std::str::FromStr for SkipPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whole_instruction" | "whole" => Ok(SkipPolicy::WholeInstruction),
            "instruction_word" | "word" => Ok(SkipPolicy::InstructionWord),
            "no_fetch" | "none" => Ok(SkipPolicy::NoFetch),
            other => Err(ConfigError::UnknownSkipPolicy(other.to_string())),
        }
    }
}

/// CPU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub skip_policy: SkipPolicy,

    /// DIV stores `(a / b) * 0xFFFF` instead of the quotient.
    pub legacy_div: bool,
}

impl CpuConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown skip policy: {0}")]
    UnknownSkipPolicy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CpuConfig::default();
        assert_eq!(cfg.skip_policy, SkipPolicy::WholeInstruction);
        assert!(!cfg.legacy_div);
    }

    #[test]
    fn test_partial_json() {
        let cfg = CpuConfig::from_json_str(r#"{ "legacy_div": true }"#).unwrap();
        assert!(cfg.legacy_div);
        assert_eq!(cfg.skip_policy, SkipPolicy::WholeInstruction);

        let cfg = CpuConfig::from_json_str(r#"{ "skip_policy": "no_fetch" }"#).unwrap();
        assert_eq!(cfg.skip_policy, SkipPolicy::NoFetch);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            CpuConfig::from_json_str(r#"{ "skip_policy": "sometimes" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_skip_policy_from_str() {
        assert_eq!("word".parse::<SkipPolicy>().unwrap(), SkipPolicy::InstructionWord);
        assert!("bogus".parse::<SkipPolicy>().is_err());
    }
}
