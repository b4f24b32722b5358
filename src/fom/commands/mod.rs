use crate::attributes::{AttributeDefinition, AttributeValues};
use crate::config::FomConfig;
use crate::error::{FomError, Result};
use crate::parse::{PathMatch, ScanItem};
use crate::paths::PathCandidate;
use serde::Serialize;
use std::path::PathBuf;

pub mod attributes;
pub mod complete;
pub mod config;
pub mod discriminants;
pub mod models;
pub mod parse;
pub mod scan;

#[derive(Debug, Clone)]
pub struct FomPaths {
    pub config_dir: PathBuf,
    /// Effective model search path, in order
    pub search_path: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub path: PathBuf,
    pub loaded: bool,
}

/// Candidate paths of one parameter, with their root-resolved form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterCompletion {
    pub parameter: String,
    pub candidates: Vec<PathCandidate>,
    pub resolved: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub models: Vec<ModelSummary>,
    pub attributes: Vec<AttributeDefinition>,
    pub discriminants: Vec<String>,
    pub completions: Vec<ParameterCompletion>,
    pub matches: Vec<PathMatch>,
    pub scanned: Vec<ScanItem>,
    pub config: Option<FomConfig>,
    pub search_path: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_models(mut self, models: Vec<ModelSummary>) -> Self {
        self.models = models;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeDefinition>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_discriminants(mut self, discriminants: Vec<String>) -> Self {
        self.discriminants = discriminants;
        self
    }

    pub fn with_completions(mut self, completions: Vec<ParameterCompletion>) -> Self {
        self.completions = completions;
        self
    }

    pub fn with_matches(mut self, matches: Vec<PathMatch>) -> Self {
        self.matches = matches;
        self
    }

    pub fn with_scanned(mut self, scanned: Vec<ScanItem>) -> Self {
        self.scanned = scanned;
        self
    }

    pub fn with_config(mut self, config: FomConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.search_path = search_path;
        self
    }
}

/// Parse `key=value` assignments given on the command line.
pub fn parse_assignments<I: AsRef<str>>(assignments: &[I]) -> Result<AttributeValues> {
    let mut values = AttributeValues::new();
    for assignment in assignments {
        let assignment = assignment.as_ref();
        let (key, value) = assignment
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| FomError::InvalidAssignment(assignment.to_string()))?;
        values.insert(key.trim().to_string(), value.to_string());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments() {
        let values = parse_assignments(&["subject=s01", "analysis=a=b"]).unwrap();
        assert_eq!(values["subject"], "s01");
        assert_eq!(values["analysis"], "a=b");
    }

    #[test]
    fn test_parse_assignments_rejects_bare_words() {
        assert!(parse_assignments(&["subject"]).is_err());
        assert!(parse_assignments(&["=s01"]).is_err());
    }
}
