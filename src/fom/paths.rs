//! Attributes -> paths.
//!
//! [`FileOrganizationModel::find_paths`] substitutes attribute values into
//! each compiled rule of a parameter and yields one [`PathCandidate`] per
//! accepted extension. The iterator borrows the model and holds no other state: asking
//! again with the same inputs yields the same sequence.
//!
//! Missing values are not errors. If an attribute of a rule has neither a
//! value nor a default, or a value falls outside its declared domain, that
//! rule yields nothing.

use crate::attributes::AttributeValues;
use crate::error::{FomError, Result};
use crate::model::{CompiledParameter, CompiledRule, FileOrganizationModel};
use crate::schema::AcceptedFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One candidate file path for a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCandidate {
    /// Path relative to its root, with extension.
    pub path: String,
    /// Root name from a `root:` pattern prefix.
    pub root: Option<String>,
    pub format: Option<String>,
    pub extension: Option<String>,
}

impl PathCandidate {
    /// Absolute path under the named root, or the relative path when the
    /// candidate has no root or the root is unknown.
    pub fn resolve(&self, roots: &BTreeMap<String, PathBuf>) -> PathBuf {
        match self.root.as_ref().and_then(|r| roots.get(r)) {
            Some(base) => base.join(&self.path),
            None => Path::new(&self.path).to_path_buf(),
        }
    }
}

/// Candidates of the rule currently being expanded.
#[derive(Debug, Clone)]
struct RuleCandidates<'m> {
    base: String,
    rule: &'m CompiledRule,
    formats: Vec<&'m AcceptedFormat>,
    position: usize,
}

impl RuleCandidates<'_> {
    fn next(&mut self) -> Option<PathCandidate> {
        let index = self.position;
        self.position += 1;
        if self.formats.is_empty() {
            return (index == 0).then(|| PathCandidate {
                path: self.base.clone(),
                root: self.rule.root.clone(),
                format: None,
                extension: None,
            });
        }
        let format = self.formats.get(index)?;
        Some(PathCandidate {
            path: format!("{}.{}", self.base, format.extension),
            root: self.rule.root.clone(),
            format: Some(format.format.clone()),
            extension: Some(format.extension.clone()),
        })
    }
}

/// Lazy sequence returned by [`FileOrganizationModel::find_paths`]: rule by
/// rule in declaration order, formats in preference order within a rule.
#[derive(Debug, Clone)]
pub struct PathCandidates<'m> {
    model: &'m FileOrganizationModel,
    values: AttributeValues,
    preferred: Option<String>,
    rules: std::slice::Iter<'m, CompiledRule>,
    current: Option<RuleCandidates<'m>>,
}

impl<'m> PathCandidates<'m> {
    /// Fill `rule` from the caller's values, or `None` when it cannot be.
    fn start(&self, rule: &'m CompiledRule) -> Option<RuleCandidates<'m>> {
        let resolved = self
            .model
            .resolve_values(rule.pattern.attributes(), &self.values)?;
        let base = rule.pattern.format(&resolved)?;

        let mut formats: Vec<&AcceptedFormat> = rule.formats.iter().collect();
        if let Some(preferred) = &self.preferred {
            let preferred = preferred.trim_start_matches('.');
            let (first, rest): (Vec<_>, Vec<_>) = formats
                .into_iter()
                .partition(|f| f.format == preferred || f.extension == preferred);
            formats = first.into_iter().chain(rest).collect();
        }
        Some(RuleCandidates {
            base,
            rule,
            formats,
            position: 0,
        })
    }
}

impl Iterator for PathCandidates<'_> {
    type Item = PathCandidate;

    fn next(&mut self) -> Option<PathCandidate> {
        loop {
            if let Some(candidate) = self.current.as_mut().and_then(RuleCandidates::next) {
                return Some(candidate);
            }
            let rule = self.rules.next()?;
            self.current = self.start(rule);
        }
    }
}

impl FileOrganizationModel {
    fn compiled_parameter(&self, process: &str, parameter: &str) -> Result<&CompiledParameter> {
        self.compiled(process)?
            .parameter(parameter)
            .ok_or_else(|| FomError::UnknownParameter {
                process: process.to_string(),
                parameter: parameter.to_string(),
            })
    }

    /// Attributes that appear in the expanded pattern of `parameter`.
    pub fn find_discriminant_attributes(&self, process: &str, parameter: &str) -> Result<&[String]> {
        Ok(self.compiled_parameter(process, parameter)?.discriminants())
    }

    /// Values used for completion: supplied non-empty values first, then
    /// registry defaults, restricted to the discriminant attributes.
    ///
    /// Returns `None` when an attribute cannot be filled.
    pub fn resolve_values(
        &self,
        discriminants: &[String],
        values: &AttributeValues,
    ) -> Option<AttributeValues> {
        let mut resolved = AttributeValues::new();
        for name in discriminants {
            let supplied = values.get(name).map(String::as_str).filter(|v| !v.is_empty());
            let Some(value) = supplied.or_else(|| self.registry().get_default(name)) else {
                debug!(attribute = %name, "no value and no default");
                return None;
            };
            if value.contains('/') {
                debug!(attribute = %name, value, "value spans a path separator");
                return None;
            }
            if let Some(definition) = self.registry().get(name) {
                if !definition.accepts(value) {
                    debug!(attribute = %name, value, "value outside declared domain");
                    return None;
                }
            }
            resolved.insert(name.clone(), value.to_string());
        }
        Some(resolved)
    }

    /// Candidate paths for `parameter` of `process`.
    ///
    /// Rules are tried in declaration order; a rule whose attributes cannot
    /// all be filled contributes nothing. Within a rule, the caller's
    /// `preferred_format` (a format name or an extension) comes first when it
    /// is accepted, then the remaining formats in declared order.
    pub fn find_paths(
        &self,
        process: &str,
        parameter: &str,
        values: &AttributeValues,
        preferred_format: Option<&str>,
    ) -> Result<PathCandidates<'_>> {
        let compiled = self.compiled_parameter(process, parameter)?;
        Ok(PathCandidates {
            model: self,
            values: values.clone(),
            preferred: preferred_format.map(str::to_string),
            rules: compiled.rules.iter(),
            current: None,
        })
    }
}
