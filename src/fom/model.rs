//! # File Organization Model
//!
//! A [`FileOrganizationModel`] is one validated schema: an attribute registry,
//! the directory bindings, the format table and the declared parameters of
//! every process.
//!
//! Everything that can be checked without building regexes is checked in
//! [`FileOrganizationModel::from_document`], so a schema that references an
//! undeclared directory or attribute never produces a model. Matchers are
//! built per process on first use and kept for the lifetime of the model; the
//! model owns every compiled pattern and hands out borrows only.
//!
//! The resolvers live next to their concerns: `paths.rs` adds the
//! attributes-to-paths methods, `parse.rs` the path-to-attributes methods.

use crate::attributes::{AttributeDefinition, AttributeRegistry, AttributeValues};
use crate::error::{FomError, Result, SchemaError};
use crate::pattern::{CompiledPattern, DirectoryBinding, Matcher};
use crate::paths::PathCandidate;
use crate::schema::{AcceptedFormat, FormatTable, SchemaDocument};
use once_cell::unsync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One `[pattern, formats, fixed]` rule of a parameter, validated at load.
#[derive(Debug, Clone)]
pub struct RuleDecl {
    pub root: Option<String>,
    /// Expanded pattern, without its `root:` prefix and with fixed values
    /// substituted.
    pub pattern: CompiledPattern,
    pub formats: Vec<String>,
    pub fixed: AttributeValues,
}

/// A parameter as declared in the schema: its rules in declaration order.
#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub name: String,
    pub rules: Vec<RuleDecl>,
}

#[derive(Debug)]
struct ProcessDecl {
    name: String,
    parameters: Vec<ParameterDecl>,
    compiled: OnceCell<CompiledProcess>,
}

/// One `(pattern, extension)` matcher of a rule.
#[derive(Debug)]
pub struct RuleMatcher {
    pub format: Option<AcceptedFormat>,
    pub matcher: Matcher,
}

#[derive(Debug)]
pub struct CompiledRule {
    pub root: Option<String>,
    pub pattern: CompiledPattern,
    pub formats: Vec<AcceptedFormat>,
    pub fixed: AttributeValues,
    pub matchers: Vec<RuleMatcher>,
}

#[derive(Debug)]
pub struct CompiledParameter {
    pub name: String,
    pub rules: Vec<CompiledRule>,
    discriminants: Vec<String>,
}

impl CompiledParameter {
    /// Attribute placeholders of every rule, in order of first appearance,
    /// after directory expansion and fixed substitution.
    pub fn discriminants(&self) -> &[String] {
        &self.discriminants
    }
}

#[derive(Debug)]
pub struct CompiledProcess {
    pub name: String,
    pub parameters: Vec<CompiledParameter>,
    /// `(parameter, rule, matcher)` indices, most specific first. Equal
    /// specificity keeps declaration order.
    order: Vec<(usize, usize, usize)>,
}

impl CompiledProcess {
    pub fn parameter(&self, name: &str) -> Option<&CompiledParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Every matcher of the process, most specific first.
    pub fn rules(
        &self,
    ) -> impl Iterator<Item = (&CompiledParameter, &CompiledRule, &RuleMatcher)> {
        self.order.iter().map(|&(p, r, m)| {
            let parameter = &self.parameters[p];
            let rule = &parameter.rules[r];
            (parameter, rule, &rule.matchers[m])
        })
    }
}

#[derive(Debug)]
pub struct FileOrganizationModel {
    name: String,
    registry: AttributeRegistry,
    directories: BTreeMap<String, DirectoryBinding>,
    formats: FormatTable,
    processes: Vec<ProcessDecl>,
    process_index: HashMap<String, usize>,
}

impl FileOrganizationModel {
    /// Validate `document` and build the model.
    pub fn from_document(name: &str, document: SchemaDocument) -> std::result::Result<Self, SchemaError> {
        let mut registry = AttributeRegistry::new();
        for (attr, spec) in document.attributes.iter() {
            let mut definition = AttributeDefinition::new(attr);
            definition.default = spec.default.clone();
            definition.values = spec.values.clone();
            definition.description = spec.description.clone();
            if let Some(default) = &definition.default {
                if !definition.accepts(default) {
                    return Err(SchemaError::InvalidDefault {
                        attribute: attr.to_string(),
                        default: default.clone(),
                    });
                }
            }
            registry.insert(definition);
        }

        let mut directories = BTreeMap::new();
        for (dir, raw) in document.directories.iter() {
            if registry.contains(dir) {
                return Err(SchemaError::NameCollision(dir.to_string()));
            }
            let binding = DirectoryBinding::parse(dir, raw)?;
            if let Some(undeclared) = binding.attributes().find(|a| !registry.contains(a)) {
                return Err(SchemaError::UndeclaredAttribute {
                    pattern: raw.clone(),
                    name: undeclared.to_string(),
                });
            }
            directories.insert(dir.to_string(), binding);
        }

        let formats = FormatTable::from_document(&document);

        let mut processes = Vec::new();
        let mut process_index = HashMap::new();
        for (process, declared) in document.processes.0 {
            let mut parameters = Vec::new();
            for (parameter, specs) in declared.0 {
                let mut rules = Vec::new();
                for spec in specs.into_vec() {
                    let (raw, formats, fixed) = spec.into_parts();
                    let (root, pattern) = split_root(&raw);

                    let expanded = CompiledPattern::compile(pattern, &directories)?;
                    let undeclared = expanded
                        .attributes()
                        .iter()
                        .chain(fixed.keys())
                        .find(|a| !registry.contains(a));
                    if let Some(undeclared) = undeclared {
                        return Err(SchemaError::UndeclaredAttribute {
                            pattern: raw.clone(),
                            name: undeclared.clone(),
                        });
                    }

                    rules.push(RuleDecl {
                        root: root.map(str::to_string),
                        pattern: expanded.with_fixed(&fixed),
                        formats,
                        fixed,
                    });
                }
                parameters.push(ParameterDecl {
                    name: parameter,
                    rules,
                });
            }
            process_index.insert(process.clone(), processes.len());
            processes.push(ProcessDecl {
                name: process,
                parameters,
                compiled: OnceCell::new(),
            });
        }

        debug!(
            model = name,
            attributes = registry.len(),
            processes = processes.len(),
            "model validated"
        );
        Ok(Self {
            name: name.to_string(),
            registry,
            directories,
            formats,
            processes,
            process_index,
        })
    }

    /// Build a model straight from JSON text.
    pub fn from_json(name: &str, text: &str) -> std::result::Result<Self, SchemaError> {
        Self::from_document(name, SchemaDocument::from_json(name, text)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    pub fn formats(&self) -> &FormatTable {
        &self.formats
    }

    pub fn process_names(&self) -> impl Iterator<Item = &str> {
        self.processes.iter().map(|p| p.name.as_str())
    }

    pub fn has_process(&self, process: &str) -> bool {
        self.process_index.contains_key(process)
    }

    /// Declared parameters of `process`, in declaration order.
    pub fn parameters(&self, process: &str) -> Result<&[ParameterDecl]> {
        Ok(&self.process_decl(process)?.parameters)
    }

    pub fn parameter_names(&self, process: &str) -> Result<Vec<&str>> {
        Ok(self
            .parameters(process)?
            .iter()
            .map(|p| p.name.as_str())
            .collect())
    }

    /// Attribute definitions in registry order. With a process, only the
    /// attributes discriminant for at least one of its parameters.
    pub fn attributes(&self, process: Option<&str>) -> Result<Vec<&AttributeDefinition>> {
        let Some(process) = process else {
            return Ok(self.registry.iter().collect());
        };
        let compiled = self.compiled(process)?;
        Ok(self
            .registry
            .iter()
            .filter(|def| {
                compiled
                    .parameters
                    .iter()
                    .any(|p| p.discriminants().contains(&def.name))
            })
            .collect())
    }

    /// First candidate path of every parameter of `process`. Parameters with
    /// no candidate are left out.
    pub fn process_completion(
        &self,
        process: &str,
        values: &AttributeValues,
    ) -> Result<BTreeMap<String, PathCandidate>> {
        self.process_completion_with_format(process, values, None)
    }

    pub fn process_completion_with_format(
        &self,
        process: &str,
        values: &AttributeValues,
        preferred_format: Option<&str>,
    ) -> Result<BTreeMap<String, PathCandidate>> {
        let compiled = self.compiled(process)?;
        let mut completion = BTreeMap::new();
        for parameter in &compiled.parameters {
            let first = self
                .find_paths(process, &parameter.name, values, preferred_format)?
                .next();
            if let Some(candidate) = first {
                completion.insert(parameter.name.clone(), candidate);
            }
        }
        Ok(completion)
    }

    fn process_decl(&self, process: &str) -> Result<&ProcessDecl> {
        self.process_index
            .get(process)
            .map(|&i| &self.processes[i])
            .ok_or_else(|| FomError::UnknownProcess {
                model: self.name.clone(),
                process: process.to_string(),
            })
    }

    /// Compiled form of `process`, built on first use.
    pub fn compiled(&self, process: &str) -> Result<&CompiledProcess> {
        let decl = self.process_decl(process)?;
        let compiled = decl
            .compiled
            .get_or_try_init(|| self.compile_process(decl))?;
        Ok(compiled)
    }

    fn compile_process(&self, decl: &ProcessDecl) -> std::result::Result<CompiledProcess, SchemaError> {
        debug!(model = %self.name, process = %decl.name, "compiling process");
        let mut parameters = Vec::with_capacity(decl.parameters.len());
        for parameter in &decl.parameters {
            let mut discriminants: Vec<String> = Vec::new();
            let mut rules = Vec::with_capacity(parameter.rules.len());
            for rule in &parameter.rules {
                for name in rule.pattern.attributes() {
                    if !discriminants.contains(name) {
                        discriminants.push(name.clone());
                    }
                }

                let formats = self.formats.accepted(&rule.formats);
                let mut matchers = Vec::with_capacity(formats.len().max(1));
                if formats.is_empty() {
                    matchers.push(RuleMatcher {
                        format: None,
                        matcher: rule.pattern.matcher(None, &self.registry)?,
                    });
                }
                for format in &formats {
                    matchers.push(RuleMatcher {
                        format: Some(format.clone()),
                        matcher: rule
                            .pattern
                            .matcher(Some(format.extension.as_str()), &self.registry)?,
                    });
                }
                rules.push(CompiledRule {
                    root: rule.root.clone(),
                    pattern: rule.pattern.clone(),
                    formats,
                    fixed: rule.fixed.clone(),
                    matchers,
                });
            }
            parameters.push(CompiledParameter {
                name: parameter.name.clone(),
                rules,
                discriminants,
            });
        }

        let mut order: Vec<(usize, usize, usize)> = Vec::new();
        for (p, parameter) in parameters.iter().enumerate() {
            for (r, rule) in parameter.rules.iter().enumerate() {
                order.extend((0..rule.matchers.len()).map(|m| (p, r, m)));
            }
        }
        order.sort_by_key(|&(p, r, m)| {
            std::cmp::Reverse(parameters[p].rules[r].matchers[m].matcher.specificity())
        });

        Ok(CompiledProcess {
            name: decl.name.clone(),
            parameters,
            order,
        })
    }
}

/// Split an optional `root:` prefix off a rule pattern.
fn split_root(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((root, rest))
            if !root.is_empty()
                && root
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
        {
            (Some(root), rest)
        }
        _ => (None, raw),
    }
}
