//! # Attribute Registry
//!
//! Attributes are the named values (subject, protocol, modality, ...) that
//! parameterize file paths. A model owns one [`AttributeRegistry`] holding the
//! definition of every attribute its patterns may reference.
//!
//! Iteration always follows first-registration order, so listings and
//! selection UIs built on top of the registry are reproducible.
//!
//! ## Merging
//!
//! A process completed with distinct input and output models needs the union
//! of both attribute sets. [`AttributeRegistry::merge`] builds that union and
//! refuses to pick silently between two different defaults: under
//! [`MergePolicy::Strict`] it fails with [`FomError::AmbiguousMerge`], under
//! [`MergePolicy::FirstWins`] it keeps the first default and reports every
//! disagreement as a [`MergeConflict`].

use crate::error::{FomError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Attribute name -> value assignment used for both completion and parsing.
pub type AttributeValues = BTreeMap<String, String>;

/// Definition of a single attribute. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub default: Option<String>,
    /// Closed value domain. `None` means any string is accepted.
    pub values: Option<Vec<String>>,
    pub description: Option<String>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            values: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether `value` lies in this attribute's domain.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.values {
            Some(values) => values.iter().any(|v| v == value),
            None => true,
        }
    }
}

/// How [`AttributeRegistry::merge`] treats two different defaults for the
/// same attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Fail with [`FomError::AmbiguousMerge`].
    #[default]
    Strict,
    /// Keep the default of the registry merged into, and flag the conflict.
    FirstWins,
}

/// A default-value disagreement resolved by [`MergePolicy::FirstWins`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub attribute: String,
    pub kept: Option<String>,
    pub discarded: Option<String>,
}

/// Result of a successful merge.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub registry: AttributeRegistry,
    pub conflicts: Vec<MergeConflict>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    definitions: Vec<AttributeDefinition>,
    index: HashMap<String, usize>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a free-string attribute. Re-registering a name replaces its
    /// definition but keeps its original position.
    pub fn register(&mut self, name: &str, default: Option<&str>) {
        let mut definition = AttributeDefinition::new(name);
        definition.default = default.map(str::to_string);
        self.insert(definition);
    }

    pub fn insert(&mut self, definition: AttributeDefinition) {
        match self.index.get(&definition.name) {
            Some(&position) => self.definitions[position] = definition,
            None => {
                self.index
                    .insert(definition.name.clone(), self.definitions.len());
                self.definitions.push(definition);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    pub fn get_default(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|d| d.default.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Attribute names in first-registration order.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions whose name is in `names`, in registry order.
    pub fn subset<'a, I>(&self, names: I) -> AttributeRegistry
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<&str> = names.into_iter().collect();
        let mut subset = AttributeRegistry::new();
        for definition in &self.definitions {
            if wanted.contains(&definition.name.as_str()) {
                subset.insert(definition.clone());
            }
        }
        subset
    }

    /// Union of `self` and `other`. Attributes only in `other` are appended in
    /// their own order. Value domains of shared attributes are unioned; a
    /// shared attribute that is free in either registry stays free.
    pub fn merge(&self, other: &AttributeRegistry, policy: MergePolicy) -> Result<MergeOutcome> {
        let mut registry = self.clone();
        let mut conflicts = Vec::new();

        for incoming in other.iter() {
            let Some(&position) = registry.index.get(&incoming.name) else {
                registry.insert(incoming.clone());
                continue;
            };
            let existing = &mut registry.definitions[position];

            if existing.default != incoming.default {
                match policy {
                    MergePolicy::Strict => {
                        return Err(FomError::AmbiguousMerge {
                            attribute: incoming.name.clone(),
                            first: existing.default.clone(),
                            second: incoming.default.clone(),
                        });
                    }
                    MergePolicy::FirstWins => conflicts.push(MergeConflict {
                        attribute: incoming.name.clone(),
                        kept: existing.default.clone(),
                        discarded: incoming.default.clone(),
                    }),
                }
            }

            existing.values = match (existing.values.take(), &incoming.values) {
                (Some(mut values), Some(more)) => {
                    for value in more {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                    Some(values)
                }
                _ => None,
            };
            if existing.description.is_none() {
                existing.description = incoming.description.clone();
            }
        }

        Ok(MergeOutcome {
            registry,
            conflicts,
        })
    }
}
