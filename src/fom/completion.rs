//! # Process Attribute Binding
//!
//! [`ProcessAttributes`] is the typed field set a host program (a form, a
//! pipeline node) edits to complete the paths of one process. Its fields are
//! the discriminant attributes of the process in its input model and its
//! output model, merged under a [`MergePolicy`].
//!
//! Every change is published as an [`AttributeEvent`] on the channels handed
//! out by [`ProcessAttributes::subscribe`]. Closed receivers are dropped on
//! the next publish.
//!
//! ```text
//! set("subject", "s01") --> values --> completion() --> { parameter: path }
//!                      \--> AttributeEvent::Changed to every subscriber
//! ```

use crate::attributes::{AttributeRegistry, AttributeValues, MergeConflict, MergePolicy};
use crate::error::{FomError, Result};
use crate::model::FileOrganizationModel;
use crate::parse::PathMatch;
use crate::paths::PathCandidate;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEvent {
    Changed {
        name: String,
        old: Option<String>,
        new: Option<String>,
    },
}

pub struct ProcessAttributes {
    process: String,
    input: Rc<FileOrganizationModel>,
    output: Rc<FileOrganizationModel>,
    fields: AttributeRegistry,
    values: AttributeValues,
    conflicts: Vec<MergeConflict>,
    subscribers: Vec<Sender<AttributeEvent>>,
}

/// Registry entries discriminant for `process` in `model`, or `None` when the
/// model does not declare the process.
fn process_fields(model: &FileOrganizationModel, process: &str) -> Result<Option<AttributeRegistry>> {
    if !model.has_process(process) {
        return Ok(None);
    }
    let names: Vec<&str> = model
        .attributes(Some(process))?
        .into_iter()
        .map(|d| d.name.as_str())
        .collect();
    Ok(Some(model.registry().subset(names)))
}

impl ProcessAttributes {
    /// Bind `process` to its input and output models. The process must exist
    /// in at least one of them.
    pub fn new(
        input: Rc<FileOrganizationModel>,
        output: Rc<FileOrganizationModel>,
        process: &str,
        policy: MergePolicy,
    ) -> Result<Self> {
        let same = Rc::ptr_eq(&input, &output);
        let input_fields = process_fields(&input, process)?;
        let output_fields = if same {
            None
        } else {
            process_fields(&output, process)?
        };

        let (fields, conflicts) = match (input_fields, output_fields) {
            (Some(a), Some(b)) => {
                let outcome = a.merge(&b, policy)?;
                (outcome.registry, outcome.conflicts)
            }
            (Some(fields), None) | (None, Some(fields)) => (fields, Vec::new()),
            (None, None) => {
                return Err(FomError::UnknownProcess {
                    model: output.name().to_string(),
                    process: process.to_string(),
                })
            }
        };

        let values = fields
            .iter()
            .filter_map(|d| d.default.clone().map(|v| (d.name.clone(), v)))
            .collect();

        debug!(process, fields = fields.len(), conflicts = conflicts.len(), "bound process attributes");
        Ok(Self {
            process: process.to_string(),
            input,
            output,
            fields,
            values,
            conflicts,
            subscribers: Vec::new(),
        })
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Field names in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.all_names().collect()
    }

    pub fn fields(&self) -> &AttributeRegistry {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    /// Default disagreements resolved by [`MergePolicy::FirstWins`].
    pub fn conflicts(&self) -> &[MergeConflict] {
        &self.conflicts
    }

    pub fn subscribe(&mut self) -> Receiver<AttributeEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.check(name)?;
        let old = self.values.insert(name.to_string(), value.to_string());
        self.publish(name, old, Some(value.to_string()));
        Ok(())
    }

    pub fn clear(&mut self, name: &str) -> Result<()> {
        self.check(name)?;
        let old = self.values.remove(name);
        self.publish(name, old, None);
        Ok(())
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.fields.contains(name) {
            Ok(())
        } else {
            Err(FomError::UnknownAttribute(name.to_string()))
        }
    }

    fn publish(&mut self, name: &str, old: Option<String>, new: Option<String>) {
        if old == new {
            return;
        }
        let event = AttributeEvent::Changed {
            name: name.to_string(),
            old,
            new,
        };
        self.subscribers.retain(|s| s.send(event.clone()).is_ok());
    }

    /// First candidate path of every parameter. Output-model parameters take
    /// precedence over input-model parameters of the same name.
    pub fn completion(&self) -> Result<BTreeMap<String, PathCandidate>> {
        let mut completion = BTreeMap::new();
        for model in [&self.output, &self.input] {
            if !model.has_process(&self.process) {
                continue;
            }
            for (parameter, candidate) in model.process_completion(&self.process, &self.values)? {
                completion.entry(parameter).or_insert(candidate);
            }
        }
        Ok(completion)
    }

    /// Parse `path` against the input model, dropping leading components
    /// until a suffix matches, and set every recognized field.
    pub fn update_from_path(&mut self, path: &str) -> Result<Option<PathMatch>> {
        if !self.input.has_process(&self.process) {
            return Ok(None);
        }
        let normalized = path.replace('\\', "/");
        let components: Vec<&str> = normalized.split('/').filter(|c| !c.is_empty()).collect();

        for start in 0..components.len() {
            let suffix = components[start..].join("/");
            let Some(found) = self.input.parse_path(&self.process, &suffix)? else {
                continue;
            };
            debug!(path, suffix = %suffix, parameter = %found.parameter, "path recognized");
            for (name, value) in found.all_attributes() {
                if self.fields.contains(&name) {
                    self.set(&name, &value)?;
                }
            }
            return Ok(Some(found));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::sample_store;
    use crate::store::memory::MemorySource;
    use crate::store::ModelStore;

    fn bound(process: &str) -> ProcessAttributes {
        let mut store = sample_store();
        let model = store.get_model("sample").unwrap();
        ProcessAttributes::new(Rc::clone(&model), model, process, MergePolicy::Strict).unwrap()
    }

    #[test]
    fn fields_are_discriminants_with_defaults() {
        let attrs = bound("normalize");
        assert_eq!(attrs.names(), vec!["subject", "analysis"]);
        assert_eq!(attrs.get("analysis"), Some("default_analysis"));
        assert_eq!(attrs.get("subject"), None);
    }

    #[test]
    fn set_publishes_changes() {
        let mut attrs = bound("normalize");
        let events = attrs.subscribe();

        attrs.set("subject", "s01").unwrap();
        attrs.set("subject", "s01").unwrap();
        attrs.clear("subject").unwrap();

        let received: Vec<AttributeEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                AttributeEvent::Changed {
                    name: "subject".into(),
                    old: None,
                    new: Some("s01".into()),
                },
                AttributeEvent::Changed {
                    name: "subject".into(),
                    old: Some("s01".into()),
                    new: None,
                },
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let mut attrs = bound("normalize");
        drop(attrs.subscribe());
        attrs.set("subject", "s01").unwrap();
        assert!(attrs.subscribers.is_empty());
    }

    #[test]
    fn unknown_field() {
        let mut attrs = bound("normalize");
        assert!(matches!(
            attrs.set("modality", "dwi"),
            Err(FomError::UnknownAttribute(name)) if name == "modality"
        ));
    }

    #[test]
    fn completion_follows_values() {
        let mut attrs = bound("normalize");
        assert!(attrs.completion().unwrap().is_empty());

        attrs.set("subject", "s01").unwrap();
        let completion = attrs.completion().unwrap();
        assert_eq!(completion["t1"].path, "s01/anat/s01_T1w.nii");
        assert_eq!(completion["output"].path, "s01/anat/default_analysis/s01_norm.nii");
    }

    #[test]
    fn update_from_absolute_path() {
        let mut attrs = bound("segment");
        let found = attrs
            .update_from_path("/data/study/proto2/s07/dwi/s07.nii.gz")
            .unwrap()
            .unwrap();
        assert_eq!(found.parameter, "input");
        assert_eq!(attrs.get("protocol"), Some("proto2"));
        assert_eq!(attrs.get("subject"), Some("s07"));
        assert_eq!(attrs.get("modality"), Some("dwi"));

        assert_eq!(attrs.update_from_path("/nowhere/at/all.txt").unwrap(), None);
    }

    #[test]
    fn distinct_models_merge_fields() {
        let source = MemorySource::new()
            .with_model(
                "in",
                r#"{ "attributes": { "subject": { "default": "a" } },
                     "processes": { "p": { "src": ["raw/<subject>", "nii"] } } }"#,
            )
            .with_model(
                "out",
                r#"{ "attributes": { "subject": { "default": "b" }, "analysis": {} },
                     "processes": { "p": { "dst": ["out/<subject>/<analysis>", "nii"] } } }"#,
            );
        let mut store = ModelStore::new(source);
        let input = store.get_model("in").unwrap();
        let output = store.get_model("out").unwrap();

        assert!(matches!(
            ProcessAttributes::new(Rc::clone(&input), Rc::clone(&output), "p", MergePolicy::Strict),
            Err(FomError::AmbiguousMerge { .. })
        ));

        let mut attrs =
            ProcessAttributes::new(input, output, "p", MergePolicy::FirstWins).unwrap();
        assert_eq!(attrs.names(), vec!["subject", "analysis"]);
        assert_eq!(attrs.get("subject"), Some("a"));
        assert_eq!(attrs.conflicts().len(), 1);

        attrs.set("analysis", "x").unwrap();
        let completion = attrs.completion().unwrap();
        assert_eq!(completion["src"].path, "raw/a.nii");
        assert_eq!(completion["dst"].path, "out/a/x.nii");
    }
}
