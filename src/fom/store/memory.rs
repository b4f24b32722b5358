use super::{Fragment, ModelLocation, SchemaSource};
use crate::error::{FomError, Result};
use std::path::PathBuf;

/// Schemas held in memory. Models keep insertion order and the same name may
/// be added more than once, like the same file in two search directories.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    models: Vec<(String, Vec<Fragment>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new model made of a single fragment.
    pub fn with_model(mut self, name: &str, text: &str) -> Self {
        self.models.push((
            name.to_string(),
            vec![Fragment {
                key_path: Vec::new(),
                origin: format!("{name}.json"),
                text: text.to_string(),
            }],
        ));
        self
    }

    /// Add a fragment to the last model called `name`, creating it if needed.
    pub fn with_fragment(mut self, name: &str, key_path: &[&str], text: &str) -> Self {
        let index = match self.models.iter().rposition(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.models.push((name.to_string(), Vec::new()));
                self.models.len() - 1
            }
        };
        let fragments = &mut self.models[index].1;
        let mut origin = vec![name.to_string()];
        origin.extend(key_path.iter().map(|k| k.to_string()));
        origin.push(format!("{}.json", fragments.len()));
        fragments.push(Fragment {
            key_path: key_path.iter().map(|k| k.to_string()).collect(),
            origin: origin.join("/"),
            text: text.to_string(),
        });
        self
    }

    fn location_path(index: usize, name: &str) -> PathBuf {
        PathBuf::from(format!("<memory>/{index}/{name}"))
    }
}

impl SchemaSource for MemorySource {
    fn discover(&self) -> Result<Vec<ModelLocation>> {
        Ok(self
            .models
            .iter()
            .enumerate()
            .map(|(index, (name, _))| ModelLocation {
                name: name.clone(),
                path: Self::location_path(index, name),
            })
            .collect())
    }

    fn read_fragments(&self, location: &ModelLocation) -> Result<Vec<Fragment>> {
        self.models
            .iter()
            .enumerate()
            .find(|(index, (name, _))| Self::location_path(*index, name) == location.path)
            .map(|(_, (_, fragments))| fragments.clone())
            .ok_or_else(|| FomError::UnknownModel(location.name.clone()))
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::store::ModelStore;

    /// A small neuroimaging layout used across tests.
    pub const SAMPLE_MODEL: &str = r#"{
        "fom_name": "sample",
        "attributes": {
            "protocol": { "default": "proto", "descr": "study protocol" },
            "subject": { "descr": "subject identifier" },
            "analysis": { "default": "default_analysis" },
            "modality": { "values": ["t1mri", "dwi"], "default": "t1mri" }
        },
        "directories": {
            "bids": "<subject>/anat",
            "session": "<protocol>/<subject>/<modality>"
        },
        "formats": { "NIFTI": ["nii.gz", "nii"], "Analyze": "img" },
        "format_lists": { "images": ["NIFTI", "Analyze"] },
        "processes": {
            "normalize": {
                "t1": ["{bids}/<subject>_T1w", "nii"],
                "output": ["output:{bids}/<analysis>/<subject>_norm", ["nii", "img"]]
            },
            "segment": {
                "input": ["{session}/<subject>", "images"],
                "mask": ["output:{session}/<analysis>/brain_<subject>", "images"],
                "report": ["output:<protocol>/<subject>/report_<subject>", "txt"]
            },
            "empty": {}
        }
    }"#;

    pub fn sample_source() -> MemorySource {
        MemorySource::new().with_model("sample", SAMPLE_MODEL)
    }

    pub fn sample_store() -> ModelStore<MemorySource> {
        ModelStore::new(sample_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_accumulate_on_last_model() {
        let source = MemorySource::new()
            .with_fragment("m", &[], "{}")
            .with_fragment("m", &["processes"], "{}");
        let locations = source.discover().unwrap();
        assert_eq!(locations.len(), 1);

        let fragments = source.read_fragments(&locations[0]).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].key_path, vec!["processes"]);
        assert_eq!(fragments[1].origin, "m/processes/1.json");
    }

    #[test]
    fn duplicate_names_have_distinct_locations() {
        let source = MemorySource::new().with_model("m", "{}").with_model("m", "{}");
        let locations = source.discover().unwrap();
        assert_ne!(locations[0].path, locations[1].path);
    }
}
