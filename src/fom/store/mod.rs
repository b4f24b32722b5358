//! # Model Store
//!
//! The store maps model names to [`FileOrganizationModel`]s. Where the schema
//! text comes from is abstracted behind the [`SchemaSource`] trait:
//!
//! - [`fs::FsSource`]: an ordered search path of directories
//! - [`memory::MemorySource`]: schemas held in memory, for tests
//!
//! ## Discovery
//!
//! [`ModelStore::find_models`] asks the source for every model location, in
//! search-path order. When two locations share a name the first one wins.
//! Every call re-scans the source.
//!
//! ## Loading
//!
//! [`ModelStore::get_model`] builds a model on first access and hands out the
//! same `Rc` afterwards, so two lookups of one name are pointer-equal:
//!
//! ```text
//! fragments (sorted) --deep merge--> document --+
//! fom_import models  --deep merge-------------- +--> SchemaDocument --> FileOrganizationModel
//! ```
//!
//! Any merge conflict, malformed fragment, bad import or schema violation
//! aborts the load; nothing is cached for that name.
//!
//! The store is single-threaded (`Rc`, `&mut self`). Hosts that share it
//! across threads serialize access themselves.

use crate::error::{FomError, Result, SchemaError};
use crate::model::FileOrganizationModel;
use crate::schema::{merge_fragment, parse_fragment, SchemaDocument};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

pub mod fs;
pub mod memory;

/// Where a model's schema lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelLocation {
    pub name: String,
    pub path: PathBuf,
}

/// One JSON fragment of a model, placed under `key_path` in the merged
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub key_path: Vec<String>,
    pub origin: String,
    pub text: String,
}

/// Abstract source of model schemas.
pub trait SchemaSource {
    /// Every model location, in search order. Names may repeat.
    fn discover(&self) -> Result<Vec<ModelLocation>>;

    /// Fragments of one model, in merge order.
    fn read_fragments(&self, location: &ModelLocation) -> Result<Vec<Fragment>>;
}

pub struct ModelStore<S: SchemaSource> {
    source: S,
    locations: Option<Vec<ModelLocation>>,
    models: HashMap<String, Rc<FileOrganizationModel>>,
}

impl<S: SchemaSource> ModelStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            locations: None,
            models: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Re-scan the source and return model names in search order.
    pub fn find_models(&mut self) -> Result<Vec<String>> {
        let locations = self.scan()?;
        Ok(locations.iter().map(|l| l.name.clone()).collect())
    }

    /// Discovered locations, scanning only if nothing was discovered yet.
    pub fn locations(&mut self) -> Result<&[ModelLocation]> {
        if self.locations.is_none() {
            self.scan()?;
        }
        Ok(self.locations.as_deref().unwrap_or_default())
    }

    pub fn location(&mut self, name: &str) -> Result<ModelLocation> {
        self.locations()?
            .iter()
            .find(|l| l.name == name)
            .cloned()
            .ok_or_else(|| FomError::UnknownModel(name.to_string()))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    fn scan(&mut self) -> Result<&[ModelLocation]> {
        let mut seen = HashSet::new();
        let mut locations = Vec::new();
        for location in self.source.discover()? {
            if seen.insert(location.name.clone()) {
                locations.push(location);
            } else {
                debug!(model = %location.name, path = %location.path.display(), "shadowed by earlier search path entry");
            }
        }
        self.models.retain(|name, _| seen.contains(name));
        info!(count = locations.len(), "models discovered");
        let stored = self.locations.insert(locations);
        Ok(stored.as_slice())
    }

    /// The model called `name`, built on first access.
    pub fn get_model(&mut self, name: &str) -> Result<Rc<FileOrganizationModel>> {
        if let Some(model) = self.models.get(name) {
            return Ok(Rc::clone(model));
        }

        let mut stack = Vec::new();
        let document = self.load_document(name, &mut stack)?;
        let document = SchemaDocument::from_value(name, document)?;
        let model = Rc::new(FileOrganizationModel::from_document(name, document)?);
        info!(model = name, "model loaded");
        self.models.insert(name.to_string(), Rc::clone(&model));
        Ok(model)
    }

    /// Merged JSON document of `name`, imports included.
    fn load_document(&mut self, name: &str, stack: &mut Vec<String>) -> Result<Value> {
        if stack.iter().any(|n| n == name) {
            return Err(SchemaError::ImportCycle(name.to_string()).into());
        }
        let location = self.location(name)?;
        stack.push(name.to_string());

        let mut own = Value::Object(Map::new());
        for fragment in self.source.read_fragments(&location)? {
            debug!(model = name, origin = %fragment.origin, "merging fragment");
            let value = parse_fragment(&fragment.origin, &fragment.text)?;
            merge_fragment(&mut own, &fragment.key_path, value, &fragment.origin)?;
        }

        let imports: Vec<String> = match own.get("fom_import") {
            Some(value) => serde_json::from_value(value.clone()).map_err(|source| {
                SchemaError::Malformed {
                    origin: location.path.display().to_string(),
                    source,
                }
            })?,
            None => Vec::new(),
        };

        let mut document = Value::Object(Map::new());
        for import in &imports {
            let mut imported = match self.load_document(import, stack) {
                Err(FomError::UnknownModel(_)) => {
                    return Err(SchemaError::UnknownImport {
                        model: name.to_string(),
                        import: import.clone(),
                    }
                    .into())
                }
                other => other?,
            };
            if let Value::Object(map) = &mut imported {
                map.remove("fom_import");
                map.remove("fom_name");
            }
            merge_fragment(&mut document, &[], imported, import)?;
        }
        merge_fragment(&mut document, &[], own, name)?;

        stack.pop();
        Ok(document)
    }
}
