//! # Schema Documents
//!
//! The on-disk form of a model is a JSON object:
//!
//! ```json
//! {
//!   "fom_import": ["shared-formats"],
//!   "attributes": {
//!     "subject": {},
//!     "modality": { "default": "t1", "values": ["t1", "t2"] }
//!   },
//!   "directories": { "bids": "<subject>/anat" },
//!   "formats": { "NIFTI": ["nii.gz", "nii"], "Analyze": "img" },
//!   "format_lists": { "images": ["NIFTI", "Analyze"] },
//!   "processes": {
//!     "normalize": {
//!       "t1": ["{bids}/<subject>_T1w", "images"],
//!       "mask": ["output:{bids}/<subject>_mask", "nii", { "modality": "t1" }],
//!       "raw": [["raw/<subject>", "nii"], ["legacy/<subject>", "img"]]
//!     }
//!   }
//! }
//! ```
//!
//! A parameter holds one rule or a list of rules. `attribute_definitions`
//! and `shared_patterns` are accepted as other names for `attributes` and
//! `directories`.
//!
//! A model may be split over several fragment files; [`merge_fragment`]
//! deep-merges them. Objects merge key by key, equal leaves are accepted, and
//! two different leaves under the same key are a [`SchemaError::MergeConflict`].
//!
//! Declaration order matters (it breaks specificity ties when parsing paths),
//! so every map is read into an [`OrderedMap`].

use crate::attributes::AttributeValues;
use crate::error::SchemaError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// JSON object read as a list of entries in document order.
#[derive(Debug, Clone)]
pub struct OrderedMap<T>(pub Vec<(String, T)>);

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> OrderedMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = OrderedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    #[serde(default, alias = "default_value")]
    pub default: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default, alias = "descr")]
    pub description: Option<String>,
}

/// One item, or an ordered list of items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T = String> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(name) => vec![name],
            OneOrMany::Many(names) => names,
        }
    }
}

/// `[pattern, formats]` or `[pattern, formats, {fixed attributes}]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    WithAttributes(String, Option<OneOrMany>, AttributeValues),
    Plain(String, Option<OneOrMany>),
}

impl RuleSpec {
    pub fn into_parts(self) -> (String, Vec<String>, AttributeValues) {
        match self {
            RuleSpec::WithAttributes(pattern, formats, fixed) => {
                (pattern, formats.map(OneOrMany::into_vec).unwrap_or_default(), fixed)
            }
            RuleSpec::Plain(pattern, formats) => (
                pattern,
                formats.map(OneOrMany::into_vec).unwrap_or_default(),
                AttributeValues::new(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub fom_name: Option<String>,
    #[serde(default)]
    pub fom_import: Vec<String>,
    #[serde(default, alias = "attribute_definitions")]
    pub attributes: OrderedMap<AttributeSpec>,
    #[serde(default, alias = "shared_patterns")]
    pub directories: OrderedMap<String>,
    #[serde(default)]
    pub formats: OrderedMap<OneOrMany>,
    #[serde(default)]
    pub format_lists: OrderedMap<Vec<String>>,
    /// process -> parameter -> one rule or a list of rules
    #[serde(default)]
    pub processes: OrderedMap<OrderedMap<OneOrMany<RuleSpec>>>,
}

impl SchemaDocument {
    pub fn from_value(origin: &str, value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|source| SchemaError::Malformed {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn from_json(origin: &str, text: &str) -> Result<Self, SchemaError> {
        Self::from_value(origin, parse_fragment(origin, text)?)
    }
}

pub fn parse_fragment(origin: &str, text: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(text).map_err(|source| SchemaError::Malformed {
        origin: origin.to_string(),
        source,
    })
}

/// Merge `fragment` into `target` under `key_path`.
pub fn merge_fragment(
    target: &mut Value,
    key_path: &[String],
    fragment: Value,
    origin: &str,
) -> Result<(), SchemaError> {
    let placed = key_path.iter().rev().fold(fragment, |inner, key| {
        let mut wrapper = Map::new();
        wrapper.insert(key.clone(), inner);
        Value::Object(wrapper)
    });
    let mut path = Vec::new();
    merge_value(target, placed, &mut path, origin)
}

fn merge_value(
    target: &mut Value,
    incoming: Value,
    path: &mut Vec<String>,
    origin: &str,
) -> Result<(), SchemaError> {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                path.push(key.clone());
                match existing.get_mut(&key) {
                    Some(slot) => merge_value(slot, value, path, origin)?,
                    None => {
                        existing.insert(key, value);
                    }
                }
                path.pop();
            }
            Ok(())
        }
        (existing, incoming) if *existing == incoming => Ok(()),
        _ => Err(SchemaError::MergeConflict {
            key: path.join("."),
            origin: origin.to_string(),
        }),
    }
}

/// One accepted file format of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedFormat {
    pub format: String,
    pub extension: String,
}

/// Format name -> extensions, plus named lists of formats.
#[derive(Debug, Clone, Default)]
pub struct FormatTable {
    formats: HashMap<String, Vec<String>>,
    lists: HashMap<String, Vec<String>>,
}

impl FormatTable {
    pub fn from_document(document: &SchemaDocument) -> Self {
        let formats = document
            .formats
            .iter()
            .map(|(name, entry)| {
                let extensions = entry
                    .clone()
                    .into_vec()
                    .into_iter()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect();
                (name.to_string(), extensions)
            })
            .collect();
        let lists = document
            .format_lists
            .iter()
            .map(|(name, members)| (name.to_string(), members.clone()))
            .collect();
        Self { formats, lists }
    }

    /// Extensions of format `name`. A name that is not declared is its own
    /// extension.
    pub fn extensions(&self, name: &str) -> Vec<String> {
        match self.formats.get(name) {
            Some(extensions) => extensions.clone(),
            None => vec![name.trim_start_matches('.').to_string()],
        }
    }

    /// Expand format and format-list names into accepted formats, in declared
    /// order, without duplicate extensions.
    pub fn accepted(&self, names: &[String]) -> Vec<AcceptedFormat> {
        let mut accepted: Vec<AcceptedFormat> = Vec::new();
        let mut push = |format: &str, extension: String| {
            if !accepted.iter().any(|a| a.extension == extension) {
                accepted.push(AcceptedFormat {
                    format: format.to_string(),
                    extension,
                });
            }
        };

        for name in names {
            match self.lists.get(name) {
                Some(members) => {
                    for member in members {
                        for ext in self.extensions(member) {
                            push(member, ext);
                        }
                    }
                }
                None => {
                    for ext in self.extensions(name) {
                        push(name, ext);
                    }
                }
            }
        }
        accepted
    }
}
