use fom::attributes::{AttributeValues, MergePolicy};
use fom::completion::ProcessAttributes;
use fom::error::{FomError, SchemaError};
use fom::listing::memory::MemoryListing;
use fom::model::FileOrganizationModel;
use fom::parse::ScanOptions;
use fom::store::fs::FsSource;
use fom::store::ModelStore;
use std::fs;
use std::path::Path;
use std::rc::Rc;

const LAYOUT: &str = r#"{
    "fom_name": "layout",
    "attributes": {
        "center": { "default": "main" },
        "subject": {},
        "modality": { "values": ["t1mri", "dwi"], "default": "t1mri" },
        "analysis": { "default": "default_analysis" }
    },
    "directories": { "acq": "<center>/<subject>/<modality>" },
    "formats": { "NIFTI": ["nii.gz", "nii"], "GIS": "ima" },
    "format_lists": { "volumes": ["NIFTI", "GIS"] },
    "processes": {
        "morpho": {
            "t1": ["{acq}/<subject>", "volumes"],
            "mask": ["output:{acq}/<analysis>/brain_<subject>", "volumes"],
            "log": ["output:<center>/<subject>/<analysis>/morpho", "txt"]
        }
    }
}"#;

fn values(pairs: &[(&str, &str)]) -> AttributeValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn layout() -> FileOrganizationModel {
    FileOrganizationModel::from_json("layout", LAYOUT).unwrap()
}

#[test]
fn completed_paths_parse_back_to_their_attributes() {
    let model = layout();
    let input = values(&[("subject", "s01"), ("modality", "dwi"), ("analysis", "a1")]);

    for parameter in ["t1", "mask", "log"] {
        let candidates: Vec<_> = model
            .find_paths("morpho", parameter, &input, None)
            .unwrap()
            .collect();
        assert!(!candidates.is_empty(), "no candidate for {}", parameter);

        for candidate in candidates {
            let found = model
                .parse_path("morpho", &candidate.path)
                .unwrap()
                .unwrap_or_else(|| panic!("{} not recognized", candidate.path));
            assert_eq!(found.parameter, parameter);
            assert_eq!(found.extension, candidate.extension);
            for (name, value) in &found.attributes {
                let expected = input
                    .get(name)
                    .map(String::as_str)
                    .or_else(|| model.registry().get_default(name));
                assert_eq!(Some(value.as_str()), expected, "attribute {}", name);
            }
        }
    }
}

#[test]
fn format_list_order_and_preference() {
    let model = layout();
    let input = values(&[("subject", "s01")]);
    let paths: Vec<String> = model
        .find_paths("morpho", "t1", &input, None)
        .unwrap()
        .map(|c| c.path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "main/s01/t1mri/s01.nii.gz",
            "main/s01/t1mri/s01.nii",
            "main/s01/t1mri/s01.ima"
        ]
    );

    let first = model
        .find_paths("morpho", "t1", &input, Some("GIS"))
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(first.path, "main/s01/t1mri/s01.ima");
    assert_eq!(first.format.as_deref(), Some("GIS"));
}

#[test]
fn scan_finds_every_generated_path() {
    let model = layout();
    let mut generated = Vec::new();
    for subject in ["s01", "s02"] {
        for modality in ["t1mri", "dwi"] {
            let input = values(&[("subject", subject), ("modality", modality)]);
            for parameter in ["t1", "mask", "log"] {
                generated.extend(
                    model
                        .find_paths("morpho", parameter, &input, None)
                        .unwrap()
                        .map(|c| c.path),
                );
            }
        }
    }
    let mut listed = generated.clone();
    listed.push("main/s01/notes.md".to_string());
    let listing = MemoryListing::from_paths(listed.iter().map(String::as_str));

    let mut scanned: Vec<String> = model
        .parse_directory(Some("morpho"), &listing, ScanOptions::default())
        .unwrap()
        .map(|item| item.unwrap().path)
        .collect();
    scanned.sort();
    scanned.dedup();
    generated.sort();
    generated.dedup();
    assert_eq!(scanned, generated);
}

#[test]
fn empty_model_loads_without_processes() {
    let model = FileOrganizationModel::from_json("empty", "{}").unwrap();
    assert!(model.process_names().next().is_none());
    assert!(matches!(
        model.find_paths("any", "thing", &AttributeValues::new(), None),
        Err(FomError::UnknownProcess { .. })
    ));
}

#[test]
fn split_schema_conflict_names_the_fragment() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("foms");
    write(&root.join("split/base.json"), LAYOUT);
    write(
        &root.join("split/override.json"),
        r#"{ "attributes": { "center": { "default": "other" } } }"#,
    );

    let mut store = ModelStore::new(FsSource::new(vec![root]));
    match store.get_model("split") {
        Err(FomError::Schema(SchemaError::MergeConflict { key, origin })) => {
            assert_eq!(key, "attributes.center.default");
            assert!(origin.ends_with("override.json"), "origin was {}", origin);
        }
        other => panic!("expected a merge conflict, got {:?}", other.map(|m| m.name().to_string())),
    }
}

#[test]
fn earlier_search_directory_shadows_later_one() {
    let temp = tempfile::tempdir().unwrap();
    let first = temp.path().join("first");
    let second = temp.path().join("second");
    write(&first.join("layout.json"), LAYOUT);
    write(&second.join("layout.json"), "{}");
    write(&second.join("extra.json"), "{}");

    let mut store = ModelStore::new(FsSource::new(vec![first, second]));
    assert_eq!(store.find_models().unwrap(), vec!["layout", "extra"]);
    let model = store.get_model("layout").unwrap();
    assert!(model.has_process("morpho"));
    assert!(Rc::ptr_eq(&model, &store.get_model("layout").unwrap()));
}

#[test]
fn process_attributes_complete_from_a_parsed_path() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("foms");
    write(&root.join("layout.json"), LAYOUT);
    let mut store = ModelStore::new(FsSource::new(vec![root]));
    let model = store.get_model("layout").unwrap();

    let mut attrs =
        ProcessAttributes::new(Rc::clone(&model), model, "morpho", MergePolicy::Strict).unwrap();
    attrs
        .update_from_path("/mnt/data/main/s07/dwi/s07.nii")
        .unwrap()
        .unwrap();
    assert_eq!(attrs.get("subject"), Some("s07"));
    assert_eq!(attrs.get("modality"), Some("dwi"));

    let completion = attrs.completion().unwrap();
    assert_eq!(
        completion["mask"].path,
        "main/s07/dwi/default_analysis/brain_s07.nii.gz"
    );
    assert_eq!(completion["mask"].root.as_deref(), Some("output"));
}
