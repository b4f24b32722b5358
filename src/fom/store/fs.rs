use super::{Fragment, ModelLocation, SchemaSource};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Models found on disk along an ordered search path.
///
/// Each search directory may hold `<name>.json` files and `<name>/`
/// directories of JSON fragments. Fragments in nested subdirectories are
/// merged under the matching key path (`processes/normalize.json` lands under
/// `processes`).
#[derive(Debug, Clone)]
pub struct FsSource {
    search_path: Vec<PathBuf>,
}

impl FsSource {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Every `*.json` file below `dir` with its key path, in sorted order.
fn collect_fragments(dir: &Path, key_path: &[String], out: &mut Vec<(Vec<String>, PathBuf)>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let mut nested = key_path.to_vec();
            nested.push(name);
            collect_fragments(&path, &nested, out)?;
        } else if is_json(&path) {
            out.push((key_path.to_vec(), path));
        }
    }
    Ok(())
}

impl SchemaSource for FsSource {
    fn discover(&self) -> Result<Vec<ModelLocation>> {
        let mut locations = Vec::new();
        for dir in &self.search_path {
            if !dir.is_dir() {
                warn!(path = %dir.display(), "search path entry is not a directory, skipping");
                continue;
            }
            for path in sorted_entries(dir)? {
                let name = if path.is_dir() {
                    let mut fragments = Vec::new();
                    collect_fragments(&path, &[], &mut fragments)?;
                    if fragments.is_empty() {
                        continue;
                    }
                    path.file_name()
                } else if is_json(&path) {
                    path.file_stem()
                } else {
                    continue;
                };
                let Some(name) = name.map(|n| n.to_string_lossy().into_owned()) else {
                    continue;
                };
                debug!(model = %name, path = %path.display(), "found model");
                locations.push(ModelLocation { name, path });
            }
        }
        Ok(locations)
    }

    fn read_fragments(&self, location: &ModelLocation) -> Result<Vec<Fragment>> {
        let mut found = Vec::new();
        if location.path.is_dir() {
            collect_fragments(&location.path, &[], &mut found)?;
        } else {
            found.push((Vec::new(), location.path.clone()));
        }

        found
            .into_iter()
            .map(|(key_path, path)| {
                Ok(Fragment {
                    key_path,
                    origin: path.display().to_string(),
                    text: fs::read_to_string(&path)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FomError, SchemaError};
    use crate::store::ModelStore;
    use tempfile::tempdir;

    #[test]
    fn discovers_files_and_directories() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("alpha.json"), "{}").unwrap();
        fs::write(first.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(first.path().join("empty")).unwrap();
        fs::create_dir_all(second.path().join("beta/processes")).unwrap();
        fs::write(second.path().join("beta/processes/p.json"), "{}").unwrap();
        fs::write(second.path().join("alpha.json"), "{}").unwrap();

        let source = FsSource::new(vec![
            first.path().to_path_buf(),
            first.path().join("missing"),
            second.path().to_path_buf(),
        ]);
        let names: Vec<String> = source.discover().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["alpha", "alpha", "beta"]);

        let mut store = ModelStore::new(source);
        assert_eq!(store.find_models().unwrap(), vec!["alpha", "beta"]);
        assert_eq!(
            store.location("alpha").unwrap().path,
            first.path().join("alpha.json")
        );
    }

    #[test]
    fn nested_fragments_merge_by_key_path() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("m");
        fs::create_dir_all(model.join("processes")).unwrap();
        fs::write(model.join("attributes.json"), r#"{ "attributes": { "subject": {} } }"#).unwrap();
        fs::write(
            model.join("processes").join("normalize.json"),
            r#"{ "normalize": { "t1": ["<subject>_T1w", "nii"] } }"#,
        )
        .unwrap();

        let mut store = ModelStore::new(FsSource::new(vec![dir.path().to_path_buf()]));
        let model = store.get_model("m").unwrap();
        let values = [("subject".to_string(), "s01".to_string())].into_iter().collect();
        let first = model.find_paths("normalize", "t1", &values, None).unwrap().next().unwrap();
        assert_eq!(first.path, "s01_T1w.nii");
    }

    #[test]
    fn conflicting_fragment_files() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("m");
        fs::create_dir(&model).unwrap();
        fs::write(model.join("a.json"), r#"{ "attributes": { "subject": { "default": "s01" } } }"#).unwrap();
        fs::write(model.join("b.json"), r#"{ "attributes": { "subject": { "default": "s02" } } }"#).unwrap();

        let mut store = ModelStore::new(FsSource::new(vec![dir.path().to_path_buf()]));
        match store.get_model("m") {
            Err(FomError::Schema(SchemaError::MergeConflict { key, origin })) => {
                assert_eq!(key, "attributes.subject.default");
                assert!(origin.ends_with("b.json"));
            }
            other => panic!("expected merge conflict, got {:?}", other.map(|m| m.name().to_string())),
        }
    }

    #[test]
    fn malformed_json_reports_origin() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let mut store = ModelStore::new(FsSource::new(vec![dir.path().to_path_buf()]));
        match store.get_model("broken") {
            Err(FomError::Schema(SchemaError::Malformed { origin, .. })) => {
                assert!(origin.ends_with("broken.json"));
            }
            other => panic!("expected malformed schema, got {:?}", other.map(|m| m.name().to_string())),
        }
    }

    #[test]
    fn rescan_forgets_removed_models() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gone.json"), "{}").unwrap();
        let mut store = ModelStore::new(FsSource::new(vec![dir.path().to_path_buf()]));
        store.get_model("gone").unwrap();

        fs::remove_file(dir.path().join("gone.json")).unwrap();
        assert!(store.find_models().unwrap().is_empty());
        assert!(!store.is_loaded("gone"));
        assert!(matches!(store.get_model("gone"), Err(FomError::UnknownModel(_))));
    }
}
