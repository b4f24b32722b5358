//! Paths -> attributes.
//!
//! A path is tried against every rule of a process, most specific first. The
//! first rule whose matcher captures the path (and reproduces it exactly when
//! the captured values are formatted back) wins. A path that matches nothing
//! is `Ok(None)`, never an error.
//!
//! [`FileOrganizationModel::parse_directory`] applies the same matching to a
//! whole tree. It is an iterator: directories are listed only when the scan
//! reaches them, and dropping the iterator stops the walk. Directories that no
//! pattern can reach are not descended into.

use crate::attributes::AttributeValues;
use crate::error::Result;
use crate::listing::{join, DirectoryListing, EntryStatus};
use crate::model::{
    CompiledParameter, CompiledProcess, CompiledRule, FileOrganizationModel, RuleMatcher,
};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// A path recognized by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMatch {
    pub process: String,
    pub parameter: String,
    pub root: Option<String>,
    pub format: Option<String>,
    pub extension: Option<String>,
    /// Values captured from the path.
    pub attributes: AttributeValues,
    /// Values fixed by the rule itself.
    pub fixed: AttributeValues,
}

impl PathMatch {
    /// Captured and fixed values together.
    pub fn all_attributes(&self) -> AttributeValues {
        let mut all = self.fixed.clone();
        all.extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Also yield entries no rule recognizes, and walk every directory.
    pub include_unknown: bool,
    /// Yield every matching rule of an entry instead of the first.
    pub all_matches: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanItem {
    pub path: String,
    pub status: EntryStatus,
    pub recognized: Option<PathMatch>,
}

#[derive(Clone, Copy)]
struct Rule<'m> {
    process: &'m CompiledProcess,
    parameter: &'m CompiledParameter,
    rule: &'m CompiledRule,
    matcher: &'m RuleMatcher,
}

impl Rule<'_> {
    fn apply(&self, path: &str) -> Option<PathMatch> {
        let attributes = self.matcher.matcher.captures(path)?;
        Some(PathMatch {
            process: self.process.name.clone(),
            parameter: self.parameter.name.clone(),
            root: self.rule.root.clone(),
            format: self.matcher.format.as_ref().map(|f| f.format.clone()),
            extension: self.matcher.format.as_ref().map(|f| f.extension.clone()),
            attributes,
            fixed: self.rule.fixed.clone(),
        })
    }
}

/// Strip `./`, trailing slashes and backslashes from a caller path.
fn normalize(path: &str) -> String {
    let mut path = path.replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    path.trim_end_matches('/').to_string()
}

impl FileOrganizationModel {
    /// Rules of one process, or of every process, most specific first.
    fn rules_for(&self, process: Option<&str>) -> Result<Vec<Rule<'_>>> {
        let processes: Vec<&CompiledProcess> = match process {
            Some(process) => vec![self.compiled(process)?],
            None => self
                .process_names()
                .map(|name| self.compiled(name))
                .collect::<Result<_>>()?,
        };

        let mut rules: Vec<Rule<'_>> = processes
            .into_iter()
            .flat_map(|process| {
                process.rules().map(move |(parameter, rule, matcher)| Rule {
                    process,
                    parameter,
                    rule,
                    matcher,
                })
            })
            .collect();
        rules.sort_by_key(|r| std::cmp::Reverse(r.matcher.matcher.specificity()));
        Ok(rules)
    }

    /// Attributes recovered from `path` by the most specific matching rule
    /// of `process`.
    pub fn parse_path(&self, process: &str, path: &str) -> Result<Option<PathMatch>> {
        let path = normalize(path);
        Ok(self
            .rules_for(Some(process))?
            .iter()
            .find_map(|rule| rule.apply(&path)))
    }

    /// Like [`parse_path`](Self::parse_path), trying every process.
    pub fn parse_path_any(&self, path: &str) -> Result<Option<PathMatch>> {
        let path = normalize(path);
        Ok(self.rules_for(None)?.iter().find_map(|rule| rule.apply(&path)))
    }

    /// Every rule matching `path`, most specific first.
    pub fn parse_path_all(&self, process: Option<&str>, path: &str) -> Result<Vec<PathMatch>> {
        let path = normalize(path);
        Ok(self
            .rules_for(process)?
            .iter()
            .filter_map(|rule| rule.apply(&path))
            .collect())
    }

    /// Walk `listing` and yield every entry a rule recognizes.
    pub fn parse_directory<L: DirectoryListing>(
        &self,
        process: Option<&str>,
        listing: L,
        options: ScanOptions,
    ) -> Result<DirectoryScan<'_, L>> {
        let rules = self.rules_for(process)?;
        debug!(model = %self.name(), rules = rules.len(), "starting directory scan");
        Ok(DirectoryScan {
            rules,
            listing,
            options,
            queue: VecDeque::from([String::new()]),
            pending: VecDeque::new(),
        })
    }
}

/// Lazy breadth-first scan returned by
/// [`FileOrganizationModel::parse_directory`].
pub struct DirectoryScan<'m, L> {
    rules: Vec<Rule<'m>>,
    listing: L,
    options: ScanOptions,
    queue: VecDeque<String>,
    pending: VecDeque<ScanItem>,
}

impl<L: DirectoryListing> DirectoryScan<'_, L> {
    fn visit(&mut self, dir: &str) -> Result<()> {
        for entry in self.listing.list(dir)? {
            let path = join(dir, &entry.name);

            let mut matches = self.rules.iter().filter_map(|rule| rule.apply(&path));
            let recognized: Vec<_> = if self.options.all_matches {
                matches.collect()
            } else {
                matches.next().into_iter().collect()
            };

            if entry.status.is_dir() {
                let reachable = self.rules.iter().any(|r| r.matcher.matcher.may_contain(&path));
                if self.options.include_unknown || reachable {
                    self.queue.push_back(path.clone());
                } else {
                    trace!(dir = %path, "pruned");
                }
            }

            if recognized.is_empty() {
                if self.options.include_unknown {
                    self.pending.push_back(ScanItem {
                        path,
                        status: entry.status,
                        recognized: None,
                    });
                }
                continue;
            }
            for found in recognized {
                self.pending.push_back(ScanItem {
                    path: path.clone(),
                    status: entry.status,
                    recognized: Some(found),
                });
            }
        }
        Ok(())
    }
}

impl<L: DirectoryListing> Iterator for DirectoryScan<'_, L> {
    type Item = Result<ScanItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            let dir = self.queue.pop_front()?;
            if let Err(e) = self.visit(&dir) {
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FomError;
    use crate::listing::memory::MemoryListing;

    const MODEL: &str = r#"{
        "attributes": {
            "protocol": { "default": "proto" },
            "subject": {},
            "acquisition": { "default": "default_acquisition" },
            "modality": { "values": ["t1mri", "dwi"] }
        },
        "directories": { "acq": "<protocol>/<subject>/<modality>/<acquisition>" },
        "formats": { "NIFTI": ["nii.gz", "nii"] },
        "processes": {
            "morphologist": {
                "t1mri": ["{acq}/<subject>", "NIFTI"],
                "mask": ["{acq}/brain_<subject>", "NIFTI"],
                "fixed": ["<protocol>/<subject>/<modality>/<acquisition>/fixed_<subject>", "nii", { "modality": "t1mri" }]
            },
            "report": {
                "sheet": ["<protocol>/<subject>/report", "txt"]
            }
        }
    }"#;

    fn model() -> FileOrganizationModel {
        FileOrganizationModel::from_json("m", MODEL).unwrap()
    }

    #[test]
    fn parses_attributes_back() {
        let model = model();
        let found = model
            .parse_path("morphologist", "proto/s01/t1mri/acq1/s01.nii.gz")
            .unwrap()
            .unwrap();
        assert_eq!(found.parameter, "t1mri");
        assert_eq!(found.format.as_deref(), Some("NIFTI"));
        assert_eq!(found.extension.as_deref(), Some("nii.gz"));
        assert_eq!(found.attributes["subject"], "s01");
        assert_eq!(found.attributes["acquisition"], "acq1");
        assert_eq!(found.attributes["modality"], "t1mri");
    }

    #[test]
    fn most_specific_rule_wins() {
        let model = model();
        // "{acq}/<subject>" would need subject = "brain_s01" in the last
        // component and "s01" in the second
        let found = model
            .parse_path("morphologist", "proto/s01/t1mri/acq1/brain_s01.nii")
            .unwrap()
            .unwrap();
        assert_eq!(found.parameter, "mask");
        assert_eq!(found.attributes["subject"], "s01");
    }

    #[test]
    fn every_rule_of_a_parameter_is_ranked() {
        let model = FileOrganizationModel::from_json(
            "m",
            r#"{ "attributes": { "subject": {}, "session": {} },
                 "processes": { "p": { "t1": [
                     ["input:raw/<subject>", "nii"],
                     ["output:raw/<subject>_<session>", "nii", { "session": "a" }]
                 ] } } }"#,
        )
        .unwrap();

        let found = model.parse_path("p", "raw/s01_a.nii").unwrap().unwrap();
        assert_eq!(found.root.as_deref(), Some("output"));
        assert_eq!(found.attributes["subject"], "s01");
        assert_eq!(found.fixed["session"], "a");

        let all = model.parse_path_all(Some("p"), "raw/s01_a.nii").unwrap();
        let roots: Vec<Option<&str>> = all.iter().map(|m| m.root.as_deref()).collect();
        assert_eq!(roots, vec![Some("output"), Some("input")]);
        assert_eq!(all[1].attributes["subject"], "s01_a");

        let first = model.parse_path("p", "raw/s02.nii").unwrap().unwrap();
        assert_eq!(first.root.as_deref(), Some("input"));
    }

    #[test]
    fn fixed_attributes_reported_separately() {
        let model = model();
        let found = model
            .parse_path("morphologist", "proto/s01/t1mri/acq1/fixed_s01.nii")
            .unwrap()
            .unwrap();
        assert_eq!(found.parameter, "fixed");
        assert!(!found.attributes.contains_key("modality"));
        assert_eq!(found.fixed["modality"], "t1mri");
        assert_eq!(found.all_attributes()["modality"], "t1mri");
    }

    #[test]
    fn non_matching_paths_are_none() {
        let model = model();
        assert_eq!(model.parse_path("morphologist", "proto/s01/t1mri/acq1/s01.img").unwrap(), None);
        assert_eq!(model.parse_path("morphologist", "elsewhere.nii").unwrap(), None);
        // out of domain
        assert_eq!(model.parse_path("morphologist", "proto/s01/flair/acq1/s01.nii").unwrap(), None);
        assert!(matches!(
            model.parse_path("nope", "x"),
            Err(FomError::UnknownProcess { .. })
        ));
    }

    #[test]
    fn normalizes_caller_paths() {
        let model = model();
        assert!(model.parse_path("report", "./proto/s01/report.txt").unwrap().is_some());
        assert!(model.parse_path("report", "proto\\s01\\report.txt").unwrap().is_some());
    }

    #[test]
    fn parse_path_any_tries_every_process() {
        let model = model();
        let found = model.parse_path_any("proto/s01/report.txt").unwrap().unwrap();
        assert_eq!(found.process, "report");
        assert_eq!(found.parameter, "sheet");
    }

    #[test]
    fn round_trip_through_find_paths() {
        let model = model();
        let mut values = AttributeValues::new();
        values.insert("subject".into(), "s07".into());
        values.insert("modality".into(), "dwi".into());

        for parameter in ["t1mri", "mask"] {
            let first = model
                .find_paths("morphologist", parameter, &values, None)
                .unwrap()
                .next()
                .unwrap();
            let found = model.parse_path("morphologist", &first.path).unwrap().unwrap();
            assert_eq!(found.parameter, parameter);

            let discriminants = model
                .find_discriminant_attributes("morphologist", parameter)
                .unwrap();
            let expected = model.resolve_values(discriminants, &values).unwrap();
            assert_eq!(found.attributes, expected);
        }
    }

    #[test]
    fn scan_yields_only_recognized_entries() {
        let model = model();
        let listing = MemoryListing::from_paths([
            "proto/s01/t1mri/acq1/s01.nii",
            "proto/s01/t1mri/acq1/brain_s01.nii.gz",
            "proto/s01/t1mri/acq1/notes.txt",
            "proto/s01/report.txt",
            "proto/s02/dwi/acq1/s02.nii",
            "proto/s02/junk/deep/file.nii",
            "stray.nii",
        ]);

        let items: Vec<ScanItem> = model
            .parse_directory(None, &listing, ScanOptions::default())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let paths: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "proto/s01/report.txt",
                "proto/s01/t1mri/acq1/brain_s01.nii.gz",
                "proto/s01/t1mri/acq1/s01.nii",
                "proto/s02/dwi/acq1/s02.nii",
            ]
        );
        assert!(items.iter().all(|i| i.recognized.is_some()));
    }

    #[test]
    fn scan_with_unknown_entries() {
        let model = model();
        let listing = MemoryListing::from_paths(["proto/s01/report.txt", "stray.nii"]);
        let items: Vec<ScanItem> = model
            .parse_directory(
                Some("report"),
                &listing,
                ScanOptions {
                    include_unknown: true,
                    all_matches: false,
                },
            )
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let unknown: Vec<&str> = items
            .iter()
            .filter(|i| i.recognized.is_none())
            .map(|i| i.path.as_str())
            .collect();
        assert_eq!(unknown, vec!["proto", "stray.nii", "proto/s01"]);
        assert_eq!(items.iter().filter(|i| i.recognized.is_some()).count(), 1);
    }

    #[test]
    fn scan_can_stop_early() {
        let model = model();
        let listing = MemoryListing::from_paths([
            "proto/a/report.txt",
            "proto/b/report.txt",
            "proto/c/report.txt",
        ]);
        let mut scan = model
            .parse_directory(Some("report"), &listing, ScanOptions::default())
            .unwrap();
        let first = scan.next().unwrap().unwrap();
        assert_eq!(first.path, "proto/a/report.txt");
    }

    #[test]
    fn empty_listing_yields_nothing() {
        let model = model();
        let listing = MemoryListing::new();
        let mut scan = model
            .parse_directory(None, &listing, ScanOptions::default())
            .unwrap();
        assert!(scan.next().is_none());
    }
}
