use super::{join, DirectoryListing, EntryStatus, ListingEntry};
use crate::error::{FomError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// Synthetic directory tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryListing {
    dirs: BTreeMap<String, BTreeSet<String>>,
    files: BTreeMap<String, Option<u64>>,
}

impl MemoryListing {
    pub fn new() -> Self {
        let mut listing = Self::default();
        listing.dirs.insert(String::new(), BTreeSet::new());
        listing
    }

    /// Build a tree from relative file paths. Parent directories are
    /// created as needed.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut listing = Self::new();
        for path in paths {
            listing.add_file(path.as_ref(), None);
        }
        listing
    }

    pub fn with_file(mut self, path: &str, size: u64) -> Self {
        self.add_file(path, Some(size));
        self
    }

    pub fn add_file(&mut self, path: &str, size: Option<u64>) {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return;
        }
        let mut parent = String::new();
        let components: Vec<&str> = path.split('/').collect();
        for (i, name) in components.iter().enumerate() {
            self.dirs
                .entry(parent.clone())
                .or_default()
                .insert(name.to_string());
            let child = join(&parent, name);
            if i + 1 == components.len() {
                self.files.insert(child, size);
            } else {
                self.dirs.entry(child.clone()).or_default();
                parent = child;
            }
        }
    }
}

impl DirectoryListing for MemoryListing {
    fn list(&self, dir: &str) -> Result<Vec<ListingEntry>> {
        let names = self.dirs.get(dir).ok_or_else(|| {
            FomError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {dir}"),
            ))
        })?;
        Ok(names
            .iter()
            .map(|name| {
                let path = join(dir, name);
                let status = if self.dirs.contains_key(&path) {
                    EntryStatus::directory()
                } else {
                    EntryStatus::file(self.files.get(&path).copied().flatten())
                };
                ListingEntry {
                    name: name.clone(),
                    status,
                }
            })
            .collect())
    }
}
