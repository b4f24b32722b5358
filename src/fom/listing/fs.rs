use super::{DirectoryListing, EntryKind, EntryStatus, ListingEntry};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Listing of a directory tree on disk. Symlinks are reported as
/// [`EntryKind::Other`] and never followed.
#[derive(Debug, Clone)]
pub struct FsListing {
    root: PathBuf,
}

impl FsListing {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DirectoryListing for FsListing {
    fn list(&self, dir: &str) -> Result<Vec<ListingEntry>> {
        let path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(dir)
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let metadata = fs::symlink_metadata(entry.path())?;
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else if metadata.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            let size = (kind == EntryKind::File).then(|| metadata.len());
            entries.push(ListingEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                status: EntryStatus { kind, size },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_sorted_with_kinds() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("s01")).unwrap();
        fs::write(dir.path().join("b.txt"), "hello").unwrap();
        fs::write(dir.path().join("s01").join("a.nii"), "").unwrap();

        let listing = FsListing::new(dir.path());
        let root = listing.list("").unwrap();
        let names: Vec<&str> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "s01"]);
        assert_eq!(root[0].status, EntryStatus::file(Some(5)));
        assert!(root[1].status.is_dir());

        let inner = listing.list("s01").unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].name, "a.nii");
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let listing = FsListing::new(dir.path().join("nope"));
        assert!(listing.list("").is_err());
    }
}
