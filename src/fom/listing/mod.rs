//! # Directory Listings
//!
//! [`parse_directory`](crate::model::FileOrganizationModel::parse_directory)
//! walks a tree one directory at a time through the [`DirectoryListing`]
//! trait, so the scanner never touches the filesystem itself.
//!
//! ## Implementations
//!
//! - [`fs::FsListing`]: a real directory tree under a root path
//! - [`memory::MemoryListing`]: a synthetic tree built from relative paths,
//!   for tests and for callers that already hold a listing
//!
//! Directories are addressed by `/`-separated paths relative to the listing
//! root; the root itself is `""`.

use crate::error::Result;
use serde::Serialize;

pub mod fs;
pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// What the listing knows about an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryStatus {
    pub kind: EntryKind,
    pub size: Option<u64>,
}

impl EntryStatus {
    pub fn file(size: Option<u64>) -> Self {
        Self {
            kind: EntryKind::File,
            size,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub status: EntryStatus,
}

/// Source of directory contents.
pub trait DirectoryListing {
    /// Entries of `dir`, sorted by name.
    fn list(&self, dir: &str) -> Result<Vec<ListingEntry>>;
}

impl<L: DirectoryListing + ?Sized> DirectoryListing for &L {
    fn list(&self, dir: &str) -> Result<Vec<ListingEntry>> {
        (**self).list(dir)
    }
}

/// `parent/name`, or `name` at the root.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
