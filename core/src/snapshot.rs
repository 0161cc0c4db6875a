use crate::types::{DirectoryEntry, FileEntry};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// In-memory capture of a filtered directory tree.
///
/// Directories and files are kept in insertion order, which is also the order
/// they are serialized in. Paths are unique within each collection; the
/// `add_*` methods reject duplicates rather than silently merging them.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    root_path: String,
    created_at: DateTime<Utc>,
    directories: Vec<DirectoryEntry>,
    files: Vec<FileEntry>,
    dir_index: HashSet<String>,
    file_index: HashSet<String>,
    parent_index: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub directory_count: usize,
    pub file_count: usize,
    pub total_size: u64,
    pub extensions: BTreeMap<String, usize>,
}

impl DirectorySnapshot {
    /// Creates an empty snapshot. `root_path` is a label only and plays no
    /// part in recreation.
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            created_at: Utc::now(),
            directories: Vec::new(),
            files: Vec::new(),
            dir_index: HashSet::new(),
            file_index: HashSet::new(),
            parent_index: HashSet::new(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn add_directory(&mut self, relative_path: &str) -> Result<()> {
        let entry = DirectoryEntry::new(relative_path)?;
        let path = entry.path();
        if self.dir_index.contains(path) {
            return Err(Error::Validation(format!("duplicate directory path: {}", path)));
        }
        if self.file_index.contains(path) {
            return Err(Error::Validation(format!(
                "directory path is already a file: {}",
                path
            )));
        }
        self.check_no_file_ancestor(path)?;

        self.index_parents(path);
        self.dir_index.insert(path.to_string());
        self.directories.push(entry);
        Ok(())
    }

    pub fn add_file(&mut self, entry: FileEntry) -> Result<()> {
        let path = entry.path();
        if self.file_index.contains(path) {
            return Err(Error::Validation(format!("duplicate file path: {}", path)));
        }
        if self.dir_index.contains(path) || self.parent_index.contains(path) {
            return Err(Error::Validation(format!(
                "file path is already a directory: {}",
                path
            )));
        }
        self.check_no_file_ancestor(path)?;

        self.index_parents(path);
        self.file_index.insert(path.to_string());
        self.files.push(entry);
        Ok(())
    }

    fn check_no_file_ancestor(&self, path: &str) -> Result<()> {
        match parents_of(path).find(|parent| self.file_index.contains(*parent)) {
            Some(parent) => Err(Error::Validation(format!(
                "'{}' is nested under file '{}'",
                path, parent
            ))),
            None => Ok(()),
        }
    }

    fn index_parents(&mut self, path: &str) {
        for parent in parents_of(path) {
            self.parent_index.insert(parent.to_string());
        }
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn directories(&self) -> &[DirectoryEntry] {
        &self.directories
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn find_file(&self, relative_path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path() == relative_path)
    }

    pub fn has_directory(&self, relative_path: &str) -> bool {
        self.dir_index.contains(relative_path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(FileEntry::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    /// Re-checks every entry's checksum, path uniqueness, and that no file
    /// occupies a path that must be a directory.
    pub fn validate(&self) -> Result<()> {
        for file in &self.files {
            if !file.verify_checksum() {
                return Err(Error::Validation(format!(
                    "checksum mismatch for file: {}",
                    file.path()
                )));
            }
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.files.iter().find(|f| !seen.insert(f.path())) {
            return Err(Error::Validation(format!("duplicate file path: {}", dup.path())));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.directories.iter().find(|d| !seen.insert(d.path())) {
            return Err(Error::Validation(format!(
                "duplicate directory path: {}",
                dup.path()
            )));
        }

        let dirs: HashSet<&str> = self.directories.iter().map(|d| d.path()).collect();
        let parents: HashSet<&str> = self
            .files
            .iter()
            .map(FileEntry::path)
            .chain(dirs.iter().copied())
            .flat_map(parents_of)
            .collect();
        if let Some(clash) = self
            .files
            .iter()
            .find(|f| dirs.contains(f.path()) || parents.contains(f.path()))
        {
            return Err(Error::Validation(format!(
                "file path is also a directory: {}",
                clash.path()
            )));
        }

        Ok(())
    }

    pub fn stats(&self) -> SnapshotStats {
        let mut extensions = BTreeMap::new();
        for file in &self.files {
            let key = file
                .extension()
                .unwrap_or_else(|| "(no extension)".to_string());
            *extensions.entry(key).or_insert(0) += 1;
        }

        SnapshotStats {
            directory_count: self.directory_count(),
            file_count: self.file_count(),
            total_size: self.total_size(),
            extensions,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} - {} dirs, {} files, {} bytes at {}",
            self.root_path,
            self.directory_count(),
            self.file_count(),
            self.total_size(),
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Every proper ancestor of a canonical relative path, shortest first.
fn parents_of(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(idx, _)| &path[..idx])
}
