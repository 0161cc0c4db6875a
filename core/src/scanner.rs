use crate::filter::ExtensionFilter;
use crate::path;
use crate::progress::{self, CancelFlag, ProgressFn};
use crate::snapshot::DirectorySnapshot;
use crate::types::FileEntry;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Walks a source tree and captures matching files into a snapshot.
///
/// The walk happens up front so the total handed to the progress callback is
/// known before the first file is read. Every directory below the root is
/// recorded, including ones with no matching files, so empty directories
/// survive a round trip.
pub struct Scanner<'f> {
    filter: &'f ExtensionFilter,
    follow_links: bool,
    cancel: Option<CancelFlag>,
}

impl<'f> Scanner<'f> {
    pub fn new(filter: &'f ExtensionFilter) -> Self {
        Self {
            filter,
            follow_links: false,
            cancel: None,
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn scan<P: AsRef<Path>>(
        &self,
        root: P,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<DirectorySnapshot> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        info!("Scanning {}", root.display());
        let (directories, files) = self.collect(root)?;
        let total = files.len() as u64;
        debug!(
            "Found {} directories and {} matching files",
            directories.len(),
            total
        );

        let mut snapshot = DirectorySnapshot::new(root.display().to_string());
        for dir in &directories {
            snapshot.add_directory(dir)?;
        }

        progress::report(&mut progress, 0, total);
        for (idx, (relative, full_path)) in files.into_iter().enumerate() {
            progress::check(self.cancel.as_ref())?;

            let content = fs::read(&full_path).map_err(|e| Error::read(&full_path, e))?;
            let entry = FileEntry::new(&relative, content)?;
            debug!("Captured {}", entry);
            snapshot.add_file(entry)?;

            progress::report(&mut progress, idx as u64 + 1, total);
        }

        info!(
            "Scan complete: {} directories, {} files, {} bytes",
            snapshot.directory_count(),
            snapshot.file_count(),
            snapshot.total_size()
        );
        Ok(snapshot)
    }

    fn collect(&self, root: &Path) -> Result<(Vec<String>, Vec<(String, PathBuf)>)> {
        let mut directories = Vec::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in walker {
            progress::check(self.cancel.as_ref())?;

            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                let message = e.to_string();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message));
                Error::read(path, source)
            })?;

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                directories.push(path::relative_to(root, entry.path())?);
            } else if file_type.is_file() {
                let name = entry.file_name().to_string_lossy();
                if self.filter.is_allowed(&name) {
                    let relative = path::relative_to(root, entry.path())?;
                    files.push((relative, entry.into_path()));
                }
            } else {
                debug!("Skipping non-regular entry {}", entry.path().display());
            }
        }

        Ok((directories, files))
    }
}

/// Scans `root` with default options.
pub fn scan<P: AsRef<Path>>(
    root: P,
    filter: &ExtensionFilter,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<DirectorySnapshot> {
    Scanner::new(filter).scan(root, progress)
}
