use crate::path;
use crate::progress::{self, CancelFlag, ProgressFn};
use crate::snapshot::DirectorySnapshot;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Counts reported after a successful recreation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecreateSummary {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Writes a snapshot back out as a directory tree.
///
/// All directories are created before any file is written. Existing files at
/// a target path are overwritten. The first failure aborts the run and
/// anything already written stays on disk.
#[derive(Debug, Clone, Default)]
pub struct Recreator {
    require_empty: bool,
    cancel: Option<CancelFlag>,
}

impl Recreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to write into an output root that already has entries.
    pub fn require_empty_output(mut self, require: bool) -> Self {
        self.require_empty = require;
        self
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn recreate<P: AsRef<Path>>(
        &self,
        snapshot: &DirectorySnapshot,
        output_root: P,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<RecreateSummary> {
        let output_root = output_root.as_ref();
        if self.require_empty && !is_empty_or_missing(output_root)? {
            return Err(Error::OutputNotEmpty {
                path: output_root.to_path_buf(),
            });
        }

        info!("Recreating snapshot in {}", output_root.display());
        fs::create_dir_all(output_root).map_err(|e| Error::write(output_root, e))?;

        let mut summary = RecreateSummary::default();
        for dir in snapshot.directories() {
            let target = path::resolve_under(output_root, dir.path());
            fs::create_dir_all(&target).map_err(|e| Error::write(&target, e))?;
            debug!("Created directory {}", dir);
            summary.directories += 1;
        }

        let total = snapshot.file_count() as u64;
        progress::report(&mut progress, 0, total);
        for (idx, file) in snapshot.files().iter().enumerate() {
            progress::check(self.cancel.as_ref())?;
            if !file.verify_checksum() {
                return Err(Error::Validation(format!(
                    "checksum mismatch for {}",
                    file.path()
                )));
            }

            let target = path::resolve_under(output_root, file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
            }
            fs::write(&target, file.content()).map_err(|e| Error::write(&target, e))?;
            debug!("Wrote {}", file);

            summary.files += 1;
            summary.bytes += file.size();
            progress::report(&mut progress, idx as u64 + 1, total);
        }

        info!(
            "Recreation complete: {} directories, {} files, {} bytes",
            summary.directories, summary.files, summary.bytes
        );
        Ok(summary)
    }
}

fn is_empty_or_missing(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(Error::read(dir, e)),
    }
}

/// Recreates `snapshot` under `output_root` with default options.
pub fn recreate<P: AsRef<Path>>(
    snapshot: &DirectorySnapshot,
    output_root: P,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<RecreateSummary> {
    Recreator::new().recreate(snapshot, output_root, progress)
}
