//! Canonical relative paths.
//!
//! Every path stored in a snapshot is relative to the scan root, uses `/` as
//! the separator and has no empty, `.` or `..` segments. These checks are the
//! only thing standing between a crafted container and a write outside the
//! output directory, so both the scanner and the deserializer run every path
//! through [`normalize`].

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Canonicalizes a relative path string.
///
/// Backslashes are treated as separators, repeated separators and `.`
/// segments collapse, and trailing separators are dropped. Absolute paths,
/// drive-prefixed paths, `..` segments and paths that reduce to nothing are
/// rejected with [`Error::InvalidPath`].
pub fn normalize(path: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let unified = path.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if has_drive_prefix(&unified) {
        return Err(invalid("drive-qualified paths are not allowed"));
    }
    if unified.contains('\0') {
        return Err(invalid("path contains a NUL byte"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid("parent directory segments are not allowed")),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }

    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Expresses `path` relative to `root` in canonical form.
///
/// Each native component is checked on its own and never re-split, so a
/// Unix file name is either stored as-is or rejected. Names containing a
/// backslash, and a first component that would read back as a drive prefix,
/// cannot be represented in a snapshot and fail with [`Error::InvalidPath`].
pub fn relative_to(root: &Path, path: &Path) -> Result<String> {
    let display = || path.display().to_string();
    let invalid = |reason| Error::InvalidPath {
        path: display(),
        reason,
    };
    let relative = path
        .strip_prefix(root)
        .map_err(|_| invalid("path is outside the scan root"))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(s) => {
                let s = s.to_str().ok_or_else(|| invalid("path is not valid UTF-8"))?;
                if s.contains('\\') {
                    return Err(invalid("file name contains a backslash"));
                }
                if s.contains('\0') {
                    return Err(invalid("path contains a NUL byte"));
                }
                if segments.is_empty() && has_drive_prefix(s) {
                    return Err(invalid("top-level name looks like a drive prefix"));
                }
                segments.push(s);
            }
            Component::CurDir => {}
            _ => return Err(invalid("unexpected path component")),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}

/// Joins a canonical relative path onto `root` using native separators.
pub fn resolve_under(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}
