use crate::envelope::{AesGcmEnvelope, Envelope, MAGIC};
use crate::serializer::{JsonSerializer, SnapshotSerializer};
use crate::snapshot::DirectorySnapshot;
use crate::{Error, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Plaintext,
    Encrypted,
}

/// Persists snapshots to single-file containers.
///
/// A container is either the serialized document as-is or that document
/// sealed in an [`Envelope`]. The two are told apart by the envelope's magic
/// prefix, so callers need not know which form is on disk until a password
/// is actually required.
///
/// # Examples
///
/// ```no_run
/// use dirsnap_core::{ContainerRepository, ExtensionFilter, scanner};
///
/// # fn main() -> dirsnap_core::Result<()> {
/// let filter = ExtensionFilter::with_defaults();
/// let snapshot = scanner::scan("./project", &filter, None)?;
///
/// let repo = ContainerRepository::new();
/// repo.save(&snapshot, "project.snap", Some("hunter2"))?;
/// let restored = repo.load("project.snap", Some("hunter2"))?;
/// assert_eq!(restored.file_count(), snapshot.file_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContainerRepository<S = JsonSerializer, E = AesGcmEnvelope> {
    serializer: S,
    envelope: E,
}

impl ContainerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: SnapshotSerializer, E: Envelope> ContainerRepository<S, E> {
    pub fn with_parts(serializer: S, envelope: E) -> Self {
        Self {
            serializer,
            envelope,
        }
    }

    /// Serializes `snapshot` and writes it to `path`, sealing it first when a
    /// non-empty password is given. The write goes through a temporary file
    /// in the destination directory so an existing container is replaced
    /// whole or not at all.
    pub fn save<P: AsRef<Path>>(
        &self,
        snapshot: &DirectorySnapshot,
        path: P,
        password: Option<&str>,
    ) -> Result<()> {
        let path = path.as_ref();
        snapshot.validate()?;

        let plaintext = self.serializer.to_bytes(snapshot)?;
        let password = non_empty(password);
        let bytes = match password {
            Some(password) => self.envelope.encrypt(&plaintext, password)?,
            None => plaintext,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::write(parent, e))?;
        tmp.write_all(&bytes).map_err(|e| Error::write(path, e))?;
        tmp.as_file().sync_all().map_err(|e| Error::write(path, e))?;
        tmp.persist(path).map_err(|e| Error::write(path, e.error))?;

        info!(
            "Saved {} container to {} ({} bytes)",
            if password.is_some() { "encrypted" } else { "plaintext" },
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    /// Reads a container, decrypting it when it carries the envelope prefix.
    pub fn load<P: AsRef<Path>>(&self, path: P, password: Option<&str>) -> Result<DirectorySnapshot> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::read(path, e))?;

        let snapshot = if self.envelope.is_encrypted(&bytes) {
            let password = non_empty(password).ok_or(Error::PasswordRequired)?;
            debug!("{} is encrypted", path.display());
            let plaintext = self.envelope.decrypt(&bytes, password)?;
            self.serializer.from_bytes(&plaintext)?
        } else {
            self.serializer.from_bytes(&bytes)?
        };

        info!(
            "Loaded {} ({} directories, {} files)",
            path.display(),
            snapshot.directory_count(),
            snapshot.file_count()
        );
        Ok(snapshot)
    }

    /// Reports whether the container at `path` is encrypted, reading only
    /// its leading bytes.
    pub fn inspect<P: AsRef<Path>>(&self, path: P) -> Result<ContainerKind> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| Error::read(path, e))?;

        let mut prefix = Vec::with_capacity(MAGIC.len());
        file.take(MAGIC.len() as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| Error::read(path, e))?;

        Ok(if self.envelope.is_encrypted(&prefix) {
            ContainerKind::Encrypted
        } else {
            ContainerKind::Plaintext
        })
    }
}

fn non_empty(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}
