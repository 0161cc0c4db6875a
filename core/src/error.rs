use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory is not empty: {}", path.display())]
    OutputNotEmpty { path: PathBuf },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data is not an encrypted container")]
    NotEncrypted,

    #[error("Unsupported container format version: {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Container is encrypted and no password was given")]
    PasswordRequired,

    #[error("Invalid password or corrupted data")]
    InvalidPasswordOrCorruptData,

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileRead { path: path.into(), source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
