use crate::path;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a file's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 32]);

impl Checksum {
    pub fn from_data(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn short_string(&self) -> String {
        self.to_hex().chars().take(8).collect()
    }
}

impl FromStr for Checksum {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut array = [0u8; 32];
        hex::decode_to_slice(s, &mut array)?;
        Ok(Self(array))
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Checksum::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A directory that must exist in the recreated tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryEntry {
    path: String,
}

impl DirectoryEntry {
    pub fn new(relative_path: &str) -> Result<Self> {
        Ok(Self {
            path: path::normalize(relative_path)?,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of segments, so `a` is depth 1 and `a/b` is depth 2.
    pub fn depth(&self) -> usize {
        self.path.split('/').count()
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.path)
    }
}

/// A captured file. The checksum is computed from `content` on construction
/// and the content is never exposed mutably, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: String,
    content: Vec<u8>,
    checksum: Checksum,
}

impl FileEntry {
    pub fn new(relative_path: &str, content: Vec<u8>) -> Result<Self> {
        let path = path::normalize(relative_path)?;
        let checksum = Checksum::from_data(&content);
        Ok(Self {
            path,
            content,
            checksum,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn verify_checksum(&self) -> bool {
        Checksum::from_data(&self.content) == self.checksum
    }

    /// Lower-cased suffix of the final segment including the dot, or `None`
    /// for names without one. Dotfiles such as `.gitignore` have no suffix.
    pub fn extension(&self) -> Option<String> {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(name[idx..].to_lowercase()),
            _ => None,
        }
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes, {})", self.path, self.size(), self.checksum.short_string())
    }
}
