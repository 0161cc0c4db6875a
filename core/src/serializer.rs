use crate::codec::{Base64Codec, ContentCodec};
use crate::snapshot::DirectorySnapshot;
use crate::types::{Checksum, FileEntry};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Converts a snapshot to and from its persisted byte form.
pub trait SnapshotSerializer {
    fn to_bytes(&self, snapshot: &DirectorySnapshot) -> Result<Vec<u8>>;

    fn from_bytes(&self, bytes: &[u8]) -> Result<DirectorySnapshot>;
}

/// On-disk document. `directories` and `files` (with `path` and `content`)
/// are the interchange contract; the remaining fields are optional metadata
/// that is verified when present.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default)]
    directories: Vec<String>,
    files: Vec<FileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    path: String,
    #[serde(alias = "content_base64")]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<Checksum>,
}

/// JSON document with file bytes embedded through a [`ContentCodec`].
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer<C = Base64Codec> {
    codec: C,
    compact: bool,
}

impl JsonSerializer<Base64Codec> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ContentCodec> JsonSerializer<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            compact: false,
        }
    }

    /// Emit single-line JSON instead of the indented default.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    fn build_snapshot(&self, document: SnapshotDocument) -> Result<DirectorySnapshot> {
        let mut snapshot = DirectorySnapshot::new(document.root_path.unwrap_or_default());
        if let Some(raw) = document.created_at.as_deref() {
            let created_at = parse_timestamp(raw).ok_or_else(|| {
                Error::Validation(format!("unrecognized created_at timestamp: {}", raw))
            })?;
            snapshot = snapshot.with_created_at(created_at);
        }

        for dir in &document.directories {
            snapshot.add_directory(dir).map_err(into_validation)?;
        }

        for record in document.files {
            let content = self.codec.decode(&record.content).map_err(|e| {
                Error::Validation(format!("file '{}': {}", record.path, e))
            })?;
            let entry = FileEntry::new(&record.path, content).map_err(into_validation)?;

            if let Some(size) = record.size {
                if size != entry.size() {
                    return Err(Error::Validation(format!(
                        "size mismatch for file '{}': recorded {}, decoded {}",
                        entry.path(),
                        size,
                        entry.size()
                    )));
                }
            }
            if let Some(expected) = record.checksum {
                if &expected != entry.checksum() {
                    return Err(Error::Validation(format!(
                        "checksum mismatch for file '{}': expected {}, got {}",
                        entry.path(),
                        expected,
                        entry.checksum()
                    )));
                }
            }

            snapshot.add_file(entry)?;
        }

        Ok(snapshot)
    }
}

impl<C: ContentCodec> SnapshotSerializer for JsonSerializer<C> {
    fn to_bytes(&self, snapshot: &DirectorySnapshot) -> Result<Vec<u8>> {
        let document = SnapshotDocument {
            root_path: Some(snapshot.root_path().to_string()),
            created_at: Some(snapshot.created_at().to_rfc3339()),
            directories: snapshot
                .directories()
                .iter()
                .map(|d| d.path().to_string())
                .collect(),
            files: snapshot
                .files()
                .iter()
                .map(|f| FileRecord {
                    path: f.path().to_string(),
                    content: self.codec.encode(f.content()),
                    size: Some(f.size()),
                    checksum: Some(*f.checksum()),
                })
                .collect(),
        };

        let bytes = if self.compact {
            serde_json::to_vec(&document)
        } else {
            serde_json::to_vec_pretty(&document)
        }
        .map_err(|e| Error::Validation(format!("failed to serialize snapshot: {}", e)))?;

        debug!("Serialized snapshot to {} bytes", bytes.len());
        Ok(bytes)
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<DirectorySnapshot> {
        let document: SnapshotDocument = serde_json::from_slice(bytes)
            .map_err(|e| Error::Validation(format!("malformed snapshot document: {}", e)))?;
        let snapshot = self.build_snapshot(document)?;
        debug!(
            "Deserialized snapshot with {} directories and {} files",
            snapshot.directory_count(),
            snapshot.file_count()
        );
        Ok(snapshot)
    }
}

fn into_validation(error: Error) -> Error {
    match error {
        Error::InvalidPath { path, reason } => {
            Error::Validation(format!("invalid path '{}': {}", path, reason))
        }
        other => other,
    }
}

/// Accepts RFC 3339 and the naive ISO form written by older tools.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn sample() -> DirectorySnapshot {
        let mut snapshot = DirectorySnapshot::new("/home/user/project");
        snapshot.add_directory("dir1").unwrap();
        snapshot.add_directory("dir1/subdir").unwrap();
        snapshot.add_directory("empty").unwrap();
        snapshot
            .add_file(FileEntry::new("dir1/file2.py", b"print('x')\n".to_vec()).unwrap())
            .unwrap();
        snapshot
            .add_file(FileEntry::new("bin.dat", vec![0, 159, 146, 150, 255]).unwrap())
            .unwrap();
        snapshot
    }

    #[test]
    fn test_document_shape() {
        let bytes = JsonSerializer::new().to_bytes(&sample()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["directories"], json!(["dir1", "dir1/subdir", "empty"]));
        assert_eq!(value["files"][0]["path"], "dir1/file2.py");
        assert_eq!(value["files"][0]["content"], "cHJpbnQoJ3gnKQo=");
        assert_eq!(value["files"][1]["size"], 5);
        assert_eq!(value["root_path"], "/home/user/project");
    }

    #[test]
    fn test_round_trip() {
        let serializer = JsonSerializer::new();
        let original = sample();
        let restored = serializer
            .from_bytes(&serializer.to_bytes(&original).unwrap())
            .unwrap();

        assert_eq!(restored.directories(), original.directories());
        assert_eq!(restored.files(), original.files());
        assert_eq!(restored.root_path(), original.root_path());
        assert_eq!(
            restored.created_at().timestamp_micros(),
            original.created_at().timestamp_micros()
        );
    }

    #[test]
    fn test_compact_output_parses() {
        let serializer = JsonSerializer::new().compact(true);
        let bytes = serializer.to_bytes(&sample()).unwrap();
        assert!(!bytes.contains(&b'\n'));
        assert_eq!(serializer.from_bytes(&bytes).unwrap().file_count(), 2);
    }

    #[test]
    fn test_minimal_document() {
        let doc = br#"{ "directories": ["dir1", "dir1/subdir"],
                       "files": [ { "path": "dir1/file2.py", "content": "aGk=" } ] }"#;
        let snapshot = JsonSerializer::new().from_bytes(doc).unwrap();
        assert_eq!(snapshot.directory_count(), 2);
        assert_eq!(snapshot.find_file("dir1/file2.py").unwrap().content(), b"hi");
        assert_eq!(snapshot.root_path(), "");
    }

    #[test]
    fn test_legacy_document() {
        let doc = json!({
            "root_path": "C:\\src",
            "created_at": "2024-03-01T10:20:30.123456",
            "metadata": {},
            "directories": ["a"],
            "files": [{
                "path": "a\\x.txt",
                "size": 2,
                "checksum": Checksum::from_data(b"ok").to_hex(),
                "content_base64": "b2s="
            }]
        });
        let snapshot = JsonSerializer::new()
            .from_bytes(&serde_json::to_vec(&doc).unwrap())
            .unwrap();
        assert_eq!(snapshot.files()[0].path(), "a/x.txt");
        assert_eq!(snapshot.created_at().format("%Y-%m-%d").to_string(), "2024-03-01");
    }

    #[test]
    fn test_duplicate_file_path_rejected() {
        let doc = br#"{ "directories": [],
                       "files": [ { "path": "a.txt", "content": "" },
                                  { "path": "./a.txt", "content": "eA==" } ] }"#;
        let result = JsonSerializer::new().from_bytes(doc);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_duplicate_directory_rejected() {
        let doc = br#"{ "directories": ["a", "a/"], "files": [] }"#;
        assert!(matches!(
            JsonSerializer::new().from_bytes(doc),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let serializer = JsonSerializer::new();
        assert!(matches!(
            serializer.from_bytes(br#"{ "directories": [] }"#),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            serializer.from_bytes(br#"{ "files": [ { "path": "a.txt" } ] }"#),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            serializer.from_bytes(b"not json"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_traversal_path_rejected() {
        let doc = br#"{ "files": [ { "path": "../../etc/passwd", "content": "" } ] }"#;
        assert!(matches!(
            JsonSerializer::new().from_bytes(doc),
            Err(Error::Validation(_))
        ));
        let doc = br#"{ "directories": ["/abs"], "files": [] }"#;
        assert!(matches!(
            JsonSerializer::new().from_bytes(doc),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let doc = json!({
            "files": [{
                "path": "a.txt",
                "content": "b2s=",
                "checksum": Checksum::from_data(b"not ok").to_hex()
            }]
        });
        let result = JsonSerializer::new().from_bytes(&serde_json::to_vec(&doc).unwrap());
        assert!(matches!(result, Err(Error::Validation(msg)) if msg.contains("checksum")));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let doc = br#"{ "files": [ { "path": "a.txt", "content": "b2s=", "size": 3 } ] }"#;
        assert!(matches!(
            JsonSerializer::new().from_bytes(doc),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_file_directory_collision_rejected() {
        let doc = json!({
            "directories": ["a"],
            "files": [
                { "path": "z.txt", "content": "b2s=" },
                { "path": "a", "content": "b2s=" }
            ]
        });
        let result = JsonSerializer::new().from_bytes(&serde_json::to_vec(&doc).unwrap());
        assert!(matches!(result, Err(Error::Validation(msg)) if msg.contains("directory")));

        let doc = json!({
            "files": [
                { "path": "a", "content": "b2s=" },
                { "path": "a/b.txt", "content": "aGk=" }
            ]
        });
        let result = JsonSerializer::new().from_bytes(&serde_json::to_vec(&doc).unwrap());
        assert!(matches!(result, Err(Error::Validation(msg)) if msg.contains("nested under file")));
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let doc = br#"{ "created_at": "last tuesday", "files": [] }"#;
        assert!(matches!(
            JsonSerializer::new().from_bytes(doc),
            Err(Error::Validation(msg)) if msg.contains("created_at")
        ));

        let doc = br#"{ "created_at": "2024-03-01T10:20:30.123456", "files": [] }"#;
        let snapshot = JsonSerializer::new().from_bytes(doc).unwrap();
        assert_eq!(snapshot.created_at().timestamp(), 1_709_288_430);
    }
}
