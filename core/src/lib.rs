pub mod codec;
pub mod container;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod path;
pub mod progress;
pub mod recreator;
pub mod scanner;
pub mod serializer;
pub mod snapshot;
pub mod types;

pub use codec::{Base64Codec, ContentCodec};
pub use container::{ContainerKind, ContainerRepository};
pub use envelope::{AesGcmEnvelope, Envelope};
pub use error::{Error, Result};
pub use filter::{DEFAULT_EXTENSIONS, ExtensionFilter};
pub use progress::{CancelFlag, ProgressFn};
pub use recreator::{RecreateSummary, Recreator};
pub use scanner::Scanner;
pub use serializer::{JsonSerializer, SnapshotSerializer};
pub use snapshot::{DirectorySnapshot, SnapshotStats};
pub use types::*;
