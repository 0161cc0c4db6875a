use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Binary to text transform used to embed file bytes in a JSON document.
pub trait ContentCodec {
    fn encode(&self, content: &[u8]) -> String;

    fn decode(&self, encoded: &str) -> Result<Vec<u8>>;
}

/// Standard RFC 4648 base64 with padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl ContentCodec for Base64Codec {
    fn encode(&self, content: &[u8]) -> String {
        STANDARD.encode(content)
    }

    fn decode(&self, encoded: &str) -> Result<Vec<u8>> {
        STANDARD
            .decode(encoded)
            .map_err(|e| Error::Validation(format!("invalid base64 content: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(Base64Codec.encode(b"foobar"), "Zm9vYmFy");
        assert_eq!(Base64Codec.decode("Zm9vYg==").unwrap(), b"foob");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(Base64Codec.encode(b""), "");
        assert!(Base64Codec.decode("").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Base64Codec.decode("not base64!"),
            Err(Error::Validation(_))
        ));
    }
}
