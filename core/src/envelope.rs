//! Password-based authenticated encryption for arbitrary buffers.
//!
//! Wire format, all fields at fixed offsets:
//!
//! ```text
//! MAGIC (6) | VERSION (1) | SALT (32) | NONCE (12) | CIPHERTEXT || TAG (16)
//! ```
//!
//! The key is derived with PBKDF2-HMAC-SHA256 and the payload sealed with
//! AES-256-GCM. A failed tag check is reported as
//! [`Error::InvalidPasswordOrCorruptData`] whatever the cause, so callers
//! learn nothing that separates a wrong password from a damaged file.

use crate::{Error, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

pub const MAGIC: &[u8; 6] = b"DSNENC";
/// Marker written by earlier releases; accepted on read, never written.
pub const LEGACY_MAGIC: &[u8; 6] = b"SAGENC";
pub const FORMAT_VERSION: u8 = 1;
pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const PBKDF2_ITERATIONS: u32 = 100_000;

pub const HEADER_LEN: usize = MAGIC.len() + 1 + SALT_LEN + NONCE_LEN;

/// True when `bytes` starts with the current or the legacy marker.
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC) || bytes.starts_with(LEGACY_MAGIC)
}

/// Turns a plaintext buffer into a self-describing protected buffer and back.
pub trait Envelope {
    fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>>;

    fn decrypt(&self, envelope: &[u8], password: &str) -> Result<Vec<u8>>;

    /// Prefix check only; never fails.
    fn is_encrypted(&self, bytes: &[u8]) -> bool {
        has_magic(bytes)
    }
}

/// Fixed-offset view of an envelope's header fields.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeHeader<'a> {
    pub version: u8,
    pub salt: &'a [u8],
    pub nonce: &'a [u8],
}

impl<'a> EnvelopeHeader<'a> {
    /// Splits `bytes` into header and sealed payload.
    pub fn parse(bytes: &'a [u8]) -> Result<(Self, &'a [u8])> {
        if !has_magic(bytes) {
            return Err(Error::NotEncrypted);
        }
        let version = *bytes
            .get(MAGIC.len())
            .ok_or(Error::InvalidPasswordOrCorruptData)?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion { version });
        }
        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(Error::InvalidPasswordOrCorruptData);
        }

        let salt_start = MAGIC.len() + 1;
        let nonce_start = salt_start + SALT_LEN;
        let header = Self {
            version,
            salt: &bytes[salt_start..nonce_start],
            nonce: &bytes[nonce_start..HEADER_LEN],
        };
        Ok((header, &bytes[HEADER_LEN..]))
    }
}

/// AES-256-GCM envelope keyed by PBKDF2-HMAC-SHA256.
#[derive(Debug, Clone, Copy)]
pub struct AesGcmEnvelope {
    iterations: u32,
}

impl Default for AesGcmEnvelope {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl AesGcmEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the KDF work factor. The iteration count is not stored in
    /// the envelope, so buffers produced this way only open with an envelope
    /// configured identically.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    fn derive_key(&self, password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, key.as_mut_slice());
        key
    }
}

impl Envelope for AesGcmEnvelope {
    fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let key = self.derive_key(password, &salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);

        debug!(
            "Encrypted {} bytes into {} byte envelope",
            plaintext.len(),
            out.len()
        );
        Ok(out)
    }

    fn decrypt(&self, envelope: &[u8], password: &str) -> Result<Vec<u8>> {
        let (header, sealed) = EnvelopeHeader::parse(envelope)?;

        let key = self.derive_key(password, header.salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(header.nonce), sealed)
            .map_err(|_| Error::InvalidPasswordOrCorruptData)?;

        debug!("Decrypted {} byte envelope", envelope.len());
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> AesGcmEnvelope {
        AesGcmEnvelope::with_iterations(1_000)
    }

    #[test]
    fn test_roundtrip_default_work_factor() {
        let envelope = AesGcmEnvelope::new();
        assert_eq!(envelope.iterations(), PBKDF2_ITERATIONS);

        let plaintext = b"{\"directories\":[],\"files\":[]}";
        let sealed = envelope.encrypt(plaintext, "Test_Password_123!").unwrap();
        assert_eq!(sealed.len(), HEADER_LEN + plaintext.len() + TAG_LEN);
        assert_eq!(&sealed[..6], MAGIC);
        assert_eq!(sealed[6], FORMAT_VERSION);
        assert_eq!(
            envelope.decrypt(&sealed, "Test_Password_123!").unwrap(),
            plaintext
        );
    }

    #[test]
    fn test_empty_plaintext_and_password() {
        let envelope = fast();
        let sealed = envelope.encrypt(b"", "").unwrap();
        assert_eq!(sealed.len(), HEADER_LEN + TAG_LEN);
        assert!(envelope.decrypt(&sealed, "").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password() {
        let envelope = fast();
        let sealed = envelope.encrypt(b"secret data", "right").unwrap();
        assert!(matches!(
            envelope.decrypt(&sealed, "wrong"),
            Err(Error::InvalidPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_every_bit_flip_in_payload_detected() {
        let envelope = fast();
        let sealed = envelope.encrypt(b"abcd", "pw").unwrap();

        for byte in HEADER_LEN..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        envelope.decrypt(&tampered, "pw"),
                        Err(Error::InvalidPasswordOrCorruptData)
                    ),
                    "flip at byte {} bit {} went undetected",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_salt_and_nonce_tampering_detected() {
        let envelope = fast();
        let sealed = envelope.encrypt(b"payload", "pw").unwrap();

        let mut bad_salt = sealed.clone();
        bad_salt[MAGIC.len() + 1] ^= 0x80;
        assert!(matches!(
            envelope.decrypt(&bad_salt, "pw"),
            Err(Error::InvalidPasswordOrCorruptData)
        ));

        let mut bad_nonce = sealed.clone();
        bad_nonce[HEADER_LEN - 1] ^= 0x01;
        assert!(matches!(
            envelope.decrypt(&bad_nonce, "pw"),
            Err(Error::InvalidPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_truncation_detected() {
        let envelope = fast();
        let sealed = envelope.encrypt(b"some longer payload", "pw").unwrap();

        for len in [MAGIC.len(), MAGIC.len() + 1, HEADER_LEN, sealed.len() - 1] {
            assert!(
                matches!(
                    envelope.decrypt(&sealed[..len], "pw"),
                    Err(Error::InvalidPasswordOrCorruptData)
                ),
                "truncation to {} bytes went undetected",
                len
            );
        }
    }

    #[test]
    fn test_fresh_salt_and_nonce_each_time() {
        let envelope = fast();
        let a = envelope.encrypt(b"same", "pw").unwrap();
        let b = envelope.encrypt(b"same", "pw").unwrap();

        let (ha, ca) = EnvelopeHeader::parse(&a).unwrap();
        let (hb, cb) = EnvelopeHeader::parse(&b).unwrap();
        assert_ne!(ha.salt, hb.salt);
        assert_ne!(ha.nonce, hb.nonce);
        assert_ne!(ca, cb);
    }

    #[test]
    fn test_not_encrypted() {
        let envelope = fast();
        assert!(matches!(
            envelope.decrypt(b"{\"files\": []}", "pw"),
            Err(Error::NotEncrypted)
        ));
        assert!(matches!(envelope.decrypt(b"", "pw"), Err(Error::NotEncrypted)));
    }

    #[test]
    fn test_unsupported_version() {
        let envelope = fast();
        let mut sealed = envelope.encrypt(b"data", "pw").unwrap();
        sealed[MAGIC.len()] = 2;
        assert!(matches!(
            envelope.decrypt(&sealed, "pw"),
            Err(Error::UnsupportedVersion { version: 2 })
        ));
    }

    #[test]
    fn test_is_encrypted_prefix_check() {
        let envelope = fast();
        assert!(!envelope.is_encrypted(b""));
        assert!(!envelope.is_encrypted(b"{}"));
        assert!(!envelope.is_encrypted(b"DSNEN"));
        assert!(envelope.is_encrypted(MAGIC));
        assert!(envelope.is_encrypted(b"DSNENC\x09garbage"));
    }

    #[test]
    fn test_iteration_count_must_match() {
        let sealed = AesGcmEnvelope::with_iterations(1_000)
            .encrypt(b"data", "pw")
            .unwrap();
        assert!(matches!(
            AesGcmEnvelope::with_iterations(1_001).decrypt(&sealed, "pw"),
            Err(Error::InvalidPasswordOrCorruptData)
        ));
    }

    #[test]
    fn test_legacy_marker_decrypts() {
        let envelope = fast();
        let mut sealed = envelope.encrypt(b"from an older release", "pw").unwrap();
        sealed[..LEGACY_MAGIC.len()].copy_from_slice(LEGACY_MAGIC);

        assert!(envelope.is_encrypted(&sealed));
        assert_eq!(
            envelope.decrypt(&sealed, "pw").unwrap(),
            b"from an older release"
        );
        assert!(matches!(
            envelope.decrypt(&sealed, "nope"),
            Err(Error::InvalidPasswordOrCorruptData)
        ));

        sealed[MAGIC.len()] = 9;
        assert!(matches!(
            envelope.decrypt(&sealed, "pw"),
            Err(Error::UnsupportedVersion { version: 9 })
        ));
    }
}
