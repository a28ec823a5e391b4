use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm,
};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the initialization vector in bytes.
pub const IV_SIZE: usize = 16;
/// The size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Separates the hex segments of an envelope. Not part of the hex alphabet.
pub const DELIMITER: char = ':';

/// AES-256-GCM with a 16-byte IV.
type FieldAead = AesGcm<Aes256, U16>;

/// Errors produced by the field cipher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The configured key is unusable.
    #[error("invalid field key: {0}")]
    InvalidKey(&'static str),

    /// The AEAD refused to encrypt.
    #[error("encryption failed")]
    Encryption,

    /// The envelope was malformed or did not authenticate.
    #[error("decryption failed: {0}")]
    Decryption(&'static str),
}

/// A 256-bit field encryption key that is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FieldKey([u8; KEY_SIZE]);

impl FieldKey {
    /// Creates a new `FieldKey` from a byte array.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Parses a key from 64 hexadecimal characters.
    pub fn from_hex(value: &str) -> Result<Self, CipherError> {
        let mut bytes = hex::decode(value.trim())
            .map_err(|_| CipherError::InvalidKey("key must be hexadecimal"))?;

        let key: [u8; KEY_SIZE] = match bytes.as_slice().try_into() {
            Ok(key) => key,
            Err(_) => {
                bytes.zeroize();
                return Err(CipherError::InvalidKey("key must be exactly 32 bytes"));
            }
        };
        bytes.zeroize();

        Ok(Self(key))
    }

    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldKey(..)")
    }
}

/// The serialized form of one encrypted field: `<ivHex>:<authTagHex>:<ciphertextHex>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope(String);

impl Envelope {
    /// Returns the envelope as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the envelope and returns the serialized string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Envelope> for String {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

/// How a stored value should be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredField<'a> {
    /// Looks like an envelope and must go through verified decryption.
    Encrypted(&'a str),
    /// Written before field encryption was introduced.
    LegacyPlaintext(&'a str),
}

impl<'a> StoredField<'a> {
    /// Classifies a raw stored value by the presence of the delimiter.
    pub fn classify(raw: &'a str) -> Self {
        if raw.contains(DELIMITER) {
            StoredField::Encrypted(raw)
        } else {
            StoredField::LegacyPlaintext(raw)
        }
    }
}

/// A plaintext recovered from storage, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revealed {
    /// Decrypted and authenticated.
    Verified(String),
    /// Passed through from a pre-encryption row. Not authenticated.
    Legacy(String),
}

impl Revealed {
    /// The plaintext, regardless of provenance.
    pub fn value(&self) -> &str {
        match self {
            Revealed::Verified(value) | Revealed::Legacy(value) => value,
        }
    }

    /// Whether the value bypassed decryption.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Revealed::Legacy(_))
    }

    /// Consumes the value and returns the plaintext.
    pub fn into_value(self) -> String {
        match self {
            Revealed::Verified(value) | Revealed::Legacy(value) => value,
        }
    }
}

/// Authenticated encryption for single sensitive string fields.
#[derive(Clone, Debug)]
pub struct FieldCipher {
    key: Arc<FieldKey>,
}

impl FieldCipher {
    /// Creates a new `FieldCipher` from a configured key.
    pub fn new(key: FieldKey) -> Self {
        Self { key: Arc::new(key) }
    }

    fn aead(&self) -> FieldAead {
        FieldAead::new(self.key.as_bytes().into())
    }

    /// Encrypts a plaintext field under a fresh random IV.
    ///
    /// Two calls with the same plaintext never produce the same envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<Envelope, CipherError> {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .aead()
            .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CipherError::Encryption)?;

        let envelope = format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            hex::encode(iv),
            hex::encode(tag),
            hex::encode(&buffer)
        );
        buffer.zeroize();

        Ok(Envelope(envelope))
    }

    /// Decrypts an envelope produced by [`FieldCipher::encrypt`].
    ///
    /// Fails closed: a malformed envelope or a tag mismatch is an error, never
    /// a partial plaintext.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let mut segments = envelope.split(DELIMITER);
        let (Some(iv_hex), Some(tag_hex), Some(ciphertext_hex), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CipherError::Decryption("envelope must have three segments"));
        };

        let iv = decode_exact::<IV_SIZE>(iv_hex, "invalid initialization vector")?;
        let tag = decode_exact::<TAG_SIZE>(tag_hex, "invalid authentication tag")?;
        let mut buffer = hex::decode(ciphertext_hex)
            .map_err(|_| CipherError::Decryption("ciphertext is not hexadecimal"))?;

        self.aead()
            .decrypt_in_place_detached(
                GenericArray::from_slice(&iv),
                b"",
                &mut buffer,
                GenericArray::from_slice(&tag),
            )
            .map_err(|_| CipherError::Decryption("authentication tag mismatch"))?;

        String::from_utf8(buffer).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            CipherError::Decryption("plaintext is not valid UTF-8")
        })
    }

    /// Reads back a stored value, passing legacy plaintext through untouched.
    ///
    /// Legacy values are returned as [`Revealed::Legacy`] so callers can keep
    /// them apart from authenticated results.
    pub fn reveal(&self, raw: &str) -> Result<Revealed, CipherError> {
        match StoredField::classify(raw) {
            StoredField::Encrypted(envelope) => self.decrypt(envelope).map(Revealed::Verified),
            StoredField::LegacyPlaintext(value) => {
                tracing::warn!("⚠️  Legacy plaintext field passed through without decryption");
                Ok(Revealed::Legacy(value.to_string()))
            }
        }
    }
}

fn decode_exact<const N: usize>(segment: &str, reason: &'static str) -> Result<[u8; N], CipherError> {
    hex::decode(segment)
        .ok()
        .and_then(|bytes| <[u8; N]>::try_from(bytes.as_slice()).ok())
        .ok_or(CipherError::Decryption(reason))
}
