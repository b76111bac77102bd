//! Encrypted record value types

use crate::envelope::WrappedKeyEnvelope;
use crate::{ChainsealResult, IV_SIZE, SALT_SIZE, TAG_SIZE};

/// Hybrid-mode ciphertext record. Created once by
/// [`HybridBlockEncryption::encrypt_block_data`](crate::HybridBlockEncryption::encrypt_block_data)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    /// AES-256-GCM ciphertext of the payload (tag stored separately)
    pub ciphertext: Vec<u8>,
    /// Serialized [`WrappedKeyEnvelope`]
    pub wrapped_key: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub auth_tag: [u8; TAG_SIZE],
    /// SHA3-256 of the plaintext, lowercase hex
    pub data_hash: String,
    pub version: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl EncryptedRecord {
    /// Parse the embedded wrapped-key envelope.
    pub fn envelope(&self) -> ChainsealResult<WrappedKeyEnvelope> {
        WrappedKeyEnvelope::from_bytes(&self.wrapped_key)
    }
}

/// Password-mode ciphertext record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureEncryptedData {
    /// AES-256-GCM ciphertext with the 16-byte tag appended
    pub ciphertext: Vec<u8>,
    /// PBKDF2 salt, unique per encryption
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
    /// SHA3-256 of the plaintext, lowercase hex
    pub data_hash: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
