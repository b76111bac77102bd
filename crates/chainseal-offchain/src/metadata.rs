//! Off-chain object metadata
//!
//! Owned by the caller's metadata store; serialized as camelCase JSON.
//! Binary fields (IV, salt, signature, public key) are standard base64.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chainseal_core::{ChainsealError, ChainsealResult, KeyDerivationStrength};
use chainseal_crypto::{IV_SIZE, SALT_SIZE, TAG_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffChainData {
    /// SHA3-256 of the plaintext, lowercase hex
    pub data_hash: String,
    /// P-256 signature over `data_hash`, base64
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub file_path: PathBuf,
    /// Plaintext length in bytes. The file itself is `file_size + 16` bytes.
    pub file_size: u64,
    #[serde(rename = "encryptionIV")]
    pub encryption_iv: String,
    pub content_type: String,
    /// SEC1 public key of the signer, base64
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_public_key: Option<String>,
    /// PBKDF2 salt, present only for objects stored with `KeyDerivationStrength::Pbkdf2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_iterations: Option<u32>,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

impl OffChainData {
    /// Strength the object was stored with, inferred from the persisted KDF fields.
    pub fn key_strength(&self) -> KeyDerivationStrength {
        if self.key_salt.is_some() {
            KeyDerivationStrength::Pbkdf2
        } else {
            KeyDerivationStrength::Sha3Single
        }
    }

    pub fn decode_iv(&self) -> ChainsealResult<[u8; IV_SIZE]> {
        decode_fixed("encryptionIV", &self.encryption_iv)
    }

    pub fn decode_key_salt(&self) -> ChainsealResult<Option<[u8; SALT_SIZE]>> {
        self.key_salt
            .as_deref()
            .map(|salt| decode_fixed("keySalt", salt))
            .transpose()
    }

    /// Size the encrypted file must have on disk, or `None` if `file_size`
    /// is too large to hold the tag as well.
    pub fn expected_file_len(&self) -> Option<u64> {
        self.file_size.checked_add(TAG_SIZE as u64)
    }

    pub fn to_json(&self) -> ChainsealResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ChainsealError::MalformedRecord(format!("serializing OffChainData: {e}")))
    }

    pub fn from_json(json: &str) -> ChainsealResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChainsealError::MalformedRecord(format!("parsing OffChainData: {e}")))
    }
}

fn decode_fixed<const N: usize>(name: &str, value: &str) -> ChainsealResult<[u8; N]> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| ChainsealError::MalformedRecord(format!("{name}: invalid base64: {e}")))?;
    bytes.as_slice().try_into().map_err(|_| {
        ChainsealError::MalformedRecord(format!("{name} must be {N} bytes, got {}", bytes.len()))
    })
}
