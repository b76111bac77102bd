//! Versioned pipe-delimited storage format for encrypted records
//!
//! ```text
//! GCM-v1.0|timestamp|ciphertext_b64|wrappedKey_b64|iv_b64|authTag_b64|dataHash
//! PBKDF2-GCM-v1.0|timestamp|ciphertext+tag_b64|salt_b64|iv_b64|dataHash
//! ```
//!
//! Binary fields are standard base64 (which never contains `|`), the timestamp
//! is decimal milliseconds, and the data hash is 64 lowercase hex characters.
//! Field order and count are fixed per version; decoding never defaults or
//! truncates a field.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::hash::is_hex_digest;
use crate::record::{EncryptedRecord, SecureEncryptedData};
use crate::{ChainsealError, ChainsealResult, IV_SIZE, SALT_SIZE, TAG_SIZE};

pub const FIELD_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Hybrid record: DEK wrapped under a public-key-derived KEK
    HybridV1,
    /// Password record: PBKDF2-derived key, tag appended to the ciphertext
    PasswordSimpleV1,
}

impl FormatVersion {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::HybridV1 => "GCM-v1.0",
            Self::PasswordSimpleV1 => "PBKDF2-GCM-v1.0",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "GCM-v1.0" => Some(Self::HybridV1),
            "PBKDF2-GCM-v1.0" => Some(Self::PasswordSimpleV1),
            _ => None,
        }
    }

    /// Total number of `|`-separated fields, version tag included.
    ///
    /// Hybrid records carry 6 data fields behind the tag, giving 7. Password
    /// records carry 5 (the GCM tag is appended to the ciphertext rather than
    /// stored as its own field), giving 6. Counts that exclude the version tag
    /// are therefore 6 and 5.
    pub const fn field_count(self) -> usize {
        match self {
            Self::HybridV1 => 7,
            Self::PasswordSimpleV1 => 6,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A decoded storage record of any known version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRecord {
    HybridV1(EncryptedRecord),
    PasswordSimpleV1(SecureEncryptedData),
}

impl StoredRecord {
    pub fn version(&self) -> FormatVersion {
        match self {
            Self::HybridV1(_) => FormatVersion::HybridV1,
            Self::PasswordSimpleV1(_) => FormatVersion::PasswordSimpleV1,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::HybridV1(r) => join(&[
                FormatVersion::HybridV1.tag(),
                &r.timestamp.to_string(),
                &BASE64.encode(&r.ciphertext),
                &BASE64.encode(&r.wrapped_key),
                &BASE64.encode(r.iv),
                &BASE64.encode(r.auth_tag),
                &r.data_hash,
            ]),
            Self::PasswordSimpleV1(d) => join(&[
                FormatVersion::PasswordSimpleV1.tag(),
                &d.timestamp.to_string(),
                &BASE64.encode(&d.ciphertext),
                &BASE64.encode(d.salt),
                &BASE64.encode(d.iv),
                &d.data_hash,
            ]),
        }
    }

    pub fn decode(encoded: &str) -> ChainsealResult<Self> {
        let version = Self::peek_version(encoded)?;
        let fields: Vec<&str> = encoded.split(FIELD_SEPARATOR).collect();
        if fields.len() != version.field_count() {
            return Err(ChainsealError::MalformedRecord(format!(
                "{version} record has {} fields, expected {}",
                fields.len(),
                version.field_count()
            )));
        }

        match version {
            FormatVersion::HybridV1 => Ok(Self::HybridV1(EncryptedRecord {
                timestamp: parse_timestamp(fields[1])?,
                ciphertext: decode_b64("ciphertext", fields[2])?,
                wrapped_key: decode_nonempty_b64("wrappedKey", fields[3])?,
                iv: decode_fixed::<IV_SIZE>("iv", fields[4])?,
                auth_tag: decode_fixed::<TAG_SIZE>("authTag", fields[5])?,
                data_hash: parse_data_hash(fields[6])?,
                version: version.tag().to_string(),
            })),
            FormatVersion::PasswordSimpleV1 => {
                let ciphertext = decode_b64("ciphertext", fields[2])?;
                if ciphertext.len() < TAG_SIZE {
                    return Err(ChainsealError::MalformedRecord(format!(
                        "ciphertext shorter than the {TAG_SIZE}-byte tag: {} bytes",
                        ciphertext.len()
                    )));
                }
                Ok(Self::PasswordSimpleV1(SecureEncryptedData {
                    timestamp: parse_timestamp(fields[1])?,
                    ciphertext,
                    salt: decode_fixed::<SALT_SIZE>("salt", fields[3])?,
                    iv: decode_fixed::<IV_SIZE>("iv", fields[4])?,
                    data_hash: parse_data_hash(fields[5])?,
                }))
            }
        }
    }

    /// Read the version tag without decoding the rest of the record.
    pub fn peek_version(encoded: &str) -> ChainsealResult<FormatVersion> {
        if encoded.is_empty() {
            return Err(ChainsealError::MalformedRecord("empty record".into()));
        }
        let tag = encoded
            .split(FIELD_SEPARATOR)
            .next()
            .unwrap_or_default();
        FormatVersion::from_tag(tag).ok_or_else(|| ChainsealError::UnsupportedVersion(tag.into()))
    }
}

impl EncryptedRecord {
    pub fn to_storage_string(&self) -> String {
        StoredRecord::HybridV1(self.clone()).encode()
    }

    pub fn from_storage_string(encoded: &str) -> ChainsealResult<Self> {
        match StoredRecord::decode(encoded)? {
            StoredRecord::HybridV1(record) => Ok(record),
            other => Err(ChainsealError::UnsupportedVersion(format!(
                "expected {} record, found {}",
                FormatVersion::HybridV1,
                other.version()
            ))),
        }
    }
}

impl SecureEncryptedData {
    pub fn to_storage_string(&self) -> String {
        StoredRecord::PasswordSimpleV1(self.clone()).encode()
    }

    pub fn from_storage_string(encoded: &str) -> ChainsealResult<Self> {
        match StoredRecord::decode(encoded)? {
            StoredRecord::PasswordSimpleV1(data) => Ok(data),
            other => Err(ChainsealError::UnsupportedVersion(format!(
                "expected {} record, found {}",
                FormatVersion::PasswordSimpleV1,
                other.version()
            ))),
        }
    }
}

fn join(fields: &[&str]) -> String {
    fields.join(FIELD_SEPARATOR)
}

fn parse_timestamp(field: &str) -> ChainsealResult<i64> {
    field
        .parse::<i64>()
        .map_err(|e| ChainsealError::MalformedRecord(format!("invalid timestamp {field:?}: {e}")))
}

fn parse_data_hash(field: &str) -> ChainsealResult<String> {
    if !is_hex_digest(field) {
        return Err(ChainsealError::MalformedRecord(format!(
            "dataHash is not a 64-character hex digest: {field:?}"
        )));
    }
    Ok(field.to_ascii_lowercase())
}

fn decode_b64(name: &str, field: &str) -> ChainsealResult<Vec<u8>> {
    BASE64
        .decode(field)
        .map_err(|e| ChainsealError::MalformedRecord(format!("{name}: invalid base64: {e}")))
}

fn decode_nonempty_b64(name: &str, field: &str) -> ChainsealResult<Vec<u8>> {
    let bytes = decode_b64(name, field)?;
    if bytes.is_empty() {
        return Err(ChainsealError::MalformedRecord(format!("{name} is empty")));
    }
    Ok(bytes)
}

fn decode_fixed<const N: usize>(name: &str, field: &str) -> ChainsealResult<[u8; N]> {
    let bytes = decode_b64(name, field)?;
    bytes.as_slice().try_into().map_err(|_| {
        ChainsealError::MalformedRecord(format!(
            "{name} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}
