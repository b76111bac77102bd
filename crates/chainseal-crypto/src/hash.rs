//! SHA3-256 content hashing and hex encoding
//!
//! The hex digest of the plaintext is stored beside every ciphertext and
//! re-checked after decryption; a mismatch is an integrity failure.

use sha3::{Digest, Sha3_256};

use crate::{ChainsealError, ChainsealResult, HASH_SIZE};

/// SHA3-256 of a byte slice.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_SIZE] {
    Sha3_256::digest(data).into()
}

/// SHA3-256 of a byte slice as lowercase hex (64 chars).
pub fn data_hash(data: &[u8]) -> String {
    hex::encode(sha3_256(data))
}

/// Recompute the data hash and compare it to the stored one.
pub fn verify_data_hash(plaintext: &[u8], expected_hex: &str) -> ChainsealResult<()> {
    let actual = data_hash(plaintext);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(ChainsealError::IntegrityFailure {
            expected: expected_hex.to_string(),
            actual,
        })
    }
}

/// True when `s` is a well-formed 64-char hex SHA3-256 digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == HASH_SIZE * 2 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
