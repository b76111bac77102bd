//! ECDSA P-256 key pairs, the key-pair consistency check, and data-hash signatures.
//!
//! Public keys travel as 65-byte SEC1 uncompressed points (`0x04 || x || y`).
//! Signatures are IEEE P1363 (raw r||s, 64 bytes).

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::{ChainsealError, ChainsealResult};

/// Fixed message signed by the key-pair check.
const KEY_PAIR_CHECK_MESSAGE: &[u8] = b"chainseal key-pair consistency check v1";

/// Generate a new P-256 signing key.
pub fn generate_keypair() -> SigningKey {
    SigningKey::random(&mut rand::rngs::OsRng)
}

/// SEC1 uncompressed encoding of a public key. This is the key material the
/// KEK is derived from and the form embedded in wrapped-key envelopes.
pub fn public_key_bytes(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// Parse a SEC1-encoded P-256 public key.
pub fn public_key_from_bytes(bytes: &[u8]) -> ChainsealResult<VerifyingKey> {
    VerifyingKey::from_sec1_bytes(bytes)
        .map_err(|e| ChainsealError::MalformedRecord(format!("invalid P-256 public key: {e}")))
}

/// Sign a message with ECDSA P-256 + SHA-256.
pub fn sign(private_key: &SigningKey, message: &[u8]) -> ChainsealResult<Vec<u8>> {
    let signature: Signature = private_key
        .try_sign(message)
        .map_err(|e| ChainsealError::Crypto(format!("signing failed: {e}")))?;
    Ok(signature.to_bytes().to_vec())
}

/// Verify an ECDSA P-256 + SHA-256 signature.
///
/// Returns false for malformed signatures as well as invalid ones.
pub fn verify(public_key: &VerifyingKey, message: &[u8], signature_bytes: &[u8]) -> bool {
    match Signature::from_slice(signature_bytes) {
        Ok(signature) => public_key.verify(message, &signature).is_ok(),
        Err(_) => false,
    }
}

/// Check that `private_key` belongs to the SEC1-encoded `public_key` by
/// signing a fixed check string and verifying it.
///
/// Used before unwrapping a DEK so a wrong private key fails as a clear
/// key mismatch instead of an opaque GCM tag failure.
pub fn verify_key_pair(private_key: &SigningKey, public_key: &[u8]) -> bool {
    let Ok(public_key) = public_key_from_bytes(public_key) else {
        return false;
    };
    match sign(private_key, KEY_PAIR_CHECK_MESSAGE) {
        Ok(signature) => verify(&public_key, KEY_PAIR_CHECK_MESSAGE, &signature),
        Err(_) => false,
    }
}

/// Sign a record's hex data hash (optional authenticity layer).
pub fn sign_data_hash(signer: &SigningKey, data_hash: &str) -> ChainsealResult<Vec<u8>> {
    if data_hash.is_empty() {
        return Err(ChainsealError::InvalidArgument(
            "data hash to sign must not be empty".into(),
        ));
    }
    sign(signer, data_hash.as_bytes())
}

/// Verify a signature produced by [`sign_data_hash`].
pub fn verify_data_hash_signature(
    signer_public_key: &VerifyingKey,
    data_hash: &str,
    signature: &[u8],
) -> bool {
    verify(signer_public_key, data_hash.as_bytes(), signature)
}
