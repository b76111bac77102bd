//! Key derivation: public-key material → KEK, password → symmetric key

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use sha3::digest::generic_array::GenericArray;
use sha3::{Digest, Sha3_256};

use crate::secret::SymmetricKey;
use crate::{ChainsealError, ChainsealResult, SALT_SIZE};

/// Domain-separation prefix for KEK derivation. Part of the stored format:
/// changing it orphans every existing wrapped DEK.
pub const KEK_DOMAIN_TAG: &[u8] = b"chainseal/kek/v1";

/// PBKDF2-HMAC-SHA256 iteration count for block records.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Derive a KEK from key material: `SHA3-256(KEK_DOMAIN_TAG || material)`.
///
/// Deterministic, so decryption re-derives the identical KEK from the public
/// key embedded in the wrapped-key envelope without any extra stored state.
pub fn derive_kek(key_material: &[u8]) -> ChainsealResult<SymmetricKey> {
    if key_material.is_empty() {
        return Err(ChainsealError::InvalidArgument(
            "KEK key material must not be empty".into(),
        ));
    }

    let mut hasher = Sha3_256::new();
    hasher.update(KEK_DOMAIN_TAG);
    hasher.update(key_material);

    let mut kek = SymmetricKey::zeroed();
    hasher.finalize_into(GenericArray::from_mut_slice(&mut kek.as_mut_bytes()[..]));
    Ok(kek)
}

/// Derive a 256-bit key from a password and salt with PBKDF2-HMAC-SHA256.
///
/// The salt must be freshly random per encryption (see [`generate_salt`]) and
/// stored alongside the ciphertext; it does not need to be secret.
pub fn derive_password_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> ChainsealResult<SymmetricKey> {
    let password = password.expose_secret();
    if password.is_empty() {
        return Err(ChainsealError::InvalidArgument(
            "password must not be empty".into(),
        ));
    }
    if iterations == 0 {
        return Err(ChainsealError::InvalidArgument(
            "PBKDF2 iteration count must be positive".into(),
        ));
    }

    let mut key = SymmetricKey::zeroed();
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.as_mut_bytes());
    Ok(key)
}

/// Derive a key with a single SHA3-256 pass over the password.
///
/// Only for large off-chain objects where PBKDF2's iteration cost is traded
/// for throughput; block records always go through [`derive_password_key`].
pub fn derive_simple_password_key(password: &SecretString) -> ChainsealResult<SymmetricKey> {
    let password = password.expose_secret();
    if password.is_empty() {
        return Err(ChainsealError::InvalidArgument(
            "password must not be empty".into(),
        ));
    }

    let mut key = SymmetricKey::zeroed();
    Sha3_256::new_with_prefix(password.as_bytes())
        .finalize_into(GenericArray::from_mut_slice(&mut key.as_mut_bytes()[..]));
    Ok(key)
}

/// Generate a fresh random 16-byte PBKDF2 salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
