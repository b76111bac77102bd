//! AES-256-GCM with a detached 128-bit tag
//!
//! The IV is drawn from the CSPRNG inside [`encrypt`] and handed back to the
//! caller; there is no way to pass an IV in, so a (key, IV) pair can never be
//! reused by construction.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::RngCore;
use zeroize::Zeroize;

use crate::secret::SymmetricKey;
use crate::{ChainsealError, ChainsealResult, IV_SIZE, TAG_SIZE};

/// Result of a single AEAD encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadOutput {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

impl AeadOutput {
    /// `ciphertext || tag`, the usual GCM framing for single-blob storage.
    pub fn into_ciphertext_with_tag(self) -> Vec<u8> {
        let mut out = self.ciphertext;
        out.extend_from_slice(&self.tag);
        out
    }
}

/// Generate a random 96-bit IV.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> ChainsealResult<AeadOutput> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let iv = generate_iv();

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| {
            buffer.zeroize();
            ChainsealError::Crypto(format!("AES-GCM encryption failed: {e}"))
        })?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(AeadOutput {
        iv,
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypt and authenticate. Any tag mismatch (wrong key, wrong IV, flipped
/// ciphertext or tag bit) is an [`ChainsealError::AuthenticationFailure`].
pub fn decrypt(
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
) -> ChainsealResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        Nonce::from_slice(iv),
        b"",
        &mut buffer,
        Tag::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(ChainsealError::AuthenticationFailure(
                "AES-GCM tag verification failed: wrong key, wrong IV, or tampered data".into(),
            ))
        }
    }
}

/// Split a `ciphertext || tag` blob into its parts.
pub fn split_tag(blob: &[u8]) -> ChainsealResult<(&[u8], [u8; TAG_SIZE])> {
    if blob.len() < TAG_SIZE {
        return Err(ChainsealError::MalformedRecord(format!(
            "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
            blob.len()
        )));
    }
    let (ciphertext, tag_bytes) = blob.split_at(blob.len() - TAG_SIZE);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(tag_bytes);
    Ok((ciphertext, tag))
}
