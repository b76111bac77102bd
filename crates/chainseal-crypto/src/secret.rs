//! Zeroize-on-drop holder for DEKs, KEKs and password-derived keys

use rand::RngCore;
use zeroize::Zeroize;

use crate::{ChainsealError, ChainsealResult, KEY_SIZE};

/// A 256-bit symmetric key. Zeroized on drop, on success and error paths alike.
///
/// Not `Clone`: a key has exactly one owner for the duration of an operation.
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Take ownership of raw key bytes. The caller's copy, if any, stays the
    /// caller's to zeroize; internal derivations write into [`Self::zeroed`] instead.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// An all-zero key to be filled in place through [`Self::as_mut_bytes`].
    pub(crate) fn zeroed() -> Self {
        Self {
            bytes: [0u8; KEY_SIZE],
        }
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_SIZE] {
        &mut self.bytes
    }

    /// Copy key bytes out of a slice, rejecting anything but exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> ChainsealResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(ChainsealError::Crypto(format!(
                "key has wrong size: {} bytes (expected {KEY_SIZE})",
                bytes.len()
            )));
        }
        let mut key = Self::zeroed();
        key.bytes.copy_from_slice(bytes);
        Ok(key)
    }

    /// Generate a random 256-bit key (used for per-record DEKs).
    pub fn generate() -> Self {
        let mut key = Self::zeroed();
        rand::thread_rng().fill_bytes(&mut key.bytes);
        key
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        let k1 = SymmetricKey::generate();
        let k2 = SymmetricKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_from_slice_wrong_size() {
        assert!(SymmetricKey::from_slice(&[0u8; 16]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; 33]).is_err());
        assert!(SymmetricKey::from_slice(&[7u8; KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_from_slice_copies_exact_bytes() {
        let key = SymmetricKey::from_slice(&[0x5Au8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[0x5Au8; KEY_SIZE]);
    }

    #[test]
    fn test_zeroed_key_filled_in_place() {
        let mut key = SymmetricKey::zeroed();
        assert_eq!(key.as_bytes(), &[0u8; KEY_SIZE]);
        key.as_mut_bytes()[0] = 0xFF;
        assert_eq!(key.as_bytes()[0], 0xFF);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_SIZE]);
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("171"), "raw byte values must not leak: {dbg}");
    }
}
