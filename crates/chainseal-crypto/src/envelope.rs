//! Wrapped-DEK envelope for hybrid records
//!
//! Binary format (big-endian length prefix):
//! ```text
//! [4 bytes: public key length N][N bytes: SEC1 public key]
//! [12 bytes: wrap IV][32 bytes: wrapped DEK][16 bytes: GCM tag]
//! ```
//!
//! The embedded public key is what the KEK is re-derived from at decryption
//! time, and what the private key is checked against before unwrapping.

use zeroize::Zeroizing;

use crate::secret::SymmetricKey;
use crate::{aead, ChainsealError, ChainsealResult, IV_SIZE, KEY_SIZE, TAG_SIZE};

/// Upper bound on an embedded public key, to reject absurd length prefixes.
pub const MAX_PUBLIC_KEY_LEN: usize = 1024;

const LEN_PREFIX_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKeyEnvelope {
    pub public_key: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

impl WrappedKeyEnvelope {
    /// AEAD-encrypt `dek` under `kek` with a fresh IV and embed `public_key`.
    pub fn seal(dek: &SymmetricKey, kek: &SymmetricKey, public_key: &[u8]) -> ChainsealResult<Self> {
        if public_key.is_empty() || public_key.len() > MAX_PUBLIC_KEY_LEN {
            return Err(ChainsealError::InvalidArgument(format!(
                "public key length {} outside 1..={MAX_PUBLIC_KEY_LEN}",
                public_key.len()
            )));
        }
        let out = aead::encrypt(dek.as_bytes(), kek)?;
        Ok(Self {
            public_key: public_key.to_vec(),
            iv: out.iv,
            ciphertext: out.ciphertext,
            tag: out.tag,
        })
    }

    /// AEAD-decrypt the wrapped DEK with `kek`.
    pub fn open(&self, kek: &SymmetricKey) -> ChainsealResult<SymmetricKey> {
        let dek = Zeroizing::new(aead::decrypt(&self.ciphertext, &self.tag, kek, &self.iv)?);
        if dek.len() != KEY_SIZE {
            return Err(ChainsealError::MalformedRecord(format!(
                "unwrapped DEK has wrong size: {} bytes (expected {KEY_SIZE})",
                dek.len()
            )));
        }
        SymmetricKey::from_slice(&dek)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            LEN_PREFIX_SIZE + self.public_key.len() + IV_SIZE + self.ciphertext.len() + TAG_SIZE,
        );
        out.extend_from_slice(&(self.public_key.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.public_key);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_bytes(data: &[u8]) -> ChainsealResult<Self> {
        if data.len() < LEN_PREFIX_SIZE {
            return Err(ChainsealError::MalformedRecord(format!(
                "wrapped key too short: {} bytes",
                data.len()
            )));
        }
        let (prefix, rest) = data.split_at(LEN_PREFIX_SIZE);
        let pk_len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

        if pk_len == 0 || pk_len > MAX_PUBLIC_KEY_LEN {
            return Err(ChainsealError::MalformedRecord(format!(
                "embedded public key length {pk_len} outside 1..={MAX_PUBLIC_KEY_LEN}"
            )));
        }
        if rest.len() < pk_len + IV_SIZE + TAG_SIZE {
            return Err(ChainsealError::MalformedRecord(format!(
                "wrapped key truncated: {} bytes after length prefix (need at least {})",
                rest.len(),
                pk_len + IV_SIZE + TAG_SIZE
            )));
        }

        let (public_key, rest) = rest.split_at(pk_len);
        let (iv_bytes, rest) = rest.split_at(IV_SIZE);
        let (ciphertext, tag_bytes) = rest.split_at(rest.len() - TAG_SIZE);

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(iv_bytes);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            public_key: public_key.to_vec(),
            iv,
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_public_key() -> Vec<u8> {
        let mut pk = vec![0x04u8];
        pk.extend_from_slice(&[0x11; 64]);
        pk
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let dek = SymmetricKey::generate();
        let kek = SymmetricKey::generate();

        let env = WrappedKeyEnvelope::seal(&dek, &kek, &sample_public_key()).unwrap();
        let opened = env.open(&kek).unwrap();
        assert_eq!(opened.as_bytes(), dek.as_bytes());
    }

    #[test]
    fn test_open_wrong_kek() {
        let dek = SymmetricKey::generate();
        let env =
            WrappedKeyEnvelope::seal(&dek, &SymmetricKey::generate(), &sample_public_key()).unwrap();
        let err = env.open(&SymmetricKey::generate()).unwrap_err();
        assert!(matches!(err, ChainsealError::AuthenticationFailure(_)));
    }

    #[test]
    fn test_byte_layout() {
        let dek = SymmetricKey::generate();
        let kek = SymmetricKey::generate();
        let pk = sample_public_key();
        let env = WrappedKeyEnvelope::seal(&dek, &kek, &pk).unwrap();
        let bytes = env.to_bytes();

        // len (4) + pk (65) + iv (12) + dek (32) + tag (16)
        assert_eq!(bytes.len(), 4 + 65 + IV_SIZE + KEY_SIZE + TAG_SIZE);
        assert_eq!(&bytes[..4], &65u32.to_be_bytes());
        assert_eq!(&bytes[4..69], pk.as_slice());

        assert_eq!(WrappedKeyEnvelope::from_bytes(&bytes).unwrap(), env);
    }

    #[test]
    fn test_from_bytes_rejects_truncation() {
        let env = WrappedKeyEnvelope::seal(
            &SymmetricKey::generate(),
            &SymmetricKey::generate(),
            &sample_public_key(),
        )
        .unwrap();
        let bytes = env.to_bytes();

        for len in [0, 3, 4, 60, 4 + 65 + IV_SIZE + TAG_SIZE - 1] {
            let err = WrappedKeyEnvelope::from_bytes(&bytes[..len]).unwrap_err();
            assert!(
                matches!(err, ChainsealError::MalformedRecord(_)),
                "len {len}: {err}"
            );
        }
    }

    #[test]
    fn test_from_bytes_rejects_oversized_length_prefix() {
        let mut bytes = vec![0u8; 200];
        bytes[..4].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            WrappedKeyEnvelope::from_bytes(&bytes),
            Err(ChainsealError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_seal_rejects_empty_public_key() {
        let err = WrappedKeyEnvelope::seal(&SymmetricKey::generate(), &SymmetricKey::generate(), &[])
            .unwrap_err();
        assert!(matches!(err, ChainsealError::InvalidArgument(_)));
    }
}
